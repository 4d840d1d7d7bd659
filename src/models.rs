use crate::aggregate::Aggregable;
use crate::buckets::parse_timestamp;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// Everything the data file holds. Missing collections read as empty.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct FarmData {
    pub sales: Vec<SaleRecord>,
    pub health: Vec<HealthRecord>,
    pub breeding: Vec<BreedingRecord>,
    pub feed: Vec<FeedRecord>,
    pub expenses: Vec<ExpenseRecord>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FarmType {
    Goat,
    Poultry,
    Dairy,
}

impl FarmType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Goat => "goat",
            Self::Poultry => "poultry",
            Self::Dairy => "dairy",
        }
    }
}

impl fmt::Display for FarmType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FarmType {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "goat" => Ok(Self::Goat),
            "poultry" => Ok(Self::Poultry),
            "dairy" => Ok(Self::Dairy),
            other => Err(format!("unknown farm type '{other}'")),
        }
    }
}

/// The thing sold on a sales line, shaped by the farm it came from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "farm_type", rename_all = "lowercase")]
pub enum FarmProduct {
    Goat {
        id: String,
        #[serde(default)]
        breed: String,
        unit_price: f64,
    },
    Poultry {
        id: String,
        #[serde(default)]
        product: String,
        unit_price: f64,
    },
    Dairy {
        id: String,
        #[serde(default)]
        product: String,
        unit_price: f64,
    },
}

impl FarmProduct {
    pub fn farm_type(&self) -> FarmType {
        match self {
            Self::Goat { .. } => FarmType::Goat,
            Self::Poultry { .. } => FarmType::Poultry,
            Self::Dairy { .. } => FarmType::Dairy,
        }
    }

    pub fn id(&self) -> &str {
        match self {
            Self::Goat { id, .. } | Self::Poultry { id, .. } | Self::Dairy { id, .. } => id,
        }
    }

    pub fn description(&self) -> String {
        match self {
            Self::Goat { id, breed, .. } if breed.is_empty() => format!("goat {id}"),
            Self::Goat { id, breed, .. } => format!("{breed} goat {id}"),
            Self::Poultry { product, .. } | Self::Dairy { product, .. } => {
                format!("{} {}", self.farm_type(), product)
            }
        }
    }

    pub fn unit_price(&self) -> f64 {
        match self {
            Self::Goat { unit_price, .. }
            | Self::Poultry { unit_price, .. }
            | Self::Dairy { unit_price, .. } => *unit_price,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaleRecord {
    #[serde(default, alias = "createdAt")]
    pub date: Option<String>,
    #[serde(default)]
    pub buyer: String,
    pub item: FarmProduct,
    #[serde(default)]
    pub quantity: f64,
}

impl SaleRecord {
    pub fn revenue(&self) -> f64 {
        self.quantity * self.item.unit_price()
    }
}

impl Aggregable for SaleRecord {
    fn timestamp(&self) -> Option<NaiveDateTime> {
        self.date.as_deref().and_then(parse_timestamp)
    }

    fn value(&self, field: &str) -> Option<f64> {
        match field {
            "quantity" => Some(self.quantity),
            "revenue" => Some(self.revenue()),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthRecord {
    #[serde(default, alias = "createdAt")]
    pub date: Option<String>,
    #[serde(default, alias = "animalId")]
    pub animal_id: String,
    #[serde(default, rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub breed: String,
    #[serde(default)]
    pub gender: String,
    #[serde(default)]
    pub cost: f64,
}

impl Aggregable for HealthRecord {
    fn timestamp(&self) -> Option<NaiveDateTime> {
        self.date.as_deref().and_then(parse_timestamp)
    }

    fn value(&self, field: &str) -> Option<f64> {
        match field {
            "cost" => Some(self.cost),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BreedingRecord {
    #[serde(default, alias = "createdAt")]
    pub date: Option<String>,
    #[serde(default, alias = "damId")]
    pub dam_id: String,
    #[serde(default, alias = "sireId")]
    pub sire_id: String,
    #[serde(default)]
    pub breed: String,
    #[serde(default)]
    pub method: String,
    #[serde(default)]
    pub offspring: f64,
}

impl Aggregable for BreedingRecord {
    fn timestamp(&self) -> Option<NaiveDateTime> {
        self.date.as_deref().and_then(parse_timestamp)
    }

    fn value(&self, field: &str) -> Option<f64> {
        match field {
            "offspring" => Some(self.offspring),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedRecord {
    #[serde(default, alias = "createdAt")]
    pub date: Option<String>,
    #[serde(default, alias = "feedType")]
    pub feed_type: String,
    #[serde(default)]
    pub quantity: f64,
    #[serde(default)]
    pub unit: String,
    #[serde(default)]
    pub cost: f64,
}

impl Aggregable for FeedRecord {
    fn timestamp(&self) -> Option<NaiveDateTime> {
        self.date.as_deref().and_then(parse_timestamp)
    }

    fn value(&self, field: &str) -> Option<f64> {
        match field {
            "quantity" => Some(self.quantity),
            "cost" => Some(self.cost),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExpenseRecord {
    #[serde(default, alias = "createdAt")]
    pub date: Option<String>,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub amount: f64,
}

/// One money movement, derived from sales (revenue) or from costs (expenses).
#[derive(Debug, Clone, PartialEq)]
pub struct FinanceEntry {
    pub timestamp: Option<NaiveDateTime>,
    pub revenue: f64,
    pub expenses: f64,
}

impl FinanceEntry {
    pub fn income(timestamp: Option<NaiveDateTime>, amount: f64) -> Self {
        Self {
            timestamp,
            revenue: amount,
            expenses: 0.0,
        }
    }

    pub fn cost(timestamp: Option<NaiveDateTime>, amount: f64) -> Self {
        Self {
            timestamp,
            revenue: 0.0,
            expenses: amount,
        }
    }
}

impl Aggregable for FinanceEntry {
    fn timestamp(&self) -> Option<NaiveDateTime> {
        self.timestamp
    }

    fn value(&self, field: &str) -> Option<f64> {
        match field {
            "revenue" => Some(self.revenue),
            "expenses" => Some(self.expenses),
            "net" => Some(self.revenue - self.expenses),
            _ => None,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ReportQuery {
    pub start: Option<String>,
    pub end: Option<String>,
    pub group: Option<String>,
    pub format: Option<String>,
    pub buyer: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    #[serde(rename = "feedType", alias = "feed_type")]
    pub feed_type: Option<String>,
    pub unit: Option<String>,
    pub breed: Option<String>,
    pub gender: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RevenuePoint {
    pub period: String,
    pub revenue: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DashboardStats {
    pub generated_at: String,
    pub sales_count: u64,
    pub revenue: f64,
    pub health_events: u64,
    pub breeding_events: u64,
    pub offspring: f64,
    pub feed_quantity: f64,
    pub feed_cost: f64,
    pub expenses: f64,
    pub net: f64,
    pub last_7_days: Vec<RevenuePoint>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub success: bool,
}
