use crate::aggregate::{aggregate, reduce_totals, Aggregable, MetricSpec, SummaryRow, TotalsRow};
use crate::buckets::{bucketize, parse_date, parse_timestamp, Bucket, Granularity};
use crate::errors::ReportError;
use crate::models::{
    BreedingRecord, FarmData, FarmType, FeedRecord, FinanceEntry, HealthRecord, ReportQuery,
    SaleRecord,
};
use crate::respond::ReportFormat;
use chrono::NaiveDate;
use std::fmt;

const SALES_METRICS: [MetricSpec; 3] = [
    MetricSpec::count("sales"),
    MetricSpec::sum("quantity"),
    MetricSpec::sum("revenue"),
];
const HEALTH_METRICS: [MetricSpec; 2] = [MetricSpec::count("events"), MetricSpec::sum("cost")];
const BREEDING_METRICS: [MetricSpec; 2] =
    [MetricSpec::count("events"), MetricSpec::sum("offspring")];
const FEED_METRICS: [MetricSpec; 3] = [
    MetricSpec::count("entries"),
    MetricSpec::sum("quantity"),
    MetricSpec::sum("cost"),
];
const FINANCE_METRICS: [MetricSpec; 3] = [
    MetricSpec::sum("revenue"),
    MetricSpec::sum("expenses"),
    MetricSpec::sum("net"),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportKind {
    Sales,
    Health,
    Breeding,
    Feed,
    Finance,
}

impl ReportKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Sales => "sales",
            Self::Health => "health",
            Self::Breeding => "breeding",
            Self::Feed => "feed",
            Self::Finance => "finance",
        }
    }

    pub fn metrics(self) -> &'static [MetricSpec] {
        match self {
            Self::Sales => &SALES_METRICS,
            Self::Health => &HEALTH_METRICS,
            Self::Breeding => &BREEDING_METRICS,
            Self::Feed => &FEED_METRICS,
            Self::Finance => &FINANCE_METRICS,
        }
    }
}

impl fmt::Display for ReportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Optional record filters. Strings match case-insensitively on the whole value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filters {
    pub buyer: Option<String>,
    pub farm_type: Option<FarmType>,
    pub kind: Option<String>,
    pub feed_type: Option<String>,
    pub unit: Option<String>,
    pub breed: Option<String>,
    pub gender: Option<String>,
}

impl Filters {
    fn sale(&self, sale: &SaleRecord) -> bool {
        filter_matches(&self.buyer, &sale.buyer)
            && self
                .farm_type
                .is_none_or(|farm_type| sale.item.farm_type() == farm_type)
    }

    fn health(&self, event: &HealthRecord) -> bool {
        filter_matches(&self.kind, &event.kind)
            && filter_matches(&self.breed, &event.breed)
            && filter_matches(&self.gender, &event.gender)
    }

    fn breeding(&self, event: &BreedingRecord) -> bool {
        filter_matches(&self.breed, &event.breed) && filter_matches(&self.kind, &event.method)
    }

    fn feed(&self, entry: &FeedRecord) -> bool {
        filter_matches(&self.feed_type, &entry.feed_type) && filter_matches(&self.unit, &entry.unit)
    }
}

fn filter_matches(filter: &Option<String>, value: &str) -> bool {
    filter
        .as_deref()
        .is_none_or(|wanted| wanted.eq_ignore_ascii_case(value.trim()))
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// A validated report request.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportRequest {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub granularity: Granularity,
    pub format: ReportFormat,
    pub filters: Filters,
}

impl ReportRequest {
    pub fn from_query(kind: ReportKind, query: ReportQuery) -> Result<Self, ReportError> {
        let start = required_date("start", query.start.as_deref())?;
        let end = required_date("end", query.end.as_deref())?;
        if start > end {
            return Err(ReportError::InvalidRange(format!(
                "start {start} is after end {end}"
            )));
        }

        let granularity = match non_empty(query.group) {
            Some(group) => group.parse()?,
            None => Granularity::default(),
        };
        let format = match non_empty(query.format) {
            Some(format) => format.parse()?,
            None => ReportFormat::default(),
        };

        let mut filters = Filters {
            buyer: non_empty(query.buyer),
            feed_type: non_empty(query.feed_type),
            unit: non_empty(query.unit),
            breed: non_empty(query.breed),
            gender: non_empty(query.gender),
            ..Filters::default()
        };
        let kind_filter = non_empty(query.kind);
        if kind == ReportKind::Sales {
            filters.farm_type = kind_filter
                .map(|value| value.parse::<FarmType>())
                .transpose()
                .map_err(ReportError::InvalidFilter)?;
        } else {
            filters.kind = kind_filter;
        }

        Ok(Self {
            start,
            end,
            granularity,
            format,
            filters,
        })
    }
}

fn required_date(name: &str, value: Option<&str>) -> Result<NaiveDate, ReportError> {
    let value = value
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .ok_or_else(|| ReportError::InvalidRange(format!("{name} is required")))?;
    parse_date(value)
        .ok_or_else(|| ReportError::InvalidRange(format!("{name} '{value}' is not a valid date")))
}

#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    pub kind: ReportKind,
    pub metrics: &'static [MetricSpec],
    pub summary: Vec<SummaryRow>,
    pub totals: TotalsRow,
}

pub fn build_report(
    kind: ReportKind,
    request: &ReportRequest,
    data: &FarmData,
) -> Result<Report, ReportError> {
    let buckets = bucketize(request.start, request.end, request.granularity)?;
    let metrics = kind.metrics();
    let filters = &request.filters;

    let summary = match kind {
        ReportKind::Sales => fold(data.sales.iter().filter(|s| filters.sale(s)), &buckets, metrics),
        ReportKind::Health => {
            fold(data.health.iter().filter(|e| filters.health(e)), &buckets, metrics)
        }
        ReportKind::Breeding => fold(
            data.breeding.iter().filter(|e| filters.breeding(e)),
            &buckets,
            metrics,
        ),
        ReportKind::Feed => fold(data.feed.iter().filter(|e| filters.feed(e)), &buckets, metrics),
        ReportKind::Finance => aggregate(&finance_entries(data), &buckets, metrics),
    };
    let totals = reduce_totals(&summary, metrics);

    Ok(Report {
        kind,
        metrics,
        summary,
        totals,
    })
}

fn fold<R: Aggregable>(
    records: impl Iterator<Item = R>,
    buckets: &[Bucket],
    metrics: &[MetricSpec],
) -> Vec<SummaryRow> {
    let records: Vec<R> = records.collect();
    aggregate(&records, buckets, metrics)
}

/// Sales count as revenue; expenses, feed and health costs count against it.
pub fn finance_entries(data: &FarmData) -> Vec<FinanceEntry> {
    let income = data
        .sales
        .iter()
        .map(|sale| FinanceEntry::income(sale.timestamp(), sale.revenue()));
    let expenses = data.expenses.iter().map(|expense| {
        let timestamp = expense.date.as_deref().and_then(parse_timestamp);
        FinanceEntry::cost(timestamp, expense.amount)
    });
    let feed = data
        .feed
        .iter()
        .map(|entry| FinanceEntry::cost(entry.timestamp(), entry.cost));
    let health = data
        .health
        .iter()
        .map(|event| FinanceEntry::cost(event.timestamp(), event.cost));

    income.chain(expenses).chain(feed).chain(health).collect()
}
