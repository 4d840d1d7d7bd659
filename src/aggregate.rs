use crate::buckets::Bucket;
use chrono::{NaiveDate, NaiveDateTime};
use serde::ser::{Serialize, SerializeMap, Serializer};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricOp {
    Sum,
    Count,
}

/// A named column of a report and how records fold into it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetricSpec {
    pub field: &'static str,
    pub op: MetricOp,
}

impl MetricSpec {
    pub const fn sum(field: &'static str) -> Self {
        Self {
            field,
            op: MetricOp::Sum,
        }
    }

    pub const fn count(field: &'static str) -> Self {
        Self {
            field,
            op: MetricOp::Count,
        }
    }
}

/// A timestamped record with numeric fields that reports can fold.
pub trait Aggregable {
    /// `None` when the record has no usable date; such records are skipped.
    fn timestamp(&self) -> Option<NaiveDateTime>;

    fn value(&self, field: &str) -> Option<f64>;
}

impl<T: Aggregable + ?Sized> Aggregable for &T {
    fn timestamp(&self) -> Option<NaiveDateTime> {
        (**self).timestamp()
    }

    fn value(&self, field: &str) -> Option<f64> {
        (**self).value(field)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SummaryRow {
    pub period: String,
    pub values: Vec<(&'static str, f64)>,
}

impl SummaryRow {
    pub fn get(&self, field: &str) -> Option<f64> {
        lookup(&self.values, field)
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct TotalsRow {
    pub values: Vec<(&'static str, f64)>,
}

impl TotalsRow {
    pub fn get(&self, field: &str) -> Option<f64> {
        lookup(&self.values, field)
    }
}

fn lookup(values: &[(&'static str, f64)], field: &str) -> Option<f64> {
    values
        .iter()
        .find(|(name, _)| *name == field)
        .map(|(_, value)| *value)
}

/// Folds `records` into one row per bucket, empty buckets included.
///
/// Plain `f64` addition is used throughout, which is fine for quantities and
/// day-to-day currency totals but is not an exact decimal ledger.
pub fn aggregate<R: Aggregable>(
    records: &[R],
    buckets: &[Bucket],
    metrics: &[MetricSpec],
) -> Vec<SummaryRow> {
    let mut rows: Vec<SummaryRow> = buckets
        .iter()
        .map(|bucket| SummaryRow {
            period: bucket.label.clone(),
            values: metrics.iter().map(|metric| (metric.field, 0.0)).collect(),
        })
        .collect();

    for record in records {
        let Some(date) = record.timestamp().map(|timestamp| timestamp.date()) else {
            continue;
        };
        let Some(index) = locate(buckets, date) else {
            continue;
        };

        for ((_, total), metric) in rows[index].values.iter_mut().zip(metrics) {
            *total += match metric.op {
                MetricOp::Count => 1.0,
                MetricOp::Sum => record
                    .value(metric.field)
                    .filter(|value| value.is_finite())
                    .unwrap_or(0.0),
            };
        }
    }

    rows
}

fn locate(buckets: &[Bucket], date: NaiveDate) -> Option<usize> {
    let index = buckets.partition_point(|bucket| bucket.end <= date);
    buckets
        .get(index)
        .filter(|bucket| bucket.contains(date))
        .map(|_| index)
}

pub fn reduce_totals(rows: &[SummaryRow], metrics: &[MetricSpec]) -> TotalsRow {
    TotalsRow {
        values: metrics
            .iter()
            .map(|metric| {
                let total = rows
                    .iter()
                    .filter_map(|row| row.get(metric.field))
                    .sum::<f64>();
                (metric.field, total)
            })
            .collect(),
    }
}

/// Renders whole numbers without a fractional part.
pub fn format_value(value: f64) -> String {
    if is_integral(value) {
        (value as i64).to_string()
    } else {
        value.to_string()
    }
}

fn is_integral(value: f64) -> bool {
    value.fract() == 0.0 && value.abs() < 9.0e15
}

struct MetricValue(f64);

impl Serialize for MetricValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if is_integral(self.0) {
            serializer.serialize_i64(self.0 as i64)
        } else {
            serializer.serialize_f64(self.0)
        }
    }
}

impl Serialize for SummaryRow {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.values.len() + 1))?;
        map.serialize_entry("period", &self.period)?;
        for (field, value) in &self.values {
            map.serialize_entry(field, &MetricValue(*value))?;
        }
        map.end()
    }
}

impl Serialize for TotalsRow {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.values.len()))?;
        for (field, value) in &self.values {
            map.serialize_entry(field, &MetricValue(*value))?;
        }
        map.end()
    }
}
