use crate::errors::ReportError;
use chrono::{DateTime, Datelike, Days, NaiveDate, NaiveDateTime};
use std::{fmt, str::FromStr};

/// Upper bound on buckets per report, roughly ten years of days.
pub const MAX_BUCKETS: usize = 3660;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Granularity {
    #[default]
    Day,
    Week,
    Month,
}

impl Granularity {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Day => "day",
            Self::Week => "week",
            Self::Month => "month",
        }
    }
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Granularity {
    type Err = ReportError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "day" => Ok(Self::Day),
            "week" => Ok(Self::Week),
            "month" => Ok(Self::Month),
            _ => Err(ReportError::InvalidGranularity(value.to_string())),
        }
    }
}

/// A half-open run of whole days, `[start, end)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bucket {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub label: String,
}

impl Bucket {
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date < self.end
    }
}

/// Splits the inclusive range `start..=end` into contiguous buckets.
///
/// Week and month buckets follow the calendar (ISO weeks start on Monday),
/// but the first and last bucket are clipped to the requested range, so the
/// first bucket always starts at `start` and the last one ends the day after
/// `end`.
pub fn bucketize(
    start: NaiveDate,
    end: NaiveDate,
    granularity: Granularity,
) -> Result<Vec<Bucket>, ReportError> {
    if start > end {
        return Err(ReportError::InvalidRange(format!(
            "start {start} is after end {end}"
        )));
    }
    let stop = end
        .succ_opt()
        .ok_or_else(|| ReportError::InvalidRange(format!("end {end} is out of range")))?;

    let mut buckets = Vec::new();
    let mut cursor = start;
    while cursor < stop {
        if buckets.len() == MAX_BUCKETS {
            return Err(ReportError::InvalidRange(format!(
                "{start} to {end} spans more than {MAX_BUCKETS} {granularity} buckets"
            )));
        }
        let next = next_boundary(cursor, granularity).map_or(stop, |next| next.min(stop));
        buckets.push(Bucket {
            start: cursor,
            end: next,
            label: bucket_label(cursor, granularity),
        });
        cursor = next;
    }

    Ok(buckets)
}

fn next_boundary(date: NaiveDate, granularity: Granularity) -> Option<NaiveDate> {
    match granularity {
        Granularity::Day => date.succ_opt(),
        Granularity::Week => week_start(date)?.checked_add_days(Days::new(7)),
        Granularity::Month => {
            if date.month() == 12 {
                NaiveDate::from_ymd_opt(date.year() + 1, 1, 1)
            } else {
                NaiveDate::from_ymd_opt(date.year(), date.month() + 1, 1)
            }
        }
    }
}

fn bucket_label(date: NaiveDate, granularity: Granularity) -> String {
    match granularity {
        Granularity::Day => date_key(date),
        Granularity::Week => week_label(date),
        Granularity::Month => date.format("%Y-%m").to_string(),
    }
}

pub fn date_key(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// `None` when the Monday falls before the first representable date.
fn week_start(date: NaiveDate) -> Option<NaiveDate> {
    date.checked_sub_days(Days::new(u64::from(date.weekday().num_days_from_monday())))
}

fn week_label(date: NaiveDate) -> String {
    let iso = date.iso_week();
    format!("{}-W{:02}", iso.year(), iso.week())
}

/// Parses record and query timestamps. RFC 3339 values are normalised to UTC;
/// bare dates resolve to midnight.
pub fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Some(parsed.naive_utc());
    }
    for pattern in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(value, pattern) {
            return Some(parsed);
        }
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
}

pub fn parse_date(value: &str) -> Option<NaiveDate> {
    parse_timestamp(value).map(|timestamp| timestamp.date())
}
