use crate::aggregate::{format_value, SummaryRow, TotalsRow};
use crate::errors::ReportError;
use crate::reports::Report;
use axum::{
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use csv::Writer;
use serde::Serialize;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReportFormat {
    #[default]
    Json,
    Csv,
}

impl FromStr for ReportFormat {
    type Err = ReportError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "csv" => Ok(Self::Csv),
            _ => Err(ReportError::UnsupportedFormat(value.to_string())),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ReportBody<'a> {
    pub summary: &'a [SummaryRow],
    pub totals: &'a TotalsRow,
}

/// CSV payload served as a download.
pub struct CsvResponse {
    pub data: Vec<u8>,
    pub filename: String,
}

impl IntoResponse for CsvResponse {
    fn into_response(self) -> Response {
        let headers = [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", self.filename),
            ),
        ];
        (headers, self.data).into_response()
    }
}

pub fn respond(report: &Report, format: ReportFormat) -> Result<Response, ReportError> {
    ensure_finite(report)?;
    match format {
        ReportFormat::Json => Ok(Json(ReportBody {
            summary: &report.summary,
            totals: &report.totals,
        })
        .into_response()),
        ReportFormat::Csv => Ok(CsvResponse {
            data: to_csv(report)?,
            filename: format!("{}-report.csv", report.kind),
        }
        .into_response()),
    }
}

/// An overflowed sum has no JSON or CSV number form.
fn ensure_finite(report: &Report) -> Result<(), ReportError> {
    let rows = report
        .summary
        .iter()
        .map(|row| (row.period.as_str(), &row.values))
        .chain(std::iter::once(("totals", &report.totals.values)));
    for (period, values) in rows {
        if let Some((field, value)) = values.iter().find(|(_, value)| !value.is_finite()) {
            return Err(ReportError::Export(format!(
                "{field} for {period} is not a finite number ({value})"
            )));
        }
    }
    Ok(())
}

/// Header is `period` followed by the metric columns; totals are not written.
pub fn to_csv(report: &Report) -> Result<Vec<u8>, ReportError> {
    let mut wtr = Writer::from_writer(vec![]);

    let header = std::iter::once("period").chain(report.metrics.iter().map(|metric| metric.field));
    wtr.write_record(header)
        .map_err(|e| ReportError::Export(e.to_string()))?;

    for row in &report.summary {
        let values = row.values.iter().map(|(_, value)| format_value(*value));
        wtr.write_record(std::iter::once(row.period.clone()).chain(values))
            .map_err(|e| ReportError::Export(e.to_string()))?;
    }

    wtr.into_inner()
        .map_err(|e| ReportError::Export(e.to_string()))
}
