use axum::{extract::rejection::QueryRejection, http::StatusCode, Json};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum ReportError {
    #[error("invalid date range: {0}")]
    InvalidRange(String),

    #[error("invalid group '{0}', expected day, week or month")]
    InvalidGranularity(String),

    #[error("unsupported format '{0}', expected json or csv")]
    UnsupportedFormat(String),

    #[error("invalid filter: {0}")]
    InvalidFilter(String),

    #[error("failed to read farm records: {0}")]
    UpstreamQuery(String),

    #[error("failed to export report: {0}")]
    Export(String),
}

#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub message: String,
}

impl AppError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    pub fn internal(err: impl std::error::Error) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: err.to_string(),
        }
    }
}

impl From<ReportError> for AppError {
    fn from(err: ReportError) -> Self {
        match err {
            ReportError::UpstreamQuery(_) | ReportError::Export(_) => Self::internal(err),
            _ => Self::bad_request(err.to_string()),
        }
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        Self::bad_request(rejection.body_text())
    }
}

impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let body = json!({ "success": false, "message": self.message });
        (self.status, Json(body)).into_response()
    }
}
