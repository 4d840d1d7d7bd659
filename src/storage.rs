use crate::errors::ReportError;
use crate::models::FarmData;
use std::path::Path;
use tokio::fs;
use tracing::{debug, error};

/// Reads the farm records afresh. A missing file is an empty farm.
pub async fn query_data(path: &Path) -> Result<FarmData, ReportError> {
    match fs::read(path).await {
        Ok(bytes) => serde_json::from_slice(&bytes).map_err(|err| {
            error!("failed to parse data file {}: {err}", path.display());
            ReportError::UpstreamQuery(format!("malformed data file: {err}"))
        }),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            debug!("data file {} not found, using empty records", path.display());
            Ok(FarmData::default())
        }
        Err(err) => {
            error!("failed to read data file {}: {err}", path.display());
            Err(ReportError::UpstreamQuery(err.to_string()))
        }
    }
}
