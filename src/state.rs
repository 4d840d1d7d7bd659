use crate::cache::TtlCache;
use crate::models::DashboardStats;
use std::{path::PathBuf, sync::Arc, time::Duration};
use tokio::sync::Mutex;

pub type DashboardCache = TtlCache<&'static str, DashboardStats>;

#[derive(Clone)]
pub struct AppState {
    pub data_path: PathBuf,
    pub dashboard_cache: Arc<Mutex<DashboardCache>>,
}

impl AppState {
    pub fn new(data_path: PathBuf, dashboard_ttl: Duration) -> Self {
        Self {
            data_path,
            dashboard_cache: Arc::new(Mutex::new(TtlCache::new(dashboard_ttl))),
        }
    }
}
