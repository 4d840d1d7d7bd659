use crate::errors::{AppError, ReportError};
use crate::models::{DashboardStats, FarmData, HealthResponse, ReportQuery};
use crate::reports::{build_report, ReportKind, ReportRequest};
use crate::respond::respond;
use crate::state::{AppState, DashboardCache};
use crate::stats::build_dashboard;
use crate::storage::query_data;
use axum::{
    extract::{rejection::QueryRejection, Query, State},
    response::Response,
    Json,
};
use std::{future::Future, time::Instant};
use tokio::sync::Mutex;
use tracing::debug;

const DASHBOARD_KEY: &str = "dashboard";

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { success: true })
}

pub async fn sales_report(
    State(state): State<AppState>,
    query: Result<Query<ReportQuery>, QueryRejection>,
) -> Result<Response, AppError> {
    run_report(&state, ReportKind::Sales, query).await
}

pub async fn health_report(
    State(state): State<AppState>,
    query: Result<Query<ReportQuery>, QueryRejection>,
) -> Result<Response, AppError> {
    run_report(&state, ReportKind::Health, query).await
}

pub async fn breeding_report(
    State(state): State<AppState>,
    query: Result<Query<ReportQuery>, QueryRejection>,
) -> Result<Response, AppError> {
    run_report(&state, ReportKind::Breeding, query).await
}

pub async fn feed_report(
    State(state): State<AppState>,
    query: Result<Query<ReportQuery>, QueryRejection>,
) -> Result<Response, AppError> {
    run_report(&state, ReportKind::Feed, query).await
}

pub async fn finance_report(
    State(state): State<AppState>,
    query: Result<Query<ReportQuery>, QueryRejection>,
) -> Result<Response, AppError> {
    run_report(&state, ReportKind::Finance, query).await
}

async fn run_report(
    state: &AppState,
    kind: ReportKind,
    query: Result<Query<ReportQuery>, QueryRejection>,
) -> Result<Response, AppError> {
    let Query(query) = query?;
    let request = ReportRequest::from_query(kind, query)?;
    let data = query_data(&state.data_path).await?;
    let report = build_report(kind, &request, &data)?;

    debug!(
        "{kind} report {}..{} by {}: {} rows as {:?}",
        request.start,
        request.end,
        request.granularity,
        report.summary.len(),
        request.format
    );

    Ok(respond(&report, request.format)?)
}

pub async fn get_dashboard(State(state): State<AppState>) -> Result<Json<DashboardStats>, AppError> {
    let stats = cached_dashboard(&state.dashboard_cache, query_data(&state.data_path)).await?;
    Ok(Json(stats))
}

/// The cache lock is not held while `load` runs, so concurrent misses may
/// each read the data file; the last one to finish wins the slot.
async fn cached_dashboard<F>(
    cache: &Mutex<DashboardCache>,
    load: F,
) -> Result<DashboardStats, ReportError>
where
    F: Future<Output = Result<FarmData, ReportError>>,
{
    let cached = cache.lock().await.get(&DASHBOARD_KEY, Instant::now()).cloned();
    if let Some(stats) = cached {
        debug!("serving dashboard from cache");
        return Ok(stats);
    }

    let stats = build_dashboard(&load.await?);
    cache
        .lock()
        .await
        .set(DASHBOARD_KEY, stats.clone(), Instant::now());

    Ok(stats)
}
