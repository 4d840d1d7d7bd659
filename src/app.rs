use crate::handlers;
use crate::state::AppState;
use axum::{routing::get, Router};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(handlers::health))
        .route("/api/dashboard", get(handlers::get_dashboard))
        .route("/reports/sales", get(handlers::sales_report))
        .route("/reports/health", get(handlers::health_report))
        .route("/reports/breeding", get(handlers::breeding_report))
        .route("/reports/feed", get(handlers::feed_report))
        .route("/reports/finance", get(handlers::finance_report))
        .with_state(state)
}
