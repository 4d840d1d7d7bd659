pub mod aggregate;
pub mod app;
pub mod buckets;
pub mod cache;
pub mod config;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod reports;
pub mod respond;
pub mod state;
pub mod stats;
pub mod storage;

pub use app::router;
pub use config::Config;
pub use state::AppState;
