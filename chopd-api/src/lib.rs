//! chopd-api library interface
//!
//! Exposes the application state and router builder for the binary and
//! for integration testing.

pub mod api;
pub mod error;
pub mod services;

pub use crate::error::{ApiError, ApiResult};

use axum::extract::DefaultBodyLimit;
use axum::Router;
use chopd_common::config::ServiceConfig;
use chopd_common::quota::QuotaLedger;
use chrono::{DateTime, Utc};
use services::VisionClient;
use std::sync::Arc;
use tokio::sync::RwLock;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

// 4 photos x 10 MB (premium ceiling) plus multipart framing headroom
const MAX_UPLOAD_BYTES: usize = 48 * 1024 * 1024;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Runtime configuration
    pub config: Arc<ServiceConfig>,
    /// Per-user quota records
    pub ledger: Arc<QuotaLedger>,
    /// External vision-model client
    pub vision: Arc<VisionClient>,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
    /// Last upstream error for diagnostic purposes
    pub last_error: Arc<RwLock<Option<String>>>,
}

impl AppState {
    pub fn new(config: ServiceConfig, vision: VisionClient) -> Self {
        Self {
            config: Arc::new(config),
            ledger: Arc::new(QuotaLedger::new()),
            vision: Arc::new(vision),
            startup_time: Utc::now(),
            last_error: Arc::new(RwLock::new(None)),
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(api::analyze_routes())
        .merge(api::user_routes())
        .merge(api::plan_routes())
        .merge(api::health_routes())
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
