//! mixtape-server library interface
//!
//! Crossfade mixing, job tracking, video rendering and description
//! generation, exposed over HTTP.

pub mod api;
pub mod audio;
pub mod config;
pub mod description;
pub mod error;
pub mod jobs;
pub mod library;
pub mod mixer;
pub mod video;

pub use crate::error::{ApiError, ApiResult, Error, Result};

use std::sync::Arc;

use axum::Router;
use chrono::{DateTime, Utc};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::config::ServiceConfig;
use crate::jobs::JobRegistry;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Every job submitted since startup
    pub registry: Arc<JobRegistry>,
    /// Fixed after startup
    pub config: Arc<ServiceConfig>,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
}

impl AppState {
    pub fn new(config: ServiceConfig) -> Self {
        Self {
            registry: Arc::new(JobRegistry::new()),
            config: Arc::new(config),
            startup_time: Utc::now(),
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(api::health_routes())
        .merge(api::upload_routes())
        .merge(api::job_routes())
        .merge(api::description_routes())
        .merge(api::download_routes())
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
