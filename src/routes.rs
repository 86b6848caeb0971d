//! Top-level router configuration.
//!
//! # Route Structure
//!
//! - `GET  /health`                    - Health check
//! - `POST /api/v1/links`              - Create a short link
//! - `GET  /api/v1/links/{code}/stats` - Aggregated click statistics
//! - `GET  /{code}`                    - Short link redirect

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

use crate::api::handlers::{health_handler, redirect_handler, shorten_handler, stats_handler};
use crate::state::AppState;

/// Constructs the application router with all routes and middleware.
pub fn app_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/api/v1/links", post(shorten_handler))
        .route("/api/v1/links/{code}/stats", get(stats_handler))
        .route("/{code}", get(redirect_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
