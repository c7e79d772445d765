//! HTTP route entry point for `/api/...`.
//!
//! Route groups:
//! - `/health` → liveness probe (public)
//! - `/auth` → registration, login, current user
//! - `/sessions` → session lifecycle (faculty create/end, scoped listing)
//! - `/attendance` → marking and attendance listings
//! - `/analytics` → role-scoped summaries, trends, AI insights

use axum::Router;
use util::state::AppState;

pub mod analytics;
pub mod attendance;
pub mod auth;
pub mod common;
pub mod health;
pub mod sessions;

use analytics::analytics_routes;
use attendance::attendance_routes;
use auth::auth_routes;
use health::health_routes;
use sessions::session_routes;

/// Builds the complete application router for all HTTP endpoints.
pub fn routes(app_state: AppState) -> Router {
    Router::new()
        .nest("/health", health_routes())
        .nest("/auth", auth_routes(app_state.clone()))
        .nest("/sessions", session_routes(app_state.clone()))
        .nest("/attendance", attendance_routes(app_state.clone()))
        .nest("/analytics", analytics_routes(app_state.clone()))
        .with_state(app_state)
}
