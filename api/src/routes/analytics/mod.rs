use axum::{Router, middleware::from_fn_with_state, routing::get};
use util::state::AppState;

use crate::auth::guards::allow_authenticated;

pub mod get;

use get::{ai_insights, overview, trends};

/// Builds the `/analytics` route group. All endpoints require auth;
/// `ai-insights` additionally rejects students in the handler.
pub fn analytics_routes(app_state: AppState) -> Router<AppState> {
    Router::new()
        .route("/overview", get(overview))
        .route("/trends", get(trends))
        .route("/ai-insights", get(ai_insights))
        .route_layer(from_fn_with_state(app_state, allow_authenticated))
}
