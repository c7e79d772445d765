use axum::{Router, middleware::from_fn_with_state, routing::get};
use util::state::AppState;

use crate::auth::guards::allow_authenticated;

pub mod events;
pub mod handlers;
pub mod ws_handlers;

use handlers::{events_ws_handler, session_feed_ws_handler};

pub fn ws_routes(app_state: AppState) -> Router {
    Router::new()
        .route("/events", get(events_ws_handler))
        .route("/sessions/{session_id}", get(session_feed_ws_handler))
        .route_layer(from_fn_with_state(app_state.clone(), allow_authenticated))
        .with_state(app_state)
}
