use axum::{
    Router,
    middleware::from_fn_with_state,
    routing::{get, post},
};
use util::state::AppState;

use crate::auth::guards::{allow_authenticated, allow_faculty};

pub mod get;
pub mod post;

use get::{get_session, list_sessions};
use post::{create_session, end_session};

/// Builds the `/sessions` route group. Creation is faculty-only; the rest
/// is visible to any authenticated caller (scoping happens per handler).
pub fn session_routes(app_state: AppState) -> Router<AppState> {
    let faculty_only = Router::new()
        .route("/", post(create_session))
        .route_layer(from_fn_with_state(app_state.clone(), allow_faculty));

    let authenticated = Router::new()
        .route("/", get(list_sessions))
        .route("/{session_id}", get(get_session))
        .route("/{session_id}/end", post(end_session))
        .route_layer(from_fn_with_state(app_state, allow_authenticated));

    faculty_only.merge(authenticated)
}
