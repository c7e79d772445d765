use axum::{
    Router,
    middleware::from_fn_with_state,
    routing::{get, post},
};
use util::state::AppState;

use crate::auth::guards::{allow_authenticated, allow_student};

pub mod get;
pub mod post;

use get::{my_history, session_attendance};
use post::mark_attendance;

/// Builds the `/attendance` route group. Marking and personal history are
/// student-only; per-session listings are for the owner or an admin.
pub fn attendance_routes(app_state: AppState) -> Router<AppState> {
    let student_only = Router::new()
        .route("/", post(mark_attendance))
        .route("/my-history", get(my_history))
        .route_layer(from_fn_with_state(app_state.clone(), allow_student));

    let authenticated = Router::new()
        .route("/session/{session_id}", get(session_attendance))
        .route_layer(from_fn_with_state(app_state, allow_authenticated));

    student_only.merge(authenticated)
}
