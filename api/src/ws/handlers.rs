use std::sync::Arc;

use axum::{
    Extension, Json,
    extract::{Path, State, WebSocketUpgrade},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use db::models::{session, user::Role};
use util::state::AppState;
use util::ws::axum_adapter::ws_route;
use util::ws::topics;

use crate::auth::guards::{CurrentUser, Empty};
use crate::response::ApiResponse;

use super::ws_handlers::EventsWsHandler;

/// GET /ws/events
///
/// Personal event channel: global `events` broadcasts plus messages
/// addressed to the caller's own topic.
pub async fn events_ws_handler(
    ws: WebSocketUpgrade,
    State(app_state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> Response {
    let subscribed = vec![
        topics::EVENTS_TOPIC.to_string(),
        topics::user_topic(&user.id),
    ];

    ws_route(
        ws,
        app_state.ws_clone(),
        subscribed,
        Some(user.id),
        Arc::new(EventsWsHandler),
    )
}

/// GET /ws/sessions/{session_id}
///
/// Live feed for one session. Open to the owning faculty member, admins,
/// and students of the session's department.
pub async fn session_feed_ws_handler(
    ws: WebSocketUpgrade,
    State(app_state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(session_id): Path<String>,
) -> Response {
    let session = match session::Model::find_by_id(app_state.db(), &session_id).await {
        Ok(Some(session)) => session,
        Ok(None) => {
            return (
                StatusCode::NOT_FOUND,
                Json(ApiResponse::<Empty>::error("Session not found")),
            )
                .into_response();
        }
        Err(e) => {
            tracing::warn!(error = %e, session_id, "DB error while checking session feed access");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::<Empty>::error(
                    "Database error while checking session",
                )),
            )
                .into_response();
        }
    };

    let allowed = match user.role {
        Role::Admin => true,
        Role::Faculty => session.faculty_id == user.id,
        Role::Student => user.department.as_deref() == Some(session.department.as_str()),
    };
    if !allowed {
        return (
            StatusCode::FORBIDDEN,
            Json(ApiResponse::<Empty>::error(
                "Not allowed to access this session feed",
            )),
        )
            .into_response();
    }

    ws_route(
        ws,
        app_state.ws_clone(),
        vec![topics::session_topic(&session.id)],
        Some(user.id),
        Arc::new(EventsWsHandler),
    )
}
