use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use db::models::session;
use serde::Deserialize;
use util::state::AppState;

use crate::auth::guards::CurrentUser;
use crate::response::ApiResponse;
use crate::routes::common::SessionResponse;

#[derive(Debug, Deserialize)]
pub struct ListSessionsQuery {
    #[serde(default)]
    pub active_only: bool,
}

/// GET /sessions?active_only=bool
///
/// Role-scoped listing, newest first: faculty see their own sessions,
/// students their department's, admins everything.
pub async fn list_sessions(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Query(query): Query<ListSessionsQuery>,
) -> (StatusCode, Json<ApiResponse<Vec<SessionResponse>>>) {
    match session::Model::list_for(state.db(), &user).await {
        Ok(sessions) => {
            let sessions: Vec<SessionResponse> = sessions
                .into_iter()
                .filter(|s| !query.active_only || s.active)
                .map(SessionResponse::from)
                .collect();
            (
                StatusCode::OK,
                Json(ApiResponse::success(sessions, "Sessions fetched")),
            )
        }
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ApiResponse::error(format!("Database error: {e}"))),
        ),
    }
}

/// GET /sessions/{session_id}
///
/// ### Responses
/// - `200 OK` with the session
/// - `404 Not Found` if absent
pub async fn get_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> (StatusCode, Json<ApiResponse<SessionResponse>>) {
    match session::Model::find_by_id(state.db(), &session_id).await {
        Ok(Some(session)) => (
            StatusCode::OK,
            Json(ApiResponse::success(
                SessionResponse::from(session),
                "Session fetched",
            )),
        ),
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(ApiResponse::error("Session not found")),
        ),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ApiResponse::error(format!("Database error: {e}"))),
        ),
    }
}
