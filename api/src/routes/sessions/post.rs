use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use common::format_validation_errors;
use db::models::{session, user::Role};
use serde::Deserialize;
use util::state::AppState;
use validator::Validate;

use crate::auth::guards::CurrentUser;
use crate::response::ApiResponse;
use crate::routes::common::SessionResponse;
use crate::ws::events;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateSessionRequest {
    #[validate(length(min = 1, message = "Course name must not be empty"))]
    pub course_name: String,

    #[validate(length(min = 1, message = "Course code must not be empty"))]
    pub course_code: String,

    #[validate(length(min = 1, message = "Department must not be empty"))]
    pub department: String,
}

/// POST /sessions
///
/// Start a new attendance session. Faculty only (enforced by the route
/// guard). Broadcasts `session_created` to all event subscribers.
///
/// ### Responses
/// - `201 Created` with the session
/// - `400 Bad Request` on validation failure
pub async fn create_session(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Json(req): Json<CreateSessionRequest>,
) -> (StatusCode, Json<ApiResponse<SessionResponse>>) {
    if let Err(validation_errors) = req.validate() {
        return (
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::error(format_validation_errors(
                &validation_errors,
            ))),
        );
    }

    match session::Model::create(
        state.db(),
        &user,
        &req.course_name,
        &req.course_code,
        &req.department,
    )
    .await
    {
        Ok(row) => {
            let response = SessionResponse::from(row);
            events::session_created(state.ws(), &response).await;
            (
                StatusCode::CREATED,
                Json(ApiResponse::success(response, "Session created")),
            )
        }
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ApiResponse::error(format!("Failed to create session: {e}"))),
        ),
    }
}

/// POST /sessions/{session_id}/end
///
/// Close an active session. Allowed for the owning faculty member or an
/// admin. Ending an already-ended session succeeds without changing
/// `end_time` and without re-emitting `session_ended`.
///
/// ### Responses
/// - `200 OK` with the (possibly unchanged) session
/// - `403 Forbidden` for anyone else
/// - `404 Not Found` if the session does not exist
pub async fn end_session(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(session_id): Path<String>,
) -> (StatusCode, Json<ApiResponse<SessionResponse>>) {
    let db = state.db();

    let session = match session::Model::find_by_id(db, &session_id).await {
        Ok(Some(session)) => session,
        Ok(None) => {
            return (
                StatusCode::NOT_FOUND,
                Json(ApiResponse::error("Session not found")),
            );
        }
        Err(e) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::error(format!("Database error: {e}"))),
            );
        }
    };

    if session.faculty_id != user.id && user.role != Role::Admin {
        return (
            StatusCode::FORBIDDEN,
            Json(ApiResponse::error("Not authorized to end this session")),
        );
    }

    match session.end(db).await {
        Ok((session, changed)) => {
            if changed {
                events::session_ended(state.ws(), &session.id).await;
            }
            (
                StatusCode::OK,
                Json(ApiResponse::success(
                    SessionResponse::from(session),
                    "Session ended successfully",
                )),
            )
        }
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ApiResponse::error(format!("Failed to end session: {e}"))),
        ),
    }
}
