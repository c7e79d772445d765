use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use db::models::{attendance_record, session, user::Role};
use util::state::AppState;

use crate::auth::guards::CurrentUser;
use crate::response::ApiResponse;
use crate::routes::common::AttendanceRecordResponse;

/// GET /attendance/my-history
///
/// The calling student's attendance records, newest first.
pub async fn my_history(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> (StatusCode, Json<ApiResponse<Vec<AttendanceRecordResponse>>>) {
    match attendance_record::Model::list_for_student(state.db(), &user.id).await {
        Ok(records) => (
            StatusCode::OK,
            Json(ApiResponse::success(
                records
                    .into_iter()
                    .map(AttendanceRecordResponse::from)
                    .collect(),
                "Attendance history fetched",
            )),
        ),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ApiResponse::error(format!("Database error: {e}"))),
        ),
    }
}

/// GET /attendance/session/{session_id}
///
/// Everyone marked present in a session. Faculty may only read their own
/// sessions; admins may read any.
///
/// ### Responses
/// - `200 OK` with records (newest mark first)
/// - `403 Forbidden` for students and non-owning faculty
/// - `404 Not Found` if the session does not exist
pub async fn session_attendance(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(session_id): Path<String>,
) -> (StatusCode, Json<ApiResponse<Vec<AttendanceRecordResponse>>>) {
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

    let allowed = match user.role {
        Role::Admin => true,
        Role::Faculty => session.faculty_id == user.id,
        Role::Student => false,
    };
    if !allowed {
        return (
            StatusCode::FORBIDDEN,
            Json(ApiResponse::error(
                "Not authorized to view this session's attendance",
            )),
        );
    }

    match attendance_record::Model::list_for_session(db, &session.id).await {
        Ok(records) => (
            StatusCode::OK,
            Json(ApiResponse::success(
                records
                    .into_iter()
                    .map(AttendanceRecordResponse::from)
                    .collect(),
                "Session attendance fetched",
            )),
        ),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ApiResponse::error(format!("Database error: {e}"))),
        ),
    }
}
