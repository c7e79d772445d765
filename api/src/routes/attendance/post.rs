use axum::{Extension, Json, extract::State, http::StatusCode};
use db::models::attendance_record::{MarkError, Model as RecordModel};
use db::models::session;
use serde::Deserialize;
use util::state::AppState;

use crate::auth::guards::CurrentUser;
use crate::response::ApiResponse;
use crate::routes::common::AttendanceRecordResponse;
use crate::verification;
use crate::ws::events;

fn default_method() -> String {
    "face".to_string()
}

#[derive(Debug, Deserialize)]
pub struct MarkAttendanceRequest {
    pub session_id: String,
    #[serde(default = "default_method")]
    pub verification_method: String,
    pub location: Option<String>,
}

/// POST /attendance
///
/// Mark the calling student present in an active session. The simulated
/// face check runs before anything is written; the insert and the
/// `present_count` recompute then share one transaction, with the unique
/// index settling concurrent duplicates.
///
/// ### Responses
/// - `201 Created` with the attendance record
/// - `400 Bad Request` — session not active, or verification failed
/// - `404 Not Found` — unknown session
/// - `409 Conflict` — already marked for this session
pub async fn mark_attendance(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Json(req): Json<MarkAttendanceRequest>,
) -> (StatusCode, Json<ApiResponse<AttendanceRecordResponse>>) {
    let db = state.db();

    let session = match session::Model::find_by_id(db, &req.session_id).await {
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
    if !session.active {
        return (
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::error("Session is not active")),
        );
    }

    // Friendly duplicate check before the expensive verification step.
    // Races slipping past this are caught by the unique index below.
    match RecordModel::exists(db, &session.id, &user.id).await {
        Ok(true) => {
            return (
                StatusCode::CONFLICT,
                Json(ApiResponse::error(
                    "Attendance already marked for this session",
                )),
            );
        }
        Ok(false) => {}
        Err(e) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::error(format!("Database error: {e}"))),
            );
        }
    }

    let verification = match verification::verify(&user.id).await {
        Ok(result) => result,
        Err(e) => {
            tracing::info!(student_id = %user.id, error = %e, "Face verification failed");
            return (
                StatusCode::BAD_REQUEST,
                Json(ApiResponse::error("Face verification failed")),
            );
        }
    };

    match RecordModel::mark(
        db,
        &session.id,
        &user,
        &req.verification_method,
        verification.confidence,
        req.location.as_deref(),
    )
    .await
    {
        Ok((record, session)) => {
            events::attendance_marked(
                state.ws(),
                &session.faculty_id,
                events::AttendanceMarked {
                    session_id: session.id.clone(),
                    student_id: record.student_id.clone(),
                    student_name: record.student_name.clone(),
                    present_count: session.present_count,
                    marked_at: record.marked_at.to_rfc3339(),
                },
            )
            .await;

            (
                StatusCode::CREATED,
                Json(ApiResponse::success(
                    AttendanceRecordResponse::from(record),
                    "Attendance recorded",
                )),
            )
        }
        Err(MarkError::SessionNotFound) => (
            StatusCode::NOT_FOUND,
            Json(ApiResponse::error("Session not found")),
        ),
        Err(MarkError::SessionInactive) => (
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::error("Session is not active")),
        ),
        Err(MarkError::AlreadyMarked) => (
            StatusCode::CONFLICT,
            Json(ApiResponse::error(
                "Attendance already marked for this session",
            )),
        ),
        Err(MarkError::Db(e)) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ApiResponse::error(format!("Failed to record attendance: {e}"))),
        ),
    }
}
