//! Event payloads and one-liner emit helpers.
//!
//! `session_created` and `session_ended` go to the global events topic;
//! `attendance_marked` is scoped to the session topic plus the owning
//! faculty member's personal topic.

use serde::Serialize;
use util::ws::{WebSocketManager, emit, topics};

use crate::routes::common::SessionResponse;

pub const SESSION_CREATED: &str = "session_created";
pub const SESSION_ENDED: &str = "session_ended";
pub const ATTENDANCE_MARKED: &str = "attendance_marked";

#[derive(Debug, Clone, Serialize)]
pub struct SessionEnded {
    pub session_id: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct AttendanceMarked {
    pub session_id: String,
    pub student_id: String,
    pub student_name: String,
    pub present_count: i32,
    pub marked_at: String,
}

pub async fn session_created(ws: &WebSocketManager, session: &SessionResponse) {
    emit(ws, topics::EVENTS_TOPIC, SESSION_CREATED, session).await;
}

pub async fn session_ended(ws: &WebSocketManager, session_id: &str) {
    let payload = SessionEnded {
        session_id: session_id.to_string(),
    };
    emit(ws, topics::EVENTS_TOPIC, SESSION_ENDED, &payload).await;
}

/// Fan out a mark to the session's live feed and to the owning faculty
/// member directly.
pub async fn attendance_marked(ws: &WebSocketManager, faculty_id: &str, payload: AttendanceMarked) {
    let session_topic = topics::session_topic(&payload.session_id);
    emit(ws, &session_topic, ATTENDANCE_MARKED, &payload).await;

    let user_topic = topics::user_topic(faculty_id);
    emit(ws, &user_topic, ATTENDANCE_MARKED, &payload).await;
}
