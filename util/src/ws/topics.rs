//! Topic name builders shared by the hub and the API layer.

/// Global topic every `/ws/events` connection subscribes to.
pub const EVENTS_TOPIC: &str = "events";

/// Personal topic for a single user (all of their devices).
pub fn user_topic(user_id: &str) -> String {
    format!("users.{user_id}")
}

/// Live feed topic for a single class session.
pub fn session_topic(session_id: &str) -> String {
    format!("sessions.{session_id}")
}
