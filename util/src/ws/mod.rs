pub mod axum_adapter;
pub mod manager;
pub mod runtime;
pub mod serve;
pub mod topics;

pub use manager::WebSocketManager;

use chrono::Utc;
use serde::Serialize;

/// Standard event envelope sent over WebSocket topics.
///
/// The `type` field is the event discriminator clients switch on
/// (`session_created`, `session_ended`, `attendance_marked`, `pong`).
#[derive(Serialize)]
pub struct EventEnvelope<'a, T> {
    #[serde(rename = "type")]
    pub r#type: &'a str,
    pub topic: &'a str,
    pub payload: T,
    pub ts: String,
}

/// Broadcast a JSON-serialized `EventEnvelope` on `topic`.
pub async fn emit<T: Serialize>(ws: &WebSocketManager, topic: &str, event: &str, payload: &T) {
    let env = EventEnvelope {
        r#type: event,
        topic,
        payload,
        ts: Utc::now().to_rfc3339(),
    };
    if let Ok(json) = serde_json::to_string(&env) {
        ws.broadcast(topic, json).await;
    }
}

/// Serialize an `EventEnvelope` addressed to a user's personal topic and
/// deliver it there.
pub async fn emit_to_user<T: Serialize>(
    ws: &WebSocketManager,
    user_id: &str,
    event: &str,
    payload: &T,
) {
    let topic = topics::user_topic(user_id);
    emit(ws, &topic, event, payload).await;
}
