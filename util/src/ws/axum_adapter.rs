use axum::{extract::WebSocketUpgrade, response::Response};
use std::sync::Arc;

use super::WebSocketManager;
use super::runtime::WsHandler;
use super::serve::{WsServerOptions, serve_topics};

/// Upgrade an HTTP request into a topic-subscribed WebSocket session.
///
/// Route handlers resolve the topic list and user id themselves (after
/// auth), then hand off here.
pub fn ws_route<H: WsHandler>(
    ws: WebSocketUpgrade,
    manager: WebSocketManager,
    topics: Vec<String>,
    user_id: Option<String>,
    handler: Arc<H>,
) -> Response {
    ws.on_upgrade(move |socket| {
        serve_topics(
            socket,
            manager,
            topics,
            user_id,
            handler,
            WsServerOptions::default(),
        )
    })
}
