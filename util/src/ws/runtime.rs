//! Per-connection runtime: the context handed to handler callbacks and
//! the handler trait itself.

use axum::extract::ws::{Message, Utf8Bytes};
use chrono::Utc;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::future::Future;
use tokio::sync::mpsc;

use super::{EventEnvelope, WebSocketManager};

/// Handle a connection holds onto for the duration of a socket session.
///
/// `topic` is the primary topic the connection was opened on; `out_tx`
/// feeds the writer task, so everything here targets this one client.
/// Hub-wide fan-out goes through `ws` instead.
pub struct WsContext {
    pub topic: String,
    pub ws: WebSocketManager,
    out_tx: mpsc::Sender<Message>,
}

impl WsContext {
    pub fn new(topic: String, ws: WebSocketManager, out_tx: mpsc::Sender<Message>) -> Self {
        Self { topic, ws, out_tx }
    }

    /// Send one text frame to this client only.
    pub async fn reply_text(&self, text: impl Into<Utf8Bytes>) -> Result<(), ()> {
        self.out_tx
            .send(Message::Text(text.into()))
            .await
            .map_err(|_| ())
    }

    /// Send an [`EventEnvelope`] on the primary topic to this client only.
    ///
    /// Same wire shape as a hub broadcast, so clients need one decoder.
    pub async fn reply_event<T: Serialize>(&self, event: &str, payload: &T) -> Result<(), ()> {
        let envelope = EventEnvelope {
            r#type: event,
            topic: &self.topic,
            payload,
            ts: Utc::now().to_rfc3339(),
        };
        match serde_json::to_string(&envelope) {
            Ok(json) => self.reply_text(json).await,
            Err(_) => Err(()),
        }
    }

    /// Answer a WS-level ping from this client.
    pub async fn reply_pong(&self, payload: bytes::Bytes) -> Result<(), ()> {
        self.out_tx
            .send(Message::Pong(payload))
            .await
            .map_err(|_| ())
    }
}

/// Per-endpoint connection behavior, driven by the serve loop.
pub trait WsHandler: Send + Sync + 'static {
    /// Incoming message type; text frames are deserialized into this
    /// before dispatch.
    type In: DeserializeOwned + Send;

    /// Runs once the socket is live and presence is registered.
    fn on_open(&self, _ctx: &WsContext) -> impl Future<Output = ()> + Send {
        async {}
    }

    /// Runs for every parsed text frame.
    fn on_message(&self, ctx: &WsContext, msg: Self::In) -> impl Future<Output = ()> + Send;

    /// Runs when the client closes; presence is unregistered afterwards.
    fn on_close(&self, _ctx: &WsContext) -> impl Future<Output = ()> + Send {
        async {}
    }
}
