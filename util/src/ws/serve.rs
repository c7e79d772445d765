use axum::extract::ws::{Message, WebSocket};
use bytes::Bytes;
use futures::{SinkExt, StreamExt};
use serde_json::Value;
use std::sync::Arc;
use tokio::{sync::mpsc, time};

use super::WebSocketManager;
use super::runtime::{WsContext, WsHandler};

pub struct WsServerOptions {
    pub ws_ping_sec: u64,
    pub enable_app_ping: bool,
}

impl Default for WsServerOptions {
    fn default() -> Self {
        Self {
            ws_ping_sec: 30,
            enable_app_ping: true,
        }
    }
}

/// Drive a WebSocket connection subscribed to one or more hub topics.
///
/// The first topic is the connection's primary topic: presence is
/// registered against it and `WsContext::emit` publishes to it. Broadcasts
/// on every subscribed topic are forwarded to the client until it
/// disconnects.
pub async fn serve_topics<H: WsHandler>(
    socket: WebSocket,
    manager: WebSocketManager,
    topics: Vec<String>,
    user_id: Option<String>,
    handler: Arc<H>,
    opts: WsServerOptions,
) {
    let primary = topics
        .first()
        .cloned()
        .unwrap_or_else(|| "events".to_string());

    let mut receivers = Vec::with_capacity(topics.len());
    for topic in &topics {
        receivers.push((topic.clone(), manager.subscribe(topic).await));
    }
    if let Some(uid) = user_id.as_deref() {
        manager.register(&primary, uid).await;
    }

    let (mut sink, mut socket_rx) = socket.split();

    // Outbound queue and writer task
    let (out_tx, mut out_rx) = mpsc::channel::<Message>(64);
    let writer_task = tokio::spawn(async move {
        while let Some(frame) = out_rx.recv().await {
            if sink.send(frame).await.is_err() {
                break;
            }
        }
    });

    let ctx = WsContext::new(primary.clone(), manager.clone(), out_tx.clone());

    // S→C: forward broadcasts on every subscribed topic
    let forward_tasks: Vec<_> = receivers
        .into_iter()
        .map(|(topic, mut rx)| {
            let out_tx = out_tx.clone();
            tokio::spawn(async move {
                while let Ok(msg) = rx.recv().await {
                    if out_tx.send(Message::Text(msg.into())).await.is_err() {
                        tracing::info!("Client disconnected while sending to '{topic}'");
                        break;
                    }
                }
            })
        })
        .collect();

    // WS-level periodic ping
    let ping_task = {
        let out_tx = out_tx.clone();
        tokio::spawn(async move {
            loop {
                time::sleep(std::time::Duration::from_secs(opts.ws_ping_sec)).await;
                if out_tx.send(Message::Ping(Bytes::new())).await.is_err() {
                    break;
                }
            }
        })
    };

    // Let feature handler know we're live
    handler.on_open(&ctx).await;

    // C→S: parse & dispatch
    let receive_task = {
        let handler = Arc::clone(&handler);
        let ctx = ctx;
        tokio::spawn(async move {
            while let Some(Ok(msg)) = socket_rx.next().await {
                match msg {
                    Message::Text(text) => {
                        let raw = text.as_str();
                        if opts.enable_app_ping && is_app_ping(raw) {
                            let _ = ctx.reply_event("pong", &serde_json::json!({})).await;
                            continue;
                        }
                        match serde_json::from_str::<H::In>(raw) {
                            Ok(parsed) => handler.on_message(&ctx, parsed).await,
                            Err(e) => tracing::warn!(
                                "WS invalid message on '{}': {e}; raw={raw}",
                                ctx.topic
                            ),
                        }
                    }
                    Message::Ping(payload) => {
                        let _ = ctx.reply_pong(payload).await;
                    }
                    Message::Pong(_) => {}
                    Message::Binary(_) => {
                        tracing::warn!("Ignoring binary on topic '{}'", ctx.topic);
                    }
                    Message::Close(_) => {
                        handler.on_close(&ctx).await;
                        break;
                    }
                }
            }
        })
    };

    let _ = receive_task.await;
    ping_task.abort();
    for t in &forward_tasks {
        t.abort();
    }
    drop(out_tx);
    let _ = writer_task.await;

    if let Some(uid) = user_id.as_deref() {
        manager.unregister(&primary, uid).await;
    }
    tracing::info!("WS session ended for topic '{primary}'");
}

fn is_app_ping(raw: &str) -> bool {
    if let Ok(Value::Object(map)) = serde_json::from_str::<Value>(raw) {
        if let Some(Value::String(t)) = map.get("type") {
            return t == "ping";
        }
    }
    false
}
