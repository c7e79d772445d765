use serde_json::{Value, json};
use util::ws::runtime::{WsContext, WsHandler};

/// Connection handler for both WS endpoints. Clients only ever send
/// liveness probes; every text message is acknowledged with a pong
/// envelope.
pub struct EventsWsHandler;

impl WsHandler for EventsWsHandler {
    type In = Value;

    async fn on_message(&self, ctx: &WsContext, _msg: Self::In) {
        let _ = ctx.reply_event("pong", &json!({})).await;
    }
}
