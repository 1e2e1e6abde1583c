use anyhow::{Context, Result};
use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::IntoResponse,
};
use futures::stream::SplitSink;
use futures::{SinkExt, StreamExt};
use tracing::info;

use super::state::AppState;
use crate::media::{InboundEvent, InboundStream, MediaSink, OutboundEvent};
use crate::session::{CallServices, CallSession};

/// GET /media-stream
/// Upgrade to the provider's bidirectional media stream
pub async fn media_stream(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| serve_media_stream(socket, state.services))
}

/// Run one call session over an accepted WebSocket
pub async fn serve_media_stream(socket: WebSocket, services: CallServices) {
    info!("WebSocket connection accepted");

    let (sender, receiver) = socket.split();
    let session = CallSession::new(services);
    let reason = session
        .run(inbound_events(receiver), Box::new(WebSocketSink::new(sender)))
        .await;

    info!("WebSocket session finished: {}", reason);
}

/// Parse text frames into inbound events; other frame types are skipped
fn inbound_events(receiver: futures::stream::SplitStream<WebSocket>) -> InboundStream {
    receiver
        .filter_map(|message| async move {
            match message {
                Ok(Message::Text(text)) => Some(
                    serde_json::from_str::<InboundEvent>(&text)
                        .context("Malformed media stream message"),
                ),
                Ok(_) => None,
                Err(e) => Some(Err(anyhow::Error::from(e).context("WebSocket receive failed"))),
            }
        })
        .boxed()
}

/// Outbound half of the media stream WebSocket
pub struct WebSocketSink {
    sender: SplitSink<WebSocket, Message>,
}

impl WebSocketSink {
    pub fn new(sender: SplitSink<WebSocket, Message>) -> Self {
        Self { sender }
    }
}

#[async_trait::async_trait]
impl MediaSink for WebSocketSink {
    async fn send(&mut self, event: OutboundEvent) -> Result<()> {
        let text = serde_json::to_string(&event).context("Failed to encode media event")?;
        self.sender
            .send(Message::Text(text))
            .await
            .context("WebSocket send failed")
    }
}
