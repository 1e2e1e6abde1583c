use anyhow::Result;
use futures::stream::BoxStream;

use super::messages::{InboundEvent, OutboundEvent};

/// Ordered inbound events; the stream ending means the peer went away
pub type InboundStream = BoxStream<'static, Result<InboundEvent>>;

/// Outbound half of the media stream
#[async_trait::async_trait]
pub trait MediaSink: Send {
    /// Send one event; an error means the transport is gone
    async fn send(&mut self, event: OutboundEvent) -> Result<()>;
}
