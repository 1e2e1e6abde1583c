//! Media stream transport boundary
//!
//! Inbound and outbound JSON events of the telephony media stream, and the
//! sink abstraction the session writes audio back through.

pub mod messages;
pub mod sink;

pub use messages::{InboundEvent, MarkPayload, MediaPayload, OutboundEvent, StartMetadata};
pub use sink::{InboundStream, MediaSink};
