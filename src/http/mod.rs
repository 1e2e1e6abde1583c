//! HTTP surface the telephony provider talks to
//!
//! - GET /health - Health check
//! - GET|POST /twiml - TwiML connecting the call to the media stream
//! - POST /call-status - Call status callbacks
//! - GET /media-stream - Bidirectional media stream (WebSocket)
//! - GET /calls/:call_sid/status - Whether a call has completed
//! - GET /calls/:call_sid/transcript - Turns logged so far

mod handlers;
mod media_stream;
mod routes;
mod state;

pub use media_stream::{serve_media_stream, WebSocketSink};
pub use routes::create_router;
pub use state::AppState;
