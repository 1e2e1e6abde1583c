//! Outbound call placement
//!
//! The telephony provider dials the target line, fetches TwiML from us and
//! then opens the media stream the session runs on.

pub mod twiml;
pub mod twilio;

pub use twilio::TwilioClient;

use anyhow::Result;

#[async_trait::async_trait]
pub trait CallPlacer: Send + Sync {
    /// Dial the target line for `scenario`; returns the provider call SID
    async fn place_call(&self, scenario: &str) -> Result<String>;

    /// Terminate a call in progress
    async fn hang_up(&self, call_sid: &str) -> Result<()>;
}
