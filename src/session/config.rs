use std::time::Duration;

/// Turn-taking policy for a call session
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Quiet period after the last final fragment before the agent's turn
    /// is considered over
    /// Default: 2.5 seconds
    pub debounce: Duration,

    /// Hard cap on generated patient replies
    /// Default: 16
    pub max_turns: u32,

    /// Replies that must have been generated before the conclusion check runs
    /// Default: 2
    pub conclusion_floor: u32,

    /// Close the call after this long without any inbound transport message
    /// Default: 120 seconds
    pub receive_timeout: Duration,

    /// Wait after the goodbye so the line can finish playing
    /// Default: 2 seconds
    pub goodbye_grace: Duration,

    /// Outbound frame size in bytes (640 = 80ms of 8kHz mu-law)
    pub frame_bytes: usize,

    /// What the patient says when hanging up
    pub goodbye_line: String,

    /// Scenario used when the stream does not name one
    pub default_scenario: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            debounce: Duration::from_millis(2500),
            max_turns: 16,
            conclusion_floor: 2,
            receive_timeout: Duration::from_secs(120),
            goodbye_grace: Duration::from_secs(2),
            frame_bytes: 640,
            goodbye_line: "Alright, thank you so much. Bye bye.".to_string(),
            default_scenario: "simple_scheduling".to_string(),
        }
    }
}
