//! Patient-side dialogue
//!
//! A `DialogueOracle` holds the conversation context of one call: it writes
//! the patient's lines and judges whether the agent is wrapping up.

pub mod openai;
pub mod scenario;

pub use openai::{ChatOracle, ChatOracleFactory};
pub use scenario::{Scenario, ScenarioCatalog};

use anyhow::Result;

#[async_trait::async_trait]
pub trait DialogueOracle: Send {
    /// What the patient says when the agent picks up (nothing heard yet)
    async fn opening_line(&mut self) -> Result<String>;

    /// The patient's reply to what the agent just said
    async fn reply(&mut self, agent_text: &str) -> Result<String>;

    /// Whether `agent_text` signals the conversation is concluding
    async fn is_concluding(&mut self, agent_text: &str) -> Result<bool>;
}

/// Builds a fresh per-call oracle for a scenario
pub trait OracleFactory: Send + Sync {
    fn create(&self, scenario: &Scenario) -> Box<dyn DialogueOracle>;
}
