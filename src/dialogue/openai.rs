use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use super::{DialogueOracle, OracleFactory, Scenario};
use crate::config::DialogueConfig;

const OPENING_PROMPT: &str = "[The medical office AI agent has just answered the phone \
and greeted you. Respond naturally as the patient. Keep it brief - one or two sentences.]";

const CONCLUSION_PROMPT: &str = "You are analyzing a phone conversation between a patient \
and a medical office AI. Based on what the agent just said, decide whether the conversation \
is winding down. Answer 'yes' if any of these are true:
- The agent said goodbye, take care, or similar
- The agent confirmed everything is done or set
- The agent asked whether there is anything else (the main task is done)
- The agent said they cannot help further
- The conversation has clearly concluded
Respond with ONLY 'yes' or 'no'.";

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

impl ChatMessage {
    fn new(role: &str, content: impl Into<String>) -> Self {
        Self {
            role: role.to_string(),
            content: content.into(),
        }
    }
}

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChatMessage,
}

/// Chat-completions oracle keeping the running message history of one call
pub struct ChatOracle {
    http: reqwest::Client,
    config: DialogueConfig,
    scenario_name: String,
    messages: Vec<ChatMessage>,
}

impl ChatOracle {
    pub fn new(http: reqwest::Client, config: DialogueConfig, scenario: &Scenario) -> Self {
        Self {
            http,
            config,
            scenario_name: scenario.name.clone(),
            messages: vec![ChatMessage::new("system", scenario.system_prompt())],
        }
    }

    async fn complete(
        &self,
        messages: &[ChatMessage],
        temperature: f32,
        max_tokens: u32,
    ) -> Result<String> {
        let url = format!("{}/chat/completions", self.config.base_url.trim_end_matches('/'));

        let request = CompletionRequest {
            model: &self.config.model,
            messages,
            temperature,
            max_tokens,
        };

        let response: CompletionResponse = self
            .http
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()
            .await
            .context("Failed to reach dialogue model")?
            .error_for_status()
            .context("Dialogue request rejected")?
            .json()
            .await
            .context("Malformed dialogue response")?;

        let text = response
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content.trim().to_string())
            .context("Dialogue response had no choices")?;

        Ok(text)
    }

    /// Run the conversation forward and keep the answer in history
    async fn advance(&mut self) -> Result<String> {
        let text = self
            .complete(&self.messages, self.config.temperature, self.config.max_tokens)
            .await?;
        self.messages.push(ChatMessage::new("assistant", text.clone()));
        debug!("[{}] Patient says: {}", self.scenario_name, text);
        Ok(text)
    }
}

#[async_trait::async_trait]
impl DialogueOracle for ChatOracle {
    async fn opening_line(&mut self) -> Result<String> {
        self.messages.push(ChatMessage::new("user", OPENING_PROMPT));
        let result = self.advance().await;
        if result.is_err() {
            self.messages.pop();
        }
        result
    }

    async fn reply(&mut self, agent_text: &str) -> Result<String> {
        self.messages.push(ChatMessage::new("user", agent_text));
        self.advance().await
    }

    async fn is_concluding(&mut self, agent_text: &str) -> Result<bool> {
        let check = [
            ChatMessage::new("system", CONCLUSION_PROMPT),
            ChatMessage::new("user", format!("Agent said: \"{}\"", agent_text)),
        ];

        let answer = self.complete(&check, 0.0, 5).await?;
        Ok(answer.to_lowercase().starts_with("yes"))
    }
}

pub struct ChatOracleFactory {
    http: reqwest::Client,
    config: DialogueConfig,
}

impl ChatOracleFactory {
    pub fn new(config: DialogueConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self { http, config })
    }
}

impl OracleFactory for ChatOracleFactory {
    fn create(&self, scenario: &Scenario) -> Box<dyn DialogueOracle> {
        Box::new(ChatOracle::new(
            self.http.clone(),
            self.config.clone(),
            scenario,
        ))
    }
}
