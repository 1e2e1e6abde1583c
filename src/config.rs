use anyhow::Result;
use serde::Deserialize;
use std::time::Duration;

use crate::session::SessionConfig;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub service: ServiceConfig,
    pub telephony: TelephonyConfig,
    pub transcription: TranscriptionConfig,
    pub synthesis: SynthesisConfig,
    pub dialogue: DialogueConfig,
    pub session: SessionSettings,
    pub transcripts: TranscriptsConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub name: String,
    pub http: HttpConfig,
    /// Public host name the telephony provider reaches us on (no scheme)
    pub public_host: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            name: "callprobe".to_string(),
            http: HttpConfig::default(),
            public_host: String::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub bind: String,
    pub port: u16,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0".to_string(),
            port: 8765,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TelephonyConfig {
    pub account_sid: String,
    pub auth_token: String,
    pub from_number: String,
    pub target_number: String,
    /// How long one call may run before it is hung up
    pub call_timeout_secs: u64,
    /// Pause between consecutive calls
    pub inter_call_delay_secs: u64,
    /// Pause after a forced hang-up
    pub hangup_grace_secs: u64,
}

impl Default for TelephonyConfig {
    fn default() -> Self {
        Self {
            account_sid: String::new(),
            auth_token: String::new(),
            from_number: String::new(),
            target_number: String::new(),
            call_timeout_secs: 120,
            inter_call_delay_secs: 10,
            hangup_grace_secs: 2,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TranscriptionConfig {
    pub nats_url: String,
}

impl Default for TranscriptionConfig {
    fn default() -> Self {
        Self {
            nats_url: "nats://localhost:4222".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SynthesisConfig {
    pub api_key: String,
    pub voice_id: String,
    pub model_id: String,
    /// Must be the phone line encoding
    pub output_format: String,
}

impl Default for SynthesisConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            voice_id: "21m00Tcm4TlvDq8ikWAM".to_string(),
            model_id: "eleven_flash_v2_5".to_string(),
            output_format: "ulaw_8000".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DialogueConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    pub temperature: f32,
    /// Keeps replies short and natural
    pub max_tokens: u32,
}

impl Default for DialogueConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: "https://api.openai.com/v1".to_string(),
            model: "gpt-4o-mini".to_string(),
            temperature: 0.8,
            max_tokens: 150,
        }
    }
}

/// Turn-taking knobs as they appear in the config file
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SessionSettings {
    pub debounce_ms: u64,
    pub max_turns: u32,
    pub conclusion_floor: u32,
    pub receive_timeout_secs: u64,
    pub goodbye_grace_ms: u64,
    pub frame_ms: u64,
    pub goodbye_line: String,
    pub default_scenario: String,
}

impl Default for SessionSettings {
    fn default() -> Self {
        let defaults = SessionConfig::default();
        Self {
            debounce_ms: defaults.debounce.as_millis() as u64,
            max_turns: defaults.max_turns,
            conclusion_floor: defaults.conclusion_floor,
            receive_timeout_secs: defaults.receive_timeout.as_secs(),
            goodbye_grace_ms: defaults.goodbye_grace.as_millis() as u64,
            frame_ms: 80,
            goodbye_line: defaults.goodbye_line,
            default_scenario: defaults.default_scenario,
        }
    }
}

impl SessionSettings {
    pub fn to_session_config(&self) -> SessionConfig {
        let format = crate::audio::AudioFormat::TELEPHONY;
        SessionConfig {
            debounce: Duration::from_millis(self.debounce_ms),
            max_turns: self.max_turns,
            conclusion_floor: self.conclusion_floor,
            receive_timeout: Duration::from_secs(self.receive_timeout_secs),
            goodbye_grace: Duration::from_millis(self.goodbye_grace_ms),
            frame_bytes: format.bytes_for_ms(self.frame_ms).max(1),
            goodbye_line: self.goodbye_line.clone(),
            default_scenario: self.default_scenario.clone(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TranscriptsConfig {
    pub output_dir: String,
}

impl Default for TranscriptsConfig {
    fn default() -> Self {
        Self {
            output_dir: "transcripts".to_string(),
        }
    }
}

impl Config {
    /// Load `path` (TOML, optional) with `CALLPROBE__SECTION__KEY` overrides
    pub fn load(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path).required(false))
            .add_source(
                config::Environment::with_prefix("CALLPROBE")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        Ok(settings.try_deserialize()?)
    }

    /// Names of required secrets that are still empty
    pub fn missing_credentials(&self) -> Vec<&'static str> {
        let required = [
            ("telephony.account_sid", &self.telephony.account_sid),
            ("telephony.auth_token", &self.telephony.auth_token),
            ("telephony.from_number", &self.telephony.from_number),
            ("telephony.target_number", &self.telephony.target_number),
            ("synthesis.api_key", &self.synthesis.api_key),
            ("dialogue.api_key", &self.dialogue.api_key),
            ("service.public_host", &self.service.public_host),
        ];

        required
            .into_iter()
            .filter(|(_, value)| value.is_empty())
            .map(|(name, _)| name)
            .collect()
    }
}
