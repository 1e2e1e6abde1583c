use anyhow::{Context, Result};
use serde::Deserialize;
use std::time::Duration;
use tracing::info;

use super::CallPlacer;
use crate::config::TelephonyConfig;

const API_BASE: &str = "https://api.twilio.com/2010-04-01";

/// Seconds the provider lets the target ring before giving up
const RING_TIMEOUT_SECS: u32 = 60;

#[derive(Debug, Deserialize)]
struct CallResource {
    sid: String,
}

/// Twilio REST client for placing and ending test calls
pub struct TwilioClient {
    http: reqwest::Client,
    config: TelephonyConfig,
    public_host: String,
    api_base: String,
}

impl TwilioClient {
    pub fn new(config: TelephonyConfig, public_host: impl Into<String>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            http,
            config,
            public_host: public_host.into(),
            api_base: API_BASE.to_string(),
        })
    }

    /// Point the client at a different API root (test doubles)
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    fn calls_url(&self) -> String {
        format!(
            "{}/Accounts/{}/Calls",
            self.api_base.trim_end_matches('/'),
            self.config.account_sid
        )
    }

    fn twiml_url(&self, scenario: &str) -> Result<String> {
        let base = format!("https://{}/twiml", self.public_host);
        let url = reqwest::Url::parse_with_params(&base, &[("scenario", scenario)])
            .with_context(|| format!("Invalid public host: {}", self.public_host))?;
        Ok(url.to_string())
    }
}

#[async_trait::async_trait]
impl CallPlacer for TwilioClient {
    async fn place_call(&self, scenario: &str) -> Result<String> {
        let twiml_url = self.twiml_url(scenario)?;
        let status_url = format!("https://{}/call-status", self.public_host);
        let ring_timeout = RING_TIMEOUT_SECS.to_string();

        let params = [
            ("To", self.config.target_number.as_str()),
            ("From", self.config.from_number.as_str()),
            ("Url", twiml_url.as_str()),
            ("StatusCallback", status_url.as_str()),
            ("StatusCallbackMethod", "POST"),
            ("StatusCallbackEvent", "initiated"),
            ("StatusCallbackEvent", "ringing"),
            ("StatusCallbackEvent", "answered"),
            ("StatusCallbackEvent", "completed"),
            ("Record", "false"),
            ("Timeout", ring_timeout.as_str()),
        ];

        let call: CallResource = self
            .http
            .post(format!("{}.json", self.calls_url()))
            .basic_auth(&self.config.account_sid, Some(&self.config.auth_token))
            .form(&params)
            .send()
            .await
            .context("Failed to reach telephony provider")?
            .error_for_status()
            .context("Call request rejected")?
            .json()
            .await
            .context("Malformed call resource")?;

        info!(
            "Call initiated: SID={}, scenario={}, to={}",
            call.sid, scenario, self.config.target_number
        );
        Ok(call.sid)
    }

    async fn hang_up(&self, call_sid: &str) -> Result<()> {
        self.http
            .post(format!("{}/{}.json", self.calls_url(), call_sid))
            .basic_auth(&self.config.account_sid, Some(&self.config.auth_token))
            .form(&[("Status", "completed")])
            .send()
            .await
            .context("Failed to reach telephony provider")?
            .error_for_status()
            .with_context(|| format!("Hang-up of {} rejected", call_sid))?;

        info!("Call hung up: SID={}", call_sid);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> TwilioClient {
        let config = TelephonyConfig {
            account_sid: "AC123".to_string(),
            ..TelephonyConfig::default()
        };
        TwilioClient::new(config, "probe.example.com").unwrap()
    }

    #[test]
    fn test_calls_url() {
        let client = client().with_api_base("http://localhost:9999/");
        assert_eq!(client.calls_url(), "http://localhost:9999/Accounts/AC123/Calls");
    }

    #[test]
    fn test_twiml_url_encodes_scenario() {
        let url = client().twiml_url("office hours").unwrap();
        assert_eq!(url, "https://probe.example.com/twiml?scenario=office+hours");
    }
}
