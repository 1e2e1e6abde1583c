//! Sequential test-call driver
//!
//! Places one call per scenario and waits for the session to signal
//! completion through the registry. A call that never completes is hung up
//! out-of-band and signalled here so nothing is left waiting.

use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

use crate::config::TelephonyConfig;
use crate::registry::SessionRegistry;
use crate::telephony::CallPlacer;

#[derive(Debug, Clone)]
pub struct RunnerSettings {
    /// Longest a single call may run
    pub call_timeout: Duration,
    /// Pause between consecutive calls
    pub inter_call_delay: Duration,
    /// Pause after a forced hang-up
    pub hangup_grace: Duration,
}

impl Default for RunnerSettings {
    fn default() -> Self {
        Self {
            call_timeout: Duration::from_secs(120),
            inter_call_delay: Duration::from_secs(10),
            hangup_grace: Duration::from_secs(2),
        }
    }
}

impl From<&TelephonyConfig> for RunnerSettings {
    fn from(config: &TelephonyConfig) -> Self {
        Self {
            call_timeout: Duration::from_secs(config.call_timeout_secs),
            inter_call_delay: Duration::from_secs(config.inter_call_delay_secs),
            hangup_grace: Duration::from_secs(config.hangup_grace_secs),
        }
    }
}

/// A call that was placed, and whether its session completed in time
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallResult {
    pub scenario: String,
    pub call_sid: String,
    pub completed: bool,
}

pub struct CallRunner {
    placer: Arc<dyn CallPlacer>,
    registry: Arc<SessionRegistry>,
    settings: RunnerSettings,
}

impl CallRunner {
    pub fn new(
        placer: Arc<dyn CallPlacer>,
        registry: Arc<SessionRegistry>,
        settings: RunnerSettings,
    ) -> Self {
        Self {
            placer,
            registry,
            settings,
        }
    }

    /// Place one call and wait for it to finish
    pub async fn run_scenario(&self, scenario: &str) -> Result<CallResult> {
        info!("=== Starting scenario: {} ===", scenario);

        let call_sid = self.placer.place_call(scenario).await?;
        let completed = self
            .registry
            .wait(&call_sid, self.settings.call_timeout)
            .await;

        if completed {
            info!("Call completed: {}", call_sid);
        } else {
            warn!(
                "Call {} timed out after {:?}, hanging up",
                call_sid, self.settings.call_timeout
            );
            if let Err(e) = self.placer.hang_up(&call_sid).await {
                warn!("Failed to hang up call {}: {:#}", call_sid, e);
            }
            self.registry.complete(&call_sid).await;
            tokio::time::sleep(self.settings.hangup_grace).await;
        }

        self.registry.release(&call_sid).await;

        Ok(CallResult {
            scenario: scenario.to_string(),
            call_sid,
            completed,
        })
    }

    /// Run scenarios one after another; a failed placement skips that scenario
    pub async fn run_all(&self, scenarios: &[String]) -> Vec<CallResult> {
        let mut results = Vec::with_capacity(scenarios.len());

        for (i, scenario) in scenarios.iter().enumerate() {
            if i > 0 {
                info!(
                    "Waiting {:?} before the next call",
                    self.settings.inter_call_delay
                );
                tokio::time::sleep(self.settings.inter_call_delay).await;
            }

            match self.run_scenario(scenario).await {
                Ok(result) => results.push(result),
                Err(e) => error!("Scenario {} failed: {:#}", scenario, e),
            }
        }

        info!("Finished {}/{} calls", results.len(), scenarios.len());
        results
    }
}
