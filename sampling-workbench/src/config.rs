// sampling-workbench/src/config.rs
use sampling_protocol::constants::defaults;
use sampling_protocol::{ClientInfo, EstimateOptions};
use serde::{Deserialize, Serialize};

use crate::error::{WorkbenchError, WorkbenchResult};
use crate::retry::RetryConfig;
use crate::routing::SamplingMode;

/// Engine settings. Every field has a default, so partial JSON is accepted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct WorkbenchConfig {
    /// Caller identity sent in outbound metadata
    pub client: ClientInfo,
    /// Session id sent in outbound metadata; generated when absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    /// Number of settled requests kept in history
    pub history_capacity: usize,
    /// Buffer size of the event broadcast channel
    pub event_capacity: usize,
    /// Max tokens used when a request does not set its own
    pub default_max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_temperature: Option<f32>,
    pub retry: RetryConfig,
    /// Reasoning effort / thinking budget of the configured model
    pub estimate: EstimateOptions,
    pub mode: SamplingMode,
}

impl Default for WorkbenchConfig {
    fn default() -> Self {
        Self {
            client: ClientInfo::new("sampling-workbench", env!("CARGO_PKG_VERSION")),
            session_id: None,
            history_capacity: defaults::HISTORY_CAPACITY,
            event_capacity: defaults::EVENT_CAPACITY,
            default_max_tokens: defaults::MAX_TOKENS,
            default_temperature: None,
            retry: RetryConfig::default(),
            estimate: EstimateOptions::default(),
            mode: SamplingMode::default(),
        }
    }
}

impl WorkbenchConfig {
    /// Parse and validate a JSON configuration document
    pub fn from_json(json: &str) -> WorkbenchResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> WorkbenchResult<()> {
        if self.history_capacity == 0 {
            return Err(config_error("historyCapacity must be greater than 0"));
        }
        if self.event_capacity == 0 {
            return Err(config_error("eventCapacity must be greater than 0"));
        }
        if self.default_max_tokens == 0 {
            return Err(config_error("defaultMaxTokens must be greater than 0"));
        }
        if let Some(temperature) = self.default_temperature {
            if !temperature.is_finite() || temperature < 0.0 {
                return Err(config_error("defaultTemperature must be a non-negative number"));
            }
        }
        if self.retry.max_attempts == 0 {
            return Err(config_error("retry.maxAttempts must be at least 1"));
        }
        if self.retry.max_delay_ms < self.retry.initial_delay_ms {
            return Err(config_error("retry.maxDelayMs must not be below retry.initialDelayMs"));
        }
        if !(0.0..=1.0).contains(&self.retry.jitter_ratio) {
            return Err(config_error("retry.jitterRatio must be within [0, 1]"));
        }
        validate_mode(&self.mode)
    }
}

/// Check a routing mode before it is installed, at build time or at runtime
pub(crate) fn validate_mode(mode: &SamplingMode) -> WorkbenchResult<()> {
    if let SamplingMode::Hybrid { rules, .. } = mode {
        if let Some(rule) = rules.iter().find(|rule| rule.name.trim().is_empty()) {
            return Err(config_error(&format!("approval rule {:?} needs a name", rule.condition)));
        }
    }
    Ok(())
}

fn config_error(message: &str) -> WorkbenchError {
    WorkbenchError::Config(message.to_string())
}
