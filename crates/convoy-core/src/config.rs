//! Configuration for the executor, the fan-out orchestrator and request defaults.
//!
//! All fields are optional in JSON; missing ones take the defaults below.
//! Durations are plain milliseconds, like `deadline_ms` style budgets.
//!
//! ```ignore
//! let config = ConvoyConfig::from_json_str(r#"{ "fanout": { "timeout_ms": 5000 } }"#)?;
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid config json: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("{field} must be at least 1")]
    Zero { field: &'static str },
}

/// `Duration` -> `_ms` field. Saturates instead of wrapping.
fn millis(timeout: Duration) -> u64 {
    u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX)
}

/// Sequential executor settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutorConfig {
    /// Timeout applied when a call does not pass its own. `None` = wait forever.
    pub timeout_ms: Option<u64>,
}

impl ExecutorConfig {
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_ms = Some(millis(timeout));
        self
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }
}

/// Fan-out orchestrator settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FanOutConfig {
    /// Deadline for the whole group. Exceeding it cancels every member.
    pub timeout_ms: Option<u64>,

    /// Upper bound on members running at once. `None` = all at once.
    pub max_in_flight: Option<usize>,
}

impl FanOutConfig {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_ms = Some(millis(timeout));
        self
    }

    pub fn with_max_in_flight(mut self, n: usize) -> Self {
        self.max_in_flight = Some(n);
        self
    }
}

/// Defaults for list requests built by `app::requests`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientDefaults {
    pub page: u32,
    pub per_page: u32,
}

impl Default for ClientDefaults {
    fn default() -> Self {
        Self {
            page: 1,
            per_page: 6,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConvoyConfig {
    pub executor: ExecutorConfig,
    pub fanout: FanOutConfig,
    pub client: ClientDefaults,
}

impl ConvoyConfig {
    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        let config: ConvoyConfig = serde_json::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.fanout.max_in_flight == Some(0) {
            return Err(ConfigError::Zero {
                field: "fanout.max_in_flight",
            });
        }
        if self.client.page == 0 {
            return Err(ConfigError::Zero { field: "client.page" });
        }
        if self.client.per_page == 0 {
            return Err(ConfigError::Zero {
                field: "client.per_page",
            });
        }
        Ok(())
    }
}
