use crate::error::{PaymentError, Result};
use serde::Deserialize;
use std::fs::File;
use std::path::Path;
use std::time::Duration;

/// Timeouts applied by the payment flow orchestrator.
///
/// Network stages are always bounded; the gateway stage waits on a human and
/// is unbounded unless `gateway_timeout_secs` is set.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct FlowConfig {
    pub reference_timeout_secs: u64,
    pub status_timeout_secs: u64,
    pub gateway_timeout_secs: Option<u64>,
}

impl Default for FlowConfig {
    fn default() -> Self {
        Self {
            reference_timeout_secs: 20,
            status_timeout_secs: 20,
            gateway_timeout_secs: None,
        }
    }
}

impl FlowConfig {
    /// Loads a JSON config file. Missing keys keep their defaults.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        let config: Self = serde_json::from_reader(file)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.reference_timeout_secs == 0 {
            return Err(PaymentError::ConfigError(
                "reference_timeout_secs must be greater than zero".to_string(),
            ));
        }
        if self.status_timeout_secs == 0 {
            return Err(PaymentError::ConfigError(
                "status_timeout_secs must be greater than zero".to_string(),
            ));
        }
        if self.gateway_timeout_secs == Some(0) {
            return Err(PaymentError::ConfigError(
                "gateway_timeout_secs must be greater than zero when set".to_string(),
            ));
        }
        Ok(())
    }

    pub fn reference_timeout(&self) -> Duration {
        Duration::from_secs(self.reference_timeout_secs)
    }

    pub fn status_timeout(&self) -> Duration {
        Duration::from_secs(self.status_timeout_secs)
    }

    pub fn gateway_timeout(&self) -> Option<Duration> {
        self.gateway_timeout_secs.map(Duration::from_secs)
    }
}
