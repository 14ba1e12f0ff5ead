//! Manager configuration.
//!
//! | variable | default | meaning |
//! |----------|---------|---------|
//! | `FABFLOW_PROGRESS_INITIAL` | 25 | completion % when production starts |
//! | `FABFLOW_PROGRESS_STEP` | 25 | completion % added per advance |
//! | `FABFLOW_TRACKING_PREFIX` | TRK | prefix of generated tracking codes |

use thiserror::Error;

use fabflow_fulfillment::UuidTrackingCodes;
use fabflow_production::ProgressPolicy;

pub const ENV_PROGRESS_INITIAL: &str = "FABFLOW_PROGRESS_INITIAL";
pub const ENV_PROGRESS_STEP: &str = "FABFLOW_PROGRESS_STEP";
pub const ENV_TRACKING_PREFIX: &str = "FABFLOW_TRACKING_PREFIX";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var}: {value:?} is not a whole number between 0 and 255")]
    InvalidNumber { var: &'static str, value: String },

    #[error("{var}: {reason}")]
    Invalid { var: &'static str, reason: String },
}

/// Tunables of the lifecycle manager.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LifecycleConfig {
    pub progress: ProgressPolicy,
    pub tracking_prefix: String,
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            progress: ProgressPolicy::default(),
            tracking_prefix: UuidTrackingCodes::DEFAULT_PREFIX.to_string(),
        }
    }
}

impl LifecycleConfig {
    /// Load from the process environment; unset variables keep their defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let initial = read_u8(&lookup, ENV_PROGRESS_INITIAL)?.unwrap_or(defaults.progress.initial());
        let step = read_u8(&lookup, ENV_PROGRESS_STEP)?.unwrap_or(defaults.progress.step());

        let progress = ProgressPolicy::new(initial, step).map_err(|e| ConfigError::Invalid {
            var: if (1..=99).contains(&initial) {
                ENV_PROGRESS_STEP
            } else {
                ENV_PROGRESS_INITIAL
            },
            reason: e.to_string(),
        })?;

        let tracking_prefix = match lookup(ENV_TRACKING_PREFIX) {
            Some(raw) => raw.trim().to_string(),
            None => defaults.tracking_prefix,
        };

        let config = Self {
            progress,
            tracking_prefix,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tracking_prefix.is_empty()
            || !self.tracking_prefix.bytes().all(|b| b.is_ascii_alphanumeric())
        {
            return Err(ConfigError::Invalid {
                var: ENV_TRACKING_PREFIX,
                reason: format!(
                    "{:?} must be non-empty ASCII alphanumeric",
                    self.tracking_prefix
                ),
            });
        }
        Ok(())
    }
}

fn read_u8(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &'static str,
) -> Result<Option<u8>, ConfigError> {
    match lookup(var) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse::<u8>()
            .map(Some)
            .map_err(|_| ConfigError::InvalidNumber { var, value: raw }),
    }
}
