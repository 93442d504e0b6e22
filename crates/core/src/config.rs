// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Ledger configuration
//!
//! Loaded from TOML. Every section is optional; missing values fall back to
//! the defaults below.
//!
//! ```toml
//! actor = "change-ledger"
//!
//! [record_updates]
//! max_attempts = 5
//! base_delay = "50ms"
//! max_delay = "2s"
//!
//! [calendar_calls]
//! max_attempts = 3
//! base_delay = "200ms"
//!
//! [logging]
//! filter = "info,ledger_engine=debug"
//! ```

use crate::id::ActorId;
use crate::retry::RetryPolicy;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("io error reading {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    /// `tracing_subscriber::EnvFilter` directive, overridden by `RUST_LOG`
    pub filter: String,
    pub ansi: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
            ansi: false,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LedgerConfig {
    /// Actor recorded on entries written by this service
    pub actor: String,
    pub record_updates: RetryPolicy,
    pub calendar_calls: RetryPolicy,
    pub logging: LoggingConfig,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            actor: "change-ledger".to_string(),
            record_updates: RetryPolicy::record_updates(),
            calendar_calls: RetryPolicy::calendar_calls(),
            logging: LoggingConfig::default(),
        }
    }
}

impl LedgerConfig {
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: LedgerConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&contents)
    }

    pub fn actor_id(&self) -> ActorId {
        ActorId::new(self.actor.clone())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.actor.trim().is_empty() {
            return Err(ConfigError::Invalid("actor must not be empty".to_string()));
        }
        for (name, policy) in [
            ("record_updates", &self.record_updates),
            ("calendar_calls", &self.calendar_calls),
        ] {
            if policy.max_attempts == 0 {
                return Err(ConfigError::Invalid(format!(
                    "{}.max_attempts must be at least 1",
                    name
                )));
            }
            if let Some(max) = policy.max_delay {
                if max < policy.base_delay {
                    return Err(ConfigError::Invalid(format!(
                        "{}.max_delay must not be below base_delay",
                        name
                    )));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
