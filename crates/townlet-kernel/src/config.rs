//! Kernel configuration.
//!
//! Loaded from an optional TOML file layered with `TOWNLET__`-prefixed
//! environment variables (`TOWNLET__ORACLE__API_KEY` overrides
//! `[oracle] api_key`). Every field has a default, so an empty config
//! is valid and tests can construct configs directly.

use std::time::Duration;

use serde::Deserialize;
use townlet_oracle::HttpOracleConfig;

use crate::error::KernelError;

/// Complete kernel configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct KernelConfig {
    /// Which town this kernel simulates.
    pub town: TownConfig,
    /// Tick cadence.
    pub kernel: TickConfig,
    /// Per-NPC tunables.
    pub npc: NpcConfig,
    /// Store write behavior during action resolution.
    pub persistence: PersistenceConfig,
    /// Decision oracle connection.
    pub oracle: OracleConfig,
}

/// Town selection.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TownConfig {
    /// Id of the town record the clock stamps its start time on.
    pub town_id: String,
}

/// Tick cadence settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TickConfig {
    /// Wall-clock seconds between ticks; one tick is one sim hour.
    /// Negative values are rejected when the clock starts.
    pub tick_interval_seconds: i64,
}

/// Per-NPC tunables.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct NpcConfig {
    /// Long-memory length above which a summarization pass runs.
    pub max_long_memory_chars: usize,
}

/// Store write behavior during action resolution.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PersistenceConfig {
    /// Whether a failed store write aborts the action or is logged
    /// and skipped.
    pub write_policy: WritePolicy,
}

/// Policy for store writes made while resolving an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WritePolicy {
    /// A failed write aborts the event's processing with an error.
    Strict,
    /// A failed write is logged and the action continues.
    BestEffort,
}

/// Decision oracle connection settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OracleConfig {
    /// Base URL of an OpenAI-compatible API.
    pub base_url: String,
    /// Bearer token. Empty means no oracle is configured.
    pub api_key: String,
    /// Model name to request.
    pub model: String,
    /// Sampling temperature.
    pub temperature: f64,
    /// Whole-request timeout in seconds.
    pub timeout_seconds: u64,
}

impl Default for TownConfig {
    fn default() -> Self {
        Self {
            town_id: String::from("town:001"),
        }
    }
}

impl Default for TickConfig {
    fn default() -> Self {
        Self {
            tick_interval_seconds: 90,
        }
    }
}

impl Default for NpcConfig {
    fn default() -> Self {
        Self {
            max_long_memory_chars: 8400,
        }
    }
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            write_policy: WritePolicy::Strict,
        }
    }
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            base_url: String::from("https://api.openai.com/v1"),
            api_key: String::new(),
            model: String::from("gpt-4o-mini"),
            temperature: 0.7,
            timeout_seconds: 30,
        }
    }
}

impl KernelConfig {
    /// Load configuration from an optional TOML file layered with
    /// `TOWNLET__`-prefixed environment variables.
    pub fn load(path: Option<&str>) -> Result<Self, KernelError> {
        let mut builder = config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(config::File::with_name(path).required(false));
        }
        builder
            .add_source(config::Environment::with_prefix("TOWNLET").separator("__"))
            .build()
            .map_err(|e| KernelError::Config(e.to_string()))?
            .try_deserialize()
            .map_err(|e| KernelError::Config(e.to_string()))
    }
}

impl OracleConfig {
    /// Convert into the HTTP backend's connection settings.
    pub fn to_http_config(&self) -> HttpOracleConfig {
        HttpOracleConfig {
            base_url: self.base_url.clone(),
            api_key: self.api_key.clone(),
            model: self.model.clone(),
            temperature: self.temperature,
            timeout: Duration::from_secs(self.timeout_seconds),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let config = KernelConfig::default();
        assert_eq!(config.town.town_id, "town:001");
        assert_eq!(config.kernel.tick_interval_seconds, 90);
        assert_eq!(config.npc.max_long_memory_chars, 8400);
        assert_eq!(config.persistence.write_policy, WritePolicy::Strict);
        assert!(config.oracle.api_key.is_empty());
    }

    #[test]
    fn write_policy_parses_snake_case() {
        let policy: WritePolicy = serde_json::from_str("\"best_effort\"").unwrap();
        assert_eq!(policy, WritePolicy::BestEffort);
    }

    #[test]
    fn missing_file_loads_defaults() {
        let config = KernelConfig::load(None).unwrap();
        assert_eq!(config.kernel.tick_interval_seconds, 90);
    }
}
