//! Simulator configuration.
//!
//! Values are layered: built-in defaults, then an optional JSON file, then
//! `ALU8_*` environment variables, then command-line flags (applied by the
//! binary).

use std::path::Path;
use std::time::Duration;
use serde::{Serialize, Deserialize};
use thiserror::Error;
use tracing::warn;
use crate::alu::Opcode;
use crate::register::Register;

/// Default clock period.
pub const DEFAULT_TICK_MS: u64 = 1500;

/// Simulator settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Clock period in milliseconds.
    pub tick_interval_ms: u64,
    /// Accumulator value at start and after reset.
    pub initial_accumulator: u8,
    /// Operand value at start and after reset.
    pub initial_operand: u8,
    /// Operation selected at start.
    pub opcode: Opcode,
    /// Fixed seed for the clock's operand generator. `None` seeds from the OS.
    pub seed: Option<u64>,
    /// Start with the signed decimal view.
    pub signed_view: bool,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: DEFAULT_TICK_MS,
            initial_accumulator: 0,
            initial_operand: 0,
            opcode: Opcode::Add,
            seed: None,
            signed_view: false,
        }
    }
}

impl SimConfig {
    /// Environment variable names understood by [`SimConfig::apply_env`].
    pub const ENV_TICK_MS: &'static str = "ALU8_TICK_MS";
    pub const ENV_ACCUMULATOR: &'static str = "ALU8_ACCUMULATOR";
    pub const ENV_OPERAND: &'static str = "ALU8_OPERAND";
    pub const ENV_OPCODE: &'static str = "ALU8_OPCODE";
    pub const ENV_SEED: &'static str = "ALU8_SEED";

    /// Parse a JSON document. Missing keys keep their defaults.
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a JSON config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_json(&text)
    }

    /// Apply overrides from the process environment.
    pub fn apply_env(&mut self) -> Result<(), ConfigError> {
        self.apply_env_with(|key| std::env::var(key).ok())
    }

    /// Apply overrides from `lookup`, which maps a variable name to its value.
    pub fn apply_env_with<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(raw) = lookup(Self::ENV_TICK_MS) {
            self.tick_interval_ms = parse_u64(Self::ENV_TICK_MS, &raw)?;
        }
        if let Some(raw) = lookup(Self::ENV_ACCUMULATOR) {
            self.initial_accumulator = parse_register(Self::ENV_ACCUMULATOR, &raw)?;
        }
        if let Some(raw) = lookup(Self::ENV_OPERAND) {
            self.initial_operand = parse_register(Self::ENV_OPERAND, &raw)?;
        }
        if let Some(raw) = lookup(Self::ENV_OPCODE) {
            self.opcode = raw.parse().map_err(|e: crate::alu::AluError| invalid(Self::ENV_OPCODE, e))?;
        }
        if let Some(raw) = lookup(Self::ENV_SEED) {
            self.seed = Some(parse_u64(Self::ENV_SEED, &raw)?);
        }
        self.validate()
    }

    /// Check cross-field constraints.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tick_interval_ms == 0 {
            return Err(ConfigError::ZeroInterval);
        }
        Ok(())
    }

    /// Clock period as a `Duration`.
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }
}

fn invalid(key: &str, reason: impl ToString) -> ConfigError {
    let reason = reason.to_string();
    warn!(key, %reason, "rejected configuration value");
    ConfigError::InvalidValue { key: key.to_string(), reason }
}

fn parse_u64(key: &str, raw: &str) -> Result<u64, ConfigError> {
    raw.trim().parse().map_err(|e| invalid(key, e))
}

fn parse_register(key: &str, raw: &str) -> Result<u8, ConfigError> {
    Register::parse_input(raw)
        .map(Register::value)
        .map_err(|e| invalid(key, e))
}

/// Errors loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed config file: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid value for {key}: {reason}")]
    InvalidValue { key: String, reason: String },

    #[error("tick interval must be greater than zero")]
    ZeroInterval,
}
