//! Configuration management for the authentication flow engine.
//!
//! Configuration is loaded from environment variables with sensible defaults.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Requirement names accepted for `default_execution_requirement`.
pub const REQUIREMENT_NAMES: [&str; 4] = ["REQUIRED", "ALTERNATIVE", "OPTIONAL", "DISABLED"];

/// Main configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Flow execution engine configuration.
    pub engine: EngineConfig,
    /// Management API configuration.
    pub admin: AdminConfig,
}

/// Flow execution engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Maximum sub-flow nesting depth.
    ///
    /// Deeper trees (or a flow that references itself) are reported as a
    /// configuration error instead of recursing without bound.
    pub max_flow_depth: usize,
}

/// Management API configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminConfig {
    /// Emit audit events for management mutations.
    pub events_enabled: bool,
    /// Requirement given to newly added executions when the caller sets none.
    pub default_execution_requirement: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self { max_flow_depth: 16 }
    }
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            events_enabled: true,
            default_execution_requirement: "DISABLED".to_string(),
        }
    }
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// A `.env` file in the working directory is honoured if present.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if a variable is set but cannot be parsed.
    pub fn from_env() -> Result<Self> {
        let _ = dotenvy::dotenv();

        let defaults = Self::default();

        let max_flow_depth = match std::env::var("KC_MAX_FLOW_DEPTH") {
            Ok(v) => v
                .parse()
                .map_err(|_| Error::Config(format!("KC_MAX_FLOW_DEPTH is not a number: {v}")))?,
            Err(_) => defaults.engine.max_flow_depth,
        };
        let events_enabled = std::env::var("KC_ADMIN_EVENTS_ENABLED")
            .map(|v| v.to_lowercase() != "false" && v != "0")
            .unwrap_or(defaults.admin.events_enabled);

        let default_execution_requirement = std::env::var("KC_DEFAULT_EXECUTION_REQUIREMENT")
            .map(|v| v.to_uppercase())
            .unwrap_or(defaults.admin.default_execution_requirement);

        let config = Self {
            engine: EngineConfig { max_flow_depth },
            admin: AdminConfig {
                events_enabled,
                default_execution_requirement,
            },
        };
        config.validate()?;
        Ok(config)
    }

    /// Checks values that would otherwise only fail once in use.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` for a zero flow depth or an unknown default
    /// execution requirement.
    pub fn validate(&self) -> Result<()> {
        if self.engine.max_flow_depth == 0 {
            return Err(Error::Config(
                "KC_MAX_FLOW_DEPTH must be at least 1".to_string(),
            ));
        }
        let requirement = &self.admin.default_execution_requirement;
        if !REQUIREMENT_NAMES.contains(&requirement.as_str()) {
            return Err(Error::Config(format!(
                "KC_DEFAULT_EXECUTION_REQUIREMENT must be one of {}, got '{requirement}'",
                REQUIREMENT_NAMES.join(", ")
            )));
        }
        Ok(())
    }
}
