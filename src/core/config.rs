/*!
 * Registry Configuration
 * Defaults come from `limits`; each value can be overridden from the environment
 */

use super::errors::ConfigError;
use super::limits::{
    ENV_AUDIT_CONSUMPTION, ENV_MAX_CLIENT_EVENTS, ENV_MAX_EVENTS, MAX_CLIENT_EVENTS,
    MAX_REGISTRY_EVENTS,
};
use serde::{Deserialize, Serialize};

/// Tunables for a [`PermissionRegistry`](crate::permissions::PermissionRegistry)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// Capacity of the global event ring buffer
    pub max_events: usize,
    /// Capacity of each per-client event ring buffer
    pub max_client_events: usize,
    /// Record consumed and denied calls, not only grants
    pub audit_consumption: bool,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            max_events: MAX_REGISTRY_EVENTS,
            max_client_events: MAX_CLIENT_EVENTS,
            audit_consumption: true,
        }
    }
}

impl RegistryConfig {
    /// Load from environment variables, falling back to defaults
    ///
    /// Environment variables:
    /// - CALL_ORDER_MAX_EVENTS: global event capacity (default: 4096)
    /// - CALL_ORDER_MAX_CLIENT_EVENTS: per-client event capacity (default: 256)
    /// - CALL_ORDER_AUDIT_CONSUMPTION: record consume/deny events (default: true)
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();
        Ok(Self {
            max_events: read_capacity(ENV_MAX_EVENTS, defaults.max_events)?,
            max_client_events: read_capacity(ENV_MAX_CLIENT_EVENTS, defaults.max_client_events)?,
            audit_consumption: read_flag(ENV_AUDIT_CONSUMPTION, defaults.audit_consumption)?,
        })
    }

    pub fn with_max_events(mut self, max_events: usize) -> Self {
        self.max_events = max_events;
        self
    }

    pub fn with_max_client_events(mut self, max_client_events: usize) -> Self {
        self.max_client_events = max_client_events;
        self
    }

    pub fn with_audit_consumption(mut self, enabled: bool) -> Self {
        self.audit_consumption = enabled;
        self
    }
}

fn read_capacity(var: &'static str, default: usize) -> Result<usize, ConfigError> {
    let Ok(value) = std::env::var(var) else {
        return Ok(default);
    };

    match value.trim().parse::<usize>() {
        Ok(0) => Err(ConfigError::Invalid {
            var,
            value,
            reason: "capacity must be at least 1".to_string(),
        }),
        Ok(n) => Ok(n),
        Err(e) => Err(ConfigError::Invalid {
            var,
            value,
            reason: e.to_string(),
        }),
    }
}

fn read_flag(var: &'static str, default: bool) -> Result<bool, ConfigError> {
    let Ok(value) = std::env::var(var) else {
        return Ok(default);
    };

    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::Invalid {
            var,
            value,
            reason: "expected a boolean".to_string(),
        }),
    }
}
