use crate::config::models::RelayConfig;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::env;

/// Supplies config values that were not given on the command line.
pub trait ValueSource {
    /// Looks up a config property by its external name.
    fn lookup(&self, name: &str) -> Option<Value>;
}

impl ValueSource for Map<String, Value> {
    fn lookup(&self, name: &str) -> Option<Value> {
        self.get(name).cloned()
    }
}

impl ValueSource for BTreeMap<String, Value> {
    fn lookup(&self, name: &str) -> Option<Value> {
        self.get(name).cloned()
    }
}

/// Reads `{PREFIX}_{NAME}` environment variables first, then the
/// `[defaults]` table of the config file.
///
/// Environment values are parsed as JSON when possible so that numbers and
/// booleans keep their type; anything else is taken as a string.
#[derive(Debug, Clone, Default)]
pub struct LayeredSource {
    env_prefix: String,
    defaults: BTreeMap<String, Value>,
}

impl LayeredSource {
    #[must_use]
    pub fn new(env_prefix: impl Into<String>, defaults: BTreeMap<String, Value>) -> Self {
        Self {
            env_prefix: env_prefix.into(),
            defaults,
        }
    }

    #[must_use]
    pub fn from_config(config: &RelayConfig) -> Self {
        Self::new(config.env_prefix(), config.defaults.clone())
    }

    /// Environment variable consulted for `name`, e.g. `RELAY_REGION` for
    /// `region` and `RELAY_CONTROL_WAIT` for `_wait`.
    #[must_use]
    pub fn env_var_name(&self, name: &str) -> String {
        let suffix: String = name
            .trim_start_matches('_')
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_uppercase() } else { '_' })
            .collect();
        if name.starts_with('_') {
            format!("{}_CONTROL_{suffix}", self.env_prefix)
        } else {
            format!("{}_{suffix}", self.env_prefix)
        }
    }
}

impl ValueSource for LayeredSource {
    fn lookup(&self, name: &str) -> Option<Value> {
        let var = self.env_var_name(name);
        if let Ok(raw) = env::var(&var) {
            tracing::debug!(config = name, env = %var, "config value from environment");
            return Some(serde_json::from_str(&raw).unwrap_or(Value::String(raw)));
        }
        let value = self.defaults.get(name).cloned();
        if value.is_some() {
            tracing::debug!(config = name, "config value from config file defaults");
        }
        value
    }
}
