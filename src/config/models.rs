use crate::constants;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Contents of `config.toml`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct RelayConfig {
    /// Prefix of the environment variables consulted for config flags.
    #[serde(default)]
    pub env_prefix: Option<String>,
    /// Catalog used when neither `--catalog` nor `RELAY_CATALOG` is given.
    #[serde(default)]
    pub catalog: Option<String>,
    /// Fallback values for config flags, keyed by property name.
    #[serde(default)]
    pub defaults: BTreeMap<String, Value>,
}

impl RelayConfig {
    #[must_use]
    pub fn env_prefix(&self) -> &str {
        self.env_prefix
            .as_deref()
            .filter(|p| !p.is_empty())
            .unwrap_or(constants::DEFAULT_ENV_PREFIX)
    }
}
