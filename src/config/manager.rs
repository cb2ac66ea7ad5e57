use crate::config::models::RelayConfig;
use crate::constants;
use crate::error::Error;
use crate::fs::{expand_path, FileReader, LocalFiles};
use std::path::{Path, PathBuf};

/// Locates and parses the relay configuration file.
pub struct ConfigManager<F: FileReader> {
    files: F,
    config_dir: Option<PathBuf>,
}

impl ConfigManager<LocalFiles> {
    /// Creates a manager reading from the platform config directory.
    #[must_use]
    pub fn new() -> Self {
        Self {
            files: LocalFiles,
            config_dir: get_config_dir(),
        }
    }
}

impl Default for ConfigManager<LocalFiles> {
    fn default() -> Self {
        Self::new()
    }
}

impl<F: FileReader> ConfigManager<F> {
    pub const fn with_reader(files: F, config_dir: Option<PathBuf>) -> Self {
        Self { files, config_dir }
    }

    /// `<config dir>/relay/config.toml`, if a config directory exists.
    #[must_use]
    pub fn default_config_path(&self) -> Option<PathBuf> {
        self.config_dir
            .as_ref()
            .map(|dir| dir.join(constants::CONFIG_FILENAME))
    }

    /// Loads the configuration.
    ///
    /// An explicit path (from `--config-file`, then `RELAY_CONFIG`) must
    /// exist. The default location is optional: a missing file yields the
    /// default configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if an explicit file is missing, or if the selected
    /// file cannot be read or parsed.
    pub fn load(&self, explicit: Option<&str>) -> Result<RelayConfig, Error> {
        let explicit = explicit
            .map(str::to_string)
            .or_else(|| std::env::var(constants::ENV_RELAY_CONFIG).ok())
            .filter(|p| !p.is_empty());

        if let Some(raw) = explicit {
            let path = expand_path(&raw)?;
            if !self.files.is_file(&path) {
                return Err(Error::config_file_not_found(&path.display().to_string()));
            }
            return self.parse(&path);
        }

        match self.default_config_path() {
            Some(path) if self.files.is_file(&path) => self.parse(&path),
            _ => {
                tracing::debug!("no configuration file found, using defaults");
                Ok(RelayConfig::default())
            }
        }
    }

    fn parse(&self, path: &Path) -> Result<RelayConfig, Error> {
        tracing::debug!(path = %path.display(), "loading configuration");
        let content = self.files.read_text(path)?;
        toml::from_str(&content)
            .map_err(|e| Error::invalid_config(format!("{}: {e}", path.display())))
    }
}

/// The relay config directory: `RELAY_CONFIG_DIR` if set, otherwise
/// `relay` under the platform config directory.
#[must_use]
pub fn get_config_dir() -> Option<PathBuf> {
    if let Ok(dir) = std::env::var(constants::ENV_RELAY_CONFIG_DIR) {
        if !dir.is_empty() {
            return Some(PathBuf::from(dir));
        }
    }
    dirs::config_dir().map(|dir| dir.join(constants::CONFIG_DIR_NAME))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::MockFileReader;
    use mockall::predicate::eq;
    use serde_json::json;

    #[test]
    fn missing_default_file_yields_defaults() {
        let mut fs = MockFileReader::new();
        fs.expect_is_file().returning(|_| false);
        let manager = ConfigManager::with_reader(fs, Some(PathBuf::from("/cfg/relay")));
        assert_eq!(manager.load(None).unwrap(), RelayConfig::default());
    }

    #[test]
    fn parses_defaults_table() {
        let mut fs = MockFileReader::new();
        let path = PathBuf::from("/cfg/relay/config.toml");
        fs.expect_is_file().with(eq(path.clone())).returning(|_| true);
        fs.expect_read_text().with(eq(path)).returning(|_| {
            Ok("env_prefix = \"MGC\"\ncatalog = \"~/api.yaml\"\n\n[defaults]\nregion = \"br-ne1\"\nretries = 3\n".to_string())
        });
        let manager = ConfigManager::with_reader(fs, Some(PathBuf::from("/cfg/relay")));
        let config = manager.load(None).unwrap();
        assert_eq!(config.env_prefix(), "MGC");
        assert_eq!(config.catalog.as_deref(), Some("~/api.yaml"));
        assert_eq!(config.defaults.get("region"), Some(&json!("br-ne1")));
        assert_eq!(config.defaults.get("retries"), Some(&json!(3)));
    }

    #[test]
    fn explicit_file_must_exist() {
        let mut fs = MockFileReader::new();
        fs.expect_is_file().returning(|_| false);
        let manager = ConfigManager::with_reader(fs, None);
        let err = manager.load(Some("/nowhere/config.toml")).unwrap_err();
        assert!(err.to_string().contains("/nowhere/config.toml"));
    }

    #[test]
    fn invalid_toml_is_a_config_error() {
        let mut fs = MockFileReader::new();
        fs.expect_is_file().returning(|_| true);
        fs.expect_read_text()
            .returning(|_| Ok("defaults = [".to_string()));
        let manager = ConfigManager::with_reader(fs, None);
        let err = manager.load(Some("/etc/relay.toml")).unwrap_err();
        assert_eq!(err.kind(), Some(crate::error::ErrorKind::Config));
    }
}
