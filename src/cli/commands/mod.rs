//! CLI command handlers extracted from main.rs.
//!
//! Each submodule handles a top-level command variant from [`Commands`].
//!
//! [`Commands`]: crate::cli::Commands

#[allow(clippy::missing_errors_doc)]
pub mod catalog;
#[allow(clippy::missing_errors_doc)]
pub mod complete;
#[allow(clippy::missing_errors_doc)]
pub mod run;

use crate::catalog::operation::CatalogOperation;
use crate::catalog::{Catalog, DryRunTransport};
use crate::cli::{Cli, OutputFormat};
use crate::config::{ConfigManager, RelayConfig};
use crate::engine::loader;
use crate::error::Error;
use crate::fs::expand_path;
use serde_json::Value;
use std::path::Path;
use std::sync::Arc;

/// Configuration and catalog shared by every command.
#[derive(Debug)]
pub struct Session {
    pub config: RelayConfig,
    pub catalog: Catalog,
}

impl Session {
    /// Loads the configuration, then the catalog named by `--catalog`,
    /// `RELAY_CATALOG` or the config file, in that order.
    pub fn load(cli: &Cli) -> Result<Self, Error> {
        let config = ConfigManager::new().load(cli.config_file.as_deref())?;
        let catalog_path = cli
            .catalog
            .clone()
            .or_else(|| config.catalog.clone())
            .ok_or_else(Error::catalog_not_configured)?;
        let path = expand_path(&catalog_path)?;
        let file = loader::load_catalog_file(&path).map_err(|e| with_catalog_context(e, &path))?;
        let catalog = Catalog::new(file, Arc::new(DryRunTransport));
        tracing::debug!(catalog = %catalog.name, "session ready");
        Ok(Self { config, catalog })
    }

    pub fn operation(&self, name: &str) -> Result<Arc<CatalogOperation>, Error> {
        self.catalog
            .operation(name)
            .ok_or_else(|| Error::operation_not_found(name, &self.catalog.operation_names()))
    }
}

/// Prints a value to stdout in the requested format.
pub fn print_value(value: &Value, format: OutputFormat) -> Result<(), Error> {
    let rendered = match format {
        OutputFormat::Json => serde_json::to_string_pretty(value)?,
        OutputFormat::Yaml => serde_yaml::to_string(value)?,
    };
    // ast-grep-ignore: no-println
    println!("{}", rendered.trim_end());
    Ok(())
}

/// Names the catalog file on I/O failures, which do not mention it.
fn with_catalog_context(err: Error, path: &Path) -> Error {
    match err {
        Error::Io(io) => anyhow::Error::new(io)
            .context(format!("cannot read catalog '{}'", path.display()))
            .into(),
        other => other,
    }
}
