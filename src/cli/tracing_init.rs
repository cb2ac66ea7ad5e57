//! Subscriber setup for the `relay` binary.
//!
//! `-v`/`-vv` select debug/trace; otherwise `RELAY_LOG` holds an
//! `EnvFilter` directive (default `error`). `RELAY_LOG_FORMAT` picks `text`
//! or `json`, and `RELAY_LOG_FILE` appends to a file instead of stderr.

use crate::constants;
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::sync::Mutex;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

const DEFAULT_DIRECTIVE: &str = "error";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

/// Logging choices gathered from the command line and environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogSettings {
    pub directive: String,
    pub format: LogFormat,
    pub file: Option<String>,
    /// Problems to report once the subscriber is installed.
    pub warnings: Vec<String>,
}

impl LogSettings {
    /// Reads the settings, with `-v` counts taking precedence over `RELAY_LOG`.
    #[must_use]
    pub fn from_env(verbosity: u8) -> Self {
        Self::resolve(verbosity, |name| std::env::var(name).ok())
    }

    fn resolve(verbosity: u8, var: impl Fn(&str) -> Option<String>) -> Self {
        let mut warnings = Vec::new();
        let directive = match verbosity {
            0 => var(constants::ENV_RELAY_LOG).unwrap_or_else(|| DEFAULT_DIRECTIVE.to_string()),
            1 => "relay_cli=debug,relay=debug".to_string(),
            _ => "trace".to_string(),
        };
        let format = match var(constants::ENV_RELAY_LOG_FORMAT).map(|f| f.to_lowercase()) {
            None => LogFormat::Text,
            Some(f) if f == "text" => LogFormat::Text,
            Some(f) if f == "json" => LogFormat::Json,
            Some(other) => {
                warnings.push(format!(
                    "unrecognized {} '{other}', using 'text'",
                    constants::ENV_RELAY_LOG_FORMAT
                ));
                LogFormat::Text
            }
        };
        Self {
            directive,
            format,
            file: var(constants::ENV_RELAY_LOG_FILE).filter(|path| !path.is_empty()),
            warnings,
        }
    }

    fn filter(&self) -> EnvFilter {
        EnvFilter::try_new(&self.directive).unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVE))
    }
}

/// Log destination: an append-only file, or stderr.
enum LogWriter {
    File(Mutex<File>),
    Stderr,
}

impl<'a> MakeWriter<'a> for LogWriter {
    type Writer = Box<dyn Write + 'a>;

    fn make_writer(&'a self) -> Self::Writer {
        match self {
            Self::File(file) => match file.lock().ok().and_then(|f| f.try_clone().ok()) {
                Some(handle) => Box::new(handle),
                None => Box::new(io::stderr()),
            },
            Self::Stderr => Box::new(io::stderr()),
        }
    }
}

/// Installs the global subscriber.
pub fn init_tracing(verbosity: u8) {
    let mut settings = LogSettings::from_env(verbosity);
    let writer = match &settings.file {
        None => LogWriter::Stderr,
        Some(path) => match OpenOptions::new().create(true).append(true).open(path) {
            Ok(file) => LogWriter::File(Mutex::new(file)),
            Err(e) => {
                settings
                    .warnings
                    .push(format!("cannot open log file '{path}': {e}, using stderr"));
                LogWriter::Stderr
            }
        },
    };

    let registry = tracing_subscriber::registry().with(settings.filter());
    match settings.format {
        LogFormat::Json => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_span_list(false)
                    .with_line_number(true)
                    .with_writer(writer),
            )
            .init(),
        LogFormat::Text => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .pretty()
                    .with_span_events(FmtSpan::CLOSE)
                    .with_target(false)
                    .with_writer(writer),
            )
            .init(),
    }

    for warning in &settings.warnings {
        tracing::warn!("{warning}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn settings(verbosity: u8, vars: &[(&str, &str)]) -> LogSettings {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        LogSettings::resolve(verbosity, |name| vars.get(name).cloned())
    }

    #[test]
    fn verbosity_overrides_environment() {
        assert_eq!(settings(2, &[("RELAY_LOG", "info")]).directive, "trace");
        assert_eq!(settings(0, &[("RELAY_LOG", "info")]).directive, "info");
        assert_eq!(settings(0, &[]).directive, "error");
    }

    #[test]
    fn unknown_format_falls_back_to_text() {
        let s = settings(0, &[("RELAY_LOG_FORMAT", "xml")]);
        assert_eq!(s.format, LogFormat::Text);
        assert_eq!(s.warnings.len(), 1);
        assert_eq!(settings(0, &[("RELAY_LOG_FORMAT", "JSON")]).format, LogFormat::Json);
    }
}
