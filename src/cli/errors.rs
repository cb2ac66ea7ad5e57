//! Error rendering for the `relay` binary.

use crate::constants;
use crate::error::{Error, UsageError, UsageIssue};
use std::fmt::Write as _;

/// Writes `error` to stderr, as JSON when `json_format` is set.
pub fn print_error_with_json(error: &Error, json_format: bool) {
    if json_format {
        if let Ok(json) = serde_json::to_string_pretty(&error.to_json()) {
            eprintln!("{json}");
            return;
        }
    }
    eprintln!("{}", render_error(error));
}

/// Renders `error` as the text shown to a user.
#[must_use]
pub fn render_error(error: &Error) -> String {
    match error {
        Error::Internal {
            kind,
            message,
            context,
        } => {
            let mut out = format!("{kind}: {message}");
            if let Some(ctx) = context {
                if let Some(details) = &ctx.details {
                    let _ = write!(out, "\n{details}");
                }
                if let Some(suggestion) = &ctx.suggestion {
                    let _ = write!(out, "\n\nHint: {suggestion}");
                }
            }
            out
        }
        Error::Usage(usage) => render_usage(usage),
        Error::HelpRequested { help, .. } => help.clone(),
        Error::Io(err) => {
            let hint = match err.kind() {
                std::io::ErrorKind::NotFound => Some(constants::ERR_FILE_NOT_FOUND),
                std::io::ErrorKind::PermissionDenied => Some(constants::ERR_PERMISSION),
                _ => None,
            };
            with_hint(format!("File Error\n{err}"), hint)
        }
        Error::Yaml(err) => with_hint(format!("Catalog Parsing Error\n{err}"), Some(constants::ERR_YAML_SYNTAX)),
        Error::Json(err) => with_hint(format!("JSON Parsing Error\n{err}"), Some(constants::ERR_JSON_SYNTAX)),
        Error::Toml(err) => with_hint(format!("Config Parsing Error\n{err}"), Some(constants::ERR_TOML_SYNTAX)),
        Error::Anyhow(err) => format!("Error\n{err:#}"),
    }
}

/// Lists every issue on its own line. Flag-level issues point at the
/// flag's `help` sentinel.
fn render_usage(usage: &UsageError) -> String {
    let mut out = String::from("Usage Error");
    for issue in &usage.issues {
        let _ = write!(out, "\n  - {issue}");
    }
    let first_invalid = usage.issues.iter().find_map(|issue| match issue {
        UsageIssue::InvalidValue { flag, .. } => Some(flag.as_str()),
        _ => None,
    });
    let hint = first_invalid.map_or_else(
        || constants::MSG_USE_HELP.to_string(),
        |flag| format!("Pass --{flag}=help to see what --{flag} accepts."),
    );
    let _ = write!(out, "\n\nHint: {hint}");
    out
}

fn with_hint(mut out: String, hint: Option<&str>) -> String {
    if let Some(hint) = hint {
        let _ = write!(out, "\n\nHint: {hint}");
    }
    out
}
