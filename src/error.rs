use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Classification of library-internal failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorKind {
    /// A malformed operation descriptor. Never caused by user input.
    Programming,
    Validation,
    Config,
    LinkResolution,
    Catalog,
    Transport,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Programming => "Programming Error",
            Self::Validation => "Validation Error",
            Self::Config => "Configuration Error",
            Self::LinkResolution => "Link Resolution Error",
            Self::Catalog => "Catalog Error",
            Self::Transport => "Transport Error",
        };
        f.write_str(label)
    }
}

/// Extra information attached to an internal error.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ErrorContext {
    /// Free-form details, rendered as JSON context.
    pub details: Option<String>,
    /// What the user can do about it.
    pub suggestion: Option<String>,
}

impl ErrorContext {
    #[must_use]
    pub fn suggestion(suggestion: impl Into<String>) -> Self {
        Self {
            details: None,
            suggestion: Some(suggestion.into()),
        }
    }

    #[must_use]
    pub fn details(details: impl Into<String>) -> Self {
        Self {
            details: Some(details.into()),
            suggestion: None,
        }
    }
}

/// One problem found while turning command-line input into values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UsageIssue {
    /// Required flags that received no value from any layer.
    MissingRequired(Vec<String>),
    /// A flag whose value could not be decoded or failed schema validation.
    InvalidValue { flag: String, reason: String },
    /// Too many or otherwise unacceptable positional arguments.
    Positional(String),
    /// Command-line syntax the parser rejected, such as an unknown flag.
    Unrecognized(String),
}

impl fmt::Display for UsageIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingRequired(names) => {
                let flags = names
                    .iter()
                    .map(|name| format!("--{name}"))
                    .collect::<Vec<_>>()
                    .join(", ");
                write!(f, "missing required flags: {flags}")
            }
            Self::InvalidValue { flag, reason } => write!(f, "invalid value for --{flag}: {reason}"),
            Self::Positional(reason) | Self::Unrecognized(reason) => f.write_str(reason),
        }
    }
}

/// Every usage problem of one command invocation, reported together.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UsageError {
    pub issues: Vec<UsageIssue>,
}

impl UsageError {
    #[must_use]
    pub const fn new(issues: Vec<UsageIssue>) -> Self {
        Self { issues }
    }

    #[must_use]
    pub fn single(issue: UsageIssue) -> Self {
        Self {
            issues: vec![issue],
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }

    /// Names of every flag mentioned by the collected issues.
    #[must_use]
    pub fn flag_names(&self) -> Vec<&str> {
        let mut names = Vec::new();
        for issue in &self.issues {
            match issue {
                UsageIssue::MissingRequired(missing) => names.extend(missing.iter().map(String::as_str)),
                UsageIssue::InvalidValue { flag, .. } => names.push(flag.as_str()),
                UsageIssue::Positional(_) | UsageIssue::Unrecognized(_) => {}
            }
        }
        names
    }
}

impl fmt::Display for UsageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, issue) in self.issues.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{issue}")?;
        }
        Ok(())
    }
}

impl std::error::Error for UsageError {}

#[derive(Error, Debug)]
pub enum Error {
    #[error("{kind}: {message}")]
    Internal {
        kind: ErrorKind,
        message: String,
        context: Option<ErrorContext>,
    },
    #[error("{0}")]
    Usage(UsageError),
    #[error("help requested for --{flag}")]
    HelpRequested { flag: String, help: String },
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

impl From<UsageError> for Error {
    fn from(err: UsageError) -> Self {
        Self::Usage(err)
    }
}

/// JSON representation of an error for structured output
#[derive(Debug, Serialize, Deserialize)]
pub struct JsonError {
    pub error_type: String,
    pub message: String,
    pub context: Option<String>,
}

impl Error {
    fn internal(kind: ErrorKind, message: impl Into<String>, context: Option<ErrorContext>) -> Self {
        Self::Internal {
            kind,
            message: message.into(),
            context,
        }
    }

    /// A malformed operation descriptor. Fatal and never caused by the user.
    #[must_use]
    pub fn programming(message: impl Into<String>) -> Self {
        Self::internal(
            ErrorKind::Programming,
            format!("programming error: {}", message.into()),
            Some(ErrorContext::suggestion(
                "The operation descriptor is malformed. Please report it with the command you were running.",
            )),
        )
    }

    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::internal(ErrorKind::Validation, message, None)
    }

    #[must_use]
    pub fn invalid_config(reason: impl Into<String>) -> Self {
        Self::internal(ErrorKind::Config, reason, None)
    }

    #[must_use]
    pub fn config_file_not_found(path: &str) -> Self {
        Self::internal(
            ErrorKind::Config,
            format!("configuration file '{path}' does not exist"),
            Some(ErrorContext::suggestion(
                "Check the --config-file argument or the RELAY_CONFIG environment variable.",
            )),
        )
    }

    #[must_use]
    pub fn catalog_not_configured() -> Self {
        Self::internal(
            ErrorKind::Catalog,
            "no operation catalog configured",
            Some(ErrorContext::suggestion(
                "Pass --catalog <file>, set RELAY_CATALOG, or add `catalog = \"...\"` to the config file.",
            )),
        )
    }

    #[must_use]
    pub fn operation_not_found(name: &str, available: &[String]) -> Self {
        let suggestion = if available.is_empty() {
            "The catalog declares no operations.".to_string()
        } else {
            format!("Available operations: {}", available.join(", "))
        };
        Self::internal(
            ErrorKind::Catalog,
            format!("operation '{name}' not found in catalog"),
            Some(ErrorContext::suggestion(suggestion)),
        )
    }

    #[must_use]
    pub fn invalid_catalog(reason: impl Into<String>) -> Self {
        Self::internal(ErrorKind::Catalog, reason, None)
    }

    #[must_use]
    pub fn link_not_found(operation: &str, link: &str) -> Self {
        Self::internal(
            ErrorKind::LinkResolution,
            format!("operation '{operation}' has no link named '{link}'"),
            Some(ErrorContext::suggestion(format!(
                "Use 'relay links {operation}' to list the available links."
            ))),
        )
    }

    #[must_use]
    pub fn link_missing_target(link: &str) -> Self {
        Self::internal(
            ErrorKind::LinkResolution,
            format!("link '{link}' has no reachable target operation"),
            None,
        )
    }

    #[must_use]
    pub fn invalid_additional_parameters(link: &str, problems: &[String]) -> Self {
        Self::internal(
            ErrorKind::LinkResolution,
            format!("additional parameters passed to link '{link}' are invalid"),
            Some(ErrorContext::details(problems.join("; "))),
        )
    }

    #[must_use]
    pub fn malformed_json_pointer(pointer: &str) -> Self {
        Self::internal(
            ErrorKind::LinkResolution,
            format!("malformed json pointer: '{pointer}'"),
            None,
        )
    }

    #[must_use]
    pub fn json_pointer_apply_failed(pointer: &str, reason: impl Into<String>) -> Self {
        Self::internal(
            ErrorKind::LinkResolution,
            format!("failed to set json pointer '{pointer}'"),
            Some(ErrorContext::details(reason)),
        )
    }

    #[must_use]
    pub fn transport(reason: impl Into<String>) -> Self {
        Self::internal(ErrorKind::Transport, reason, None)
    }

    /// Returns the kind for internal errors.
    #[must_use]
    pub const fn kind(&self) -> Option<ErrorKind> {
        match self {
            Self::Internal { kind, .. } => Some(*kind),
            _ => None,
        }
    }

    /// Convert error to JSON representation for structured output
    #[must_use]
    pub fn to_json(&self) -> JsonError {
        let (error_type, message, context) = match self {
            Self::Internal {
                kind,
                message,
                context,
            } => {
                let context = context.as_ref().and_then(|ctx| {
                    match (&ctx.details, &ctx.suggestion) {
                        (Some(details), Some(suggestion)) => Some(format!("{details}. {suggestion}")),
                        (Some(details), None) => Some(details.clone()),
                        (None, Some(suggestion)) => Some(suggestion.clone()),
                        (None, None) => None,
                    }
                });
                (format!("{kind:?}"), message.clone(), context)
            }
            Self::Usage(usage) => ("Usage".to_string(), usage.to_string(), None),
            Self::HelpRequested { flag, .. } => {
                ("HelpRequested".to_string(), format!("help requested for --{flag}"), None)
            }
            Self::Io(io_err) => {
                let context = match io_err.kind() {
                    std::io::ErrorKind::NotFound => Some(crate::constants::ERR_FILE_NOT_FOUND.to_string()),
                    std::io::ErrorKind::PermissionDenied => Some(crate::constants::ERR_PERMISSION.to_string()),
                    _ => None,
                };
                ("FileSystem".to_string(), io_err.to_string(), context)
            }
            Self::Json(err) => (
                "JSONParsing".to_string(),
                err.to_string(),
                Some(crate::constants::ERR_JSON_SYNTAX.to_string()),
            ),
            Self::Yaml(err) => (
                "YAMLParsing".to_string(),
                err.to_string(),
                Some(crate::constants::ERR_YAML_SYNTAX.to_string()),
            ),
            Self::Toml(err) => (
                "TOMLParsing".to_string(),
                err.to_string(),
                Some(crate::constants::ERR_TOML_SYNTAX.to_string()),
            ),
            Self::Anyhow(err) => ("Unexpected".to_string(), err.to_string(), None),
        };

        JsonError {
            error_type,
            message,
            context,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn usage_error_lists_every_issue() {
        let err = UsageError::new(vec![
            UsageIssue::InvalidValue {
                flag: "count".into(),
                reason: "expected integer".into(),
            },
            UsageIssue::MissingRequired(vec!["name".into(), "region".into()]),
        ]);
        let text = err.to_string();
        assert!(text.contains("invalid value for --count: expected integer"));
        assert!(text.contains("missing required flags: --name, --region"));
        assert_eq!(err.flag_names(), vec!["count", "name", "region"]);
    }

    #[test]
    fn programming_error_kind() {
        let err = Error::programming("positional 'x' is not a property");
        assert_eq!(err.kind(), Some(ErrorKind::Programming));
        assert!(err.to_string().contains("programming error"));
    }

    #[test]
    fn json_output_includes_details_and_suggestion() {
        let err = Error::invalid_additional_parameters("next", &["/x: unexpected property".into()]);
        let json = err.to_json();
        assert_eq!(json.error_type, "LinkResolution");
        assert_eq!(json.context.as_deref(), Some("/x: unexpected property"));
    }
}
