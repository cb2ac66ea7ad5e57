use crate::config::ValueSource;
use crate::engine::generator::{apply_arguments, generate_operation_command};
use crate::error::{Error, UsageError, UsageIssue};
use crate::flags::{ExternalFlag, FlagSet, FlagSynthesizer, ValueResolver};
use crate::invocation::{Configs, Context, ExecutorDescriptor, OperationResult, Parameters};
use crate::link::{LinkResolver, OperationRegistry};
use serde_json::Value;
use tracing::Span;

/// Flag names owned by the surrounding command line.
pub const RESERVED_FLAG_NAMES: &[&str] = &["help"];

/// Flag selecting a link to follow after the operation succeeds.
pub const FOLLOW_FLAG: &str = "follow";

/// Repeatable `key=value` flag supplying additional link parameters.
pub const LINK_PARAM_FLAG: &str = "link-param";

/// Parameters, configs and the populated flags of one invocation.
#[derive(Debug)]
pub struct PreparedCall {
    pub flags: FlagSet,
    pub parameters: Parameters,
    pub configs: Configs,
}

impl PreparedCall {
    /// Name of the link requested with `--follow`, if any.
    #[must_use]
    pub fn follow(&self) -> Option<String> {
        let id = self.flags.lookup(FOLLOW_FLAG)?;
        match self.flags.value(id)? {
            Value::String(link) => Some(link),
            _ => None,
        }
    }

    /// Additional link parameters from `--link-param key=value`. Values are
    /// parsed as JSON when possible.
    ///
    /// # Errors
    ///
    /// Returns a usage error for an entry without `=`.
    pub fn link_parameters(&self) -> Result<Parameters, Error> {
        let mut params = Parameters::new();
        let Some(Value::Array(entries)) = self.flags.lookup(LINK_PARAM_FLAG).and_then(|id| self.flags.value(id))
        else {
            return Ok(params);
        };
        for entry in entries.iter().filter_map(Value::as_str) {
            let (key, raw) = entry.split_once('=').ok_or_else(|| {
                Error::Usage(UsageError::single(UsageIssue::InvalidValue {
                    flag: LINK_PARAM_FLAG.to_string(),
                    reason: format!("expected key=value, got '{entry}'"),
                }))
            })?;
            let value = serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()));
            params.insert(key.to_string(), value);
        }
        Ok(params)
    }
}

/// Builds the flag set of `executor`, including the flags `relay run` adds.
/// With `show_hidden`, hidden flags appear in help and completion.
///
/// # Errors
///
/// Returns a programming error if the descriptor's positional list is invalid.
pub fn build_flags(executor: &dyn ExecutorDescriptor, show_hidden: bool, span: &Span) -> Result<FlagSet, Error> {
    let extras = vec![
        (
            FOLLOW_FLAG.to_string(),
            ExternalFlag::owned("Follow the named link with the result of this call"),
        ),
        (
            LINK_PARAM_FLAG.to_string(),
            ExternalFlag::owned("Additional parameter for the followed link, as key=value (repeatable)").repeatable(),
        ),
    ];
    let mut flags = FlagSynthesizer::new(span.clone()).build_with_extras(executor, RESERVED_FLAG_NAMES, extras)?;
    if show_hidden {
        flags.reveal_hidden();
    }
    Ok(flags)
}

/// Parses command-line `args` for `executor` and resolves its inputs.
///
/// # Errors
///
/// Returns a usage error for bad input, [`Error::HelpRequested`] when help
/// was asked for, or a programming error for a malformed descriptor.
pub fn prepare_call(
    executor: &dyn ExecutorDescriptor,
    args: &[String],
    cmd_path: &str,
    source: &dyn ValueSource,
    show_hidden: bool,
    span: &Span,
) -> Result<PreparedCall, Error> {
    let _guard = span.enter();
    let mut flags = build_flags(executor, show_hidden, span)?;
    let command = generate_operation_command(executor, &flags, cmd_path);

    let parsed = match apply_arguments(command, &mut flags, args) {
        Ok(()) => None,
        Err(Error::Usage(usage)) if !is_syntax_error(&usage) => Some(usage),
        Err(err) => return Err(err),
    };
    let resolved = ValueResolver::new(source, span.clone()).resolve(&flags);

    match (parsed, resolved) {
        (None, Ok((parameters, configs))) => Ok(PreparedCall {
            flags,
            parameters,
            configs,
        }),
        (_, Err(help @ Error::HelpRequested { .. })) => Err(help),
        (Some(usage), Ok(_)) => Err(Error::Usage(usage)),
        (Some(mut usage), Err(Error::Usage(later))) => {
            merge_issues(&mut usage, later);
            Err(Error::Usage(usage))
        }
        (_, Err(err)) => Err(err),
    }
}

fn is_syntax_error(usage: &UsageError) -> bool {
    usage
        .issues
        .iter()
        .any(|issue| matches!(issue, UsageIssue::Unrecognized(_)))
}

/// Appends `later` to `usage`, dropping missing-flag reports for flags that
/// already failed to decode.
fn merge_issues(usage: &mut UsageError, later: UsageError) {
    let reported: Vec<String> = usage.flag_names().into_iter().map(str::to_string).collect();
    for issue in later.issues {
        match issue {
            UsageIssue::MissingRequired(names) => {
                let names: Vec<String> = names.into_iter().filter(|n| !reported.contains(n)).collect();
                if !names.is_empty() {
                    usage.issues.push(UsageIssue::MissingRequired(names));
                }
            }
            other => usage.issues.push(other),
        }
    }
}

/// Follows `link_name` from `result`: prepares the target's inputs and
/// executes it.
///
/// # Errors
///
/// Returns a link-resolution error if the link is unknown or cannot be
/// prepared, or the target's execution error.
pub fn follow_link(
    registry: &dyn OperationRegistry,
    executor: &dyn ExecutorDescriptor,
    result: &dyn OperationResult,
    link_name: &str,
    additional: &Parameters,
    ctx: &Context,
) -> Result<Box<dyn OperationResult>, Error> {
    let link = executor
        .links()
        .iter()
        .find(|link| link.name == link_name)
        .ok_or_else(|| Error::link_not_found(executor.name(), link_name))?;

    let resolver = LinkResolver::new(registry, ctx.span.clone());
    let target = resolver.target(link)?;
    let (parameters, configs) = resolver.prepare(result, link, additional)?;

    tracing::info!(
        link = link_name,
        from = executor.name(),
        to = target.name(),
        "following link"
    );
    target.execute(ctx, parameters, configs)
}

/// Renders a result payload for output.
#[must_use]
pub fn payload_to_json(result: &dyn OperationResult) -> Value {
    match result.payload() {
        crate::invocation::ResultPayload::Value(value) => value.clone(),
        crate::invocation::ResultPayload::Reader(bytes) => {
            Value::String(String::from_utf8_lossy(bytes).into_owned())
        }
        crate::invocation::ResultPayload::Multipart(parts) => Value::Array(
            parts
                .iter()
                .map(|part| {
                    serde_json::json!({
                        "name": part.name,
                        "contentType": part.content_type,
                        "size": part.data.len(),
                    })
                })
                .collect(),
        ),
    }
}
