use crate::error::{Error, UsageError, UsageIssue};
use crate::flags::{FlagId, FlagSet};
use crate::invocation::ExecutorDescriptor;
use clap::{Arg, ArgAction, ArgMatches, Command};

/// Id of the clap argument collecting positional arguments.
pub const POSITIONAL_ARGS_ID: &str = "__positional_args";

/// Converts a String to a 'static str by leaking it
///
/// This is necessary for clap's API which requires 'static strings.
/// In a CLI context, this is acceptable as the program runs once and exits.
fn to_static_str(s: String) -> &'static str {
    Box::leak(s.into_boxed_str())
}

/// Generates the clap command of one operation from its synthesized flags.
///
/// Every schema, child and owned external flag becomes a repeatable
/// `--name <value>` option. Positional arguments are collected verbatim and
/// bound later by [`FlagSet::bind_positionals`].
///
/// # Example
/// For an operation with properties `name` and `network.vpc`:
/// ```text
/// relay run create-volume [--name <string>] [--network <object>] [--network.vpc <string>] [name]
/// ```
#[must_use]
pub fn generate_operation_command(executor: &dyn ExecutorDescriptor, flags: &FlagSet, cmd_path: &str) -> Command {
    let mut command = Command::new(to_static_str(executor.name().to_string()))
        .about(executor.description().to_string())
        .no_binary_name(true)
        .disable_version_flag(true);

    let example = flags.usage_example(cmd_path);
    if !example.is_empty() {
        command = command.after_help(format!("Examples:\n{example}"));
    }

    for id in flags.command_flags() {
        command = command.arg(create_arg_from_flag(flags, id));
    }

    let names = flags.positional_names();
    let value_name = if names.is_empty() {
        "ARGS".to_string()
    } else {
        names.join(" ")
    };
    command.arg(
        Arg::new(POSITIONAL_ARGS_ID)
            .value_name(to_static_str(value_name))
            .help(if names.is_empty() {
                "This command takes no positional arguments".to_string()
            } else {
                format!("Positional arguments: {}", names.join(", "))
            })
            .num_args(0..)
            .action(ArgAction::Append),
    )
}

fn create_arg_from_flag(flags: &FlagSet, id: FlagId) -> Arg {
    let flag = flags.flag(id);
    let name = to_static_str(flag.name.clone());
    Arg::new(name)
        .long(name)
        .value_name(to_static_str(flag.type_tag().to_uppercase()))
        .help(flags.usage(id))
        .hide(flag.hidden)
        .num_args(1)
        .allow_hyphen_values(true)
        .action(ArgAction::Append)
}

/// Parses `args` with the generated command and feeds every flag value and
/// positional argument into `flags`, in command-line order.
///
/// # Errors
///
/// Returns [`Error::HelpRequested`] for `--help`, otherwise a usage error
/// collecting every problem.
pub fn apply_arguments(command: Command, flags: &mut FlagSet, args: &[String]) -> Result<(), Error> {
    let matches = command.try_get_matches_from(args).map_err(|err| match err.kind() {
        clap::error::ErrorKind::DisplayHelp => Error::HelpRequested {
            flag: "help".to_string(),
            help: err.to_string(),
        },
        _ => Error::Usage(UsageError::single(UsageIssue::Unrecognized(
            err.render().to_string().trim().to_string(),
        ))),
    })?;

    let mut issues = Vec::new();
    for (_, id, raw) in collect_flag_values(flags, &matches) {
        if let Err(err) = flags.set(id, &raw) {
            push_issues(err, &mut issues);
        }
    }

    let positional: Vec<String> = matches
        .get_many::<String>(POSITIONAL_ARGS_ID)
        .map(|values| values.cloned().collect())
        .unwrap_or_default();
    if let Err(err) = flags.bind_positionals(&positional) {
        push_issues(err, &mut issues);
    }

    if issues.is_empty() {
        Ok(())
    } else {
        Err(Error::Usage(UsageError::new(issues)))
    }
}

fn collect_flag_values(flags: &FlagSet, matches: &ArgMatches) -> Vec<(usize, FlagId, String)> {
    let mut values = Vec::new();
    for id in flags.command_flags() {
        let name = flags.name(id);
        let (Some(indices), Some(raw)) = (matches.indices_of(name), matches.get_many::<String>(name)) else {
            continue;
        };
        values.extend(indices.zip(raw).map(|(index, raw)| (index, id, raw.clone())));
    }
    values.sort_by_key(|(index, _, _)| *index);
    values
}

fn push_issues(err: Error, issues: &mut Vec<UsageIssue>) {
    match err {
        Error::Usage(usage) => issues.extend(usage.issues),
        other => issues.push(UsageIssue::Unrecognized(other.to_string())),
    }
}
