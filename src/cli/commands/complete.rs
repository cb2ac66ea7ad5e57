//! Handler for `relay complete`.

use super::Session;
use crate::cli::Cli;
use crate::engine::executor;
use crate::error::Error;
use crate::flags::CompletionProvider;
use crate::invocation::ExecutorDescriptor;

/// Prints completion candidates for `args`, whose last element is the word
/// being completed.
pub fn execute_complete(cli: &Cli, session: &Session, operation: &str, args: &[String]) -> Result<(), Error> {
    let op = session.operation(operation)?;
    let span = tracing::debug_span!("complete", operation = op.name());
    let flags = executor::build_flags(op.as_ref(), cli.show_hidden, &span)?;

    let (to_complete, words) = args
        .split_last()
        .map_or(("", args), |(last, words)| (last.as_str(), words));
    let completion = CompletionProvider::new(&flags, span).complete_command_line(words, to_complete);
    // ast-grep-ignore: no-println
    print!("{}", completion.render());
    Ok(())
}
