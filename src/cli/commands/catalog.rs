//! Handlers for `relay list` and `relay links`.

use super::{print_value, Session};
use crate::cli::Cli;
use crate::error::Error;
use crate::invocation::ExecutorDescriptor;
use crate::link::LinkResolver;

pub fn execute_list(session: &Session) {
    let width = session
        .catalog
        .operations()
        .map(|op| op.name().len())
        .max()
        .unwrap_or(0);
    // ast-grep-ignore: no-println
    println!("Operations in '{}':", session.catalog.name);
    for op in session.catalog.operations() {
        // ast-grep-ignore: no-println
        println!("  {:<width$}  {} {}", op.name(), op.method(), op.path());
        if !op.description().is_empty() {
            // ast-grep-ignore: no-println
            println!("  {:<width$}  {}", "", op.description());
        }
    }
}

pub fn execute_links(cli: &Cli, session: &Session, operation: &str) -> Result<(), Error> {
    let op = session.operation(operation)?;
    let span = tracing::info_span!("links", operation = op.name());
    let resolver = LinkResolver::new(&session.catalog, span);
    let descriptions: Vec<_> = op.links().iter().map(|link| resolver.describe(link)).collect();
    print_value(&serde_json::to_value(descriptions)?, cli.format)
}
