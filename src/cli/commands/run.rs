//! Handler for `relay run`.

use super::{print_value, Session};
use crate::cli::Cli;
use crate::config::LayeredSource;
use crate::engine::executor::{self, payload_to_json};
use crate::error::Error;
use crate::invocation::{Context, ExecutorDescriptor};

pub fn execute_run(cli: &Cli, session: &Session, operation: &str, args: &[String]) -> Result<(), Error> {
    let op = session.operation(operation)?;
    let span = tracing::info_span!("operation", name = op.name());
    let source = LayeredSource::from_config(&session.config);
    let cmd_path = format!("relay run {}", op.name());

    let call = executor::prepare_call(op.as_ref(), args, &cmd_path, &source, cli.show_hidden, &span)?;
    let follow = call.follow();
    let additional = call.link_parameters()?;

    let ctx = Context::new(span);
    let result = op.execute(&ctx, call.parameters, call.configs)?;

    let output = match follow {
        Some(link) => {
            let followed =
                executor::follow_link(&session.catalog, op.as_ref(), result.as_ref(), &link, &additional, &ctx)?;
            payload_to_json(followed.as_ref())
        }
        None => payload_to_json(result.as_ref()),
    };
    print_value(&output, cli.format)
}
