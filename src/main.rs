use clap::Parser;
use relay_cli::cli::commands::{catalog, complete, run, Session};
use relay_cli::cli::errors::print_error_with_json;
use relay_cli::cli::tracing_init::init_tracing;
use relay_cli::cli::{Cli, Commands};
use relay_cli::error::Error;

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbosity);
    let json_errors = cli.json_errors;

    match run_command(&cli) {
        Ok(()) => {}
        Err(Error::HelpRequested { help, .. }) => {
            // ast-grep-ignore: no-println
            println!("{help}");
        }
        Err(e) => {
            print_error_with_json(&e, json_errors);
            std::process::exit(1);
        }
    }
}

fn run_command(cli: &Cli) -> Result<(), Error> {
    let session = Session::load(cli)?;
    match &cli.command {
        Commands::List => catalog::execute_list(&session),
        Commands::Links { operation } => catalog::execute_links(cli, &session, operation)?,
        Commands::Run { operation, args } => run::execute_run(cli, &session, operation, args)?,
        Commands::Complete { operation, args } => complete::execute_complete(cli, &session, operation, args)?,
    }
    Ok(())
}
