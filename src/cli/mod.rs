pub mod commands;
pub mod errors;
pub mod tracing_init;

use clap::{ArgAction, Parser, Subcommand, ValueEnum};

#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Output as JSON (default)
    #[default]
    Json,
    /// Output as YAML
    Yaml,
}

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Relay: schema-driven command line for operation catalogs",
    long_about = "Relay turns every operation of a catalog into a command whose flags,\n\
                  positional arguments and shell completions come from the operation's\n\
                  parameter and config schemas. Results can be chained into further\n\
                  operations through declared links.\n\n\
                  Examples:\n  \
                  relay --catalog volumes.yaml list\n  \
                  relay run create-volume data --size=10\n  \
                  relay run create-volume data --follow get --link-param verbose=true\n  \
                  relay complete create-volume --type="
)]
pub struct Cli {
    /// Operation catalog (YAML or JSON)
    #[arg(long, global = true, env = "RELAY_CATALOG", value_name = "FILE")]
    pub catalog: Option<String>,

    /// Configuration file (defaults to <config dir>/relay/config.toml)
    #[arg(long, global = true, value_name = "FILE")]
    pub config_file: Option<String>,

    /// Output all errors as structured JSON to stderr
    #[arg(long, global = true, help = "Output errors in JSON format")]
    pub json_errors: bool,

    /// Increase logging verbosity
    #[arg(
        short = 'v',
        global = true,
        action = ArgAction::Count,
        help = "Increase logging verbosity (-v for debug, -vv for trace)"
    )]
    pub verbosity: u8,

    /// Show hidden operation flags in help and completion
    #[arg(long, global = true, env = "RELAY_SHOW_HIDDEN")]
    pub show_hidden: bool,

    /// Output format for results
    #[arg(long, global = true, value_enum, default_value = "json")]
    pub format: OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List the operations of the catalog
    List,
    /// Run an operation; everything after its name is parsed by the operation
    Run {
        operation: String,
        #[arg(trailing_var_arg = true, allow_hyphen_values = true, num_args = 0..)]
        args: Vec<String>,
    },
    /// Describe the links of an operation
    Links { operation: String },
    /// Print shell completion candidates for a partial command line
    ///
    /// The last argument is the word being completed (possibly empty).
    Complete {
        operation: String,
        #[arg(trailing_var_arg = true, allow_hyphen_values = true, num_args = 0..)]
        args: Vec<String>,
    },
}
