//! Schema-driven command-line engine.
//!
//! Operations described by JSON-Schema-like parameter and config schemas are
//! turned into flags, positional arguments and shell completions; their
//! results can be chained into further operations through links.

pub mod catalog;
pub mod cli;
pub mod config;
pub mod constants;
pub mod engine;
pub mod error;
pub mod flags;
pub mod fs;
pub mod invocation;
pub mod link;
pub mod logging;
pub mod schema;
pub mod utils;
