//! CLI module
//!
//! Provides command-line access to:
//! - translate: $filter to SQL, host or canonical text
//! - orderby: $orderby to its sort tree
//! - page: one page of a JSON entity file

mod args;
mod commands;
mod errors;
mod io;

pub use args::{Cli, Command, Dialect, TargetArgs};
pub use commands::{load_config, orderby, page, run, run_command, translate};
pub use errors::{CliError, CliErrorCode, CliResult};
pub use io::{read_entities, write_error, write_response};
