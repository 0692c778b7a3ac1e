//! CLI argument definitions using clap
//!
//! Commands:
//! - odata-core translate --metadata <path> --type <name> --filter <text>
//! - odata-core orderby --metadata <path> --type <name> --orderby <text>
//! - odata-core page --metadata <path> --type <name> --entities <path>

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Query option compiler and pagination tool
#[derive(Parser, Debug)]
#[command(name = "odata-core")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Service configuration file (limits, log level)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Metadata document and the resource type queries target
#[derive(Args, Debug, Clone)]
pub struct TargetArgs {
    /// JSON metadata document: {"types": [...]}
    #[arg(long)]
    pub metadata: PathBuf,

    /// Base resource type name
    #[arg(long = "type")]
    pub resource_type: String,
}

/// Output form for translated filters
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    /// SQL predicate
    Sql,
    /// Host-language expression over a bound entity, with null guards
    Host,
    /// Normalised $filter text
    Canonical,
}

impl Dialect {
    pub fn as_str(&self) -> &'static str {
        match self {
            Dialect::Sql => "sql",
            Dialect::Host => "host",
            Dialect::Canonical => "canonical",
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Parse a $filter and translate it for a backend
    Translate {
        #[command(flatten)]
        target: TargetArgs,

        /// $filter expression text
        #[arg(long)]
        filter: String,

        #[arg(long, value_enum, default_value = "sql")]
        dialect: Dialect,

        /// Variable the host dialect reads properties from
        #[arg(long, default_value = "entity")]
        binding: String,
    },

    /// Parse an $orderby clause into its sort tree
    Orderby {
        #[command(flatten)]
        target: TargetArgs,

        /// $orderby clause text
        #[arg(long)]
        orderby: String,
    },

    /// Serve one page of a JSON entity file
    Page {
        #[command(flatten)]
        target: TargetArgs,

        /// JSON array of entities
        #[arg(long)]
        entities: PathBuf,

        /// Raw query string, e.g. "$filter=Age gt 30&$top=10"
        #[arg(long, default_value = "")]
        query: String,

        /// URL the next link continues from; defaults to the type name
        #[arg(long)]
        base: Option<String>,
    },
}

impl Cli {
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
