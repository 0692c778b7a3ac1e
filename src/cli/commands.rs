//! CLI command implementations
//!
//! Every command loads the metadata document, resolves the base type,
//! runs one query-core operation and prints a `{status, data}` envelope.

use std::path::Path;

use serde_json::json;

use crate::config::ServiceConfig;
use crate::filter::{parse_filter, EvaluationMode, FunctionCatalog, ParseContext};
use crate::metadata::{InMemoryMetadata, MetadataProvider, ResourceType};
use crate::observability::{log_event_with_fields, Event, Logger};
use crate::orderby::parse_orderby;
use crate::query::{QueryOptions, QueryProcessor};
use crate::translate::{
    translate as translate_expression, CanonicalExpressionProvider, ExpressionProvider,
    HostExpressionProvider, SqlExpressionProvider,
};

use super::args::{Cli, Command, Dialect, TargetArgs};
use super::errors::{CliError, CliResult};
use super::io::{read_entities, write_error, write_response};

/// Load configuration, or defaults when no file is given
pub fn load_config(path: Option<&Path>) -> CliResult<ServiceConfig> {
    let Some(path) = path else {
        return Ok(ServiceConfig::default());
    };
    let config = ServiceConfig::load(path)?;
    Logger::set_min_severity(config.min_severity()?);

    let path_text = path.display().to_string();
    log_event_with_fields(Event::ConfigLoaded, &[("path", path_text.as_str())]);
    Ok(config)
}

/// Metadata catalog plus the name of the requested base type
struct Target {
    metadata: InMemoryMetadata,
    type_name: String,
}

impl Target {
    fn load(args: &TargetArgs) -> CliResult<Self> {
        let metadata = InMemoryMetadata::load(&args.metadata)?;
        if metadata.resource_type(&args.resource_type).is_none() {
            return Err(CliError::metadata_error(format!(
                "Resource type '{}' not found; known types: {}",
                args.resource_type,
                metadata.type_names().join(", ")
            )));
        }
        Ok(Self {
            metadata,
            type_name: args.resource_type.clone(),
        })
    }

    fn resource_type(&self) -> CliResult<&ResourceType> {
        self.metadata.resource_type(&self.type_name).ok_or_else(|| {
            CliError::metadata_error(format!("Resource type '{}' not found", self.type_name))
        })
    }
}

/// Main CLI entry point
///
/// Failures are also reported as an error envelope on stdout.
pub fn run() -> CliResult<()> {
    let cli = Cli::parse_args();
    let result = load_config(cli.config.as_deref())
        .and_then(|config| run_command(cli.command, &config));

    if let Err(err) = &result {
        write_error(err.code_str(), err.message())?;
    }
    result
}

pub fn run_command(cmd: Command, config: &ServiceConfig) -> CliResult<()> {
    match cmd {
        Command::Translate {
            target,
            filter,
            dialect,
            binding,
        } => translate(&target, &filter, dialect, &binding),
        Command::Orderby {
            target,
            orderby: text,
        } => orderby(&target, &text),
        Command::Page {
            target,
            entities,
            query,
            base,
        } => page(&target, &entities, &query, base.as_deref(), config),
    }
}

/// Parse `$filter` and print its tree and its translation
pub fn translate(target: &TargetArgs, filter: &str, dialect: Dialect, binding: &str) -> CliResult<()> {
    let target = Target::load(target)?;
    let resource_type = target.resource_type()?;
    let catalog = FunctionCatalog::standard();

    // The host dialect is evaluated in-process and needs null guards
    let mode = match dialect {
        Dialect::Host => EvaluationMode::InProcess,
        Dialect::Sql | Dialect::Canonical => EvaluationMode::PushDown,
    };
    let ctx = ParseContext::new(&target.metadata, resource_type, &catalog).with_mode(mode);
    let expr = parse_filter(filter, ctx)?;

    let sql = SqlExpressionProvider::new();
    let host = HostExpressionProvider::new(binding);
    let provider: &dyn ExpressionProvider = match dialect {
        Dialect::Sql => &sql,
        Dialect::Host => &host,
        Dialect::Canonical => &CanonicalExpressionProvider,
    };
    let output = translate_expression(&expr, provider)?;

    write_response(json!({
        "filter": filter,
        "dialect": dialect.as_str(),
        "tree": expr.to_string(),
        "output": output,
    }))
}

/// Print the normalised sort tree of an `$orderby` clause
pub fn orderby(target: &TargetArgs, text: &str) -> CliResult<()> {
    let target = Target::load(target)?;
    let resource_type = target.resource_type()?;
    let tree = parse_orderby(text, resource_type, &target.metadata)?;

    let mut data = tree.describe();
    data["clause"] = json!(tree.clause());
    write_response(data)
}

/// Run the page pipeline over an entity file
pub fn page(
    target: &TargetArgs,
    entities_path: &Path,
    query: &str,
    base: Option<&str>,
    config: &ServiceConfig,
) -> CliResult<()> {
    let target = Target::load(target)?;
    let resource_type = target.resource_type()?;
    let catalog = FunctionCatalog::standard();
    let entities = read_entities(entities_path)?;

    let options = QueryOptions::parse(query, config)?;
    let processor = QueryProcessor::new(&target.metadata, resource_type, &catalog, config);
    let page = processor.execute(entities, &options)?;

    let base = base.unwrap_or(resource_type.name.as_str());
    write_response(json!({
        "count": page.entities.len(),
        "matched": page.matched,
        "orderby": page.orderby,
        "skiptoken": page.skiptoken,
        "next_link": page.next_link(base, &options),
        "entities": page.entities,
    }))
}
