//! # Page Pipeline
//!
//! Runs the query options over an in-memory entity set:
//!
//! filter → sort → skiptoken → `$skip` → `$top` → server page size
//!
//! When server paging is on, the key properties of the base type are
//! appended to the sort so every skiptoken names one resumption point.

use serde_json::Value;

use crate::config::ServiceConfig;
use crate::errors::ODataResult;
use crate::filter::{matches, parse_filter, EvaluationMode, Expression, FunctionCatalog, ParseContext};
use crate::metadata::{MetadataProvider, ResourceType};
use crate::observability::{log_event_with_fields, Event};
use crate::orderby::{parse_orderby, OrderByTree};
use crate::skiptoken::SkipTokenResolver;

use super::options::{next_link, QueryOptions};

/// One page of results
#[derive(Debug, Clone, PartialEq)]
pub struct QueryPage {
    pub entities: Vec<Value>,
    /// Continuation token when the server page size cut the result
    pub skiptoken: Option<String>,
    /// Entities that passed `$filter`
    pub matched: usize,
    /// Effective sort, including key tiebreakers
    pub orderby: String,
}

impl QueryPage {
    pub fn has_next(&self) -> bool {
        self.skiptoken.is_some()
    }

    /// Continuation URL for the following page
    pub fn next_link(&self, base: &str, options: &QueryOptions) -> Option<String> {
        self.skiptoken.as_ref().map(|token| {
            next_link(base, &options.continuation(self.entities.len()), token)
        })
    }
}

/// Executes query options against one entity set
pub struct QueryProcessor<'a> {
    metadata: &'a dyn MetadataProvider,
    resource_type: &'a ResourceType,
    catalog: &'a FunctionCatalog,
    config: &'a ServiceConfig,
}

impl<'a> QueryProcessor<'a> {
    pub fn new(
        metadata: &'a dyn MetadataProvider,
        resource_type: &'a ResourceType,
        catalog: &'a FunctionCatalog,
        config: &'a ServiceConfig,
    ) -> Self {
        Self {
            metadata,
            resource_type,
            catalog,
            config,
        }
    }

    /// Parse `$filter` for in-process evaluation, with null guards
    pub fn filter(&self, text: &str) -> ODataResult<Expression> {
        let ctx = ParseContext::new(self.metadata, self.resource_type, self.catalog)
            .with_mode(EvaluationMode::InProcess);
        let expr = parse_filter(text, ctx)?;
        let rendered = expr.to_string();
        log_event_with_fields(
            Event::FilterParsed,
            &[("filter", text), ("tree", rendered.as_str())],
        );
        Ok(expr)
    }

    /// Sort tree for the request; keys are appended when paging or resuming
    pub fn orderby_tree(&self, options: &QueryOptions) -> ODataResult<OrderByTree> {
        let tree = match &options.orderby {
            Some(text) => parse_orderby(text, self.resource_type, self.metadata)?,
            None => OrderByTree::empty(self.resource_type),
        };
        let tree = if self.config.paging_enabled() || options.skiptoken.is_some() {
            tree.with_key_tiebreakers(self.resource_type)
        } else {
            tree
        };

        if options.orderby.is_some() {
            let clause = tree.clause();
            log_event_with_fields(Event::OrderByParsed, &[("clause", clause.as_str())]);
        }
        Ok(tree)
    }

    /// Produce the page `options` select from `entities`
    pub fn execute(&self, entities: Vec<Value>, options: &QueryOptions) -> ODataResult<QueryPage> {
        self.run(entities, options).map_err(|err| {
            log_event_with_fields(
                Event::QueryRejected,
                &[("code", err.code().code()), ("reason", err.message())],
            );
            err
        })
    }

    fn run(&self, entities: Vec<Value>, options: &QueryOptions) -> ODataResult<QueryPage> {
        let mut results = match &options.filter {
            Some(text) => {
                let filter = self.filter(text)?;
                let mut kept = Vec::with_capacity(entities.len());
                for entity in entities {
                    if matches(&filter, &entity)? {
                        kept.push(entity);
                    }
                }
                kept
            }
            None => entities,
        };
        let matched = results.len();

        let tree = self.orderby_tree(options)?;
        let resolver = SkipTokenResolver::new(&tree, self.resource_type, self.metadata);
        if !tree.is_empty() {
            resolver.comparator().sort(&mut results)?;
        }

        if let Some(text) = &options.skiptoken {
            let token = resolver.parse(text)?;
            let start = resolver.resolve(&results, &token)?;
            let start_field = start.map_or_else(|| "none".to_string(), |i| i.to_string());
            log_event_with_fields(
                Event::SkipTokenResolved,
                &[("skiptoken", text.as_str()), ("start", start_field.as_str())],
            );
            match start {
                Some(index) => {
                    results.drain(..index);
                }
                None => results.clear(),
            }
        }

        if let Some(skip) = options.skip {
            results.drain(..skip.min(results.len()));
        }
        if let Some(top) = options.top {
            results.truncate(top);
        }

        let mut skiptoken = None;
        if let Some(page_size) = self.config.max_page_size {
            if results.len() > page_size {
                results.truncate(page_size);
                if let Some(last) = results.last() {
                    skiptoken = Some(resolver.build(last)?);
                }
            }
        }

        let count = results.len().to_string();
        let matched_field = matched.to_string();
        log_event_with_fields(
            Event::PageServed,
            &[
                ("count", count.as_str()),
                ("matched", matched_field.as_str()),
                ("next", if skiptoken.is_some() { "true" } else { "false" }),
                ("resource_type", self.resource_type.name.as_str()),
            ],
        );

        Ok(QueryPage {
            entities: results,
            skiptoken,
            matched,
            orderby: tree.clause(),
        })
    }
}
