//! Next-page resolution
//!
//! The token's values are written into a synthetic key object of the base
//! resource type, which is then located in the sorted page with the same
//! comparator that sorted it.

use std::cmp::Ordering;

use serde_json::Value;

use crate::errors::ODataResult;
use crate::filter::{LiteralValue, PropertyHop};
use crate::metadata::{MetadataProvider, ResourceInstance, ResourceType};
use crate::orderby::{OrderByComparator, OrderByTree};

use super::codec::{build_skiptoken, parse_skiptoken, SkipToken};

/// Key object carrying only the orderby paths, set to the token's values.
///
/// Intermediate objects are created as needed for non-null values. A null
/// value leaves the path unset, which the comparator reads as null no
/// matter where the entity's own path stopped.
pub fn build_key_object(
    token: &SkipToken,
    tree: &OrderByTree,
    base_type: &ResourceType,
    metadata: &dyn MetadataProvider,
) -> ODataResult<Value> {
    let mut key = Value::new_instance(base_type);
    for (value, segment) in token.values().iter().zip(tree.segments()) {
        if value.is_null() {
            continue;
        }
        assign_path(&mut key, segment.sub_paths(), value, metadata)?;
    }
    Ok(key)
}

fn assign_path(
    node: &mut Value,
    hops: &[PropertyHop],
    value: &LiteralValue,
    metadata: &dyn MetadataProvider,
) -> ODataResult<()> {
    let Some((hop, rest)) = hops.split_first() else {
        return Ok(());
    };
    if rest.is_empty() {
        return node.set_property(&hop.property, value.to_json());
    }

    let mut child = match node.get_property(&hop.property)? {
        Some(existing) => existing.clone(),
        None => Value::new_instance(metadata.target_type(&hop.property)?),
    };
    assign_path(&mut child, rest, value, metadata)?;
    node.set_property(&hop.property, child)
}

/// Index the next page starts at, `None` when nothing follows the key.
///
/// Upper-bound search: the first entity ordered strictly after the key.
/// An exact match at `m` resumes at `m + 1` (after the last of any tied
/// run); a key between entities resumes at the insertion point.
pub fn resolve_next_page_start(
    sorted_page: &[Value],
    key: &Value,
    comparator: &OrderByComparator,
) -> ODataResult<Option<usize>> {
    let (mut low, mut high) = (0, sorted_page.len());
    while low < high {
        let mid = low + (high - low) / 2;
        if comparator.compare(key, &sorted_page[mid])? == Ordering::Less {
            high = mid;
        } else {
            low = mid + 1;
        }
    }
    Ok((low < sorted_page.len()).then_some(low))
}

/// Skiptoken operations bound to one request's orderby tree
pub struct SkipTokenResolver<'a> {
    tree: &'a OrderByTree,
    base_type: &'a ResourceType,
    metadata: &'a dyn MetadataProvider,
    comparator: OrderByComparator,
}

impl<'a> SkipTokenResolver<'a> {
    pub fn new(
        tree: &'a OrderByTree,
        base_type: &'a ResourceType,
        metadata: &'a dyn MetadataProvider,
    ) -> Self {
        Self {
            tree,
            base_type,
            metadata,
            comparator: OrderByComparator::new(tree),
        }
    }

    pub fn comparator(&self) -> &OrderByComparator {
        &self.comparator
    }

    pub fn parse(&self, text: &str) -> ODataResult<SkipToken> {
        parse_skiptoken(text, self.tree)
    }

    pub fn key_object(&self, token: &SkipToken) -> ODataResult<Value> {
        build_key_object(token, self.tree, self.base_type, self.metadata)
    }

    /// Start index of the page following `token` in `sorted_page`
    pub fn resolve(&self, sorted_page: &[Value], token: &SkipToken) -> ODataResult<Option<usize>> {
        let key = self.key_object(token)?;
        resolve_next_page_start(sorted_page, &key, &self.comparator)
    }

    pub fn build(&self, last_entity: &Value) -> ODataResult<String> {
        build_skiptoken(last_entity, self.tree)
    }
}
