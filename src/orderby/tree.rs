//! `$orderby` parsing
//!
//! A clause is a comma separated list of property paths, each optionally
//! followed by `asc` or `desc`. Paths resolve hop by hop exactly like
//! `$filter` property chains; the last hop is the sort key and must be a
//! sortable primitive.

use std::cmp::Ordering;

use serde::Serialize;
use serde_json::Value;

use crate::errors::{ODataError, ODataResult};
use crate::filter::{resolve_path, PropertyAccessExpr, PropertyHop};
use crate::metadata::{EdmType, MetadataProvider, ResourceType};

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        }
    }

    /// Orient an ascending comparison result
    pub fn apply(&self, ordering: Ordering) -> Ordering {
        match self {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        }
    }
}

/// Traversal hop of an orderby path
pub type SubPathSegment = PropertyHop;

/// One comma separated clause
#[derive(Debug, Clone, PartialEq)]
pub struct OrderByPathSegment {
    path: PropertyAccessExpr,
    direction: SortDirection,
}

impl OrderByPathSegment {
    pub fn new(path: PropertyAccessExpr, direction: SortDirection) -> Self {
        Self { path, direction }
    }

    /// Hops root first; all but the last are traversal only
    pub fn sub_paths(&self) -> &[SubPathSegment] {
        self.path.hops()
    }

    pub fn path(&self) -> &PropertyAccessExpr {
        &self.path
    }

    pub fn direction(&self) -> SortDirection {
        self.direction
    }

    /// Declared type of the sort key
    pub fn key_type(&self) -> EdmType {
        self.path.edm_type()
    }

    /// Clause text, direction included only when descending
    pub fn clause(&self) -> String {
        match self.direction {
            SortDirection::Asc => self.path.path(),
            SortDirection::Desc => format!("{} desc", self.path.path()),
        }
    }
}

/// Parsed `$orderby`, rooted at the request's base resource type
#[derive(Debug, Clone, PartialEq)]
pub struct OrderByTree {
    root: String,
    segments: Vec<OrderByPathSegment>,
}

impl OrderByTree {
    /// Tree with no segments
    pub fn empty(root: &ResourceType) -> Self {
        Self {
            root: root.name.clone(),
            segments: Vec::new(),
        }
    }

    pub fn root(&self) -> &str {
        &self.root
    }

    pub fn segments(&self) -> &[OrderByPathSegment] {
        &self.segments
    }

    /// Number of sort keys, the arity of a matching skiptoken
    pub fn leaf_count(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn push(&mut self, segment: OrderByPathSegment) {
        self.segments.push(segment);
    }

    /// Append ascending key properties not already used as sort keys, so
    /// the ordering is total over distinct entities
    pub fn with_key_tiebreakers(mut self, resource_type: &ResourceType) -> Self {
        for key in resource_type.key_properties() {
            let already_sorted = self
                .segments
                .iter()
                .any(|s| s.path.depth() == 1 && s.path.path() == key.name);
            if !already_sorted {
                let path = PropertyAccessExpr::new(vec![PropertyHop::new(key.clone())]);
                self.segments
                    .push(OrderByPathSegment::new(path, SortDirection::Asc));
            }
        }
        self
    }

    /// Normalised `$orderby` text
    pub fn clause(&self) -> String {
        self.segments
            .iter()
            .map(OrderByPathSegment::clause)
            .collect::<Vec<_>>()
            .join(",")
    }

    /// JSON description for tooling output
    pub fn describe(&self) -> Value {
        let segments: Vec<Value> = self
            .segments
            .iter()
            .map(|s| {
                serde_json::json!({
                    "path": s.path.path(),
                    "type": s.key_type().name(),
                    "direction": s.direction.as_str(),
                })
            })
            .collect();
        serde_json::json!({ "root": self.root, "segments": segments })
    }
}

/// Parse `$orderby` text against `base_type`
pub fn parse_orderby(
    text: &str,
    base_type: &ResourceType,
    metadata: &dyn MetadataProvider,
) -> ODataResult<OrderByTree> {
    let mut tree = OrderByTree::empty(base_type);

    for clause in text.split(',') {
        let mut words = clause.split_whitespace();
        let path = words
            .next()
            .ok_or_else(|| ODataError::invalid_orderby(format!("Empty clause in '{}'", text)))?;

        let direction = match words.next() {
            None => SortDirection::Asc,
            Some("asc") => SortDirection::Asc,
            Some("desc") => SortDirection::Desc,
            Some(other) => {
                return Err(ODataError::invalid_orderby(format!(
                    "Expected 'asc' or 'desc' after '{}', found '{}'",
                    path, other
                )))
            }
        };
        if let Some(extra) = words.next() {
            return Err(ODataError::invalid_orderby(format!(
                "Unexpected '{}' in clause '{}'",
                extra,
                clause.trim()
            )));
        }

        let segments: Vec<&str> = path.split('/').collect();
        if segments.iter().any(|s| s.is_empty()) {
            return Err(ODataError::invalid_orderby(format!(
                "Malformed property path '{}'",
                path
            )));
        }

        let chain = resolve_path(metadata, base_type, &segments)?;
        let key_type = chain.edm_type();
        if !key_type.is_primitive() {
            return Err(ODataError::invalid_orderby(format!(
                "Cannot order by non-primitive property '{}'",
                path
            )));
        }
        if key_type == EdmType::Binary {
            return Err(ODataError::invalid_orderby(format!(
                "Cannot order by {} property '{}'",
                key_type, path
            )));
        }

        tree.push(OrderByPathSegment::new(chain, direction));
    }

    Ok(tree)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ODataErrorCode;
    use crate::metadata::fixtures::northwind;
    use crate::metadata::InMemoryMetadata;

    fn orderby(metadata: &InMemoryMetadata, text: &str) -> ODataResult<OrderByTree> {
        let customer = metadata.resource_type("Customer").unwrap();
        parse_orderby(text, customer, metadata)
    }

    #[test]
    fn test_parse_segments() {
        let metadata = northwind();
        let tree = orderby(&metadata, "Name desc, Address/Country,Age asc").unwrap();

        assert_eq!(tree.root(), "Customer");
        assert_eq!(tree.leaf_count(), 3);
        assert_eq!(tree.segments()[0].direction(), SortDirection::Desc);
        assert_eq!(tree.segments()[1].sub_paths().len(), 2);
        assert_eq!(tree.segments()[1].key_type(), EdmType::String);
        assert_eq!(tree.clause(), "Name desc,Address/Country,Age");
    }

    #[test]
    fn test_rejects_bad_clauses() {
        let metadata = northwind();

        let err = orderby(&metadata, "Address").unwrap_err();
        assert_eq!(err.code(), ODataErrorCode::InvalidOrderBy);

        let err = orderby(&metadata, "Name sideways").unwrap_err();
        assert!(err.message().contains("sideways"));

        assert!(orderby(&metadata, "Name,").is_err());
        assert!(orderby(&metadata, "Name asc desc").is_err());
        assert!(orderby(&metadata, "Photo").is_err());

        let err = orderby(&metadata, "Orders/Total").unwrap_err();
        assert_eq!(err.code(), ODataErrorCode::CollectionNotAllowed);

        let err = orderby(&metadata, "Nickname").unwrap_err();
        assert_eq!(err.code(), ODataErrorCode::UnknownProperty);
    }

    #[test]
    fn test_key_tiebreakers() {
        let metadata = northwind();
        let customer = metadata.resource_type("Customer").unwrap();

        let tree = orderby(&metadata, "Name").unwrap().with_key_tiebreakers(customer);
        assert_eq!(tree.clause(), "Name,CustomerID");

        let tree = orderby(&metadata, "CustomerID desc")
            .unwrap()
            .with_key_tiebreakers(customer);
        assert_eq!(tree.clause(), "CustomerID desc");

        let tree = OrderByTree::empty(customer).with_key_tiebreakers(customer);
        assert_eq!(tree.leaf_count(), 1);
    }

    #[test]
    fn test_describe() {
        let metadata = northwind();
        let tree = orderby(&metadata, "Since desc").unwrap();
        let json = tree.describe();
        assert_eq!(json["root"], "Customer");
        assert_eq!(json["segments"][0]["type"], "Edm.DateTime");
        assert_eq!(json["segments"][0]["direction"], "desc");
    }
}
