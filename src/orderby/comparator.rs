//! Comparator synthesis
//!
//! Each orderby segment becomes a closure over its resolved hops and
//! direction. The closure walks both entities in step; a null at any hop
//! makes the whole path null. Nulls sort first (ascending) and compare
//! equal to each other whichever hop they stopped at, the same as a SQL
//! `ORDER BY` over a nullable join. Leaf values compare by type.

use std::cell::RefCell;
use std::cmp::Ordering;

use serde_json::Value;

use crate::errors::{ODataError, ODataResult};
use crate::filter::{LiteralValue, PropertyHop};
use crate::metadata::{EdmType, ResourceInstance};

use super::tree::{OrderByPathSegment, OrderByTree};

/// Fallible comparison between two entities
pub type SegmentComparator = Box<dyn Fn(&Value, &Value) -> ODataResult<Ordering>>;

/// Sort key read off an entity; `None` when the path is null anywhere
fn read_path(hops: &[PropertyHop], entity: &Value) -> ODataResult<Option<LiteralValue>> {
    let mut current = entity;
    for hop in hops {
        match current.get_property(&hop.property)? {
            Some(next) => current = next,
            None => return Ok(None),
        }
    }
    let leaf_type = hops.last().map(|h| h.edm_type).unwrap_or(EdmType::Null);
    let value = LiteralValue::from_json(current, leaf_type)?;
    Ok((!value.is_null()).then_some(value))
}

/// Ascending comparison of two path reads
fn compare_paths(a: &Option<LiteralValue>, b: &Option<LiteralValue>) -> ODataResult<Ordering> {
    match (a, b) {
        (None, None) => Ok(Ordering::Equal),
        (None, Some(_)) => Ok(Ordering::Less),
        (Some(_), None) => Ok(Ordering::Greater),
        (Some(x), Some(y)) => x.compare(y).ok_or_else(|| {
            ODataError::internal(format!("Cannot order {} against {}", x, y))
        }),
    }
}

/// Closure comparing two entities by one orderby segment
pub fn segment_comparator(segment: &OrderByPathSegment) -> SegmentComparator {
    let hops = segment.sub_paths().to_vec();
    let direction = segment.direction();

    Box::new(move |a: &Value, b: &Value| {
        let left = read_path(&hops, a)?;
        let right = read_path(&hops, b)?;
        compare_paths(&left, &right).map(|ordering| direction.apply(ordering))
    })
}

/// Composite comparator over every segment of an orderby tree
pub struct OrderByComparator {
    segments: Vec<SegmentComparator>,
}

impl OrderByComparator {
    pub fn new(tree: &OrderByTree) -> Self {
        Self {
            segments: tree.segments().iter().map(segment_comparator).collect(),
        }
    }

    /// First non-equal segment result, else equal
    pub fn compare(&self, a: &Value, b: &Value) -> ODataResult<Ordering> {
        for segment in &self.segments {
            let ordering = segment(a, b)?;
            if ordering != Ordering::Equal {
                return Ok(ordering);
            }
        }
        Ok(Ordering::Equal)
    }

    /// Stable sort; the first comparison failure is returned
    pub fn sort(&self, entities: &mut [Value]) -> ODataResult<()> {
        let failure: RefCell<Option<ODataError>> = RefCell::new(None);

        entities.sort_by(|a, b| {
            if failure.borrow().is_some() {
                return Ordering::Equal;
            }
            self.compare(a, b).unwrap_or_else(|err| {
                *failure.borrow_mut() = Some(err);
                Ordering::Equal
            })
        });

        match failure.into_inner() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

impl std::fmt::Debug for OrderByComparator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrderByComparator")
            .field("segments", &self.segments.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::fixtures::northwind;
    use crate::metadata::MetadataProvider;
    use crate::orderby::parse_orderby;
    use serde_json::json;

    fn comparator(text: &str) -> OrderByComparator {
        let metadata = northwind();
        let customer = metadata.resource_type("Customer").unwrap();
        OrderByComparator::new(&parse_orderby(text, customer, &metadata).unwrap())
    }

    #[test]
    fn test_null_ancestor_sorts_first_ascending() {
        let cmp = comparator("Address/Country");
        let a = json!({"CustomerID": "A", "Address": null});
        let b = json!({"CustomerID": "B", "Address": {"Country": "USA"}});

        assert_eq!(cmp.compare(&a, &b).unwrap(), Ordering::Less);
        assert_eq!(cmp.compare(&b, &a).unwrap(), Ordering::Greater);
        assert_eq!(cmp.compare(&a, &a).unwrap(), Ordering::Equal);
    }

    #[test]
    fn test_null_sorts_last_descending() {
        let cmp = comparator("Address/Country desc");
        let a = json!({"Address": null});
        let b = json!({"Address": {"Country": "USA"}});
        assert_eq!(cmp.compare(&a, &b).unwrap(), Ordering::Greater);
    }

    #[test]
    fn test_null_ancestor_and_null_leaf_compare_equal() {
        let cmp = comparator("Address/Country");
        let no_address = json!({"Address": null});
        let no_country = json!({"Address": {"City": "Oslo"}});
        let null_country = json!({"Address": {"City": "Oslo", "Country": null}});

        assert_eq!(cmp.compare(&no_address, &no_country).unwrap(), Ordering::Equal);
        assert_eq!(cmp.compare(&no_country, &null_country).unwrap(), Ordering::Equal);
        assert_eq!(cmp.compare(&json!({}), &no_address).unwrap(), Ordering::Equal);
    }

    #[test]
    fn test_comparisons_are_antisymmetric() {
        let entities = [
            json!({"CustomerID": "A", "Age": 30, "Address": null}),
            json!({"CustomerID": "B", "Age": 30, "Address": {"City": "Oslo"}}),
            json!({"CustomerID": "C", "Age": 25, "Address": {"Country": null}}),
            json!({"CustomerID": "D", "Address": {"Country": "Norway"}}),
            json!({"CustomerID": "E", "Age": 41, "Address": {"Country": "USA"}}),
            json!({"CustomerID": "F", "Age": 25}),
        ];

        for clause in [
            "Address/Country",
            "Address/Country desc",
            "Age, Address/Country desc",
            "Age desc, CustomerID",
        ] {
            let cmp = comparator(clause);
            for a in &entities {
                for b in &entities {
                    let forward = cmp.compare(a, b).unwrap();
                    let backward = cmp.compare(b, a).unwrap();
                    assert_eq!(forward, backward.reverse(), "{}: {} vs {}", clause, a, b);
                }
            }
        }
    }

    #[test]
    fn test_composite_uses_first_difference() {
        let cmp = comparator("Age desc, Name");
        let a = json!({"Age": 30, "Name": "Bea"});
        let b = json!({"Age": 30, "Name": "Al"});
        let c = json!({"Age": 40, "Name": "Zed"});

        assert_eq!(cmp.compare(&a, &b).unwrap(), Ordering::Greater);
        assert_eq!(cmp.compare(&c, &a).unwrap(), Ordering::Less);
    }

    #[test]
    fn test_typed_leaf_comparisons() {
        let cmp = comparator("Since");
        let early = json!({"Since": "2019-12-31T23:59:59"});
        let late = json!({"Since": "2020-01-01T00:00:00"});
        assert_eq!(cmp.compare(&early, &late).unwrap(), Ordering::Less);

        let cmp = comparator("Balance");
        assert_eq!(
            cmp.compare(&json!({"Balance": 9.5}), &json!({"Balance": 10})).unwrap(),
            Ordering::Less
        );
    }

    #[test]
    fn test_sort_is_stable() {
        let cmp = comparator("Age");
        let mut entities = vec![
            json!({"CustomerID": "x", "Age": 2}),
            json!({"CustomerID": "y", "Age": 1}),
            json!({"CustomerID": "z", "Age": 2}),
            json!({"CustomerID": "w"}),
        ];
        cmp.sort(&mut entities).unwrap();

        let ids: Vec<&str> = entities
            .iter()
            .map(|e| e["CustomerID"].as_str().unwrap())
            .collect();
        assert_eq!(ids, vec!["w", "y", "x", "z"]);
    }

    #[test]
    fn test_sort_reports_bad_values() {
        let cmp = comparator("Age");
        let mut entities = vec![json!({"Age": 1}), json!({"Age": "old"})];
        assert!(cmp.sort(&mut entities).is_err());
    }
}
