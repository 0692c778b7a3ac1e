//! Server-driven paging over sorted results
//!
//! Follows next links page by page and checks that the concatenated
//! pages equal the full sorted result, with no entity repeated or lost.

mod common;

use std::cmp::Ordering;

use serde_json::Value;

use odata_core::config::ServiceConfig;
use odata_core::errors::ODataErrorCode;
use odata_core::filter::FunctionCatalog;
use odata_core::metadata::{InMemoryMetadata, MetadataProvider};
use odata_core::orderby::{parse_orderby, OrderByComparator};
use odata_core::query::{QueryOptions, QueryPage, QueryProcessor};

const BASE: &str = "http://host/svc/Customers";

fn config(page_size: usize) -> ServiceConfig {
    ServiceConfig {
        max_page_size: Some(page_size),
        ..ServiceConfig::default()
    }
}

fn run(metadata: &InMemoryMetadata, config: &ServiceConfig, query: &str) -> (QueryPage, QueryOptions) {
    run_over(common::customers(), metadata, config, query)
}

fn run_over(
    entities: Vec<Value>,
    metadata: &InMemoryMetadata,
    config: &ServiceConfig,
    query: &str,
) -> (QueryPage, QueryOptions) {
    let catalog = FunctionCatalog::standard();
    let customer = metadata.resource_type("Customer").unwrap();
    let options = QueryOptions::parse(query, config).unwrap();
    let page = QueryProcessor::new(metadata, customer, &catalog, config)
        .execute(entities, &options)
        .unwrap();
    (page, options)
}

/// Every page's ids, following next links until none is returned
fn walk(config: &ServiceConfig, query: &str) -> Vec<Vec<String>> {
    walk_over(common::customers, config, query)
}

fn walk_over(source: fn() -> Vec<Value>, config: &ServiceConfig, query: &str) -> Vec<Vec<String>> {
    let metadata = common::catalog();
    let mut pages = Vec::new();
    let mut query = query.to_string();

    loop {
        let (page, options) = run_over(source(), &metadata, config, &query);
        pages.push(common::ids(&page.entities));
        match page.next_link(BASE, &options) {
            Some(link) => {
                let (_, next) = link.split_once('?').unwrap();
                query = next.to_string();
            }
            None => break,
        }
        assert!(pages.len() < 20, "paging did not terminate");
    }
    pages
}

fn strs(ids: &[&str]) -> Vec<String> {
    ids.iter().map(|s| s.to_string()).collect()
}

// =============================================================================
// PAGE CHAINING
// =============================================================================

#[test]
fn test_descending_sort_with_tied_ages() {
    let pages = walk(&config(5), "$orderby=Age desc");
    assert_eq!(
        pages,
        vec![
            strs(&["BSBEV", "BLAUS", "AROUT", "BONAP", "ALFKI"]),
            strs(&["ANTON", "BLONP", "ANATR", "BERGS", "BOTTM"]),
            strs(&["BOLID", "CACTU"]),
        ]
    );
}

#[test]
fn test_string_keys_with_quotes_and_spaces() {
    let pages = walk(&config(5), "$orderby=Name");
    assert_eq!(
        pages,
        vec![
            strs(&["ALFKI", "ANATR", "ANTON", "AROUT", "BSBEV"]),
            strs(&["BERGS", "BLAUS", "BLONP", "BOLID", "BONAP"]),
            strs(&["BOTTM", "CACTU"]),
        ]
    );
}

#[test]
fn test_nested_path_with_null_intermediates() {
    let pages = walk(&config(2), "$orderby=Address/Country");
    let flat: Vec<String> = pages.into_iter().flatten().collect();
    assert_eq!(
        flat,
        strs(&[
            "BERGS", "CACTU", "BOTTM", "BLONP", "BONAP", "ALFKI", "BLAUS", "ANATR", "ANTON",
            "BOLID", "AROUT", "BSBEV",
        ])
    );
}

#[test]
fn test_null_country_at_page_boundary() {
    let expected = strs(&[
        "BERGS", "CACTU", "CHOPS", "COMMI", "BOTTM", "BLONP", "BONAP", "ALFKI", "BLAUS", "ANATR",
        "ANTON", "BOLID", "AROUT", "BSBEV",
    ]);

    for page_size in [1, 2, 3] {
        let pages = walk_over(
            common::customers_with_partial_addresses,
            &config(page_size),
            "$orderby=Address/Country",
        );
        let flat: Vec<String> = pages.into_iter().flatten().collect();
        assert_eq!(flat, expected, "page size {}", page_size);
    }

    let pages = walk_over(
        common::customers_with_partial_addresses,
        &config(3),
        "$orderby=Address/Country desc",
    );
    assert_eq!(pages.last().unwrap(), &strs(&["CHOPS", "COMMI"]));
}

#[test]
fn test_orderings_are_antisymmetric_over_fixture() {
    let metadata = common::catalog();
    let customer = metadata.resource_type("Customer").unwrap();
    let all = common::customers_with_partial_addresses();

    for text in ["Address/Country", "Address/Country desc", "Age desc, Address/Country", "Name"] {
        let tree = parse_orderby(text, customer, &metadata)
            .unwrap()
            .with_key_tiebreakers(customer);
        let cmp = OrderByComparator::new(&tree);
        for a in &all {
            for b in &all {
                let forward = cmp.compare(a, b).unwrap();
                assert_eq!(forward, cmp.compare(b, a).unwrap().reverse(), "{}", text);
                if a["CustomerID"] == b["CustomerID"] {
                    assert_eq!(forward, Ordering::Equal);
                } else {
                    assert_ne!(forward, Ordering::Equal, "{}", text);
                }
            }
        }
    }
}

#[test]
fn test_pages_agree_with_full_sort() {
    let metadata = common::catalog();
    let customer = metadata.resource_type("Customer").unwrap();
    let tree = parse_orderby("Age, Name desc", customer, &metadata)
        .unwrap()
        .with_key_tiebreakers(customer);
    let mut all = common::customers();
    OrderByComparator::new(&tree).sort(&mut all).unwrap();

    let paged: Vec<String> = walk(&config(3), "$orderby=Age,Name desc")
        .into_iter()
        .flatten()
        .collect();
    assert_eq!(paged, common::ids(&all));
}

#[test]
fn test_filter_and_top_carry_across_pages() {
    let pages = walk(&config(2), "$filter=Age lt 40&$orderby=Age&$top=5");
    assert_eq!(
        pages,
        vec![
            strs(&["BOLID", "CACTU"]),
            strs(&["ANATR", "BERGS"]),
            strs(&["BOTTM"]),
        ]
    );
}

#[test]
fn test_no_paging_returns_everything() {
    let config = ServiceConfig {
        max_page_size: None,
        ..ServiceConfig::default()
    };
    let metadata = common::catalog();
    let (page, _) = run(&metadata, &config, "$orderby=Age desc");
    assert_eq!(page.entities.len(), 12);
    assert!(!page.has_next());
    assert_eq!(page.orderby, "Age desc");
}

// =============================================================================
// TOKEN HANDLING
// =============================================================================

#[test]
fn test_next_link_shape() {
    let metadata = common::catalog();
    let (page, options) = run(&metadata, &config(5), "$orderby=Age desc&$top=7");
    assert_eq!(page.skiptoken.as_deref(), Some("34, 'ALFKI'"));
    assert_eq!(
        page.next_link(BASE, &options).unwrap(),
        "http://host/svc/Customers?%24orderby=Age+desc&%24top=2&%24skiptoken=34%2C+%27ALFKI%27"
    );
}

#[test]
fn test_token_past_the_end_yields_empty_page() {
    let metadata = common::catalog();
    let (page, _) = run(&metadata, &config(5), "$orderby=Age&$skiptoken=99,'ZZZZZ'");
    assert!(page.entities.is_empty());
    assert!(!page.has_next());
}

#[test]
fn test_mismatched_tokens_rejected() {
    let metadata = common::catalog();
    let customer = metadata.resource_type("Customer").unwrap();
    let catalog = FunctionCatalog::standard();
    let config = config(5);
    let processor = QueryProcessor::new(&metadata, customer, &catalog, &config);

    for query in [
        "$orderby=Age&$skiptoken=30",
        "$orderby=Age&$skiptoken='x','ALFKI'",
        "$orderby=Age&$skiptoken=30,'A',1",
    ] {
        let options = QueryOptions::parse(query, &config).unwrap();
        let err = processor
            .execute(common::customers(), &options)
            .unwrap_err();
        assert_eq!(err.code(), ODataErrorCode::SkipTokenMismatch, "{}", query);
    }
}

#[test]
fn test_unsortable_orderby_rejected() {
    let metadata = common::catalog();
    let customer = metadata.resource_type("Customer").unwrap();
    for text in ["Address", "BestFriend", "Age sideways", "Age,,Name", "Address//City"] {
        let err = parse_orderby(text, customer, &metadata).unwrap_err();
        assert_eq!(err.code(), ODataErrorCode::InvalidOrderBy, "{}", text);
    }
}

#[test]
fn test_entities_stay_json() {
    let metadata = common::catalog();
    let (page, _) = run(&metadata, &config(1), "$filter=CustomerID eq 'BONAP'");
    assert_eq!(page.entities[0]["Name"], Value::from("Bon app'"));
}
