//! Config file → query options → page, as a service front end drives it

mod common;

use std::io::Write;

use odata_core::config::{ConfigError, ServiceConfig};
use odata_core::errors::ODataErrorCode;
use odata_core::filter::FunctionCatalog;
use odata_core::metadata::{InMemoryMetadata, MetadataProvider};
use odata_core::observability::Severity;
use odata_core::query::{QueryOptions, QueryProcessor};

fn config_file(json: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, "{}", json).unwrap();
    file
}

// =============================================================================
// CONFIGURATION
// =============================================================================

#[test]
fn test_config_file_drives_limits() {
    let file = config_file(r#"{"max_page_size": 3, "max_top": 10, "log_level": "warn"}"#);
    let config = ServiceConfig::load(file.path()).unwrap();
    assert_eq!(config.max_page_size, Some(3));
    assert_eq!(config.max_top, 10);
    assert_eq!(config.max_batch_parts, ServiceConfig::default().max_batch_parts);
    assert_eq!(config.min_severity().unwrap(), Severity::Warn);

    let err = QueryOptions::parse("$top=11", &config).unwrap_err();
    assert_eq!(err.code(), ODataErrorCode::InvalidQueryOption);
}

#[test]
fn test_null_page_size_disables_paging() {
    let file = config_file(r#"{"max_page_size": null}"#);
    let config = ServiceConfig::load(file.path()).unwrap();
    assert!(!config.paging_enabled());
}

#[test]
fn test_bad_config_files() {
    let file = config_file("{not json");
    assert!(matches!(
        ServiceConfig::load(file.path()),
        Err(ConfigError::Parse(_))
    ));

    let file = config_file(r#"{"max_top": 0}"#);
    assert!(matches!(
        ServiceConfig::load(file.path()),
        Err(ConfigError::Invalid(_))
    ));

    let missing = std::env::temp_dir().join("odata-core-missing-config.json");
    assert!(matches!(
        ServiceConfig::load(&missing),
        Err(ConfigError::Read(_))
    ));
}

// =============================================================================
// PIPELINE
// =============================================================================

fn execute(metadata: &InMemoryMetadata, config: &ServiceConfig, query: &str) -> Vec<String> {
    let catalog = FunctionCatalog::standard();
    let customer = metadata.resource_type("Customer").unwrap();
    let options = QueryOptions::parse(query, config).unwrap();
    let page = QueryProcessor::new(metadata, customer, &catalog, config)
        .execute(common::customers(), &options)
        .unwrap();
    common::ids(&page.entities)
}

#[test]
fn test_skip_and_top_apply_after_sort() {
    let metadata = common::catalog();
    let config = ServiceConfig::default();
    assert_eq!(
        execute(&metadata, &config, "?$orderby=Age desc&$skip=2&$top=3"),
        vec!["AROUT", "BONAP", "ALFKI"]
    );
}

#[test]
fn test_encoded_filter_with_functions() {
    let metadata = common::catalog();
    let config = ServiceConfig::default();
    assert_eq!(
        execute(
            &metadata,
            &config,
            "$filter=startswith(Name,%27B%27)%20and%20length(Name)%20gt%206&$orderby=Name"
        ),
        vec!["BSBEV", "BERGS", "BLONP", "BONAP", "BOTTM"]
    );
}

#[test]
fn test_custom_options_pass_through() {
    let config = ServiceConfig::default();
    let options = QueryOptions::parse("$top=2&sap-client=100", &config).unwrap();
    assert_eq!(
        options.custom,
        vec![("sap-client".to_string(), "100".to_string())]
    );
}

#[test]
fn test_option_rejections() {
    let config = ServiceConfig {
        max_filter_length: 16,
        ..ServiceConfig::default()
    };
    for query in [
        "$top=-1",
        "$skip=abc",
        "$filter=",
        "$top=1&$top=2",
        "$expand=Orders",
        "$filter=Name eq 'a very long name'",
    ] {
        let err = QueryOptions::parse(query, &config).unwrap_err();
        assert_eq!(err.code(), ODataErrorCode::InvalidQueryOption, "{}", query);
    }
}

#[test]
fn test_filter_errors_surface_from_execute() {
    let metadata = common::catalog();
    let catalog = FunctionCatalog::standard();
    let customer = metadata.resource_type("Customer").unwrap();
    let config = ServiceConfig::default();
    let processor = QueryProcessor::new(&metadata, customer, &catalog, &config);

    let options = QueryOptions::parse("$filter=Name eq 5", &config).unwrap();
    let err = processor.execute(common::customers(), &options).unwrap_err();
    assert_eq!(err.code(), ODataErrorCode::TypeMismatch);
    assert_eq!(err.status_code().as_u16(), 400);
}
