//! # System Query Options
//!
//! Splits a raw URL query string into the options the query core
//! understands. Keys and values are percent-decoded once here; a
//! skiptoken's string bodies stay encoded until the token is parsed.

use url::form_urlencoded;

use crate::config::ServiceConfig;
use crate::errors::{ODataError, ODataResult};

use super::encoding::decode_component;

/// Parsed `$filter`, `$orderby`, `$skiptoken`, `$top` and `$skip`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryOptions {
    pub filter: Option<String>,
    pub orderby: Option<String>,
    pub skiptoken: Option<String>,
    pub top: Option<usize>,
    pub skip: Option<usize>,
    /// Non-`$` options, passed through in request order
    pub custom: Vec<(String, String)>,
}

impl QueryOptions {
    /// Parse a raw query string, with or without the leading `?`
    pub fn parse(raw: &str, config: &ServiceConfig) -> ODataResult<Self> {
        let mut options = QueryOptions::default();
        let raw = raw.strip_prefix('?').unwrap_or(raw);

        for pair in raw.split('&').filter(|p| !p.is_empty()) {
            let (raw_key, raw_value) = pair.split_once('=').unwrap_or((pair, ""));
            let key = decode_component(raw_key);
            let value = decode_component(raw_value);

            if !key.starts_with('$') {
                options.custom.push((key, value));
                continue;
            }

            match key.as_str() {
                "$filter" => {
                    if value.len() > config.max_filter_length {
                        return Err(ODataError::invalid_query_option(format!(
                            "$filter is {} bytes, limit is {}",
                            value.len(),
                            config.max_filter_length
                        )));
                    }
                    set_once(&mut options.filter, &key, non_empty(&key, value)?)?;
                }
                "$orderby" => set_once(&mut options.orderby, &key, non_empty(&key, value)?)?,
                "$skiptoken" => set_once(&mut options.skiptoken, &key, non_empty(&key, value)?)?,
                "$top" => {
                    let top = parse_count(&key, &value)?;
                    if top > config.max_top {
                        return Err(ODataError::invalid_query_option(format!(
                            "$top {} exceeds limit {}",
                            top, config.max_top
                        )));
                    }
                    set_once(&mut options.top, &key, top)?;
                }
                "$skip" => {
                    let skip = parse_count(&key, &value)?;
                    set_once(&mut options.skip, &key, skip)?;
                }
                _ => {
                    return Err(ODataError::invalid_query_option(format!(
                        "Unknown system query option '{}'",
                        key
                    )))
                }
            }
        }

        Ok(options)
    }

    /// Options for the page after one that served `served` entities.
    ///
    /// `$skip` has already been consumed and `$top` shrinks by what was
    /// served.
    pub fn continuation(&self, served: usize) -> QueryOptions {
        QueryOptions {
            skip: None,
            top: self.top.map(|top| top.saturating_sub(served)),
            ..self.clone()
        }
    }
}

fn set_once<T>(slot: &mut Option<T>, key: &str, value: T) -> ODataResult<()> {
    if slot.is_some() {
        return Err(ODataError::invalid_query_option(format!(
            "Duplicate system query option '{}'",
            key
        )));
    }
    *slot = Some(value);
    Ok(())
}

fn non_empty(key: &str, value: String) -> ODataResult<String> {
    if value.trim().is_empty() {
        return Err(ODataError::invalid_query_option(format!(
            "{} must not be empty",
            key
        )));
    }
    Ok(value)
}

fn parse_count(key: &str, value: &str) -> ODataResult<usize> {
    value.trim().parse().map_err(|_| {
        ODataError::invalid_query_option(format!(
            "{} must be a non-negative integer, got '{}'",
            key, value
        ))
    })
}

/// Continuation URL for `token`, carrying the options that shape the
/// result set. The token is encoded a second time as a query value.
pub fn next_link(base: &str, options: &QueryOptions, token: &str) -> String {
    let mut query = form_urlencoded::Serializer::new(String::new());
    if let Some(filter) = &options.filter {
        query.append_pair("$filter", filter);
    }
    if let Some(orderby) = &options.orderby {
        query.append_pair("$orderby", orderby);
    }
    if let Some(top) = options.top {
        query.append_pair("$top", &top.to_string());
    }
    for (key, value) in &options.custom {
        query.append_pair(key, value);
    }
    query.append_pair("$skiptoken", token);

    let base = base.trim_end_matches(['?', '&']);
    let separator = if base.contains('?') { '&' } else { '?' };
    format!("{}{}{}", base, separator, query.finish())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ODataErrorCode;

    fn parse(raw: &str) -> ODataResult<QueryOptions> {
        QueryOptions::parse(raw, &ServiceConfig::default())
    }

    #[test]
    fn test_parse_system_options() {
        let options = parse(
            "?$filter=Age+gt+30%20and%20Name+ne+%27Bob%27&$orderby=Name%20desc&$top=5&$skip=2&$skiptoken=%27A%27",
        )
        .unwrap();
        assert_eq!(options.filter.as_deref(), Some("Age gt 30 and Name ne 'Bob'"));
        assert_eq!(options.orderby.as_deref(), Some("Name desc"));
        assert_eq!(options.top, Some(5));
        assert_eq!(options.skip, Some(2));
        assert_eq!(options.skiptoken.as_deref(), Some("'A'"));
    }

    #[test]
    fn test_custom_options_kept_in_order() {
        let options = parse("tenant=north&$top=1&debug").unwrap();
        assert_eq!(
            options.custom,
            vec![
                ("tenant".to_string(), "north".to_string()),
                ("debug".to_string(), String::new())
            ]
        );
    }

    #[test]
    fn test_rejects_bad_options() {
        for raw in [
            "$top=ten",
            "$skip=-1",
            "$top=1&$top=2",
            "$expand=Orders",
            "$filter=",
            "$top=1001",
        ] {
            let err = parse(raw).unwrap_err();
            assert_eq!(err.code(), ODataErrorCode::InvalidQueryOption, "{}", raw);
        }
    }

    #[test]
    fn test_filter_length_limit() {
        let config = ServiceConfig {
            max_filter_length: 10,
            ..ServiceConfig::default()
        };
        assert!(QueryOptions::parse("$filter=Age+gt+1", &config).is_ok());
        let err = QueryOptions::parse("$filter=Name+eq+%27abcdef%27", &config).unwrap_err();
        assert!(err.message().contains("limit is 10"));
    }

    #[test]
    fn test_continuation_drops_skip_and_shrinks_top() {
        let options = parse("$top=10&$skip=3&$orderby=Name").unwrap();
        let next = options.continuation(4);
        assert_eq!(next.top, Some(6));
        assert_eq!(next.skip, None);
        assert_eq!(next.orderby.as_deref(), Some("Name"));
    }

    #[test]
    fn test_next_link_encodes_token_again() {
        let options = parse("$filter=Age+gt+1&$orderby=Name&x=1").unwrap();
        let link = next_link("http://host/svc/Customers", &options, "'O%27%27Neil', 5");
        assert_eq!(
            link,
            "http://host/svc/Customers?%24filter=Age+gt+1&%24orderby=Name&x=1&%24skiptoken=%27O%2527%2527Neil%27%2C+5"
        );

        let query = link.split_once('?').unwrap().1;
        let reparsed = parse(query).unwrap();
        assert_eq!(reparsed.skiptoken.as_deref(), Some("'O%27%27Neil', 5"));
        assert_eq!(reparsed.filter, options.filter);
    }

    #[test]
    fn test_next_link_appends_to_existing_query() {
        let link = next_link("Customers?", &QueryOptions::default(), "1");
        assert_eq!(link, "Customers?%24skiptoken=1");
    }
}
