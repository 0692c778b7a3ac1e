//! Skiptoken text
//!
//! A skiptoken is a comma separated list of literals, one per orderby
//! key, written in `$filter` literal syntax. String bodies are
//! percent-encoded when a token is built so the token survives being
//! placed in a URL; parsing decodes them again.

use serde_json::Value;

use crate::errors::{ODataError, ODataResult};
use crate::filter::{tokenize, LiteralValue, Token, TokenKind};
use crate::metadata::ResourceInstance;
use crate::orderby::{OrderByPathSegment, OrderByTree};
use crate::query::encoding::{decode_component, encode_component};

/// Positional continuation values, one per orderby key
#[derive(Debug, Clone, PartialEq)]
pub struct SkipToken {
    values: Vec<LiteralValue>,
}

impl SkipToken {
    pub fn new(values: Vec<LiteralValue>) -> Self {
        Self { values }
    }

    pub fn values(&self) -> &[LiteralValue] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Token text, literals joined with `", "`
    pub fn to_text(&self) -> String {
        self.values
            .iter()
            .map(encode_literal)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Canonical literal text with the string body percent-encoded
fn encode_literal(value: &LiteralValue) -> String {
    match value {
        LiteralValue::String(s) => format!("'{}'", encode_component(&s.replace('\'', "''"))),
        other => other.to_literal_text(),
    }
}

/// Decode a string literal token whose body may be percent-encoded
fn decode_literal(token: &Token) -> ODataResult<LiteralValue> {
    if token.kind != TokenKind::StringLiteral {
        return LiteralValue::from_token(token);
    }
    let body = token
        .text
        .strip_prefix('\'')
        .and_then(|t| t.strip_suffix('\''))
        .unwrap_or_default();
    let decoded = Token::new(
        format!("'{}'", decode_component(body)),
        TokenKind::StringLiteral,
        token.position,
    );
    LiteralValue::from_token(&decoded)
}

/// Parse skiptoken text against the orderby tree it continues
pub fn parse_skiptoken(text: &str, tree: &OrderByTree) -> ODataResult<SkipToken> {
    let mut values = Vec::new();
    let mut lexer = tokenize(text);

    loop {
        let token = lexer.next_token()?;
        if !token.kind.is_literal() {
            return Err(ODataError::syntax(
                token.position,
                format!("Expected skiptoken literal, found {}", token.kind),
            ));
        }
        values.push(decode_literal(&token)?);

        let separator = lexer.next_token()?;
        match separator.kind {
            TokenKind::Comma => continue,
            TokenKind::End => break,
            other => {
                return Err(ODataError::syntax(
                    separator.position,
                    format!("Expected ',' or end of skiptoken, found {}", other),
                ))
            }
        }
    }

    if values.len() != tree.leaf_count() {
        return Err(ODataError::skiptoken_mismatch(format!(
            "Skiptoken value count {} does not match orderby clause with {} keys",
            values.len(),
            tree.leaf_count()
        )));
    }

    for (position, (value, segment)) in values.iter().zip(tree.segments()).enumerate() {
        if !value.fits(segment.key_type()) {
            return Err(ODataError::skiptoken_mismatch(format!(
                "Skiptoken value at position {} has type {}, expected {} for '{}'",
                position,
                value.edm_type(),
                segment.key_type(),
                segment.path().path()
            )));
        }
    }

    Ok(SkipToken::new(values))
}

/// Read a segment's sort key off an entity; null anywhere on the path
/// reads as null
pub fn segment_value(segment: &OrderByPathSegment, entity: &Value) -> ODataResult<LiteralValue> {
    let mut current = entity;
    for hop in segment.sub_paths() {
        match current.get_property(&hop.property)? {
            Some(next) => current = next,
            None => return Ok(LiteralValue::Null),
        }
    }
    LiteralValue::from_json(current, segment.key_type())
}

/// Skiptoken continuing after `last_entity`
pub fn build_skiptoken(last_entity: &Value, tree: &OrderByTree) -> ODataResult<String> {
    let values = tree
        .segments()
        .iter()
        .map(|segment| segment_value(segment, last_entity))
        .collect::<ODataResult<Vec<_>>>()?;
    Ok(SkipToken::new(values).to_text())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ODataErrorCode;
    use crate::metadata::fixtures::northwind;
    use crate::metadata::MetadataProvider;
    use crate::orderby::parse_orderby;
    use serde_json::json;

    fn tree(text: &str) -> OrderByTree {
        let metadata = northwind();
        let customer = metadata.resource_type("Customer").unwrap();
        parse_orderby(text, customer, &metadata).unwrap()
    }

    #[test]
    fn test_parse_matching_arity() {
        let tree = tree("Name, Age desc, Since");
        let token = parse_skiptoken("'Alice', 30, datetime'2020-01-01T00:00:00'", &tree).unwrap();
        assert_eq!(token.len(), 3);
        assert_eq!(token.values()[0], LiteralValue::String("Alice".into()));
        assert_eq!(token.values()[1], LiteralValue::Int32(30));
    }

    #[test]
    fn test_arity_mismatch_rejected() {
        let tree = tree("Name, Age");
        for text in ["'Alice'", "'Alice', 30, 1", "'a', 1, 2, 3"] {
            let err = parse_skiptoken(text, &tree).unwrap_err();
            assert_eq!(err.code(), ODataErrorCode::SkipTokenMismatch, "{}", text);
            assert!(err.message().contains("count"));
        }
    }

    #[test]
    fn test_type_mismatch_names_position_and_types() {
        let tree = tree("Name, Age");
        let err = parse_skiptoken("'Alice', 'thirty'", &tree).unwrap_err();
        assert_eq!(err.code(), ODataErrorCode::SkipTokenMismatch);
        assert!(err.message().contains("position 1"));
        assert!(err.message().contains("Edm.String"));
        assert!(err.message().contains("Edm.Int32"));
    }

    #[test]
    fn test_null_accepted_for_any_key() {
        let tree = tree("Address/Country, Token");
        let token = parse_skiptoken("null, null", &tree).unwrap();
        assert!(token.values().iter().all(LiteralValue::is_null));
    }

    #[test]
    fn test_malformed_token_is_syntax_error() {
        let tree = tree("Name");
        let err = parse_skiptoken("Name", &tree).unwrap_err();
        assert_eq!(err.code(), ODataErrorCode::Syntax);

        let err = parse_skiptoken("'a' 'b'", &tree).unwrap_err();
        assert_eq!(err.position(), Some(4));

        assert!(parse_skiptoken("", &tree).is_err());
    }

    #[test]
    fn test_build_and_parse_back() {
        let tree = tree("Name, Age, Address/Country, Rating");
        let entity = json!({
            "Name": "O'Neil & Sons, Ltd",
            "Age": 41,
            "Address": null,
            "Rating": 2.5
        });

        let text = build_skiptoken(&entity, &tree).unwrap();
        assert_eq!(text, "'O%27%27Neil+%26+Sons%2C+Ltd', 41, null, 2.5d");

        let token = parse_skiptoken(&text, &tree).unwrap();
        assert_eq!(
            token.values(),
            &[
                LiteralValue::String("O'Neil & Sons, Ltd".into()),
                LiteralValue::Int32(41),
                LiteralValue::Null,
                LiteralValue::Double(2.5),
            ]
        );
    }

    #[test]
    fn test_build_reports_bad_entity_values() {
        let tree = tree("Age");
        let err = build_skiptoken(&json!({"Age": "forty"}), &tree).unwrap_err();
        assert_eq!(err.code(), ODataErrorCode::Internal);
    }
}
