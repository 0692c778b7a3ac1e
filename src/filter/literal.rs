//! Typed literal values
//!
//! Decodes literal tokens, renders canonical literal text (the same syntax
//! `$filter` and `$skiptoken` accept), and converts to and from the JSON
//! representation entities use.

use std::cmp::Ordering;
use std::fmt;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Timelike};
use serde_json::{Number, Value};
use uuid::Uuid;

use crate::errors::{ODataError, ODataResult};
use crate::metadata::EdmType;

use super::token::{Token, TokenKind};

/// A typed constant
#[derive(Debug, Clone, PartialEq)]
pub enum LiteralValue {
    Null,
    Boolean(bool),
    Int32(i32),
    Int64(i64),
    Single(f32),
    Double(f64),
    Decimal(f64),
    String(String),
    Guid(Uuid),
    DateTime(NaiveDateTime),
    Binary(Vec<u8>),
}

/// Body of a quoted literal: `guid'abc'` -> `abc`
fn quoted_body(text: &str) -> &str {
    match text.find('\'') {
        Some(open) if text.len() >= open + 2 => &text[open + 1..text.len() - 1],
        _ => "",
    }
}

/// Drop a one-character type suffix if present
fn strip_suffix<'a>(text: &'a str, suffixes: &[char]) -> &'a str {
    text.strip_suffix(|c: char| suffixes.contains(&c))
        .unwrap_or(text)
}

/// Parse the datetime forms accepted in literals and entity JSON
pub fn parse_datetime(text: &str) -> Option<NaiveDateTime> {
    const FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"];

    for format in FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(text, format) {
            return Some(dt);
        }
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.naive_utc());
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

/// Canonical datetime text, fractional seconds only when present
pub fn format_datetime(dt: &NaiveDateTime) -> String {
    if dt.nanosecond() == 0 {
        dt.format("%Y-%m-%dT%H:%M:%S").to_string()
    } else {
        dt.format("%Y-%m-%dT%H:%M:%S%.f").to_string()
    }
}

impl LiteralValue {
    /// Decode a literal token
    pub fn from_token(token: &Token) -> ODataResult<Self> {
        let text = token.text.as_str();
        let malformed =
            |what: &str| ODataError::syntax(token.position, format!("Malformed {} '{}'", what, text));

        let value = match token.kind {
            TokenKind::NullLiteral => LiteralValue::Null,
            TokenKind::BooleanLiteral => LiteralValue::Boolean(text == "true"),
            TokenKind::IntegerLiteral => match text.parse::<i32>() {
                Ok(v) => LiteralValue::Int32(v),
                Err(_) => text
                    .parse::<i64>()
                    .map(LiteralValue::Int64)
                    .map_err(|_| malformed("integer literal"))?,
            },
            TokenKind::Int64Literal => strip_suffix(text, &['L', 'l'])
                .parse::<i64>()
                .map(LiteralValue::Int64)
                .map_err(|_| malformed("Int64 literal"))?,
            TokenKind::SingleLiteral => strip_suffix(text, &['F', 'f'])
                .parse::<f32>()
                .map(LiteralValue::Single)
                .map_err(|_| malformed("Single literal"))?,
            TokenKind::DoubleLiteral => strip_suffix(text, &['D', 'd'])
                .parse::<f64>()
                .map(LiteralValue::Double)
                .map_err(|_| malformed("Double literal"))?,
            TokenKind::DecimalLiteral => strip_suffix(text, &['M', 'm'])
                .parse::<f64>()
                .map(LiteralValue::Decimal)
                .map_err(|_| malformed("Decimal literal"))?,
            TokenKind::StringLiteral => LiteralValue::String(quoted_body(text).replace("''", "'")),
            TokenKind::GuidLiteral => Uuid::parse_str(quoted_body(text))
                .map(LiteralValue::Guid)
                .map_err(|_| malformed("guid literal"))?,
            TokenKind::DateTimeLiteral => parse_datetime(quoted_body(text))
                .map(LiteralValue::DateTime)
                .ok_or_else(|| malformed("datetime literal"))?,
            TokenKind::BinaryLiteral => hex::decode(quoted_body(text))
                .map(LiteralValue::Binary)
                .map_err(|_| malformed("binary literal"))?,
            other => {
                return Err(ODataError::syntax(
                    token.position,
                    format!("Expected literal, found {}", other),
                ))
            }
        };
        Ok(value)
    }

    /// Static type of the value
    pub fn edm_type(&self) -> EdmType {
        match self {
            LiteralValue::Null => EdmType::Null,
            LiteralValue::Boolean(_) => EdmType::Boolean,
            LiteralValue::Int32(_) => EdmType::Int32,
            LiteralValue::Int64(_) => EdmType::Int64,
            LiteralValue::Single(_) => EdmType::Single,
            LiteralValue::Double(_) => EdmType::Double,
            LiteralValue::Decimal(_) => EdmType::Decimal,
            LiteralValue::String(_) => EdmType::String,
            LiteralValue::Guid(_) => EdmType::Guid,
            LiteralValue::DateTime(_) => EdmType::DateTime,
            LiteralValue::Binary(_) => EdmType::Binary,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, LiteralValue::Null)
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            LiteralValue::Int32(v) => Some(i64::from(*v)),
            LiteralValue::Int64(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            LiteralValue::Int32(v) => Some(f64::from(*v)),
            LiteralValue::Int64(v) => Some(*v as f64),
            LiteralValue::Single(v) => Some(f64::from(*v)),
            LiteralValue::Double(v) | LiteralValue::Decimal(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            LiteralValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Whether the value can stand in for a property of `declared` type.
    ///
    /// Integral literals are accepted by narrower integral types when the
    /// value fits, since unsuffixed integers always lex as Int32.
    pub fn fits(&self, declared: EdmType) -> bool {
        if declared.accepts(self.edm_type()) {
            return true;
        }
        match (self.as_i64(), declared) {
            (Some(v), EdmType::Byte) => u8::try_from(v).is_ok(),
            (Some(v), EdmType::Int16) => i16::try_from(v).is_ok(),
            (Some(v), EdmType::Int32) => i32::try_from(v).is_ok(),
            _ => false,
        }
    }

    /// Canonical literal text, re-lexable to an equal value
    pub fn to_literal_text(&self) -> String {
        match self {
            LiteralValue::Null => "null".to_string(),
            LiteralValue::Boolean(b) => b.to_string(),
            LiteralValue::Int32(v) => v.to_string(),
            LiteralValue::Int64(v) => format!("{}L", v),
            LiteralValue::Single(v) => format!("{}f", v),
            LiteralValue::Double(v) => format!("{}d", v),
            LiteralValue::Decimal(v) => format!("{}M", v),
            LiteralValue::String(s) => format!("'{}'", s.replace('\'', "''")),
            LiteralValue::Guid(g) => format!("guid'{}'", g),
            LiteralValue::DateTime(dt) => format!("datetime'{}'", format_datetime(dt)),
            LiteralValue::Binary(bytes) => format!("X'{}'", hex::encode_upper(bytes)),
        }
    }

    /// JSON representation used inside entity instances
    pub fn to_json(&self) -> Value {
        let float = |v: f64| Number::from_f64(v).map(Value::Number).unwrap_or(Value::Null);
        match self {
            LiteralValue::Null => Value::Null,
            LiteralValue::Boolean(b) => Value::Bool(*b),
            LiteralValue::Int32(v) => Value::from(*v),
            LiteralValue::Int64(v) => Value::from(*v),
            LiteralValue::Single(v) => float(f64::from(*v)),
            LiteralValue::Double(v) | LiteralValue::Decimal(v) => float(*v),
            LiteralValue::String(s) => Value::String(s.clone()),
            LiteralValue::Guid(g) => Value::String(g.to_string()),
            LiteralValue::DateTime(dt) => Value::String(format_datetime(dt)),
            LiteralValue::Binary(bytes) => Value::String(STANDARD.encode(bytes)),
        }
    }

    /// Read a JSON entity value as a literal of the declared type
    pub fn from_json(value: &Value, declared: EdmType) -> ODataResult<Self> {
        if value.is_null() {
            return Ok(LiteralValue::Null);
        }
        let converted = match declared {
            EdmType::Boolean => value.as_bool().map(LiteralValue::Boolean),
            EdmType::Byte | EdmType::Int16 | EdmType::Int32 => value
                .as_i64()
                .and_then(|v| i32::try_from(v).ok())
                .map(LiteralValue::Int32),
            EdmType::Int64 => value.as_i64().map(LiteralValue::Int64),
            EdmType::Single => value.as_f64().map(|v| LiteralValue::Single(v as f32)),
            EdmType::Double => value.as_f64().map(LiteralValue::Double),
            EdmType::Decimal => value
                .as_f64()
                .or_else(|| value.as_str().and_then(|s| s.parse().ok()))
                .map(LiteralValue::Decimal),
            EdmType::String => value.as_str().map(|s| LiteralValue::String(s.to_string())),
            EdmType::Guid => value
                .as_str()
                .and_then(|s| Uuid::parse_str(s).ok())
                .map(LiteralValue::Guid),
            EdmType::DateTime => value
                .as_str()
                .and_then(parse_datetime)
                .map(LiteralValue::DateTime),
            EdmType::Binary => value
                .as_str()
                .and_then(|s| STANDARD.decode(s).ok())
                .map(LiteralValue::Binary),
            EdmType::Null | EdmType::Resource => None,
        };
        converted.ok_or_else(|| {
            ODataError::internal(format!("Value {} is not a valid {}", value, declared))
        })
    }

    /// Ordering between two non-null values of compatible types
    pub fn compare(&self, other: &LiteralValue) -> Option<Ordering> {
        if let (Some(a), Some(b)) = (self.as_i64(), other.as_i64()) {
            return Some(a.cmp(&b));
        }
        if let (Some(a), Some(b)) = (self.as_f64(), other.as_f64()) {
            return a.partial_cmp(&b);
        }
        match (self, other) {
            (LiteralValue::Boolean(a), LiteralValue::Boolean(b)) => Some(a.cmp(b)),
            (LiteralValue::String(a), LiteralValue::String(b)) => Some(a.cmp(b)),
            (LiteralValue::Guid(a), LiteralValue::Guid(b)) => Some(a.cmp(b)),
            (LiteralValue::DateTime(a), LiteralValue::DateTime(b)) => Some(a.cmp(b)),
            (LiteralValue::Binary(a), LiteralValue::Binary(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }
}

impl fmt::Display for LiteralValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_literal_text())
    }
}
