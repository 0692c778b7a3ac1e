//! Host-evaluable expression text
//!
//! Renders C#-style member access over a bound entity variable, e.g.
//! `((entity.Address != null) && (entity.Address.Country == "USA"))`.
//! Null guards produced for in-process evaluation appear as explicit
//! `!= null` tests.

use crate::errors::{ODataError, ODataResult};
use crate::filter::literal::format_datetime;
use crate::filter::{
    ArithmeticOperator, FunctionSignature, LiteralValue, LogicalOperator, PropertyAccessExpr,
    RelationalOperator, UnaryOperator, IS_NULL,
};
use crate::metadata::EdmType;

use super::{arity_error, require_named_leaf, ExpressionProvider};

/// Translator for in-process host expressions
#[derive(Debug, Clone)]
pub struct HostExpressionProvider {
    binding: String,
}

impl Default for HostExpressionProvider {
    fn default() -> Self {
        Self::new("entity")
    }
}

impl HostExpressionProvider {
    /// Provider reading properties off the variable named `binding`
    pub fn new(binding: impl Into<String>) -> Self {
        Self {
            binding: binding.into(),
        }
    }

    pub fn binding(&self) -> &str {
        &self.binding
    }

    fn quote(text: &str) -> String {
        let mut out = String::with_capacity(text.len() + 2);
        out.push('"');
        for c in text.chars() {
            match c {
                '"' => out.push_str("\\\""),
                '\\' => out.push_str("\\\\"),
                '\n' => out.push_str("\\n"),
                '\r' => out.push_str("\\r"),
                '\t' => out.push_str("\\t"),
                c => out.push(c),
            }
        }
        out.push('"');
        out
    }
}

impl ExpressionProvider for HostExpressionProvider {
    fn on_logical(&self, op: LogicalOperator, left: &str, right: &str) -> ODataResult<String> {
        let symbol = match op {
            LogicalOperator::And => "&&",
            LogicalOperator::Or => "||",
        };
        Ok(format!("({} {} {})", left, symbol, right))
    }

    fn on_arithmetic(&self, op: ArithmeticOperator, left: &str, right: &str) -> ODataResult<String> {
        let symbol = match op {
            ArithmeticOperator::Add => "+",
            ArithmeticOperator::Sub => "-",
            ArithmeticOperator::Mul => "*",
            ArithmeticOperator::Div => "/",
            ArithmeticOperator::Mod => "%",
        };
        Ok(format!("({} {} {})", left, symbol, right))
    }

    fn on_relational(&self, op: RelationalOperator, left: &str, right: &str) -> ODataResult<String> {
        let symbol = match op {
            RelationalOperator::Eq => "==",
            RelationalOperator::Ne => "!=",
            RelationalOperator::Gt => ">",
            RelationalOperator::Ge => ">=",
            RelationalOperator::Lt => "<",
            RelationalOperator::Le => "<=",
        };
        Ok(format!("({} {} {})", left, symbol, right))
    }

    fn on_unary(&self, op: UnaryOperator, operand: &str) -> ODataResult<String> {
        // `!(x == null)` reads better as `x != null`
        if op == UnaryOperator::Not {
            if let Some(inner) = operand
                .strip_prefix('(')
                .and_then(|s| s.strip_suffix(" == null)"))
            {
                return Ok(format!("({} != null)", inner));
            }
        }
        Ok(match op {
            UnaryOperator::Not => format!("!{}", operand),
            UnaryOperator::Negate => format!("-{}", operand),
        })
    }

    fn on_function_call(&self, signature: &FunctionSignature, args: &[String]) -> ODataResult<String> {
        if args.len() != signature.arity() {
            return Err(arity_error(signature, args.len()));
        }
        let a = |i: usize| args[i].as_str();

        let text = match signature.name.as_str() {
            IS_NULL => format!("({} == null)", a(0)),
            "substringof" => format!("{}.Contains({})", a(1), a(0)),
            "startswith" => format!("{}.StartsWith({})", a(0), a(1)),
            "endswith" => format!("{}.EndsWith({})", a(0), a(1)),
            "indexof" => format!("{}.IndexOf({})", a(0), a(1)),
            "length" => format!("{}.Length", a(0)),
            "replace" => format!("{}.Replace({}, {})", a(0), a(1), a(2)),
            "substring" if args.len() == 2 => format!("{}.Substring({})", a(0), a(1)),
            "substring" => format!("{}.Substring({}, {})", a(0), a(1), a(2)),
            "tolower" => format!("{}.ToLower()", a(0)),
            "toupper" => format!("{}.ToUpper()", a(0)),
            "trim" => format!("{}.Trim()", a(0)),
            "concat" => format!("string.Concat({}, {})", a(0), a(1)),
            "year" => format!("{}.Year", a(0)),
            "month" => format!("{}.Month", a(0)),
            "day" => format!("{}.Day", a(0)),
            "hour" => format!("{}.Hour", a(0)),
            "minute" => format!("{}.Minute", a(0)),
            "second" => format!("{}.Second", a(0)),
            "round" => format!("Math.Round({})", a(0)),
            "floor" => format!("Math.Floor({})", a(0)),
            "ceiling" => format!("Math.Ceiling({})", a(0)),
            other => {
                return Err(ODataError::provider_configuration(format!(
                    "Function '{}' has no host translation",
                    other
                )))
            }
        };
        Ok(text)
    }

    fn on_property_access(&self, chain: &PropertyAccessExpr) -> ODataResult<String> {
        require_named_leaf(chain)?;
        let mut text = self.binding.clone();
        for hop in chain.hops() {
            text.push('.');
            text.push_str(&hop.property.name);
        }
        Ok(text)
    }

    fn on_constant(&self, _edm_type: EdmType, value: &LiteralValue) -> ODataResult<String> {
        Ok(match value {
            LiteralValue::Null => "null".to_string(),
            LiteralValue::Boolean(b) => b.to_string(),
            LiteralValue::Int32(v) => v.to_string(),
            LiteralValue::Int64(v) => format!("{}L", v),
            LiteralValue::Single(v) => format!("{}f", v),
            LiteralValue::Double(v) => format!("{:?}", v),
            LiteralValue::Decimal(v) => format!("{}m", v),
            LiteralValue::String(s) => Self::quote(s),
            LiteralValue::Guid(g) => format!("Guid.Parse(\"{}\")", g),
            LiteralValue::DateTime(dt) => format!("DateTime.Parse(\"{}\")", format_datetime(dt)),
            LiteralValue::Binary(bytes) => format!("Convert.FromHexString(\"{}\")", hex::encode_upper(bytes)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::{parse_filter, EvaluationMode, FunctionCatalog, ParseContext};
    use crate::metadata::fixtures::northwind;
    use crate::metadata::MetadataProvider;
    use crate::translate::translate;

    fn host(text: &str) -> String {
        let metadata = northwind();
        let catalog = FunctionCatalog::standard();
        let customer = metadata.resource_type("Customer").unwrap();
        let ctx = ParseContext::new(&metadata, customer, &catalog).with_mode(EvaluationMode::InProcess);
        let expr = parse_filter(text, ctx).unwrap();
        translate(&expr, &HostExpressionProvider::default()).unwrap()
    }

    #[test]
    fn test_guarded_member_access() {
        assert_eq!(
            host("Address/Country eq 'USA'"),
            "((entity.Address != null) && (entity.Address.Country == \"USA\"))"
        );
    }

    #[test]
    fn test_operators_and_functions() {
        assert_eq!(
            host("not startswith(Name, 'A') or Age mod 2 eq 0"),
            "(!entity.Name.StartsWith(\"A\") || ((entity.Age % 2) == 0))"
        );
        assert_eq!(host("length(Name) gt 3"), "(entity.Name.Length > 3)");
    }

    #[test]
    fn test_literals() {
        assert_eq!(host("Name eq 'say \"hi\"'"), "(entity.Name == \"say \\\"hi\\\"\")");
        assert_eq!(host("Rating gt 2.5"), "(entity.Rating > 2.5)");
        assert_eq!(host("Balance lt 10.5M"), "(entity.Balance < 10.5m)");
    }

    #[test]
    fn test_custom_binding() {
        let metadata = northwind();
        let catalog = FunctionCatalog::standard();
        let customer = metadata.resource_type("Customer").unwrap();
        let expr = parse_filter("Age eq 1", ParseContext::new(&metadata, customer, &catalog)).unwrap();
        let text = translate(&expr, &HostExpressionProvider::new("c")).unwrap();
        assert_eq!(text, "(c.Age == 1)");
    }
}
