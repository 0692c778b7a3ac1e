//! MySQL-flavoured SQL predicates
//!
//! Property access renders the leaf column name only; the data access
//! layer is expected to have flattened complex properties into columns.

use crate::errors::{ODataError, ODataResult};
use crate::filter::literal::format_datetime;
use crate::filter::{
    ArithmeticOperator, FunctionSignature, LiteralValue, LogicalOperator, PropertyAccessExpr,
    RelationalOperator, UnaryOperator, IS_NULL,
};
use crate::metadata::EdmType;

use super::{arity_error, require_named_leaf, ExpressionProvider};

const SQL_NULL: &str = "NULL";

/// Push-down translator emitting SQL `WHERE` fragments
#[derive(Debug, Clone, Copy, Default)]
pub struct SqlExpressionProvider;

impl SqlExpressionProvider {
    pub fn new() -> Self {
        Self
    }

    fn quote(text: &str) -> String {
        format!("'{}'", text.replace('\\', "\\\\").replace('\'', "''"))
    }
}

impl ExpressionProvider for SqlExpressionProvider {
    fn on_logical(&self, op: LogicalOperator, left: &str, right: &str) -> ODataResult<String> {
        let keyword = match op {
            LogicalOperator::And => "AND",
            LogicalOperator::Or => "OR",
        };
        Ok(format!("({} {} {})", left, keyword, right))
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
        // `= NULL` is never true in SQL
        if op.is_equality() && (left == SQL_NULL || right == SQL_NULL) {
            let operand = if right == SQL_NULL { left } else { right };
            let test = match op {
                RelationalOperator::Eq => "IS NULL",
                _ => "IS NOT NULL",
            };
            return Ok(format!("({} {})", operand, test));
        }

        let symbol = match op {
            RelationalOperator::Eq => "=",
            RelationalOperator::Ne => "<>",
            RelationalOperator::Gt => ">",
            RelationalOperator::Ge => ">=",
            RelationalOperator::Lt => "<",
            RelationalOperator::Le => "<=",
        };
        Ok(format!("({} {} {})", left, symbol, right))
    }

    fn on_unary(&self, op: UnaryOperator, operand: &str) -> ODataResult<String> {
        Ok(match op {
            UnaryOperator::Not => format!("(NOT {})", operand),
            UnaryOperator::Negate => format!("(-{})", operand),
        })
    }

    fn on_function_call(&self, signature: &FunctionSignature, args: &[String]) -> ODataResult<String> {
        if args.len() != signature.arity() {
            return Err(arity_error(signature, args.len()));
        }
        let a = |i: usize| args[i].as_str();

        let text = match signature.name.as_str() {
            IS_NULL => format!("({} IS NULL)", a(0)),
            "substringof" => format!("(LOCATE({}, {}) > 0)", a(0), a(1)),
            // Prefix and suffix tests compare substrings so `%` and `_` stay literal
            "startswith" => format!("(LEFT({0}, CHAR_LENGTH({1})) = {1})", a(0), a(1)),
            "endswith" => format!("(RIGHT({0}, CHAR_LENGTH({1})) = {1})", a(0), a(1)),
            "indexof" => format!("(LOCATE({}, {}) - 1)", a(1), a(0)),
            "length" => format!("CHAR_LENGTH({})", a(0)),
            "replace" => format!("REPLACE({}, {}, {})", a(0), a(1), a(2)),
            "substring" if args.len() == 2 => format!("SUBSTRING({}, {} + 1)", a(0), a(1)),
            "substring" => format!("SUBSTRING({}, {} + 1, {})", a(0), a(1), a(2)),
            "tolower" => format!("LOWER({})", a(0)),
            "toupper" => format!("UPPER({})", a(0)),
            "trim" => format!("TRIM({})", a(0)),
            "concat" => format!("CONCAT({}, {})", a(0), a(1)),
            "year" => format!("YEAR({})", a(0)),
            "month" => format!("MONTH({})", a(0)),
            "day" => format!("DAY({})", a(0)),
            "hour" => format!("HOUR({})", a(0)),
            "minute" => format!("MINUTE({})", a(0)),
            "second" => format!("SECOND({})", a(0)),
            "round" => format!("ROUND({})", a(0)),
            "floor" => format!("FLOOR({})", a(0)),
            "ceiling" => format!("CEILING({})", a(0)),
            other => {
                return Err(ODataError::provider_configuration(format!(
                    "Function '{}' has no SQL translation",
                    other
                )))
            }
        };
        Ok(text)
    }

    fn on_property_access(&self, chain: &PropertyAccessExpr) -> ODataResult<String> {
        require_named_leaf(chain).map(str::to_string)
    }

    fn on_constant(&self, _edm_type: EdmType, value: &LiteralValue) -> ODataResult<String> {
        Ok(match value {
            LiteralValue::Null => SQL_NULL.to_string(),
            LiteralValue::Boolean(true) => "TRUE".to_string(),
            LiteralValue::Boolean(false) => "FALSE".to_string(),
            LiteralValue::Int32(v) => v.to_string(),
            LiteralValue::Int64(v) => v.to_string(),
            LiteralValue::Single(v) => v.to_string(),
            LiteralValue::Double(v) | LiteralValue::Decimal(v) => v.to_string(),
            LiteralValue::String(s) => Self::quote(s),
            LiteralValue::Guid(g) => Self::quote(&g.to_string()),
            LiteralValue::DateTime(dt) => Self::quote(&format_datetime(dt).replace('T', " ")),
            LiteralValue::Binary(bytes) => format!("X'{}'", hex::encode_upper(bytes)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ODataErrorCode;
    use crate::filter::{parse_filter, FunctionCatalog, ParseContext, PropertyHop};
    use crate::metadata::fixtures::northwind;
    use crate::metadata::{MetadataProvider, ResourceProperty};
    use crate::translate::translate;

    fn sql(text: &str) -> String {
        let metadata = northwind();
        let catalog = FunctionCatalog::standard();
        let customer = metadata.resource_type("Customer").unwrap();
        let expr = parse_filter(text, ParseContext::new(&metadata, customer, &catalog)).unwrap();
        translate(&expr, &SqlExpressionProvider::new()).unwrap()
    }

    #[test]
    fn test_nested_property_renders_leaf_without_guard() {
        assert_eq!(sql("Address/Country eq 'USA'"), "(Country = 'USA')");
    }

    #[test]
    fn test_operators() {
        assert_eq!(
            sql("Age add 1 gt 18 and not IsActive or Name ne 'x'"),
            "((((Age + 1) > 18) AND (NOT IsActive)) OR (Name <> 'x'))"
        );
        assert_eq!(sql("-Age le -5"), "((-Age) <= -5)");
    }

    #[test]
    fn test_null_comparisons() {
        assert_eq!(sql("Name eq null"), "(Name IS NULL)");
        assert_eq!(sql("null ne Name"), "(Name IS NOT NULL)");
        assert_eq!(sql("Address eq null"), "(Address IS NULL)");
    }

    #[test]
    fn test_literal_quoting() {
        assert_eq!(sql("Name eq 'O''Neil'"), "(Name = 'O''Neil')");
        assert_eq!(
            sql("Since ge datetime'2020-01-02T03:04:05'"),
            "(Since >= '2020-01-02 03:04:05')"
        );
        assert_eq!(sql("Photo eq X'0aff'"), "(Photo = X'0AFF')");
        assert_eq!(sql("IsActive eq true"), "(IsActive = TRUE)");
    }

    #[test]
    fn test_wildcards_in_arguments_stay_literal() {
        assert_eq!(
            sql("startswith(Name, '50%_off')"),
            "(LEFT(Name, CHAR_LENGTH('50%_off')) = '50%_off')"
        );
        assert_eq!(
            sql("endswith(Name, 'a\\_b')"),
            "(RIGHT(Name, CHAR_LENGTH('a\\\\_b')) = 'a\\\\_b')"
        );
        assert_eq!(sql("substringof('%', Name)"), "(LOCATE('%', Name) > 0)");
        assert!(!sql("endswith(Name, '%')").contains("LIKE"));
    }

    #[test]
    fn test_functions() {
        assert_eq!(sql("substringof('li', Name)"), "(LOCATE('li', Name) > 0)");
        assert_eq!(sql("startswith(Name, 'A')"), "(LEFT(Name, CHAR_LENGTH('A')) = 'A')");
        assert_eq!(sql("indexof(Name, 'c') eq 2"), "((LOCATE('c', Name) - 1) = 2)");
        assert_eq!(
            sql("substring(Name, 1, 2) eq 'li'"),
            "(SUBSTRING(Name, 1 + 1, 2) = 'li')"
        );
        assert_eq!(sql("year(Since) eq 2020"), "(YEAR(Since) = 2020)");
    }

    #[test]
    fn test_unsupported_function_is_configuration_error() {
        let signature = FunctionSignature::new("distance", &[EdmType::Double], EdmType::Double);
        let err = SqlExpressionProvider::new()
            .on_function_call(&signature, &["1".to_string()])
            .unwrap_err();
        assert_eq!(err.code(), ODataErrorCode::ProviderConfiguration);
    }

    #[test]
    fn test_unnamed_property_is_configuration_error() {
        let provider = SqlExpressionProvider::new();

        let empty = PropertyAccessExpr::new(Vec::new());
        let err = provider.on_property_access(&empty).unwrap_err();
        assert_eq!(err.code(), ODataErrorCode::ProviderConfiguration);

        let unnamed = PropertyAccessExpr::new(vec![PropertyHop::new(ResourceProperty::primitive(
            "",
            EdmType::String,
        ))]);
        assert!(provider.on_property_access(&unnamed).is_err());
    }
}
