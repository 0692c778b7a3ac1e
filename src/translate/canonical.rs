//! Normalised `$filter` text
//!
//! Re-emits a parsed tree in the query language itself, fully
//! parenthesized and with canonical literal text. Used when a filter is
//! carried forward into a next-page link.

use crate::errors::{ODataError, ODataResult};
use crate::filter::{
    ArithmeticOperator, FunctionSignature, LiteralValue, LogicalOperator, PropertyAccessExpr,
    RelationalOperator, UnaryOperator, IS_NULL,
};
use crate::metadata::EdmType;

use super::{arity_error, require_named_leaf, ExpressionProvider};

#[derive(Debug, Clone, Copy, Default)]
pub struct CanonicalExpressionProvider;

impl ExpressionProvider for CanonicalExpressionProvider {
    fn on_logical(&self, op: LogicalOperator, left: &str, right: &str) -> ODataResult<String> {
        Ok(format!("({} {} {})", left, op.as_str(), right))
    }

    fn on_arithmetic(&self, op: ArithmeticOperator, left: &str, right: &str) -> ODataResult<String> {
        Ok(format!("({} {} {})", left, op.as_str(), right))
    }

    fn on_relational(&self, op: RelationalOperator, left: &str, right: &str) -> ODataResult<String> {
        Ok(format!("({} {} {})", left, op.as_str(), right))
    }

    fn on_unary(&self, op: UnaryOperator, operand: &str) -> ODataResult<String> {
        Ok(match op {
            UnaryOperator::Not => format!("not {}", operand),
            UnaryOperator::Negate => format!("-{}", operand),
        })
    }

    fn on_function_call(&self, signature: &FunctionSignature, args: &[String]) -> ODataResult<String> {
        if signature.name == IS_NULL {
            // Not callable from query text; the equivalent predicate is
            let [arg] = args else {
                return Err(arity_error(signature, args.len()));
            };
            return Ok(format!("({} eq null)", arg));
        }
        if args.len() != signature.arity() {
            return Err(arity_error(signature, args.len()));
        }
        Ok(format!("{}({})", signature.name, args.join(", ")))
    }

    fn on_property_access(&self, chain: &PropertyAccessExpr) -> ODataResult<String> {
        require_named_leaf(chain)?;
        Ok(chain.path())
    }

    fn on_constant(&self, edm_type: EdmType, value: &LiteralValue) -> ODataResult<String> {
        if value.edm_type() != edm_type {
            return Err(ODataError::provider_configuration(format!(
                "Constant {} does not carry declared type {}",
                value, edm_type
            )));
        }
        Ok(value.to_literal_text())
    }
}
