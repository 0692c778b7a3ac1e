//! # Expression Translation
//!
//! Projects a typed filter tree into backend text. Backends implement
//! `ExpressionProvider`, one callback per node kind, each receiving the
//! already-translated children. The walk in `translate` is shared.
//!
//! Providers:
//! - `SqlExpressionProvider`: MySQL-flavoured predicate for push-down
//! - `HostExpressionProvider`: C-family expression over a bound entity
//! - `CanonicalExpressionProvider`: normalised `$filter` text

mod canonical;
mod host;
mod sql;

pub use canonical::CanonicalExpressionProvider;
pub use host::HostExpressionProvider;
pub use sql::SqlExpressionProvider;

use crate::errors::{ODataError, ODataResult};
use crate::filter::{
    ArithmeticOperator, Expression, FunctionSignature, LiteralValue, LogicalOperator,
    PropertyAccessExpr, RelationalOperator, UnaryOperator,
};
use crate::metadata::EdmType;

/// Backend-specific rendering of each node kind
pub trait ExpressionProvider {
    fn on_logical(&self, op: LogicalOperator, left: &str, right: &str) -> ODataResult<String>;

    fn on_arithmetic(&self, op: ArithmeticOperator, left: &str, right: &str) -> ODataResult<String>;

    fn on_relational(&self, op: RelationalOperator, left: &str, right: &str) -> ODataResult<String>;

    fn on_unary(&self, op: UnaryOperator, operand: &str) -> ODataResult<String>;

    fn on_function_call(&self, signature: &FunctionSignature, args: &[String]) -> ODataResult<String>;

    fn on_property_access(&self, chain: &PropertyAccessExpr) -> ODataResult<String>;

    fn on_constant(&self, edm_type: EdmType, value: &LiteralValue) -> ODataResult<String>;
}

/// Translate `expr` bottom-up through `provider`
pub fn translate(expr: &Expression, provider: &dyn ExpressionProvider) -> ODataResult<String> {
    match expr {
        Expression::Constant(c) => provider.on_constant(c.edm_type(), c.value()),
        Expression::PropertyAccess(chain) => provider.on_property_access(chain),
        Expression::Unary(u) => {
            let operand = translate(u.operand(), provider)?;
            provider.on_unary(u.op(), &operand)
        }
        Expression::Arithmetic(b) => {
            let left = translate(b.left(), provider)?;
            let right = translate(b.right(), provider)?;
            provider.on_arithmetic(b.op(), &left, &right)
        }
        Expression::Relational(b) => {
            let left = translate(b.left(), provider)?;
            let right = translate(b.right(), provider)?;
            provider.on_relational(b.op(), &left, &right)
        }
        Expression::Logical(b) => {
            let left = translate(b.left(), provider)?;
            let right = translate(b.right(), provider)?;
            provider.on_logical(b.op(), &left, &right)
        }
        Expression::FunctionCall(call) => {
            let args = call
                .args()
                .iter()
                .map(|arg| translate(arg, provider))
                .collect::<ODataResult<Vec<_>>>()?;
            provider.on_function_call(call.signature(), &args)
        }
    }
}

/// Checks shared by every provider's `on_property_access`
pub(crate) fn require_named_leaf(chain: &PropertyAccessExpr) -> ODataResult<&str> {
    let leaf = chain.leaf().ok_or_else(|| {
        ODataError::provider_configuration("Property access has no resolved property")
    })?;
    if leaf.property.name.is_empty() {
        return Err(ODataError::provider_configuration(
            "Property access refers to a property with no name",
        ));
    }
    if chain.hops().iter().any(|h| h.property.name.is_empty()) {
        return Err(ODataError::provider_configuration(format!(
            "Property path '{}' contains an unnamed property",
            chain.path()
        )));
    }
    Ok(&leaf.property.name)
}

/// Wrong argument count reaching a provider
pub(crate) fn arity_error(signature: &FunctionSignature, got: usize) -> ODataError {
    ODataError::provider_configuration(format!(
        "Function '{}' expects {} arguments, got {}",
        signature.name,
        signature.arity(),
        got
    ))
}
