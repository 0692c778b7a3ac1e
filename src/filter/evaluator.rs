//! In-process evaluation of filter trees over JSON entities
//!
//! Comparisons involving null follow SQL semantics: ordering operators
//! yield null, logical operators use three-valued logic, and an entity
//! matches only when the predicate is true. Reading a property through a
//! null intermediate is an internal error; parse trees for in-process
//! evaluation carry null guards that short-circuit before that happens.

use chrono::{Datelike, Timelike};
use serde_json::Value;

use crate::errors::{ODataError, ODataResult};
use crate::metadata::{EdmType, ResourceInstance};

use super::ast::{
    ArithmeticOperator, Expression, FunctionCallExpr, LogicalOperator, PropertyAccessExpr,
    RelationalOperator, UnaryOperator,
};
use super::catalog::IS_NULL;
use super::literal::LiteralValue;

/// Evaluated operand: a primitive value or a complex/entity node
enum Operand<'v> {
    Literal(LiteralValue),
    Resource(Option<&'v Value>),
}

impl Operand<'_> {
    fn is_null(&self) -> bool {
        match self {
            Operand::Literal(v) => v.is_null(),
            Operand::Resource(r) => r.is_none(),
        }
    }

    fn into_literal(self) -> ODataResult<LiteralValue> {
        match self {
            Operand::Literal(v) => Ok(v),
            Operand::Resource(None) => Ok(LiteralValue::Null),
            Operand::Resource(Some(_)) => Err(ODataError::internal(
                "Complex or entity value used where a primitive is required",
            )),
        }
    }
}

/// True when `filter` evaluates to true for `entity`
pub fn matches(filter: &Expression, entity: &Value) -> ODataResult<bool> {
    Ok(matches!(evaluate(filter, entity)?, LiteralValue::Boolean(true)))
}

/// Evaluate a primitive-typed expression against `entity`
pub fn evaluate(expr: &Expression, entity: &Value) -> ODataResult<LiteralValue> {
    eval(expr, entity)?.into_literal()
}

fn eval<'v>(expr: &Expression, entity: &'v Value) -> ODataResult<Operand<'v>> {
    let value = match expr {
        Expression::Constant(c) => c.value().clone(),
        Expression::PropertyAccess(chain) => return read_chain(chain, entity),
        Expression::Unary(u) => {
            let operand = evaluate(u.operand(), entity)?;
            match u.op() {
                UnaryOperator::Not => match operand {
                    LiteralValue::Boolean(b) => LiteralValue::Boolean(!b),
                    _ => LiteralValue::Null,
                },
                UnaryOperator::Negate => negate(operand),
            }
        }
        Expression::Arithmetic(b) => {
            let left = evaluate(b.left(), entity)?;
            let right = evaluate(b.right(), entity)?;
            arithmetic(b.op(), &left, &right, expr.edm_type())
        }
        Expression::Relational(b) => {
            let left = eval(b.left(), entity)?;
            let right = eval(b.right(), entity)?;
            relational(b.op(), left, right)?
        }
        Expression::Logical(b) => logical(b.op(), b.left(), b.right(), entity)?,
        Expression::FunctionCall(call) => call_function(call, entity)?,
    };
    Ok(Operand::Literal(value))
}

fn read_chain<'v>(chain: &PropertyAccessExpr, entity: &'v Value) -> ODataResult<Operand<'v>> {
    let mut current = entity;
    let last = chain.depth().saturating_sub(1);

    for (i, hop) in chain.hops().iter().enumerate() {
        let Some(next) = current.get_property(&hop.property)? else {
            if i == last {
                return Ok(if hop.edm_type.is_primitive() {
                    Operand::Literal(LiteralValue::Null)
                } else {
                    Operand::Resource(None)
                });
            }
            return Err(ODataError::internal(format!(
                "Cannot read '{}' through null property '{}'",
                chain.path(),
                hop.property.name
            )));
        };
        current = next;
    }

    if chain.edm_type().is_primitive() {
        Ok(Operand::Literal(LiteralValue::from_json(
            current,
            chain.edm_type(),
        )?))
    } else {
        Ok(Operand::Resource(Some(current)))
    }
}

fn negate(value: LiteralValue) -> LiteralValue {
    match value {
        LiteralValue::Int32(v) => v
            .checked_neg()
            .map(LiteralValue::Int32)
            .unwrap_or(LiteralValue::Int64(-i64::from(v))),
        LiteralValue::Int64(v) => v.checked_neg().map(LiteralValue::Int64).unwrap_or(LiteralValue::Null),
        LiteralValue::Single(v) => LiteralValue::Single(-v),
        LiteralValue::Double(v) => LiteralValue::Double(-v),
        LiteralValue::Decimal(v) => LiteralValue::Decimal(-v),
        _ => LiteralValue::Null,
    }
}

/// Numeric result typed by `result_type`; null on null operands or
/// integral division by zero
fn arithmetic(
    op: ArithmeticOperator,
    left: &LiteralValue,
    right: &LiteralValue,
    result_type: EdmType,
) -> LiteralValue {
    if result_type.is_integral() {
        let (Some(a), Some(b)) = (left.as_i64(), right.as_i64()) else {
            return LiteralValue::Null;
        };
        let result = match op {
            ArithmeticOperator::Add => a.checked_add(b),
            ArithmeticOperator::Sub => a.checked_sub(b),
            ArithmeticOperator::Mul => a.checked_mul(b),
            ArithmeticOperator::Div => a.checked_div(b),
            ArithmeticOperator::Mod => a.checked_rem(b),
        };
        return match (result, result_type) {
            (Some(v), EdmType::Int64) => LiteralValue::Int64(v),
            (Some(v), _) => i32::try_from(v)
                .map(LiteralValue::Int32)
                .unwrap_or(LiteralValue::Int64(v)),
            (None, _) => LiteralValue::Null,
        };
    }

    let (Some(a), Some(b)) = (left.as_f64(), right.as_f64()) else {
        return LiteralValue::Null;
    };
    let result = match op {
        ArithmeticOperator::Add => a + b,
        ArithmeticOperator::Sub => a - b,
        ArithmeticOperator::Mul => a * b,
        ArithmeticOperator::Div => a / b,
        ArithmeticOperator::Mod => a % b,
    };
    float_of_type(result, result_type)
}

fn float_of_type(value: f64, edm_type: EdmType) -> LiteralValue {
    match edm_type {
        EdmType::Single => LiteralValue::Single(value as f32),
        EdmType::Decimal => LiteralValue::Decimal(value),
        _ => LiteralValue::Double(value),
    }
}

fn relational(op: RelationalOperator, left: Operand<'_>, right: Operand<'_>) -> ODataResult<LiteralValue> {
    if left.is_null() || right.is_null() {
        let both = left.is_null() && right.is_null();
        return Ok(match op {
            RelationalOperator::Eq => LiteralValue::Boolean(both),
            RelationalOperator::Ne => LiteralValue::Boolean(!both),
            _ => LiteralValue::Null,
        });
    }

    let left = left.into_literal()?;
    let right = right.into_literal()?;
    let ordering = left.compare(&right).ok_or_else(|| {
        ODataError::internal(format!("Cannot compare {} with {}", left, right))
    })?;

    Ok(LiteralValue::Boolean(match op {
        RelationalOperator::Eq => ordering.is_eq(),
        RelationalOperator::Ne => ordering.is_ne(),
        RelationalOperator::Gt => ordering.is_gt(),
        RelationalOperator::Ge => ordering.is_ge(),
        RelationalOperator::Lt => ordering.is_lt(),
        RelationalOperator::Le => ordering.is_le(),
    }))
}

fn as_bool(value: &LiteralValue) -> Option<bool> {
    match value {
        LiteralValue::Boolean(b) => Some(*b),
        _ => None,
    }
}

fn logical(
    op: LogicalOperator,
    left: &Expression,
    right: &Expression,
    entity: &Value,
) -> ODataResult<LiteralValue> {
    let l = as_bool(&evaluate(left, entity)?);

    // Right side is skipped once the result is decided; null guards rely on it
    match (op, l) {
        (LogicalOperator::And, Some(false)) => return Ok(LiteralValue::Boolean(false)),
        (LogicalOperator::Or, Some(true)) => return Ok(LiteralValue::Boolean(true)),
        _ => {}
    }

    let r = as_bool(&evaluate(right, entity)?);
    let result = match op {
        LogicalOperator::And => match (l, r) {
            (_, Some(false)) => Some(false),
            (Some(true), Some(true)) => Some(true),
            _ => None,
        },
        LogicalOperator::Or => match (l, r) {
            (_, Some(true)) => Some(true),
            (Some(false), Some(false)) => Some(false),
            _ => None,
        },
    };
    Ok(result.map(LiteralValue::Boolean).unwrap_or(LiteralValue::Null))
}

fn call_function(call: &FunctionCallExpr, entity: &Value) -> ODataResult<LiteralValue> {
    let name = call.signature().name.as_str();

    if name == IS_NULL {
        let [arg] = call.args() else {
            return Err(ODataError::internal("is_null takes exactly one argument"));
        };
        return Ok(LiteralValue::Boolean(eval(arg, entity)?.is_null()));
    }

    let args = call
        .args()
        .iter()
        .map(|arg| evaluate(arg, entity))
        .collect::<ODataResult<Vec<_>>>()?;
    if args.iter().any(LiteralValue::is_null) {
        return Ok(LiteralValue::Null);
    }

    let text = |i: usize| args.get(i).and_then(LiteralValue::as_str).unwrap_or_default();
    let int = |i: usize| args.get(i).and_then(LiteralValue::as_i64).unwrap_or_default();
    let number = |i: usize| args.get(i).and_then(LiteralValue::as_f64).unwrap_or_default();
    let datetime = |i: usize| match args.get(i) {
        Some(LiteralValue::DateTime(dt)) => Some(*dt),
        _ => None,
    };
    let int32 = |v: usize| LiteralValue::Int32(i32::try_from(v).unwrap_or(i32::MAX));

    let value = match name {
        "substringof" => LiteralValue::Boolean(text(1).contains(text(0))),
        "startswith" => LiteralValue::Boolean(text(0).starts_with(text(1))),
        "endswith" => LiteralValue::Boolean(text(0).ends_with(text(1))),
        "indexof" => match text(0).find(text(1)) {
            Some(byte) => int32(text(0)[..byte].chars().count()),
            None => LiteralValue::Int32(-1),
        },
        "length" => int32(text(0).chars().count()),
        "replace" => LiteralValue::String(text(0).replace(text(1), text(2))),
        "substring" => {
            let start = usize::try_from(int(1).max(0)).unwrap_or(0);
            let chars = text(0).chars().skip(start);
            LiteralValue::String(if args.len() == 3 {
                let len = usize::try_from(int(2).max(0)).unwrap_or(0);
                chars.take(len).collect()
            } else {
                chars.collect()
            })
        }
        "tolower" => LiteralValue::String(text(0).to_lowercase()),
        "toupper" => LiteralValue::String(text(0).to_uppercase()),
        "trim" => LiteralValue::String(text(0).trim().to_string()),
        "concat" => LiteralValue::String(format!("{}{}", text(0), text(1))),
        "year" | "month" | "day" | "hour" | "minute" | "second" => {
            let dt = datetime(0).ok_or_else(|| {
                ODataError::internal(format!("{} requires an Edm.DateTime argument", name))
            })?;
            let part = match name {
                "year" => dt.year(),
                "month" => dt.month() as i32,
                "day" => dt.day() as i32,
                "hour" => dt.hour() as i32,
                "minute" => dt.minute() as i32,
                _ => dt.second() as i32,
            };
            LiteralValue::Int32(part)
        }
        "round" => float_of_type(number(0).round(), call.signature().return_type),
        "floor" => float_of_type(number(0).floor(), call.signature().return_type),
        "ceiling" => float_of_type(number(0).ceil(), call.signature().return_type),
        other => {
            return Err(ODataError::provider_configuration(format!(
                "No in-process implementation for function '{}'",
                other
            )))
        }
    };
    Ok(value)
}
