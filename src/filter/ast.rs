//! Typed expression tree for `$filter`
//!
//! Every node carries its type from construction on. Relational and
//! logical nodes are always `Edm.Boolean`; arithmetic and function call
//! nodes carry the type their operator or signature produces.

use std::fmt;

use crate::metadata::{EdmType, ResourceProperty};

use super::catalog::FunctionSignature;
use super::literal::LiteralValue;

/// Arithmetic operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArithmeticOperator {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
}

/// Relational operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelationalOperator {
    Eq,
    Ne,
    Gt,
    Ge,
    Lt,
    Le,
}

/// Logical operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalOperator {
    And,
    Or,
}

/// Unary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOperator {
    Negate,
    Not,
}

impl ArithmeticOperator {
    pub fn as_str(&self) -> &'static str {
        match self {
            ArithmeticOperator::Add => "add",
            ArithmeticOperator::Sub => "sub",
            ArithmeticOperator::Mul => "mul",
            ArithmeticOperator::Div => "div",
            ArithmeticOperator::Mod => "mod",
        }
    }
}

impl RelationalOperator {
    pub fn as_str(&self) -> &'static str {
        match self {
            RelationalOperator::Eq => "eq",
            RelationalOperator::Ne => "ne",
            RelationalOperator::Gt => "gt",
            RelationalOperator::Ge => "ge",
            RelationalOperator::Lt => "lt",
            RelationalOperator::Le => "le",
        }
    }

    pub fn is_equality(&self) -> bool {
        matches!(self, RelationalOperator::Eq | RelationalOperator::Ne)
    }
}

impl LogicalOperator {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogicalOperator::And => "and",
            LogicalOperator::Or => "or",
        }
    }
}

impl UnaryOperator {
    pub fn as_str(&self) -> &'static str {
        match self {
            UnaryOperator::Negate => "-",
            UnaryOperator::Not => "not",
        }
    }
}

/// One resolved hop of a property path
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyHop {
    pub property: ResourceProperty,
    pub edm_type: EdmType,
}

impl PropertyHop {
    pub fn new(property: ResourceProperty) -> Self {
        let edm_type = property.edm_type();
        Self { property, edm_type }
    }
}

/// Property access chain, stored root first.
///
/// The parent of hop `i` is hop `i - 1`; hop 0 hangs off the entity
/// being filtered.
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyAccessExpr {
    hops: Vec<PropertyHop>,
}

impl PropertyAccessExpr {
    pub fn new(hops: Vec<PropertyHop>) -> Self {
        Self { hops }
    }

    pub fn hops(&self) -> &[PropertyHop] {
        &self.hops
    }

    pub fn leaf(&self) -> Option<&PropertyHop> {
        self.hops.last()
    }

    /// Hop the given hop hangs off, None for the root hop
    pub fn parent_of(&self, index: usize) -> Option<&PropertyHop> {
        index.checked_sub(1).and_then(|i| self.hops.get(i))
    }

    pub fn depth(&self) -> usize {
        self.hops.len()
    }

    /// Type of the value this chain reads
    pub fn edm_type(&self) -> EdmType {
        self.leaf().map(|h| h.edm_type).unwrap_or(EdmType::Null)
    }

    /// Chains for every intermediate hop, shortest first
    pub fn ancestors(&self) -> Vec<PropertyAccessExpr> {
        (1..self.hops.len())
            .map(|len| PropertyAccessExpr::new(self.hops[..len].to_vec()))
            .collect()
    }

    /// Slash separated path, as written in a query
    pub fn path(&self) -> String {
        self.hops
            .iter()
            .map(|h| h.property.name.as_str())
            .collect::<Vec<_>>()
            .join("/")
    }
}

/// Constant node
#[derive(Debug, Clone, PartialEq)]
pub struct ConstantExpr {
    value: LiteralValue,
    edm_type: EdmType,
}

impl ConstantExpr {
    pub fn value(&self) -> &LiteralValue {
        &self.value
    }

    pub fn edm_type(&self) -> EdmType {
        self.edm_type
    }
}

/// Unary node
#[derive(Debug, Clone, PartialEq)]
pub struct UnaryExpr {
    op: UnaryOperator,
    operand: Box<Expression>,
    edm_type: EdmType,
}

impl UnaryExpr {
    pub fn op(&self) -> UnaryOperator {
        self.op
    }

    pub fn operand(&self) -> &Expression {
        &self.operand
    }
}

/// Binary node, shared by the arithmetic, relational and logical variants
#[derive(Debug, Clone, PartialEq)]
pub struct BinaryExpr<Op> {
    op: Op,
    left: Box<Expression>,
    right: Box<Expression>,
    edm_type: EdmType,
}

impl<Op: Copy> BinaryExpr<Op> {
    pub fn op(&self) -> Op {
        self.op
    }

    pub fn left(&self) -> &Expression {
        &self.left
    }

    pub fn right(&self) -> &Expression {
        &self.right
    }
}

/// Function call node
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionCallExpr {
    signature: FunctionSignature,
    args: Vec<Expression>,
}

impl FunctionCallExpr {
    pub fn signature(&self) -> &FunctionSignature {
        &self.signature
    }

    pub fn args(&self) -> &[Expression] {
        &self.args
    }
}

/// Expression tree node
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    Constant(ConstantExpr),
    PropertyAccess(PropertyAccessExpr),
    Unary(UnaryExpr),
    Arithmetic(BinaryExpr<ArithmeticOperator>),
    Relational(BinaryExpr<RelationalOperator>),
    Logical(BinaryExpr<LogicalOperator>),
    FunctionCall(FunctionCallExpr),
}

impl Expression {
    pub(crate) fn constant(value: LiteralValue) -> Self {
        let edm_type = value.edm_type();
        Expression::Constant(ConstantExpr { value, edm_type })
    }

    pub(crate) fn unary(op: UnaryOperator, operand: Expression, edm_type: EdmType) -> Self {
        Expression::Unary(UnaryExpr {
            op,
            operand: Box::new(operand),
            edm_type,
        })
    }

    pub(crate) fn arithmetic(
        op: ArithmeticOperator,
        left: Expression,
        right: Expression,
        edm_type: EdmType,
    ) -> Self {
        Expression::Arithmetic(BinaryExpr {
            op,
            left: Box::new(left),
            right: Box::new(right),
            edm_type,
        })
    }

    pub(crate) fn relational(op: RelationalOperator, left: Expression, right: Expression) -> Self {
        Expression::Relational(BinaryExpr {
            op,
            left: Box::new(left),
            right: Box::new(right),
            edm_type: EdmType::Boolean,
        })
    }

    pub(crate) fn logical(op: LogicalOperator, left: Expression, right: Expression) -> Self {
        Expression::Logical(BinaryExpr {
            op,
            left: Box::new(left),
            right: Box::new(right),
            edm_type: EdmType::Boolean,
        })
    }

    pub(crate) fn call(signature: FunctionSignature, args: Vec<Expression>) -> Self {
        Expression::FunctionCall(FunctionCallExpr { signature, args })
    }

    /// `not is_null(chain)`
    pub(crate) fn not_null(chain: PropertyAccessExpr) -> Self {
        let test = Expression::call(
            FunctionSignature::is_null(),
            vec![Expression::PropertyAccess(chain)],
        );
        Expression::unary(UnaryOperator::Not, test, EdmType::Boolean)
    }

    /// Type of the value the node produces
    pub fn edm_type(&self) -> EdmType {
        match self {
            Expression::Constant(c) => c.edm_type,
            Expression::PropertyAccess(p) => p.edm_type(),
            Expression::Unary(u) => u.edm_type,
            Expression::Arithmetic(b) => b.edm_type,
            Expression::Relational(b) => b.edm_type,
            Expression::Logical(b) => b.edm_type,
            Expression::FunctionCall(f) => f.signature.return_type,
        }
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expression::Constant(c) => write!(f, "{}", c.value),
            Expression::PropertyAccess(p) => f.write_str(&p.path()),
            Expression::Unary(u) => match u.op {
                UnaryOperator::Not => write!(f, "NOT {}", u.operand),
                UnaryOperator::Negate => write!(f, "-{}", u.operand),
            },
            Expression::Arithmetic(b) => {
                write!(f, "({} {} {})", b.left, b.op.as_str(), b.right)
            }
            Expression::Relational(b) => {
                write!(f, "({} {} {})", b.left, b.op.as_str(), b.right)
            }
            Expression::Logical(b) => write!(
                f,
                "{}({}, {})",
                b.op.as_str().to_uppercase(),
                b.left,
                b.right
            ),
            Expression::FunctionCall(call) => {
                write!(f, "{}(", call.signature.name)?;
                for (i, arg) in call.args.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", arg)?;
                }
                f.write_str(")")
            }
        }
    }
}
