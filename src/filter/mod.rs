//! # `$filter` Compilation
//!
//! Lexer, function catalog, typed expression tree, parser and the
//! in-process evaluator.
//!
//! Text flows `tokenize` -> `parse` -> `Expression`. The tree is either
//! handed to a translator in `crate::translate` or walked directly by
//! `evaluator::matches` when parsed with `EvaluationMode::InProcess`.

pub mod ast;
pub mod catalog;
pub mod evaluator;
pub mod lexer;
pub mod literal;
pub mod parser;
pub mod token;

pub use ast::{
    ArithmeticOperator, BinaryExpr, ConstantExpr, Expression, FunctionCallExpr, LogicalOperator,
    PropertyAccessExpr, PropertyHop, RelationalOperator, UnaryExpr, UnaryOperator,
};
pub use catalog::{FunctionCatalog, FunctionSignature, IS_NULL};
pub use evaluator::{evaluate, matches};
pub use lexer::{tokenize, Lexer};
pub use literal::LiteralValue;
pub use parser::{parse, parse_filter, resolve_path, EvaluationMode, ParseContext};
pub use token::{Token, TokenKind};
