//! # Expression Parser
//!
//! Recursive descent over the token stream. Precedence, highest first:
//!
//! 1. primary: literal, property path, function call, parenthesized
//! 2. unary: `-`, `not`
//! 3. multiplicative: `mul`, `div`, `mod`
//! 4. additive: `add`, `sub`
//! 5. relational: `eq`, `ne`, `gt`, `ge`, `lt`, `le`
//! 6. `and`
//! 7. `or`
//!
//! Trees built for in-process evaluation get null guards: every boolean
//! node reading through a multi-hop property path is conjoined with
//! `not is_null(ancestor)` for each intermediate hop. A boolean path is
//! guarded where it stands as a predicate (the whole filter, a `not`
//! operand, an `and`/`or` operand); as a comparison operand it is covered
//! by the comparison's own guard.

use crate::errors::{ODataError, ODataResult};
use crate::metadata::{EdmType, MetadataProvider, ResourceType};

use super::ast::{
    ArithmeticOperator, Expression, LogicalOperator, PropertyAccessExpr, PropertyHop,
    RelationalOperator, UnaryOperator,
};
use super::catalog::{FunctionCatalog, IS_NULL};
use super::lexer::tokenize;
use super::literal::LiteralValue;
use super::token::{Token, TokenKind};

/// Where a parsed tree will be evaluated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EvaluationMode {
    /// Translated for a backend with native null semantics
    #[default]
    PushDown,
    /// Walked directly over entity instances
    InProcess,
}

/// Everything the parser needs besides tokens
#[derive(Clone, Copy)]
pub struct ParseContext<'a> {
    pub metadata: &'a dyn MetadataProvider,
    pub resource_type: &'a ResourceType,
    pub catalog: &'a FunctionCatalog,
    pub mode: EvaluationMode,
}

impl<'a> ParseContext<'a> {
    pub fn new(
        metadata: &'a dyn MetadataProvider,
        resource_type: &'a ResourceType,
        catalog: &'a FunctionCatalog,
    ) -> Self {
        Self {
            metadata,
            resource_type,
            catalog,
            mode: EvaluationMode::PushDown,
        }
    }

    pub fn with_mode(mut self, mode: EvaluationMode) -> Self {
        self.mode = mode;
        self
    }
}

/// Parse a `$filter` string
pub fn parse_filter(text: &str, ctx: ParseContext<'_>) -> ODataResult<Expression> {
    parse(tokenize(text), ctx)
}

/// Parse a token stream into a boolean expression tree
pub fn parse<I>(tokens: I, ctx: ParseContext<'_>) -> ODataResult<Expression>
where
    I: IntoIterator<Item = ODataResult<Token>>,
{
    let mut parser = ExpressionParser::new(tokens.into_iter(), ctx)?;
    let expr = parser.parse_or()?;
    parser.expect(TokenKind::End)?;
    let expr = parser.predicate(expr);

    if expr.edm_type() != EdmType::Boolean {
        return Err(ODataError::type_mismatch(format!(
            "Filter expression must be Edm.Boolean, found {}",
            expr.edm_type()
        )));
    }
    Ok(expr)
}

struct ExpressionParser<'a, I> {
    tokens: I,
    current: Token,
    ctx: ParseContext<'a>,
}

impl<'a, I> ExpressionParser<'a, I>
where
    I: Iterator<Item = ODataResult<Token>>,
{
    fn new(mut tokens: I, ctx: ParseContext<'a>) -> ODataResult<Self> {
        let current = tokens
            .next()
            .transpose()?
            .unwrap_or_else(|| Token::new("", TokenKind::End, 0));
        Ok(Self {
            tokens,
            current,
            ctx,
        })
    }

    fn advance(&mut self) -> ODataResult<Token> {
        let end = self.current.position + self.current.text.len();
        let next = self
            .tokens
            .next()
            .transpose()?
            .unwrap_or_else(|| Token::new("", TokenKind::End, end));
        Ok(std::mem::replace(&mut self.current, next))
    }

    fn expect(&mut self, kind: TokenKind) -> ODataResult<Token> {
        if self.current.kind == kind {
            return self.advance();
        }
        Err(self.unexpected(&format!("Expected {}", kind)))
    }

    fn unexpected(&self, expectation: &str) -> ODataError {
        if self.current.kind == TokenKind::End {
            ODataError::syntax(
                self.current.position,
                format!("{}, found unexpected end of input", expectation),
            )
        } else {
            ODataError::syntax(
                self.current.position,
                format!("{}, found '{}'", expectation, self.current.text),
            )
        }
    }

    fn parse_or(&mut self) -> ODataResult<Expression> {
        let mut left = self.parse_and()?;
        while self.current.kind == TokenKind::Or {
            self.advance()?;
            let right = self.parse_and()?;
            left = build_logical(LogicalOperator::Or, self.predicate(left), self.predicate(right))?;
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> ODataResult<Expression> {
        let mut left = self.parse_relational()?;
        while self.current.kind == TokenKind::And {
            self.advance()?;
            let right = self.parse_relational()?;
            left = build_logical(LogicalOperator::And, self.predicate(left), self.predicate(right))?;
        }
        Ok(left)
    }

    fn parse_relational(&mut self) -> ODataResult<Expression> {
        let mut left = self.parse_additive()?;
        loop {
            let op = match self.current.kind {
                TokenKind::Eq => RelationalOperator::Eq,
                TokenKind::Ne => RelationalOperator::Ne,
                TokenKind::Gt => RelationalOperator::Gt,
                TokenKind::Ge => RelationalOperator::Ge,
                TokenKind::Lt => RelationalOperator::Lt,
                TokenKind::Le => RelationalOperator::Le,
                _ => return Ok(left),
            };
            self.advance()?;
            let right = self.parse_additive()?;
            let node = build_relational(op, left, right)?;
            left = self.guard(node);
        }
    }

    fn parse_additive(&mut self) -> ODataResult<Expression> {
        let mut left = self.parse_multiplicative()?;
        loop {
            let op = match self.current.kind {
                TokenKind::Add => ArithmeticOperator::Add,
                TokenKind::Sub => ArithmeticOperator::Sub,
                _ => return Ok(left),
            };
            self.advance()?;
            let right = self.parse_multiplicative()?;
            left = build_arithmetic(op, left, right)?;
        }
    }

    fn parse_multiplicative(&mut self) -> ODataResult<Expression> {
        let mut left = self.parse_unary()?;
        loop {
            let op = match self.current.kind {
                TokenKind::Mul => ArithmeticOperator::Mul,
                TokenKind::Div => ArithmeticOperator::Div,
                TokenKind::Mod => ArithmeticOperator::Mod,
                _ => return Ok(left),
            };
            self.advance()?;
            let right = self.parse_unary()?;
            left = build_arithmetic(op, left, right)?;
        }
    }

    fn parse_unary(&mut self) -> ODataResult<Expression> {
        match self.current.kind {
            TokenKind::Minus => {
                self.advance()?;
                let operand = self.parse_unary()?;
                let edm_type = operand.edm_type();
                if !edm_type.is_numeric() {
                    return Err(ODataError::type_mismatch(format!(
                        "Operator '-' requires a numeric operand, found {}",
                        edm_type
                    )));
                }
                Ok(Expression::unary(UnaryOperator::Negate, operand, edm_type))
            }
            TokenKind::Not => {
                self.advance()?;
                let operand = self.parse_unary()?;
                if operand.edm_type() != EdmType::Boolean {
                    return Err(ODataError::type_mismatch(format!(
                        "Operator 'not' requires an Edm.Boolean operand, found {}",
                        operand.edm_type()
                    )));
                }
                Ok(Expression::unary(
                    UnaryOperator::Not,
                    self.predicate(operand),
                    EdmType::Boolean,
                ))
            }
            _ => self.parse_primary(),
        }
    }

    fn parse_primary(&mut self) -> ODataResult<Expression> {
        let kind = self.current.kind;
        match kind {
            TokenKind::OpenParen => {
                self.advance()?;
                let expr = self.parse_or()?;
                self.expect(TokenKind::CloseParen)?;
                Ok(expr)
            }
            kind if kind.is_literal() => {
                let token = self.advance()?;
                Ok(Expression::constant(LiteralValue::from_token(&token)?))
            }
            TokenKind::Identifier => {
                let token = self.advance()?;
                if self.current.kind == TokenKind::OpenParen {
                    self.parse_function_call(token)
                } else {
                    self.parse_property_chain(&token)
                }
            }
            _ => Err(self.unexpected("Expected expression")),
        }
    }

    fn parse_function_call(&mut self, name: Token) -> ODataResult<Expression> {
        self.expect(TokenKind::OpenParen)?;

        let mut args = Vec::new();
        if self.current.kind != TokenKind::CloseParen {
            loop {
                args.push(self.parse_or()?);
                if self.current.kind != TokenKind::Comma {
                    break;
                }
                self.advance()?;
            }
        }
        self.expect(TokenKind::CloseParen)?;

        let arg_types: Vec<EdmType> = args.iter().map(Expression::edm_type).collect();
        if name.text == IS_NULL || !self.ctx.catalog.contains(&name.text) {
            let names: Vec<String> = arg_types.iter().map(|t| t.to_string()).collect();
            return Err(ODataError::unknown_function(&name.text, &names));
        }

        let signature = self.ctx.catalog.lookup(&name.text, &arg_types)?;
        let returns_boolean = signature.return_type == EdmType::Boolean;
        let call = Expression::call(signature, args);
        Ok(if returns_boolean { self.guard(call) } else { call })
    }

    fn parse_property_chain(&mut self, token: &Token) -> ODataResult<Expression> {
        let segments: Vec<&str> = token.text.split('/').collect();
        if segments.iter().any(|s| s.is_empty()) {
            return Err(ODataError::syntax(
                token.position,
                format!("Malformed property path '{}'", token.text),
            ));
        }

        let chain = resolve_path(self.ctx.metadata, self.ctx.resource_type, &segments)?;
        Ok(Expression::PropertyAccess(chain))
    }

    /// Guard a bare boolean path standing as a predicate
    fn predicate(&self, expr: Expression) -> Expression {
        let is_path = matches!(expr, Expression::PropertyAccess(_));
        if is_path && expr.edm_type() == EdmType::Boolean {
            self.guard(expr)
        } else {
            expr
        }
    }

    /// Conjoin null checks for every intermediate hop read by `node`
    fn guard(&self, node: Expression) -> Expression {
        if self.ctx.mode != EvaluationMode::InProcess {
            return node;
        }

        let mut chains = Vec::new();
        match &node {
            Expression::Relational(b) => {
                collect_chains(b.left(), &mut chains);
                collect_chains(b.right(), &mut chains);
            }
            Expression::FunctionCall(call) => {
                for arg in call.args() {
                    collect_chains(arg, &mut chains);
                }
            }
            Expression::PropertyAccess(chain) => chains.push(chain),
            _ => {}
        }

        let mut seen: Vec<String> = Vec::new();
        let mut guards: Vec<PropertyAccessExpr> = Vec::new();
        for chain in chains {
            for ancestor in chain.ancestors() {
                let path = ancestor.path();
                if !seen.contains(&path) {
                    seen.push(path);
                    guards.push(ancestor);
                }
            }
        }

        let mut guards = guards.into_iter().map(Expression::not_null);
        let Some(first) = guards.next() else {
            return node;
        };
        let condition = guards.fold(first, |acc, g| {
            Expression::logical(LogicalOperator::And, acc, g)
        });
        Expression::logical(LogicalOperator::And, condition, node)
    }
}

/// Property chains read by a non-boolean subtree
fn collect_chains<'e>(expr: &'e Expression, out: &mut Vec<&'e PropertyAccessExpr>) {
    match expr {
        Expression::PropertyAccess(chain) => out.push(chain),
        Expression::Arithmetic(b) => {
            collect_chains(b.left(), out);
            collect_chains(b.right(), out);
        }
        Expression::Unary(u) if u.op() == UnaryOperator::Negate => collect_chains(u.operand(), out),
        Expression::FunctionCall(call) if call.signature().return_type != EdmType::Boolean => {
            for arg in call.args() {
                collect_chains(arg, out);
            }
        }
        _ => {}
    }
}

/// Resolve path segments hop by hop starting at `root`.
///
/// Intermediate hops must be complex or single-valued navigation
/// properties; collections are rejected anywhere in the path.
pub fn resolve_path(
    metadata: &dyn MetadataProvider,
    root: &ResourceType,
    segments: &[&str],
) -> ODataResult<PropertyAccessExpr> {
    let mut hops = Vec::with_capacity(segments.len());
    let mut current = root;

    for (i, segment) in segments.iter().enumerate() {
        let property = metadata.resolve_property(current, segment)?;
        if property.is_collection() {
            return Err(ODataError::collection_not_allowed(&property.name));
        }

        let is_last = i + 1 == segments.len();
        if !is_last {
            if property.is_primitive() {
                return Err(ODataError::unknown_property(
                    property.edm_type().name(),
                    segments[i + 1],
                ));
            }
            current = metadata.target_type(property)?;
        }
        hops.push(PropertyHop::new(property.clone()));
    }

    Ok(PropertyAccessExpr::new(hops))
}

fn build_logical(op: LogicalOperator, left: Expression, right: Expression) -> ODataResult<Expression> {
    for operand in [&left, &right] {
        if operand.edm_type() != EdmType::Boolean {
            return Err(ODataError::type_mismatch(format!(
                "Operator '{}' requires Edm.Boolean operands, found {}",
                op.as_str(),
                operand.edm_type()
            )));
        }
    }
    Ok(Expression::logical(op, left, right))
}

fn build_arithmetic(
    op: ArithmeticOperator,
    left: Expression,
    right: Expression,
) -> ODataResult<Expression> {
    let (lt, rt) = (left.edm_type(), right.edm_type());
    let result = EdmType::promote(lt, rt).ok_or_else(|| {
        ODataError::type_mismatch(format!(
            "Operator '{}' requires numeric operands, found {} and {}",
            op.as_str(),
            lt,
            rt
        ))
    })?;
    Ok(Expression::arithmetic(op, left, right, result))
}

fn build_relational(
    op: RelationalOperator,
    left: Expression,
    right: Expression,
) -> ODataResult<Expression> {
    let (lt, rt) = (left.edm_type(), right.edm_type());

    for t in [lt, rt] {
        if (t.is_equality_only() || t == EdmType::Resource) && !op.is_equality() {
            return Err(ODataError::type_mismatch(format!(
                "Operator '{}' is not supported for type {}",
                op.as_str(),
                t
            )));
        }
    }

    let compatible = match (lt, rt) {
        (EdmType::Null, _) | (_, EdmType::Null) => true,
        (EdmType::Resource, _) | (_, EdmType::Resource) => false,
        (a, b) if a.is_numeric() && b.is_numeric() => true,
        (a, b) => a == b,
    };
    if !compatible {
        return Err(ODataError::type_mismatch(format!(
            "Operator '{}' cannot compare {} with {}",
            op.as_str(),
            lt,
            rt
        )));
    }

    Ok(Expression::relational(op, left, right))
}
