//! Token types for the `$filter` lexer

use std::fmt;

/// A single token produced by the lexer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    /// Source text of the token, quotes and type prefixes included
    pub text: String,
    /// Token discriminant
    pub kind: TokenKind,
    /// Byte offset of the first character
    pub position: usize,
}

impl Token {
    pub fn new(text: impl Into<String>, kind: TokenKind, position: usize) -> Self {
        Self {
            text: text.into(),
            kind,
            position,
        }
    }
}

/// Token discriminant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    /// Property name or navigation path (`Address/Country`), or function name
    Identifier,

    // Literals
    IntegerLiteral,
    Int64Literal,
    SingleLiteral,
    DoubleLiteral,
    DecimalLiteral,
    StringLiteral,
    GuidLiteral,
    DateTimeLiteral,
    BinaryLiteral,
    BooleanLiteral,
    NullLiteral,

    // Relational
    Eq,
    Ne,
    Gt,
    Ge,
    Lt,
    Le,

    // Logical
    And,
    Or,
    Not,

    // Arithmetic
    Add,
    Sub,
    Mul,
    Div,
    Mod,

    /// Unary minus (`-`) not attached to a number
    Minus,
    Comma,
    OpenParen,
    CloseParen,
    End,
}

impl TokenKind {
    /// Keyword operators, matched case-sensitively
    pub fn keyword(word: &str) -> Option<TokenKind> {
        let kind = match word {
            "eq" => TokenKind::Eq,
            "ne" => TokenKind::Ne,
            "gt" => TokenKind::Gt,
            "ge" => TokenKind::Ge,
            "lt" => TokenKind::Lt,
            "le" => TokenKind::Le,
            "and" => TokenKind::And,
            "or" => TokenKind::Or,
            "not" => TokenKind::Not,
            "add" => TokenKind::Add,
            "sub" => TokenKind::Sub,
            "mul" => TokenKind::Mul,
            "div" => TokenKind::Div,
            "mod" => TokenKind::Mod,
            "true" | "false" => TokenKind::BooleanLiteral,
            "null" => TokenKind::NullLiteral,
            _ => return None,
        };
        Some(kind)
    }

    pub fn is_literal(&self) -> bool {
        matches!(
            self,
            TokenKind::IntegerLiteral
                | TokenKind::Int64Literal
                | TokenKind::SingleLiteral
                | TokenKind::DoubleLiteral
                | TokenKind::DecimalLiteral
                | TokenKind::StringLiteral
                | TokenKind::GuidLiteral
                | TokenKind::DateTimeLiteral
                | TokenKind::BinaryLiteral
                | TokenKind::BooleanLiteral
                | TokenKind::NullLiteral
        )
    }

    pub fn is_relational(&self) -> bool {
        matches!(
            self,
            TokenKind::Eq
                | TokenKind::Ne
                | TokenKind::Gt
                | TokenKind::Ge
                | TokenKind::Lt
                | TokenKind::Le
        )
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TokenKind::Identifier => "identifier",
            TokenKind::IntegerLiteral => "Int32 literal",
            TokenKind::Int64Literal => "Int64 literal",
            TokenKind::SingleLiteral => "Single literal",
            TokenKind::DoubleLiteral => "Double literal",
            TokenKind::DecimalLiteral => "Decimal literal",
            TokenKind::StringLiteral => "string literal",
            TokenKind::GuidLiteral => "guid literal",
            TokenKind::DateTimeLiteral => "datetime literal",
            TokenKind::BinaryLiteral => "binary literal",
            TokenKind::BooleanLiteral => "boolean literal",
            TokenKind::NullLiteral => "null",
            TokenKind::Eq => "eq",
            TokenKind::Ne => "ne",
            TokenKind::Gt => "gt",
            TokenKind::Ge => "ge",
            TokenKind::Lt => "lt",
            TokenKind::Le => "le",
            TokenKind::And => "and",
            TokenKind::Or => "or",
            TokenKind::Not => "not",
            TokenKind::Add => "add",
            TokenKind::Sub => "sub",
            TokenKind::Mul => "mul",
            TokenKind::Div => "div",
            TokenKind::Mod => "mod",
            TokenKind::Minus => "'-'",
            TokenKind::Comma => "','",
            TokenKind::OpenParen => "'('",
            TokenKind::CloseParen => "')'",
            TokenKind::End => "end of input",
        };
        f.write_str(name)
    }
}
