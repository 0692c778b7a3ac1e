//! `$filter` lexer
//!
//! Produces tokens lazily. Iteration stops after the `End` token or the
//! first error; restarting requires a new `Lexer`.

use crate::errors::{ODataError, ODataResult};

use super::token::{Token, TokenKind};

/// Lexer over a query option string
pub struct Lexer<'a> {
    src: &'a str,
    bytes: &'a [u8],
    pos: usize,
    finished: bool,
}

/// Tokenize `text` lazily
pub fn tokenize(text: &str) -> Lexer<'_> {
    Lexer::new(text)
}

impl<'a> Lexer<'a> {
    pub fn new(src: &'a str) -> Self {
        Self {
            src,
            bytes: src.as_bytes(),
            pos: 0,
            finished: false,
        }
    }

    /// Source text being tokenized
    pub fn source(&self) -> &'a str {
        self.src
    }

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<u8> {
        self.bytes.get(self.pos + offset).copied()
    }

    fn token(&self, kind: TokenKind, start: usize) -> Token {
        Token::new(&self.src[start..self.pos], kind, start)
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(|c| c.is_ascii_whitespace()) {
            self.pos += 1;
        }
    }

    /// Produce the next token
    pub fn next_token(&mut self) -> ODataResult<Token> {
        self.skip_whitespace();

        let start = self.pos;
        let Some(ch) = self.peek() else {
            return Ok(Token::new("", TokenKind::End, start));
        };

        match ch {
            b'\'' => {
                self.read_quoted(start)?;
                Ok(self.token(TokenKind::StringLiteral, start))
            }
            b'(' => self.single(TokenKind::OpenParen, start),
            b')' => self.single(TokenKind::CloseParen, start),
            b',' => self.single(TokenKind::Comma, start),
            b'-' if self.peek_at(1).is_some_and(|c| c.is_ascii_digit()) => {
                self.pos += 1;
                self.read_number(start)
            }
            b'-' => self.single(TokenKind::Minus, start),
            b'0'..=b'9' => self.read_number(start),
            c if c.is_ascii_alphabetic() || c == b'_' => self.read_word(start),
            _ => {
                let c = self.src[start..].chars().next().unwrap_or('?');
                Err(ODataError::syntax(
                    start,
                    format!("Invalid character '{}'", c),
                ))
            }
        }
    }

    fn single(&mut self, kind: TokenKind, start: usize) -> ODataResult<Token> {
        self.pos += 1;
        Ok(self.token(kind, start))
    }

    /// Consume a single-quoted section; `''` is an escaped quote
    fn read_quoted(&mut self, token_start: usize) -> ODataResult<()> {
        // opening quote
        self.pos += 1;
        loop {
            match self.peek() {
                None => {
                    return Err(ODataError::syntax(
                        token_start,
                        "Unterminated string literal",
                    ))
                }
                Some(b'\'') if self.peek_at(1) == Some(b'\'') => self.pos += 2,
                Some(b'\'') => {
                    self.pos += 1;
                    return Ok(());
                }
                Some(_) => self.pos += 1,
            }
        }
    }

    fn read_digits(&mut self) -> usize {
        let from = self.pos;
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.pos += 1;
        }
        self.pos - from
    }

    fn read_number(&mut self, start: usize) -> ODataResult<Token> {
        self.read_digits();
        let mut integral = true;

        if self.peek() == Some(b'.') {
            self.pos += 1;
            integral = false;
            if self.read_digits() == 0 {
                return Err(ODataError::syntax(self.pos, "Expected digit"));
            }
        }

        if matches!(self.peek(), Some(b'e') | Some(b'E')) {
            self.pos += 1;
            integral = false;
            if matches!(self.peek(), Some(b'+') | Some(b'-')) {
                self.pos += 1;
            }
            if self.read_digits() == 0 {
                return Err(ODataError::syntax(self.pos, "Expected digit"));
            }
        }

        let kind = match self.peek() {
            Some(b'L') | Some(b'l') if integral => TokenKind::Int64Literal,
            Some(b'F') | Some(b'f') => TokenKind::SingleLiteral,
            Some(b'M') | Some(b'm') => TokenKind::DecimalLiteral,
            Some(b'D') | Some(b'd') => TokenKind::DoubleLiteral,
            _ if integral => return Ok(self.token(TokenKind::IntegerLiteral, start)),
            _ => return Ok(self.token(TokenKind::DoubleLiteral, start)),
        };
        // suffix
        self.pos += 1;

        if self
            .peek()
            .is_some_and(|c| c.is_ascii_alphanumeric() || c == b'_')
        {
            return Err(ODataError::syntax(
                self.pos,
                "Unexpected character after numeric literal",
            ));
        }
        Ok(self.token(kind, start))
    }

    fn read_word(&mut self, start: usize) -> ODataResult<Token> {
        while self
            .peek()
            .is_some_and(|c| c.is_ascii_alphanumeric() || matches!(c, b'_' | b'/' | b'.'))
        {
            self.pos += 1;
        }
        let word = &self.src[start..self.pos];

        if self.peek() == Some(b'\'') {
            let kind = match word {
                "guid" => Some(TokenKind::GuidLiteral),
                "datetime" => Some(TokenKind::DateTimeLiteral),
                "binary" | "X" | "x" => Some(TokenKind::BinaryLiteral),
                _ => None,
            };
            if let Some(kind) = kind {
                self.read_quoted(start)?;
                return Ok(self.token(kind, start));
            }
        }

        let kind = TokenKind::keyword(word).unwrap_or(TokenKind::Identifier);
        Ok(self.token(kind, start))
    }
}

impl Iterator for Lexer<'_> {
    type Item = ODataResult<Token>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        let result = self.next_token();
        match &result {
            Ok(token) if token.kind == TokenKind::End => self.finished = true,
            Err(_) => self.finished = true,
            Ok(_) => {}
        }
        Some(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ODataErrorCode;

    fn kinds(text: &str) -> Vec<TokenKind> {
        tokenize(text).map(|t| t.unwrap().kind).collect()
    }

    #[test]
    fn test_simple_relational() {
        assert_eq!(
            kinds("Name eq 'Alice'"),
            vec![
                TokenKind::Identifier,
                TokenKind::Eq,
                TokenKind::StringLiteral,
                TokenKind::End
            ]
        );
    }

    #[test]
    fn test_navigation_identifier() {
        let tokens: Vec<Token> = tokenize("Address/Country").map(|t| t.unwrap()).collect();
        assert_eq!(tokens[0].kind, TokenKind::Identifier);
        assert_eq!(tokens[0].text, "Address/Country");
    }

    #[test]
    fn test_numeric_suffixes() {
        assert_eq!(
            kinds("1 2L 1.5f 3.25M 4.5D 6.5 1e3"),
            vec![
                TokenKind::IntegerLiteral,
                TokenKind::Int64Literal,
                TokenKind::SingleLiteral,
                TokenKind::DecimalLiteral,
                TokenKind::DoubleLiteral,
                TokenKind::DoubleLiteral,
                TokenKind::DoubleLiteral,
                TokenKind::End
            ]
        );
    }

    #[test]
    fn test_negative_number_and_unary_minus() {
        let tokens: Vec<Token> = tokenize("-5 sub - Price").map(|t| t.unwrap()).collect();
        assert_eq!(tokens[0].kind, TokenKind::IntegerLiteral);
        assert_eq!(tokens[0].text, "-5");
        assert_eq!(tokens[1].kind, TokenKind::Sub);
        assert_eq!(tokens[2].kind, TokenKind::Minus);
        assert_eq!(tokens[3].kind, TokenKind::Identifier);
    }

    #[test]
    fn test_typed_literals() {
        assert_eq!(
            kinds("guid'12345678-aaaa-bbbb-cccc-ddddeeeeffff' datetime'2020-01-01T00:00' X'0AFF' binary'00'"),
            vec![
                TokenKind::GuidLiteral,
                TokenKind::DateTimeLiteral,
                TokenKind::BinaryLiteral,
                TokenKind::BinaryLiteral,
                TokenKind::End
            ]
        );
    }

    #[test]
    fn test_keywords_and_punctuation() {
        assert_eq!(
            kinds("not (true or null) and startswith(Name, 'A')"),
            vec![
                TokenKind::Not,
                TokenKind::OpenParen,
                TokenKind::BooleanLiteral,
                TokenKind::Or,
                TokenKind::NullLiteral,
                TokenKind::CloseParen,
                TokenKind::And,
                TokenKind::Identifier,
                TokenKind::OpenParen,
                TokenKind::Identifier,
                TokenKind::Comma,
                TokenKind::StringLiteral,
                TokenKind::CloseParen,
                TokenKind::End
            ]
        );
    }

    #[test]
    fn test_escaped_quote() {
        let tokens: Vec<Token> = tokenize("'O''Neil'").map(|t| t.unwrap()).collect();
        assert_eq!(tokens[0].text, "'O''Neil'");
        assert_eq!(tokens.len(), 2);
    }

    #[test]
    fn test_unterminated_string() {
        let err = tokenize("Name eq 'abc")
            .find_map(|t| t.err())
            .unwrap();
        assert_eq!(err.code(), ODataErrorCode::Syntax);
        assert_eq!(err.position(), Some(8));
    }

    #[test]
    fn test_invalid_character() {
        let err = tokenize("Price # 5").find_map(|t| t.err()).unwrap();
        assert_eq!(err.position(), Some(6));
        assert!(err.message().contains('#'));
    }

    #[test]
    fn test_expected_digit() {
        let err = tokenize("Price gt 5.").find_map(|t| t.err()).unwrap();
        assert!(err.message().contains("Expected digit"));
        assert_eq!(err.position(), Some(11));
    }

    #[test]
    fn test_iteration_stops_after_end() {
        let mut lexer = tokenize("a");
        assert!(lexer.next().is_some());
        assert_eq!(lexer.next().unwrap().unwrap().kind, TokenKind::End);
        assert!(lexer.next().is_none());
    }

    #[test]
    fn test_iteration_stops_after_error() {
        let mut lexer = tokenize("# a");
        assert!(lexer.next().unwrap().is_err());
        assert!(lexer.next().is_none());
    }
}
