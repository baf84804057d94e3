//! Formula parser
//!
//! A recursive descent parser for the metric formula grammar:
//!
//! ```text
//! expression := term (('+' | '-') term)*
//! term       := factor (('*' | '/') factor)*
//! factor     := number | identifier | '(' expression ')' | '-' factor
//! ```
//!
//! Scanning is done on demand, one token ahead of the parser. Every token
//! remembers its character offset so errors can point at the exact spot
//! in the text the user typed.

use crate::ast::{BinaryOperator, FieldRef, FormulaExpr, UnaryOperator};
use crate::error::{FormulaError, FormulaResult, SyntaxErrorKind};
use custom_metrics_core::FieldSet;

/// Maximum nesting of parentheses and negations
pub const MAX_DEPTH: usize = 256;

/// Maximum height of the expression tree
///
/// A flat chain like `a + b + c` grows one level per operator without any
/// nesting, so it gets a ceiling of its own well above [`MAX_DEPTH`].
pub const MAX_HEIGHT: usize = 2048;

/// Parse a formula string into an AST without checking field names
///
/// # Example
/// ```rust
/// use custom_metrics_formula::parse_formula;
///
/// let ast = parse_formula("(results * 15) / spend").unwrap();
/// assert_eq!(ast.referenced_fields(), vec!["results", "spend"]);
/// assert!(parse_formula("(results * 15").is_err());
/// ```
pub fn parse_formula(formula: &str) -> FormulaResult<FormulaExpr> {
    FormulaParser::new(formula, None).parse()
}

/// Parse a formula, rejecting identifiers that are not in `fields`
///
/// Syntax and field errors are reported in reading order: whichever
/// problem comes first in the text is the one returned.
pub(crate) fn parse_with_fields(formula: &str, fields: &FieldSet) -> FormulaResult<FormulaExpr> {
    FormulaParser::new(formula, Some(fields)).parse()
}

/// Token types
#[derive(Debug, Clone, PartialEq)]
enum Token {
    Number(f64),
    /// Literal that overflows `f64`
    HugeNumber,
    Identifier,
    Plus,
    Minus,
    Star,
    Slash,
    LeftParen,
    RightParen,
    /// Character outside the grammar, or a malformed number
    Invalid,
    Eof,
}

/// Token plus its location
#[derive(Debug, Clone)]
struct Lexeme {
    token: Token,
    /// Byte span in the input
    start: usize,
    end: usize,
    /// Character offset of the first character
    position: usize,
}

/// Subtree with its height, used to bound recursion during evaluation
struct Node {
    expr: FormulaExpr,
    height: usize,
}

impl Node {
    fn leaf(expr: FormulaExpr) -> Self {
        Self { expr, height: 1 }
    }
}

/// Formula parser
struct FormulaParser<'a> {
    input: &'a str,
    /// Byte offset of the scanner
    pos: usize,
    /// Character offset of the scanner
    char_pos: usize,
    current: Lexeme,
    fields: Option<&'a FieldSet>,
    nesting: usize,
}

impl<'a> FormulaParser<'a> {
    fn new(input: &'a str, fields: Option<&'a FieldSet>) -> Self {
        let mut parser = Self {
            input,
            pos: 0,
            char_pos: 0,
            current: Lexeme {
                token: Token::Eof,
                start: 0,
                end: 0,
                position: 0,
            },
            fields,
            nesting: 0,
        };
        parser.advance_token();
        parser
    }

    fn parse(mut self) -> FormulaResult<FormulaExpr> {
        if self.current.token == Token::Eof {
            return Err(FormulaError::syntax(SyntaxErrorKind::EmptyFormula, 0, None));
        }

        let node = self.parse_expression()?;

        // Make sure we consumed all input
        match self.current.token {
            Token::Eof => Ok(node.expr),
            Token::RightParen => Err(self.error_here(SyntaxErrorKind::UnmatchedParen)),
            _ => Err(self.unexpected()),
        }
    }

    // === Token scanning ===

    fn advance_token(&mut self) {
        self.current = self.scan_token();
    }

    fn scan_token(&mut self) -> Lexeme {
        self.skip_whitespace();

        let start = self.pos;
        let position = self.char_pos;

        let token = match self.peek_char() {
            None => Token::Eof,
            Some(c) => match c {
                '+' => self.single(Token::Plus),
                '-' => self.single(Token::Minus),
                '*' => self.single(Token::Star),
                '/' => self.single(Token::Slash),
                '(' => self.single(Token::LeftParen),
                ')' => self.single(Token::RightParen),
                c if c.is_ascii_digit() => self.scan_number(),
                '.' if self.peek_char_at(1).map_or(false, |c| c.is_ascii_digit()) => {
                    self.scan_number()
                }
                c if c.is_alphabetic() || c == '_' => self.scan_identifier(),
                _ => self.single(Token::Invalid),
            },
        };

        Lexeme {
            token,
            start,
            end: self.pos,
            position,
        }
    }

    fn single(&mut self, token: Token) -> Token {
        self.advance();
        token
    }

    fn scan_number(&mut self) -> Token {
        let start = self.pos;

        // Integer part
        while self.peek_char().map_or(false, |c| c.is_ascii_digit()) {
            self.advance();
        }

        // Decimal part
        if self.peek_char() == Some('.') {
            self.advance();
            while self.peek_char().map_or(false, |c| c.is_ascii_digit()) {
                self.advance();
            }
        }

        match self.input[start..self.pos].parse::<f64>() {
            Ok(n) if n.is_finite() => Token::Number(n),
            Ok(_) => Token::HugeNumber,
            Err(_) => Token::Invalid,
        }
    }

    fn scan_identifier(&mut self) -> Token {
        while self
            .peek_char()
            .map_or(false, |c| c.is_alphanumeric() || c == '_')
        {
            self.advance();
        }
        Token::Identifier
    }

    // === Helper methods ===

    fn peek_char(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn peek_char_at(&self, offset: usize) -> Option<char> {
        self.input[self.pos..].chars().nth(offset)
    }

    fn advance(&mut self) {
        if let Some(c) = self.peek_char() {
            self.pos += c.len_utf8();
            self.char_pos += 1;
        }
    }

    fn skip_whitespace(&mut self) {
        while self.peek_char().map_or(false, |c| c.is_whitespace()) {
            self.advance();
        }
    }

    fn text(&self) -> &'a str {
        &self.input[self.current.start..self.current.end]
    }

    fn consume(&mut self) {
        self.advance_token();
    }

    fn error_here(&self, kind: SyntaxErrorKind) -> FormulaError {
        FormulaError::syntax(kind, self.current.position, Some(self.text()))
    }

    /// Error for a token that cannot appear at the current point
    fn unexpected(&self) -> FormulaError {
        match self.current.token {
            Token::Eof => {
                FormulaError::syntax(SyntaxErrorKind::UnexpectedEnd, self.current.position, None)
            }
            Token::Invalid => self.error_here(SyntaxErrorKind::UnexpectedCharacter),
            Token::HugeNumber => self.error_here(SyntaxErrorKind::NumberOutOfRange),
            _ => self.error_here(SyntaxErrorKind::UnexpectedToken),
        }
    }

    fn enter(&mut self, position: usize) -> FormulaResult<()> {
        self.nesting += 1;
        if self.nesting > MAX_DEPTH {
            return Err(FormulaError::syntax(SyntaxErrorKind::TooDeep, position, None));
        }
        Ok(())
    }

    fn leave(&mut self) {
        self.nesting -= 1;
    }

    fn join(
        op: BinaryOperator,
        left: Node,
        right: Node,
        position: usize,
    ) -> FormulaResult<Node> {
        let height = left.height.max(right.height) + 1;
        if height > MAX_HEIGHT {
            return Err(FormulaError::syntax(
                SyntaxErrorKind::TooLong,
                position,
                Some(&op.symbol().to_string()),
            ));
        }
        Ok(Node {
            expr: FormulaExpr::BinaryOp {
                op,
                left: Box::new(left.expr),
                right: Box::new(right.expr),
            },
            height,
        })
    }

    // === Expression parsing with precedence ===
    // Precedence (lowest to highest):
    // 1. Addition/Subtraction: +, -
    // 2. Multiplication/Division: *, /
    // 3. Unary: -
    // 4. Primary: numbers, fields, parentheses

    fn parse_expression(&mut self) -> FormulaResult<Node> {
        let mut left = self.parse_term()?;

        loop {
            let op = match self.current.token {
                Token::Plus => BinaryOperator::Add,
                Token::Minus => BinaryOperator::Subtract,
                _ => break,
            };

            let position = self.current.position;
            self.consume();
            let right = self.parse_term()?;
            left = Self::join(op, left, right, position)?;
        }

        Ok(left)
    }

    fn parse_term(&mut self) -> FormulaResult<Node> {
        let mut left = self.parse_factor()?;

        loop {
            let op = match self.current.token {
                Token::Star => BinaryOperator::Multiply,
                Token::Slash => BinaryOperator::Divide,
                _ => break,
            };

            let position = self.current.position;
            self.consume();
            let right = self.parse_factor()?;
            left = Self::join(op, left, right, position)?;
        }

        Ok(left)
    }

    fn parse_factor(&mut self) -> FormulaResult<Node> {
        match self.current.token {
            Token::Number(n) => {
                self.consume();
                Ok(Node::leaf(FormulaExpr::Number(n)))
            }

            Token::Identifier => {
                let name = self.text();
                let position = self.current.position;
                if let Some(fields) = self.fields {
                    if !fields.contains(name) {
                        return Err(FormulaError::UnknownField {
                            name: name.to_string(),
                            position,
                        });
                    }
                }
                self.consume();
                Ok(Node::leaf(FormulaExpr::Field(FieldRef {
                    name: name.to_string(),
                    position,
                })))
            }

            Token::LeftParen => {
                let open = self.current.position;
                self.enter(open)?;
                self.consume();
                let inner = self.parse_expression()?;
                match self.current.token {
                    Token::RightParen => {
                        self.consume();
                        self.leave();
                        Ok(inner)
                    }
                    Token::Eof => Err(FormulaError::syntax(
                        SyntaxErrorKind::UnclosedParen,
                        open,
                        Some("("),
                    )),
                    _ => Err(self.unexpected()),
                }
            }

            Token::Minus => {
                let position = self.current.position;
                self.enter(position)?;
                self.consume();
                let operand = self.parse_factor()?;
                self.leave();
                let height = operand.height + 1;
                if height > MAX_HEIGHT {
                    return Err(FormulaError::syntax(SyntaxErrorKind::TooLong, position, Some("-")));
                }
                Ok(Node {
                    expr: FormulaExpr::UnaryOp {
                        op: UnaryOperator::Negate,
                        operand: Box::new(operand.expr),
                    },
                    height,
                })
            }

            _ => Err(self.unexpected()),
        }
    }
}
