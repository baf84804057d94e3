//! Formula error types

use std::fmt;
use thiserror::Error;

/// Result type for formula compilation
pub type FormulaResult<T> = std::result::Result<T, FormulaError>;

/// Result type for strict evaluation
pub type EvalResult<T> = std::result::Result<T, EvalError>;

/// What went wrong while parsing a formula
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SyntaxErrorKind {
    /// Nothing but whitespace
    EmptyFormula,
    /// A token that cannot appear where it was found
    UnexpectedToken,
    /// Input ended where an operand was required
    UnexpectedEnd,
    /// A '(' that is never closed
    UnclosedParen,
    /// A ')' with no matching '('
    UnmatchedParen,
    /// A character outside the formula alphabet
    UnexpectedCharacter,
    /// A number literal too large to represent
    NumberOutOfRange,
    /// Parentheses or negations nested too deeply to evaluate safely
    TooDeep,
    /// More operators in a single chain than the evaluator accepts
    TooLong,
}

impl fmt::Display for SyntaxErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            SyntaxErrorKind::EmptyFormula => "formula is empty",
            SyntaxErrorKind::UnexpectedToken => "unexpected token",
            SyntaxErrorKind::UnexpectedEnd => "missing operand at end of formula",
            SyntaxErrorKind::UnclosedParen => "unclosed parenthesis",
            SyntaxErrorKind::UnmatchedParen => "unmatched closing parenthesis",
            SyntaxErrorKind::UnexpectedCharacter => "unexpected character",
            SyntaxErrorKind::NumberOutOfRange => "number is too large",
            SyntaxErrorKind::TooDeep => "formula is nested too deeply",
            SyntaxErrorKind::TooLong => "formula is too long",
        };
        f.write_str(text)
    }
}

/// Coarse error category, for callers that only branch on the kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormulaErrorKind {
    Syntax,
    UnknownField,
}

/// Errors that can occur while compiling a formula
///
/// Positions are 0-based character offsets into the formula text as the
/// user typed it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormulaError {
    /// Malformed expression
    #[error("Syntax error at position {position}: {kind}{}", quoted(.token))]
    Syntax {
        kind: SyntaxErrorKind,
        position: usize,
        token: Option<String>,
    },

    /// Identifier that is not in the field set
    #[error("Unknown field '{name}' at position {position}")]
    UnknownField { name: String, position: usize },
}

fn quoted(token: &Option<String>) -> String {
    match token {
        Some(text) => format!(" '{text}'"),
        None => String::new(),
    }
}

impl FormulaError {
    pub(crate) fn syntax(kind: SyntaxErrorKind, position: usize, token: Option<&str>) -> Self {
        FormulaError::Syntax {
            kind,
            position,
            token: token.map(str::to_string),
        }
    }

    /// Error category
    pub fn kind(&self) -> FormulaErrorKind {
        match self {
            FormulaError::Syntax { .. } => FormulaErrorKind::Syntax,
            FormulaError::UnknownField { .. } => FormulaErrorKind::UnknownField,
        }
    }

    /// Character offset of the offending token
    pub fn position(&self) -> usize {
        match self {
            FormulaError::Syntax { position, .. } | FormulaError::UnknownField { position, .. } => {
                *position
            }
        }
    }

    /// Text of the offending token or field name, when there is one
    pub fn offending(&self) -> Option<&str> {
        match self {
            FormulaError::Syntax { token, .. } => token.as_deref(),
            FormulaError::UnknownField { name, .. } => Some(name),
        }
    }
}

/// Errors from strict evaluation against a row
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EvalError {
    /// A referenced field has no value in the row
    #[error("Field '{name}' is missing from the row")]
    MissingField { name: String },
}
