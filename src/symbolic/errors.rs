//! Error types shared by the symbolic engine and everything built on top of it.
//!
//! Two failure kinds exist: the text could not be turned into an expression
//! ([`ParseError`]) or the engine could not produce a result for a valid expression
//! ([`ComputeError`]). [`MathError`] joins them so that callers can use `?` across
//! parsing and computation and still match on the kind when they need to.
use thiserror::Error;

/// The input text is not a valid expression of the grammar.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("cannot parse '{input}': {reason}")]
pub struct ParseError {
    /// the offending text as the user typed it
    pub input: String,
    pub reason: String,
}

impl ParseError {
    pub fn new(input: &str, reason: impl Into<String>) -> Self {
        ParseError {
            input: input.to_string(),
            reason: reason.into(),
        }
    }
}

/// A syntactically valid expression for which no result could be computed
/// (non-elementary integral, limit that does not exist, undefined value...).
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{0}")]
pub struct ComputeError(pub String);

impl ComputeError {
    pub fn new(message: impl Into<String>) -> Self {
        ComputeError(message.into())
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum MathError {
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Compute(#[from] ComputeError),
}

impl MathError {
    pub fn is_parse_error(&self) -> bool {
        matches!(self, MathError::Parse(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_error_names_input() {
        let err = ParseError::new("sin(x", "unbalanced parentheses");
        assert_eq!(err.to_string(), "cannot parse 'sin(x': unbalanced parentheses");
    }

    #[test]
    fn test_math_error_is_transparent() {
        let err: MathError = ComputeError::new("limit does not exist").into();
        assert_eq!(err.to_string(), "limit does not exist");
        assert!(!err.is_parse_error());
        let err: MathError = ParseError::new("x+", "missing operand").into();
        assert!(err.is_parse_error());
    }
}
