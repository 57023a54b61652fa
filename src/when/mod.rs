//! Condition evaluator for `when` clauses
//!
//! A small, sandboxed grammar over a fixed set of context keys:
//!
//! ```text
//! expr    := or
//! or      := and ('||' and)*
//! and     := unary ('&&' unary)*
//! unary   := '!' unary | primary
//! primary := '(' expr ')' | 'true' | 'false'
//!          | key [('==' | '!=' | '<' | '<=' | '>' | '>=') literal]
//!          | key '=~' /regex/flags
//!          | key ['not'] 'in' key
//! ```
//!
//! Evaluation never fails: anything that does not parse is treated as false.

use log::warn;
use thiserror::Error;

pub mod context;
pub mod lexer;
pub mod parser;

pub use context::{ContextValue, EditorContext};
pub use parser::Expr;

#[derive(Error, Debug)]
pub enum WhenError {
    #[error("Unexpected character '{ch}' at {pos}")]
    UnexpectedChar { ch: char, pos: usize },
    #[error("Unterminated string starting at {0}")]
    UnterminatedString(usize),
    #[error("Expected a /regex/ at {0}")]
    ExpectedRegex(usize),
    #[error("Unexpected token {0}")]
    UnexpectedToken(String),
    #[error("Unexpected end of expression")]
    UnexpectedEnd,
    #[error("Expression nested deeper than {0} levels")]
    TooDeep(usize),
    #[error("Invalid regex pattern `{pattern}`: {source}")]
    Regex {
        source: regex::Error,
        pattern: String,
    },
}

/// Parse a `when` clause.
///
/// # Errors
///
/// Returns `WhenError` describing the first lexing or parsing problem.
pub fn parse_when(source: &str) -> Result<Expr, WhenError> {
    parser::parse(lexer::lex(source)?)
}

/// Whether a node gated by `when` is currently eligible.
///
/// An absent or blank clause is always eligible; a malformed one never is.
#[must_use]
pub fn evaluate(when: Option<&str>, context: &EditorContext) -> bool {
    let Some(source) = when.filter(|w| !w.trim().is_empty()) else {
        return true;
    };
    match parse_when(source) {
        Ok(expr) => expr.eval(context),
        Err(e) => {
            warn!("Ignoring malformed when clause `{source}`: {e}");
            false
        }
    }
}
