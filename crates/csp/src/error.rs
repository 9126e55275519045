//! Error types for Content-Security-Policy parsing.

use crate::grammar::{rule_name, Rule};

/// Errors produced while parsing a policy header
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CspError {
    /// The input, or a directive value under its own grammar, matched no
    /// grammar path
    #[error("Syntax error: {input:?} does not match {rule}{} at byte {position}", directive_suffix(.directive))]
    Syntax {
        rule: String,
        directive: Option<String>,
        input: String,
        position: usize,
    },

    /// The grammar engine itself failed
    #[error("Grammar engine failure while matching {rule}: {message}")]
    GrammarEngine { rule: String, message: String },

    /// The grammar and the dispatcher disagree about the tree shape
    #[error("Internal invariant violated: {0}")]
    InvariantViolation(String),

    /// The input exceeds a configured parser limit
    #[error("Limit exceeded: {what} is {actual}, limit is {limit}")]
    LimitExceeded {
        what: &'static str,
        limit: usize,
        actual: usize,
    },
}

fn directive_suffix(directive: &Option<String>) -> String {
    match directive {
        Some(name) => format!(" (directive {})", name),
        None => String::new(),
    }
}

impl CspError {
    pub(crate) fn syntax(rule: Rule, input: &str, position: usize) -> Self {
        CspError::Syntax {
            rule: rule_name(rule),
            directive: None,
            input: input.to_string(),
            position,
        }
    }

    pub(crate) fn invariant(message: impl Into<String>) -> Self {
        let message = message.into();
        log::warn!("CSP grammar/dispatcher mismatch: {}", message);
        CspError::InvariantViolation(message)
    }

    /// Attach the directive whose value failed to parse.
    pub(crate) fn in_directive(self, name: &str) -> Self {
        match self {
            CspError::Syntax {
                rule,
                input,
                position,
                ..
            } => CspError::Syntax {
                rule,
                directive: Some(name.to_string()),
                input,
                position,
            },
            other => other,
        }
    }

    /// Returns true if the input was rejected by the grammar
    pub fn is_syntax_error(&self) -> bool {
        matches!(self, CspError::Syntax { .. })
    }

    /// Returns true if the error points at a defect in this crate rather than
    /// at the input
    pub fn is_internal(&self) -> bool {
        matches!(
            self,
            CspError::GrammarEngine { .. } | CspError::InvariantViolation(_)
        )
    }
}

/// Result type for policy parsing
pub type CspResult<T> = Result<T, CspError>;
