//! Rule table and classifier error types.

use thiserror::Error;

/// Errors raised while building or loading a rule table.
///
/// Classification itself never fails: a miss is reported as `unknown`.
#[derive(Debug, Error)]
pub enum NluError {
    #[error("duplicate priority {priority} (intents {first} and {second})")]
    DuplicatePriority {
        priority: u16,
        first: String,
        second: String,
    },

    #[error("intent {0} declared by more than one rule")]
    DuplicateIntent(String),

    #[error("rule for {0} has no usable triggers")]
    EmptyTriggers(String),

    #[error("rule for {intent} has confidence {confidence} outside (0, 1]")]
    InvalidConfidence { intent: String, confidence: f64 },

    #[error("the unknown intent cannot have a rule")]
    UnknownRule,

    #[error("invalid rule file: {0}")]
    Parse(String),
}

/// Convenience alias for rule-table results.
pub type NluResult<T> = Result<T, NluError>;
