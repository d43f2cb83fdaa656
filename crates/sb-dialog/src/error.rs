//! Dialog and collaborator error types.
//!
//! None of these are shown to the customer verbatim; the router turns
//! them into fallback or apology templates.

use std::time::Duration;

use sb_protocol::intent::SlotName;
use sb_protocol::session::SessionId;
use thiserror::Error;

/// Failure of an external collaborator (store, recommender, scorer).
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CollaboratorError {
    #[error("unavailable: {0}")]
    Unavailable(String),

    #[error("timed out after {0:?}")]
    Timeout(Duration),

    #[error("backend error: {0}")]
    Backend(String),
}

/// Convenience alias for collaborator results.
pub type CollaboratorResult<T> = Result<T, CollaboratorError>;

/// Conditions the router and session store report while handling a turn.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DialogError {
    /// No rule matched, or confidence was below the threshold.
    #[error("utterance not understood")]
    ClassificationMiss,

    /// The dialog was waiting for a slot and the input did not carry it.
    #[error("expected {slot} but input did not contain one (attempt {attempts})")]
    SlotFillMismatch { slot: SlotName, attempts: u8 },

    /// A collaborator failed or timed out.
    #[error("{collaborator} failed: {source}")]
    CollaboratorUnavailable {
        collaborator: &'static str,
        #[source]
        source: CollaboratorError,
    },

    /// Stored state was inconsistent and had to be reset.
    #[error("invalid state for session {session}: {reason}")]
    InvalidSession { session: SessionId, reason: String },
}
