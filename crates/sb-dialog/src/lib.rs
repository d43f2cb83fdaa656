//! Dialog layer of the support bot.
//!
//! Takes classified utterances, tracks per-session dialog state and calls
//! out to injected collaborators (catalog/order store, recommender,
//! sentiment scorer, transcript log) to build replies.
//!
//! - [`router::DialogRouter`]: the per-turn state machine.
//! - [`session::SessionStore`]: keyed conversation state with expiry.
//! - [`engine::SupportAgent`]: one full turn, from raw text to reply.

pub mod collaborators;
pub mod config;
pub mod engine;
pub mod error;
pub mod mock;
pub mod recommend;
pub mod router;
pub mod session;
pub mod templates;

pub use collaborators::{ConversationLog, Recommender, SentimentScorer, SupportStore};
pub use config::DialogConfig;
pub use engine::{Collaborators, SupportAgent, TurnReply};
pub use error::{CollaboratorError, CollaboratorResult, DialogError};
pub use router::{DialogRouter, RouteOutcome};
pub use session::SessionStore;
