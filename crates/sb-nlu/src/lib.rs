//! Natural-language understanding for the support bot.
//!
//! Turns raw customer text into a [`Classification`] using an ordered,
//! explicitly prioritized keyword rule table. Also hosts the small scoring
//! heuristics the dialog layer relies on: keyword sentiment, product
//! ranking and FAQ matching. Everything here is pure and synchronous.

pub mod classifier;
pub mod entities;
pub mod error;
pub mod faq;
pub mod normalize;
pub mod ranking;
pub mod rules;
pub mod sentiment;
pub mod terms;

pub use classifier::{IntentClassifier, RuleClassifier};
pub use error::{NluError, NluResult};
pub use rules::{IntentRule, RuleTable};
pub use sentiment::KeywordSentiment;
pub use terms::search_terms;

pub use sb_protocol::intent::{Classification, Entities, IntentKind, MatchTier, SlotName};
