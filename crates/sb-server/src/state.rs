//! Shared application state for the Axum server.
//!
//! Supports two modes:
//! - **Database mode**: `PgStore` collaborators and a transcript writer
//!   task over a `PgPool` (production).
//! - **In-memory mode**: the sample `InMemoryStore` with transcripts sent
//!   to tracing (tests and development).

use std::sync::Arc;

use sqlx::PgPool;

use sb_dialog::mock::InMemoryStore;
use sb_dialog::recommend::CatalogRecommender;
use sb_dialog::{
    Collaborators, ConversationLog, DialogConfig, SentimentScorer, SupportAgent, SupportStore,
};
use sb_nlu::{IntentClassifier, KeywordSentiment, RuleClassifier};

use crate::db::PgStore;
use crate::db::log_writer::TracingLog;

/// Shared application state, cheap to clone into every handler.
#[derive(Clone)]
pub struct AppState {
    /// The support bot driving every conversation.
    pub agent: Arc<SupportAgent>,
    /// PostgreSQL connection pool (None in test/in-memory mode).
    pub pool: Option<PgPool>,
}

impl AppState {
    pub fn new(agent: Arc<SupportAgent>) -> Self {
        Self { agent, pool: None }
    }

    /// Wire an agent from a store, scorer and log sink. The recommender
    /// ranks candidates drawn from the same store.
    pub fn build(
        classifier: Arc<dyn IntentClassifier>,
        store: Arc<dyn SupportStore>,
        scorer: Arc<dyn SentimentScorer>,
        log: Arc<dyn ConversationLog>,
        config: DialogConfig,
    ) -> Self {
        let recommender = Arc::new(CatalogRecommender::new(store.clone()));
        let agent = SupportAgent::new(
            classifier,
            Collaborators {
                store,
                recommender,
                scorer,
                log,
            },
            config,
        );
        Self::new(Arc::new(agent))
    }

    /// Create state backed by a PostgreSQL pool.
    pub fn with_pool(
        pool: PgPool,
        classifier: Arc<dyn IntentClassifier>,
        scorer: Arc<dyn SentimentScorer>,
        log: Arc<dyn ConversationLog>,
        config: DialogConfig,
    ) -> Self {
        let store = Arc::new(PgStore::new(pool.clone()));
        let mut state = Self::build(classifier, store, scorer, log, config);
        state.pool = Some(pool);
        state
    }

    /// In-memory state over the sample catalog, with the given classifier
    /// and scorer.
    pub fn in_memory(
        classifier: Arc<dyn IntentClassifier>,
        scorer: Arc<dyn SentimentScorer>,
        config: DialogConfig,
    ) -> Self {
        Self::build(
            classifier,
            Arc::new(InMemoryStore::with_sample_data()),
            scorer,
            Arc::new(TracingLog),
            config,
        )
    }

    /// In-memory state with default rules and keyword sentiment.
    pub fn with_sample_data() -> Self {
        Self::in_memory(
            Arc::new(RuleClassifier::default()),
            Arc::new(KeywordSentiment::new()),
            DialogConfig::default(),
        )
    }
}
