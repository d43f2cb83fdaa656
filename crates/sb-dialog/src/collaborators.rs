//! Narrow interfaces to everything outside the dialog core.
//!
//! The router and engine only ever see these traits; concrete backends
//! (PostgreSQL, HTTP sentiment service, in-memory fixtures) are injected
//! at construction as `Arc<dyn …>`.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use tracing::warn;

use crate::error::{CollaboratorError, CollaboratorResult};
use sb_nlu::KeywordSentiment;
use sb_protocol::catalog::{CancellationOutcome, FaqEntry, OrderRecord, Product};
use sb_protocol::transcript::{LogEntry, Sentiment};

/// Orders, catalog and FAQ backend.
#[async_trait]
pub trait SupportStore: Send + Sync {
    /// Look up an order by canonical number. `None` when it does not exist.
    async fn order_status(&self, order_number: &str) -> CollaboratorResult<Option<OrderRecord>>;

    /// Ask for an order to be cancelled. `None` when it does not exist.
    async fn cancel_order(
        &self,
        order_number: &str,
    ) -> CollaboratorResult<Option<CancellationOutcome>>;

    /// Products matching any of `terms` (name, description or category),
    /// optionally restricted to one category, best rated first.
    async fn search_products(
        &self,
        terms: &[String],
        category: Option<&str>,
        limit: usize,
    ) -> CollaboratorResult<Vec<Product>>;

    /// Highest-rated in-stock products.
    async fn popular_products(&self, limit: usize) -> CollaboratorResult<Vec<Product>>;

    /// FAQ entries sharing at least one term with the query.
    async fn search_faq(&self, terms: &[String]) -> CollaboratorResult<Vec<FaqEntry>>;

    /// Bump the "times asked" counter of an FAQ entry.
    async fn record_faq_hit(&self, faq_id: i64) -> CollaboratorResult<()>;
}

/// Personalized product recommendations.
#[async_trait]
pub trait Recommender: Send + Sync {
    async fn recommend(
        &self,
        user_id: &str,
        category: Option<&str>,
        limit: usize,
    ) -> CollaboratorResult<Vec<Product>>;
}

/// Message sentiment scoring.
#[async_trait]
pub trait SentimentScorer: Send + Sync {
    async fn score(&self, text: &str) -> CollaboratorResult<Sentiment>;

    /// Name of this scorer (for logging).
    fn name(&self) -> &str;
}

#[async_trait]
impl SentimentScorer for KeywordSentiment {
    async fn score(&self, text: &str) -> CollaboratorResult<Sentiment> {
        Ok(self.analyze(text))
    }

    fn name(&self) -> &str {
        "keywords"
    }
}

/// Transcript sink.
///
/// Fire-and-forget: implementations must not block and must swallow
/// their own failures, so logging can never hold up a reply.
pub trait ConversationLog: Send + Sync {
    fn record(&self, entry: LogEntry);
}

/// A log that drops everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullLog;

impl ConversationLog for NullLog {
    fn record(&self, _entry: LogEntry) {}
}

/// Run a collaborator call with an upper time bound.
pub async fn bounded<T, F>(name: &'static str, limit: Duration, call: F) -> CollaboratorResult<T>
where
    F: Future<Output = CollaboratorResult<T>>,
{
    match tokio::time::timeout(limit, call).await {
        Ok(result) => result,
        Err(_) => {
            warn!(collaborator = name, timeout_ms = limit.as_millis() as u64, "Collaborator timed out");
            Err(CollaboratorError::Timeout(limit))
        }
    }
}
