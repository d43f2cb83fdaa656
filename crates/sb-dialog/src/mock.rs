//! In-memory collaborators.
//!
//! [`InMemoryStore`] serves a small sample catalog and doubles as the
//! server's store when no database is configured. The remaining types are
//! test doubles that record what they were asked to do.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{NaiveDate, TimeZone, Utc};
use tokio::sync::RwLock;

use crate::collaborators::{ConversationLog, Recommender, SentimentScorer, SupportStore};
use crate::error::{CollaboratorError, CollaboratorResult};
use sb_protocol::catalog::{CancellationOutcome, FaqEntry, OrderRecord, OrderStatus, Product};
use sb_protocol::session::SessionId;
use sb_protocol::transcript::{LogEntry, Sentiment};

fn lock<T>(m: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn matches_any(haystack: &str, terms: &[String]) -> bool {
    let haystack = haystack.to_lowercase();
    terms.iter().any(|t| haystack.contains(&t.to_lowercase()))
}

// ── Store ───────────────────────────────────────────────────────

/// Store backed by in-process maps.
///
/// Can be switched into a failing or slow mode to exercise error paths,
/// and counts calls per operation.
pub struct InMemoryStore {
    orders: RwLock<HashMap<String, OrderRecord>>,
    products: Vec<Product>,
    faqs: RwLock<Vec<FaqEntry>>,
    failing: AtomicBool,
    fail_only: Mutex<Option<&'static str>>,
    delay_ms: AtomicU64,
    calls: Mutex<HashMap<&'static str, usize>>,
}

impl InMemoryStore {
    pub fn new(orders: Vec<OrderRecord>, products: Vec<Product>, faqs: Vec<FaqEntry>) -> Self {
        Self {
            orders: RwLock::new(
                orders
                    .into_iter()
                    .map(|o| (o.order_number.clone(), o))
                    .collect(),
            ),
            products,
            faqs: RwLock::new(faqs),
            failing: AtomicBool::new(false),
            fail_only: Mutex::new(None),
            delay_ms: AtomicU64::new(0),
            calls: Mutex::new(HashMap::new()),
        }
    }

    /// Store pre-loaded with the demo catalog, orders and FAQs.
    pub fn with_sample_data() -> Self {
        Self::new(sample_orders(), sample_products(), sample_faqs())
    }

    /// Make every call fail with `Unavailable`.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Make a single operation fail while the rest keep working.
    pub fn fail_only(&self, operation: &'static str) {
        *lock(&self.fail_only) = Some(operation);
    }

    /// Delay every call by `delay` before answering.
    pub fn set_delay(&self, delay: Option<Duration>) {
        let ms = delay.map_or(0, |d| d.as_millis() as u64);
        self.delay_ms.store(ms, Ordering::SeqCst);
    }

    /// Number of calls made to `operation`.
    pub fn calls(&self, operation: &str) -> usize {
        lock(&self.calls).get(operation).copied().unwrap_or(0)
    }

    /// Number of calls made to any operation.
    pub fn total_calls(&self) -> usize {
        lock(&self.calls).values().sum()
    }

    pub async fn order(&self, order_number: &str) -> Option<OrderRecord> {
        self.orders.read().await.get(order_number).cloned()
    }

    pub async fn faq_times_asked(&self, faq_id: i64) -> Option<i32> {
        self.faqs
            .read()
            .await
            .iter()
            .find(|f| f.id == faq_id)
            .map(|f| f.times_asked)
    }

    async fn enter(&self, operation: &'static str) -> CollaboratorResult<()> {
        *lock(&self.calls).entry(operation).or_insert(0) += 1;

        let delay = self.delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }
        if self.failing.load(Ordering::SeqCst) || *lock(&self.fail_only) == Some(operation) {
            return Err(CollaboratorError::Unavailable("store offline".into()));
        }
        Ok(())
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::with_sample_data()
    }
}

#[async_trait]
impl SupportStore for InMemoryStore {
    async fn order_status(&self, order_number: &str) -> CollaboratorResult<Option<OrderRecord>> {
        self.enter("order_status").await?;
        Ok(self.order(order_number).await)
    }

    async fn cancel_order(
        &self,
        order_number: &str,
    ) -> CollaboratorResult<Option<CancellationOutcome>> {
        self.enter("cancel_order").await?;
        let mut orders = self.orders.write().await;
        let Some(order) = orders.get_mut(order_number) else {
            return Ok(None);
        };
        if !order.status.is_cancellable() {
            return Ok(Some(CancellationOutcome::NotCancellable {
                order_number: order.order_number.clone(),
                status: order.status,
            }));
        }
        order.status = OrderStatus::Cancelled;
        Ok(Some(CancellationOutcome::Cancelled {
            order_number: order.order_number.clone(),
        }))
    }

    async fn search_products(
        &self,
        terms: &[String],
        category: Option<&str>,
        limit: usize,
    ) -> CollaboratorResult<Vec<Product>> {
        self.enter("search_products").await?;
        let mut found: Vec<Product> = self
            .products
            .iter()
            .filter(|p| category.is_none_or(|c| p.category.eq_ignore_ascii_case(c)))
            .filter(|p| {
                terms.is_empty()
                    || matches_any(&p.name, terms)
                    || matches_any(&p.category, terms)
                    || p.description
                        .as_deref()
                        .is_some_and(|d| matches_any(d, terms))
            })
            .cloned()
            .collect();
        found.sort_by(|a, b| b.rating.total_cmp(&a.rating).then(a.id.cmp(&b.id)));
        found.truncate(limit);
        Ok(found)
    }

    async fn popular_products(&self, limit: usize) -> CollaboratorResult<Vec<Product>> {
        self.enter("popular_products").await?;
        let mut found: Vec<Product> = self.products.iter().filter(|p| p.in_stock()).cloned().collect();
        found.sort_by(|a, b| {
            b.rating
                .total_cmp(&a.rating)
                .then(b.reviews_count.cmp(&a.reviews_count))
        });
        found.truncate(limit);
        Ok(found)
    }

    async fn search_faq(&self, terms: &[String]) -> CollaboratorResult<Vec<FaqEntry>> {
        self.enter("search_faq").await?;
        if terms.is_empty() {
            return Ok(Vec::new());
        }
        Ok(self
            .faqs
            .read()
            .await
            .iter()
            .filter(|f| matches_any(&f.question, terms) || matches_any(&f.answer, terms))
            .cloned()
            .collect())
    }

    async fn record_faq_hit(&self, faq_id: i64) -> CollaboratorResult<()> {
        self.enter("record_faq_hit").await?;
        let mut faqs = self.faqs.write().await;
        match faqs.iter_mut().find(|f| f.id == faq_id) {
            Some(faq) => {
                faq.times_asked += 1;
                Ok(())
            }
            None => Err(CollaboratorError::Backend(format!("no FAQ with id {faq_id}"))),
        }
    }
}

// ── Sample data ─────────────────────────────────────────────────

#[allow(clippy::too_many_arguments)]
fn product(
    id: i64,
    name: &str,
    category: &str,
    price: f64,
    rating: f64,
    description: &str,
    stock_quantity: i32,
    reviews_count: i32,
) -> Product {
    Product {
        id,
        name: name.into(),
        category: category.into(),
        price,
        rating,
        description: Some(description.into()),
        stock_quantity,
        reviews_count,
    }
}

pub fn sample_products() -> Vec<Product> {
    vec![
        product(1, "Dell XPS 15 Laptop", "Laptops", 1299.99, 4.7, "15.6\" FHD Display, Intel i7, 16GB RAM", 25, 234),
        product(2, "MacBook Pro M3", "Laptops", 1999.99, 4.9, "14\" Retina Display, M3 Chip, 16GB RAM", 15, 567),
        product(3, "iPhone 15 Pro", "Smartphones", 999.99, 4.8, "6.1\" Display, A17 Pro Chip, 128GB", 50, 891),
        product(4, "Sony WH-1000XM5", "Accessories", 349.99, 4.8, "Wireless Noise-Cancelling Headphones", 60, 1234),
        product(5, "Logitech MX Master 3S", "Accessories", 99.99, 4.7, "Wireless Performance Mouse, 8K DPI", 120, 2100),
        product(6, "The Pragmatic Programmer", "Books", 49.99, 4.8, "20th Anniversary Edition", 40, 3050),
        product(7, "Dyson V15 Detect", "Appliances", 749.99, 4.6, "Cordless Vacuum Cleaner", 0, 812),
    ]
}

pub fn sample_orders() -> Vec<OrderRecord> {
    let at = |y, mo, d, h, mi| Utc.with_ymd_and_hms(y, mo, d, h, mi, 0).single().unwrap_or_default();
    vec![
        OrderRecord {
            order_number: "ORD-2026-00001".into(),
            status: OrderStatus::Shipped,
            order_date: at(2026, 1, 15, 10, 30),
            total_amount: 1349.98,
            tracking_number: Some("TRK123456789".into()),
            estimated_delivery: NaiveDate::from_ymd_opt(2026, 1, 22),
        },
        OrderRecord {
            order_number: "ORD-2026-00002".into(),
            status: OrderStatus::Delivered,
            order_date: at(2026, 1, 10, 14, 20),
            total_amount: 999.99,
            tracking_number: Some("TRK987654321".into()),
            estimated_delivery: NaiveDate::from_ymd_opt(2026, 1, 15),
        },
        OrderRecord {
            order_number: "ORD-2026-00003".into(),
            status: OrderStatus::Pending,
            order_date: at(2026, 1, 18, 9, 0),
            total_amount: 49.99,
            tracking_number: None,
            estimated_delivery: NaiveDate::from_ymd_opt(2026, 1, 25),
        },
        OrderRecord {
            order_number: "ORD-2026-00004".into(),
            status: OrderStatus::Processing,
            order_date: at(2026, 1, 19, 16, 45),
            total_amount: 349.99,
            tracking_number: None,
            estimated_delivery: NaiveDate::from_ymd_opt(2026, 1, 26),
        },
    ]
}

pub fn sample_faqs() -> Vec<FaqEntry> {
    let faq = |id, question: &str, answer: &str, category: &str| FaqEntry {
        id,
        question: question.into(),
        answer: answer.into(),
        category: Some(category.into()),
        times_asked: 0,
    };
    vec![
        faq(
            1,
            "What is your return policy?",
            "We offer a 30-day money-back guarantee on all products. Items must be in original condition.",
            "Returns",
        ),
        faq(
            2,
            "How long does shipping take?",
            "Standard shipping takes 5-7 business days. Express shipping is available for $15.",
            "Shipping",
        ),
        faq(
            3,
            "What payment methods do you accept?",
            "We accept Visa, Mastercard, American Express, PayPal, and Apple Pay.",
            "Payment",
        ),
    ]
}

// ── Recommender ─────────────────────────────────────────────────

/// Recommender that always returns the same list.
pub struct StaticRecommender {
    products: Vec<Product>,
}

impl StaticRecommender {
    pub fn new(products: Vec<Product>) -> Self {
        Self { products }
    }

    pub fn empty() -> Self {
        Self::new(Vec::new())
    }
}

#[async_trait]
impl Recommender for StaticRecommender {
    async fn recommend(
        &self,
        _user_id: &str,
        _category: Option<&str>,
        limit: usize,
    ) -> CollaboratorResult<Vec<Product>> {
        Ok(self.products.iter().take(limit).cloned().collect())
    }
}

// ── Scorers ─────────────────────────────────────────────────────

/// Scorer that returns a fixed sentiment.
pub struct StaticScorer(pub Sentiment);

#[async_trait]
impl SentimentScorer for StaticScorer {
    async fn score(&self, _text: &str) -> CollaboratorResult<Sentiment> {
        Ok(self.0)
    }

    fn name(&self) -> &str {
        "static"
    }
}

/// Scorer that always fails.
pub struct FailingScorer;

#[async_trait]
impl SentimentScorer for FailingScorer {
    async fn score(&self, _text: &str) -> CollaboratorResult<Sentiment> {
        Err(CollaboratorError::Unavailable("sentiment service down".into()))
    }

    fn name(&self) -> &str {
        "failing"
    }
}

// ── Log ─────────────────────────────────────────────────────────

/// Transcript sink that keeps every entry in memory.
#[derive(Default)]
pub struct MemoryLog {
    entries: Mutex<Vec<LogEntry>>,
}

impl MemoryLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// All recorded entries in arrival order.
    pub fn entries(&self) -> Vec<LogEntry> {
        lock(&self.entries).clone()
    }

    /// Entries for one session.
    pub fn for_session(&self, session: &SessionId) -> Vec<LogEntry> {
        lock(&self.entries)
            .iter()
            .filter(|e| &e.session_id == session)
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        lock(&self.entries).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ConversationLog for MemoryLog {
    fn record(&self, entry: LogEntry) {
        lock(&self.entries).push(entry);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn order_lookup() {
        let store = InMemoryStore::with_sample_data();
        let order = store.order_status("ORD-2026-00001").await.unwrap().unwrap();
        assert_eq!(order.status, OrderStatus::Shipped);
        assert!(store.order_status("ORD-2026-99999").await.unwrap().is_none());
        assert_eq!(store.calls("order_status"), 2);
    }

    #[tokio::test]
    async fn cancellation_changes_status_once() {
        let store = InMemoryStore::with_sample_data();
        let first = store.cancel_order("ORD-2026-00004").await.unwrap();
        assert!(matches!(first, Some(CancellationOutcome::Cancelled { .. })));
        let second = store.cancel_order("ORD-2026-00004").await.unwrap();
        assert_eq!(
            second,
            Some(CancellationOutcome::NotCancellable {
                order_number: "ORD-2026-00004".into(),
                status: OrderStatus::Cancelled,
            })
        );
        let shipped = store.cancel_order("ORD-2026-00001").await.unwrap();
        assert!(matches!(
            shipped,
            Some(CancellationOutcome::NotCancellable {
                status: OrderStatus::Shipped,
                ..
            })
        ));
    }

    #[tokio::test]
    async fn product_search_by_term_and_category() {
        let store = InMemoryStore::with_sample_data();
        let found = store
            .search_products(&["wireless".into()], None, 10)
            .await
            .unwrap();
        let names: Vec<&str> = found.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["Sony WH-1000XM5", "Logitech MX Master 3S"]);

        let laptops = store.search_products(&[], Some("laptops"), 1).await.unwrap();
        assert_eq!(laptops.len(), 1);
        assert_eq!(laptops[0].name, "MacBook Pro M3");
    }

    #[tokio::test]
    async fn popular_skips_out_of_stock() {
        let store = InMemoryStore::with_sample_data();
        let popular = store.popular_products(10).await.unwrap();
        assert_eq!(popular[0].name, "MacBook Pro M3");
        assert!(popular.iter().all(|p| p.in_stock()));
    }

    #[tokio::test]
    async fn faq_search_and_hits() {
        let store = InMemoryStore::with_sample_data();
        let found = store.search_faq(&["shipping".into()]).await.unwrap();
        assert_eq!(found.len(), 1);
        store.record_faq_hit(2).await.unwrap();
        assert_eq!(store.faq_times_asked(2).await, Some(1));
        assert!(store.record_faq_hit(42).await.is_err());
    }

    #[tokio::test]
    async fn failure_modes() {
        let store = InMemoryStore::with_sample_data();
        store.set_failing(true);
        assert!(store.popular_products(3).await.is_err());
        store.set_failing(false);

        store.fail_only("search_faq");
        assert!(store.search_faq(&["return".into()]).await.is_err());
        assert!(store.popular_products(3).await.is_ok());
    }

    #[test]
    fn memory_log_filters_by_session() {
        use sb_protocol::transcript::Sender;

        let log = MemoryLog::new();
        for session in ["a", "b", "a"] {
            log.record(LogEntry {
                session_id: session.into(),
                user_id: "u".into(),
                channel: "test".into(),
                sender: Sender::User,
                text: "hi".into(),
                intent: None,
                confidence: None,
                sentiment: None,
                logged_at: Utc::now(),
            });
        }
        assert_eq!(log.len(), 3);
        assert_eq!(log.for_session(&"a".into()).len(), 2);
    }
}
