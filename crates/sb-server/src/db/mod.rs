//! Database access layer for PostgreSQL.
//!
//! Each sub-module provides typed query functions over a `PgPool`;
//! [`PgStore`] adapts them to the dialog layer's `SupportStore` seam.

pub mod faq;
pub mod log_writer;
pub mod orders;
pub mod products;

use async_trait::async_trait;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

use sb_dialog::{CollaboratorError, CollaboratorResult, SupportStore};
use sb_protocol::catalog::{CancellationOutcome, FaqEntry, OrderRecord, Product};

/// Connect to PostgreSQL and run migrations.
pub async fn connect(database_url: &str) -> Result<PgPool, sqlx::Error> {
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(database_url)
        .await?;

    tracing::info!("running database migrations");
    sqlx::raw_sql(include_str!("../../migrations/001_catalog.sql"))
        .execute(&pool)
        .await?;
    sqlx::raw_sql(include_str!("../../migrations/002_conversations.sql"))
        .execute(&pool)
        .await?;
    tracing::info!("migrations complete");

    Ok(pool)
}

/// Map a driver error onto the collaborator taxonomy.
pub(crate) fn db_err(e: sqlx::Error) -> CollaboratorError {
    match e {
        sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
            CollaboratorError::Unavailable(e.to_string())
        }
        other => CollaboratorError::Backend(other.to_string()),
    }
}

/// `SupportStore` backed by PostgreSQL.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SupportStore for PgStore {
    async fn order_status(&self, order_number: &str) -> CollaboratorResult<Option<OrderRecord>> {
        orders::get(&self.pool, order_number)
            .await
            .map_err(db_err)?
            .map(OrderRecord::try_from)
            .transpose()
    }

    async fn cancel_order(
        &self,
        order_number: &str,
    ) -> CollaboratorResult<Option<CancellationOutcome>> {
        if let Some(row) = orders::cancel(&self.pool, order_number)
            .await
            .map_err(db_err)?
        {
            tracing::info!(order = %row.order_number, "order cancelled");
            return Ok(Some(CancellationOutcome::Cancelled {
                order_number: row.order_number,
            }));
        }

        // Nothing updated: either unknown or already past cancellation.
        match orders::get(&self.pool, order_number).await.map_err(db_err)? {
            None => Ok(None),
            Some(row) => {
                let order = OrderRecord::try_from(row)?;
                Ok(Some(CancellationOutcome::NotCancellable {
                    order_number: order.order_number,
                    status: order.status,
                }))
            }
        }
    }

    async fn search_products(
        &self,
        terms: &[String],
        category: Option<&str>,
        limit: usize,
    ) -> CollaboratorResult<Vec<Product>> {
        let rows = products::search(&self.pool, terms, category, limit)
            .await
            .map_err(db_err)?;
        Ok(rows.into_iter().map(Product::from).collect())
    }

    async fn popular_products(&self, limit: usize) -> CollaboratorResult<Vec<Product>> {
        let rows = products::popular(&self.pool, limit).await.map_err(db_err)?;
        Ok(rows.into_iter().map(Product::from).collect())
    }

    async fn search_faq(&self, terms: &[String]) -> CollaboratorResult<Vec<FaqEntry>> {
        if terms.is_empty() {
            return Ok(Vec::new());
        }
        let rows = faq::search(&self.pool, terms).await.map_err(db_err)?;
        Ok(rows.into_iter().map(FaqEntry::from).collect())
    }

    async fn record_faq_hit(&self, faq_id: i64) -> CollaboratorResult<()> {
        let updated = faq::record_hit(&self.pool, faq_id).await.map_err(db_err)?;
        if updated == 0 {
            return Err(CollaboratorError::Backend(format!("no FAQ with id {faq_id}")));
        }
        Ok(())
    }
}

/// `%term%` pattern for ILIKE, with LIKE metacharacters escaped.
pub(crate) fn like_pattern(term: &str) -> String {
    let mut out = String::with_capacity(term.len() + 2);
    out.push('%');
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('%');
    out
}
