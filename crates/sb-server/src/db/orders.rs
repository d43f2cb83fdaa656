//! Order status and cancellation queries.

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::PgPool;

use sb_dialog::CollaboratorError;
use sb_protocol::catalog::{OrderRecord, OrderStatus, ParseStatusError};

/// Order row returned from the database.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct OrderRow {
    pub order_number: String,
    pub status: String,
    pub order_date: DateTime<Utc>,
    pub total_amount: f64,
    pub tracking_number: Option<String>,
    pub estimated_delivery: Option<NaiveDate>,
}

const COLUMNS: &str =
    "order_number, status, order_date, total_amount, tracking_number, estimated_delivery";

/// Get an order by its number.
pub async fn get(pool: &PgPool, order_number: &str) -> Result<Option<OrderRow>, sqlx::Error> {
    sqlx::query_as::<_, OrderRow>(&format!(
        "SELECT {COLUMNS} FROM orders WHERE order_number = $1"
    ))
    .bind(order_number)
    .fetch_optional(pool)
    .await
}

/// Cancel an order if it has not shipped yet. Returns the updated row, or
/// `None` when nothing was cancelled.
pub async fn cancel(pool: &PgPool, order_number: &str) -> Result<Option<OrderRow>, sqlx::Error> {
    sqlx::query_as::<_, OrderRow>(&format!(
        "UPDATE orders SET status = 'Cancelled', updated_at = now()
         WHERE order_number = $1 AND status IN ('Pending', 'Processing')
         RETURNING {COLUMNS}"
    ))
    .bind(order_number)
    .fetch_optional(pool)
    .await
}

impl TryFrom<OrderRow> for OrderRecord {
    type Error = CollaboratorError;

    fn try_from(row: OrderRow) -> Result<Self, Self::Error> {
        let status: OrderStatus = row
            .status
            .parse()
            .map_err(|e: ParseStatusError| CollaboratorError::Backend(e.to_string()))?;
        Ok(OrderRecord {
            order_number: row.order_number,
            status,
            order_date: row.order_date,
            total_amount: row.total_amount,
            tracking_number: row.tracking_number,
            estimated_delivery: row.estimated_delivery,
        })
    }
}
