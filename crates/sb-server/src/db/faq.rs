//! FAQ queries.

use sqlx::PgPool;

use sb_protocol::catalog::FaqEntry;

use super::like_pattern;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct FaqRow {
    pub id: i64,
    pub question: String,
    pub answer: String,
    pub category: Option<String>,
    pub times_asked: i32,
}

/// FAQ entries whose question or answer contains any of `terms`.
pub async fn search(pool: &PgPool, terms: &[String]) -> Result<Vec<FaqRow>, sqlx::Error> {
    let patterns: Vec<String> = terms.iter().map(|t| like_pattern(t)).collect();
    sqlx::query_as::<_, FaqRow>(
        "SELECT id, question, answer, category, times_asked
         FROM faqs
         WHERE question ILIKE ANY($1) OR answer ILIKE ANY($1)
         ORDER BY id",
    )
    .bind(&patterns)
    .fetch_all(pool)
    .await
}

/// Increment the "times asked" counter. Returns the number of rows updated.
pub async fn record_hit(pool: &PgPool, faq_id: i64) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("UPDATE faqs SET times_asked = times_asked + 1 WHERE id = $1")
        .bind(faq_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}

impl From<FaqRow> for FaqEntry {
    fn from(row: FaqRow) -> Self {
        FaqEntry {
            id: row.id,
            question: row.question,
            answer: row.answer,
            category: row.category,
            times_asked: row.times_asked,
        }
    }
}
