//! Product catalog queries.

use sqlx::PgPool;

use sb_protocol::catalog::Product;

use super::like_pattern;

/// Product row returned from the database.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ProductRow {
    pub id: i64,
    pub name: String,
    pub category: String,
    pub price: f64,
    pub rating: f64,
    pub description: Option<String>,
    pub stock_quantity: i32,
    pub reviews_count: i32,
}

/// Products whose name, category or description contains any term,
/// optionally restricted to one category, best rated first.
pub async fn search(
    pool: &PgPool,
    terms: &[String],
    category: Option<&str>,
    limit: usize,
) -> Result<Vec<ProductRow>, sqlx::Error> {
    let patterns: Vec<String> = terms.iter().map(|t| like_pattern(t)).collect();
    sqlx::query_as::<_, ProductRow>(
        "SELECT id, name, category, price, rating, description, stock_quantity, reviews_count
         FROM products
         WHERE ($1::text IS NULL OR lower(category) = lower($1))
           AND (cardinality($2::text[]) = 0
                OR name ILIKE ANY($2)
                OR category ILIKE ANY($2)
                OR description ILIKE ANY($2))
         ORDER BY rating DESC, id
         LIMIT $3",
    )
    .bind(category)
    .bind(&patterns)
    .bind(limit as i64)
    .fetch_all(pool)
    .await
}

/// Highest-rated in-stock products.
pub async fn popular(pool: &PgPool, limit: usize) -> Result<Vec<ProductRow>, sqlx::Error> {
    sqlx::query_as::<_, ProductRow>(
        "SELECT id, name, category, price, rating, description, stock_quantity, reviews_count
         FROM products
         WHERE stock_quantity > 0
         ORDER BY rating DESC, reviews_count DESC
         LIMIT $1",
    )
    .bind(limit as i64)
    .fetch_all(pool)
    .await
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        Product {
            id: row.id,
            name: row.name,
            category: row.category,
            price: row.price,
            rating: row.rating,
            description: row.description,
            stock_quantity: row.stock_quantity,
            reviews_count: row.reviews_count,
        }
    }
}
