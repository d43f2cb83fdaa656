//! Catalog-based recommender.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::collaborators::{Recommender, SupportStore};
use crate::error::CollaboratorResult;
use sb_nlu::ranking::{self, PriceRange};
use sb_protocol::catalog::Product;

/// Candidates pulled per category before ranking.
const CANDIDATE_POOL: usize = 20;

/// Recommends by ranking store products with the weighted heuristic.
///
/// With a category, candidates come from that category first and are
/// topped up from complementary categories when it is thin. Without one,
/// the store's popular items are ranked.
pub struct CatalogRecommender {
    store: Arc<dyn SupportStore>,
    price_range: Option<PriceRange>,
}

impl CatalogRecommender {
    pub fn new(store: Arc<dyn SupportStore>) -> Self {
        Self {
            store,
            price_range: None,
        }
    }

    pub fn with_price_range(mut self, range: PriceRange) -> Self {
        self.price_range = Some(range);
        self
    }
}

#[async_trait]
impl Recommender for CatalogRecommender {
    async fn recommend(
        &self,
        user_id: &str,
        category: Option<&str>,
        limit: usize,
    ) -> CollaboratorResult<Vec<Product>> {
        let mut candidates = match category {
            Some(category) => {
                self.store
                    .search_products(&[], Some(category), CANDIDATE_POOL)
                    .await?
            }
            None => self.store.popular_products(CANDIDATE_POOL).await?,
        };

        if let Some(category) = category {
            for related in ranking::complementary_categories(category) {
                if candidates.len() >= limit {
                    break;
                }
                let extra = self
                    .store
                    .search_products(&[], Some(*related), CANDIDATE_POOL)
                    .await?;
                candidates.extend(extra);
            }
        }

        let ranked = ranking::rank_products(candidates, self.price_range);
        debug!(
            user = user_id,
            category = category.unwrap_or("any"),
            candidates = ranked.len(),
            "Ranked recommendation candidates"
        );
        Ok(ranked.into_iter().take(limit).map(|s| s.product).collect())
    }
}
