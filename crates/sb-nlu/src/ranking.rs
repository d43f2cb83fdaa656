//! Product ranking heuristics for recommendations.

use serde::{Deserialize, Serialize};

use sb_protocol::catalog::Product;

/// Review count treated as "maximally popular".
const REVIEWS_CEILING: f64 = 10_000.0;

/// Named price bands a shopper can prefer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceRange {
    Budget,
    MidRange,
    Premium,
}

impl PriceRange {
    pub fn bounds(&self) -> (f64, f64) {
        match self {
            PriceRange::Budget => (0.0, 200.0),
            PriceRange::MidRange => (200.0, 800.0),
            PriceRange::Premium => (800.0, 5000.0),
        }
    }
}

/// A product with its ranking score.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredProduct {
    pub product: Product,
    pub score: f64,
}

/// Weighted score in [0, 1]: rating 40 %, review volume 20 %, in stock 20 %,
/// price fit 20 %.
pub fn score_product(product: &Product, price_range: Option<PriceRange>) -> f64 {
    let mut score = (product.rating / 5.0).clamp(0.0, 1.0) * 0.4;
    score += (f64::from(product.reviews_count.max(0)) / REVIEWS_CEILING).min(1.0) * 0.2;
    if product.in_stock() {
        score += 0.2;
    }
    score + price_fit(product.price, price_range) * 0.2
}

fn price_fit(price: f64, price_range: Option<PriceRange>) -> f64 {
    match price_range {
        Some(range) => {
            let (min, max) = range.bounds();
            if (min..=max).contains(&price) {
                1.0
            } else {
                let diff = if price < min { min - price } else { price - max };
                1.0 - (diff / max).min(1.0)
            }
        }
        // Without a preference, mid-priced items rank best.
        None if (100.0..=1000.0).contains(&price) => 1.0,
        None if (50.0..=1500.0).contains(&price) => 0.5,
        None => 0.0,
    }
}

/// Rank products by descending score. Ties keep their input order.
pub fn rank_products(products: Vec<Product>, price_range: Option<PriceRange>) -> Vec<ScoredProduct> {
    let mut scored: Vec<ScoredProduct> = products
        .into_iter()
        .map(|product| {
            let score = score_product(&product, price_range);
            ScoredProduct { product, score }
        })
        .collect();
    scored.sort_by(|a, b| b.score.total_cmp(&a.score));
    scored
}

/// Categories whose products pair well with `category`.
pub fn complementary_categories(category: &str) -> &'static [&'static str] {
    match category {
        "Laptops" => &["Accessories", "Books"],
        "Smartphones" => &["Accessories"],
        "Accessories" => &["Electronics"],
        "Appliances" => &["Home & Kitchen"],
        "Books" => &["Electronics"],
        "Sports & Outdoors" => &["Home & Kitchen"],
        _ => &[],
    }
}

/// One-line reason a product was recommended.
pub fn explain(product: &Product) -> String {
    let mut reasons = Vec::new();
    if product.rating >= 4.5 {
        reasons.push(format!("highly rated ({:.1}/5.0)", product.rating));
    }
    if product.reviews_count > 500 {
        reasons.push(format!(
            "popular with {} reviews",
            group_thousands(product.reviews_count)
        ));
    }
    if product.price < 100.0 {
        reasons.push("affordable price".to_string());
    } else if product.price > 1000.0 {
        reasons.push("premium quality".to_string());
    }
    if reasons.is_empty() {
        return "Recommended because it matches your interests".to_string();
    }
    format!("Recommended because it's {}", reasons.join(", "))
}

fn group_thousands(n: i32) -> String {
    let digits = n.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    if n < 0 { format!("-{out}") } else { out }
}
