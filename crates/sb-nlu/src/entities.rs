//! Entity extraction: order numbers and product categories.

use std::sync::LazyLock;

use regex::Regex;
use sb_protocol::intent::{Entities, SlotName};

use crate::normalize::normalize;

static ORD_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bORD-\d{4}-\d{5}\b").unwrap());

static BARE_NUMBER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"#?\b\d{5,}\b").unwrap());

/// Category keywords in match order. `headphone` precedes `phone`
/// so headphones land in accessories.
const CATEGORY_KEYWORDS: &[(&str, &str)] = &[
    ("laptop", "Laptops"),
    ("computer", "Laptops"),
    ("notebook", "Laptops"),
    ("headphone", "Accessories"),
    ("earbud", "Accessories"),
    ("mouse", "Accessories"),
    ("keyboard", "Accessories"),
    ("smartphone", "Smartphones"),
    ("phone", "Smartphones"),
    ("book", "Books"),
    ("appliance", "Appliances"),
];

/// Pull every recognizable entity out of raw text.
pub fn extract(text: &str) -> Entities {
    Entities {
        order_number: extract_order_number(text),
        category: extract_category(text),
    }
}

/// Value for a single slot, if the text carries one.
pub fn extract_slot(slot: SlotName, text: &str) -> Option<String> {
    match slot {
        SlotName::OrderNumber => extract_order_number(text),
    }
}

/// Find an order number and return it in canonical `ORD-…` form.
///
/// Accepts `ORD-2026-00001` in any case anywhere in the text. Only when
/// there is none does a bare run of at least five digits, optionally
/// prefixed with `#`, count. Digit runs joined to a dash are part of some
/// longer code and are skipped.
pub fn extract_order_number(text: &str) -> Option<String> {
    if let Some(m) = ORD_NUMBER.find(text) {
        return Some(m.as_str().to_ascii_uppercase());
    }
    BARE_NUMBER
        .find_iter(text)
        .find(|m| !text[..m.start()].ends_with('-') && !text[m.end()..].starts_with('-'))
        .map(|m| format!("ORD-{}", m.as_str().trim_start_matches('#')))
}

/// Map category keywords (plural or singular) to a catalog category.
pub fn extract_category(text: &str) -> Option<String> {
    let normalized = normalize(text);
    CATEGORY_KEYWORDS
        .iter()
        .find(|(kw, _)| normalized.split(' ').any(|word| word.starts_with(kw)))
        .map(|(_, category)| (*category).to_string())
}
