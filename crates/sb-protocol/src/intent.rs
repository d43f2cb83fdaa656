use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Closed vocabulary of things a customer can ask for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntentKind {
    TrackOrder,
    CancelOrder,
    ProductSearch,
    ProductRecommendation,
    ReturnPolicy,
    ShippingInfo,
    PaymentMethods,
    Greeting,
    Goodbye,
    Help,
    Unknown,
}

impl IntentKind {
    pub const ALL: [IntentKind; 11] = [
        IntentKind::TrackOrder,
        IntentKind::CancelOrder,
        IntentKind::ProductSearch,
        IntentKind::ProductRecommendation,
        IntentKind::ReturnPolicy,
        IntentKind::ShippingInfo,
        IntentKind::PaymentMethods,
        IntentKind::Greeting,
        IntentKind::Goodbye,
        IntentKind::Help,
        IntentKind::Unknown,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            IntentKind::TrackOrder => "track_order",
            IntentKind::CancelOrder => "cancel_order",
            IntentKind::ProductSearch => "product_search",
            IntentKind::ProductRecommendation => "product_recommendation",
            IntentKind::ReturnPolicy => "return_policy",
            IntentKind::ShippingInfo => "shipping_info",
            IntentKind::PaymentMethods => "payment_methods",
            IntentKind::Greeting => "greeting",
            IntentKind::Goodbye => "goodbye",
            IntentKind::Help => "help",
            IntentKind::Unknown => "unknown",
        }
    }
}

impl fmt::Display for IntentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when an intent name is not part of the vocabulary.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown intent name: {0}")]
pub struct ParseIntentError(pub String);

impl FromStr for IntentKind {
    type Err = ParseIntentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        IntentKind::ALL
            .iter()
            .copied()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| ParseIntentError(s.to_string()))
    }
}

/// How strongly the winning rule matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchTier {
    /// The whole normalized utterance equals a trigger phrase.
    Exact,
    /// A trigger phrase or keyword appears inside the utterance.
    Keyword,
    /// No rule fired.
    Fallback,
}

/// A piece of information a dialog must collect before it can act.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlotName {
    OrderNumber,
}

impl SlotName {
    pub fn as_str(&self) -> &'static str {
        match self {
            SlotName::OrderNumber => "order_number",
        }
    }
}

impl fmt::Display for SlotName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Values extracted from the utterance alongside the intent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entities {
    /// Canonical order number (e.g. `ORD-2026-00001`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_number: Option<String>,
    /// Product category inferred from category keywords.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

impl Entities {
    /// Value of a slot if the utterance carried it.
    pub fn slot(&self, slot: SlotName) -> Option<&str> {
        match slot {
            SlotName::OrderNumber => self.order_number.as_deref(),
        }
    }

    /// Slot values as a name → value map (used for session state).
    pub fn slot_values(&self) -> BTreeMap<SlotName, String> {
        let mut out = BTreeMap::new();
        if let Some(n) = &self.order_number {
            out.insert(SlotName::OrderNumber, n.clone());
        }
        out
    }
}

/// Output of the intent classifier for a single utterance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    pub intent: IntentKind,
    /// Heuristic confidence in `[0, 1]`.
    pub confidence: f64,
    pub tier: MatchTier,
    #[serde(default)]
    pub entities: Entities,
}

impl Classification {
    /// The classification produced when no rule fires.
    pub fn unknown(entities: Entities) -> Self {
        Self {
            intent: IntentKind::Unknown,
            confidence: 0.0,
            tier: MatchTier::Fallback,
            entities,
        }
    }

    pub fn is_unknown(&self) -> bool {
        self.intent == IntentKind::Unknown
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intent_serialization_is_snake_case() {
        let json = serde_json::to_string(&IntentKind::ProductRecommendation).unwrap();
        assert_eq!(json, r#""product_recommendation""#);
    }

    #[test]
    fn intent_display_matches_serde_name() {
        for kind in IntentKind::ALL {
            let json = serde_json::to_string(&kind).unwrap();
            assert_eq!(json.trim_matches('"'), kind.to_string());
        }
    }

    #[test]
    fn intent_from_str() {
        assert_eq!("track_order".parse::<IntentKind>(), Ok(IntentKind::TrackOrder));
        assert!("track-order".parse::<IntentKind>().is_err());
    }

    #[test]
    fn unknown_classification_has_zero_confidence() {
        let c = Classification::unknown(Entities::default());
        assert!(c.is_unknown());
        assert_eq!(c.confidence, 0.0);
        assert_eq!(c.tier, MatchTier::Fallback);
    }

    #[test]
    fn entities_skip_empty_fields() {
        let json = serde_json::to_string(&Entities::default()).unwrap();
        assert_eq!(json, "{}");
    }

    #[test]
    fn slot_lookup() {
        let e = Entities {
            order_number: Some("ORD-2026-00001".into()),
            category: None,
        };
        assert_eq!(e.slot(SlotName::OrderNumber), Some("ORD-2026-00001"));
        assert_eq!(e.slot_values().len(), 1);
    }
}
