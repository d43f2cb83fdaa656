//! Intent classification over a [`RuleTable`].

use tracing::trace;

use crate::entities;
use crate::normalize::{Padded, normalize};
use crate::rules::RuleTable;
use sb_protocol::intent::{Classification, IntentKind, MatchTier, SlotName};

/// Confidence reported when the whole utterance equals a trigger.
pub const EXACT_CONFIDENCE: f64 = 1.0;

/// Anything that can turn raw text into a [`Classification`].
///
/// Implementations must be deterministic: the same text always yields
/// the same intent and confidence.
pub trait IntentClassifier: Send + Sync {
    fn classify(&self, text: &str) -> Classification;

    /// Slot the intent needs before the dialog can act on it.
    fn required_slot(&self, intent: IntentKind) -> Option<SlotName>;

    /// Name of this classifier (for logging).
    fn name(&self) -> &str;
}

/// Keyword classifier backed by an ordered rule table.
#[derive(Debug, Clone, Default)]
pub struct RuleClassifier {
    table: RuleTable,
}

impl RuleClassifier {
    pub fn new(table: RuleTable) -> Self {
        Self { table }
    }

    pub fn table(&self) -> &RuleTable {
        &self.table
    }
}

impl IntentClassifier for RuleClassifier {
    /// Two passes over the rules in priority order: first an exact match of
    /// the whole normalized text against any trigger, then whole-word
    /// containment. The first rule to fire in a pass wins.
    fn classify(&self, text: &str) -> Classification {
        let entities = entities::extract(text);
        let normalized = normalize(text);
        if normalized.is_empty() {
            return Classification::unknown(entities);
        }

        let exact = self
            .table
            .rules()
            .iter()
            .find(|rule| rule.triggers.iter().any(|t| *t == normalized));
        if let Some(rule) = exact {
            trace!(intent = %rule.intent, "Exact trigger match");
            return Classification {
                intent: rule.intent,
                confidence: EXACT_CONFIDENCE,
                tier: MatchTier::Exact,
                entities,
            };
        }

        let padded = Padded::new(&normalized);
        let keyword = self
            .table
            .rules()
            .iter()
            .find(|rule| rule.triggers.iter().any(|t| padded.contains_phrase(t)));
        match keyword {
            Some(rule) => {
                trace!(intent = %rule.intent, priority = rule.priority, "Keyword match");
                Classification {
                    intent: rule.intent,
                    confidence: rule.confidence,
                    tier: MatchTier::Keyword,
                    entities,
                }
            }
            None => {
                trace!(text = %normalized, "No rule matched");
                Classification::unknown(entities)
            }
        }
    }

    fn required_slot(&self, intent: IntentKind) -> Option<SlotName> {
        self.table.required_slot(intent)
    }

    fn name(&self) -> &str {
        "rules"
    }
}
