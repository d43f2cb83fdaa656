//! Ordered intent rule table.
//!
//! Every rule carries an explicit, unique priority. The classifier walks
//! rules in ascending priority order and the first rule that fires wins,
//! so overlapping triggers ("cancel my order" mentions both cancel and
//! order) always resolve the same way.

use std::collections::HashSet;

use serde::Deserialize;
use tracing::debug;

use crate::error::{NluError, NluResult};
use crate::normalize::normalize;
use sb_protocol::intent::{IntentKind, SlotName};

/// One keyword rule.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct IntentRule {
    pub intent: IntentKind,
    /// Lower fires first. Unique within a table.
    pub priority: u16,
    /// Confidence reported for a keyword-tier match.
    pub confidence: f64,
    /// Words or phrases that trigger the rule. Normalized on load.
    pub triggers: Vec<String>,
    /// Slot the intent needs before it can be resolved.
    #[serde(default)]
    pub slot: Option<SlotName>,
}

impl IntentRule {
    pub fn new(intent: IntentKind, priority: u16, confidence: f64, triggers: &[&str]) -> Self {
        Self {
            intent,
            priority,
            confidence,
            triggers: triggers.iter().map(|t| (*t).to_string()).collect(),
            slot: None,
        }
    }

    pub fn with_slot(mut self, slot: SlotName) -> Self {
        self.slot = Some(slot);
        self
    }
}

#[derive(Debug, Deserialize)]
struct RuleFile {
    #[serde(default, rename = "rule")]
    rules: Vec<IntentRule>,
}

/// Validated rules sorted by ascending priority.
#[derive(Debug, Clone)]
pub struct RuleTable {
    rules: Vec<IntentRule>,
}

impl RuleTable {
    /// Validate and sort a set of rules.
    ///
    /// Rejects duplicate priorities, duplicate intents, rules for
    /// `unknown`, confidences outside (0, 1] and rules whose triggers are
    /// all empty after normalization.
    pub fn new(rules: Vec<IntentRule>) -> NluResult<Self> {
        let mut rules: Vec<IntentRule> = rules
            .into_iter()
            .map(|mut rule| {
                rule.triggers = rule
                    .triggers
                    .iter()
                    .map(|t| normalize(t))
                    .filter(|t| !t.is_empty())
                    .collect();
                rule
            })
            .collect();

        let mut intents = HashSet::new();
        for rule in &rules {
            if rule.intent == IntentKind::Unknown {
                return Err(NluError::UnknownRule);
            }
            if !intents.insert(rule.intent) {
                return Err(NluError::DuplicateIntent(rule.intent.to_string()));
            }
            if rule.triggers.is_empty() {
                return Err(NluError::EmptyTriggers(rule.intent.to_string()));
            }
            if !(rule.confidence > 0.0 && rule.confidence <= 1.0) {
                return Err(NluError::InvalidConfidence {
                    intent: rule.intent.to_string(),
                    confidence: rule.confidence,
                });
            }
        }

        rules.sort_by_key(|r| r.priority);
        if let Some(pair) = rules.windows(2).find(|w| w[0].priority == w[1].priority) {
            return Err(NluError::DuplicatePriority {
                priority: pair[0].priority,
                first: pair[0].intent.to_string(),
                second: pair[1].intent.to_string(),
            });
        }

        debug!(rules = rules.len(), "Rule table loaded");
        Ok(Self { rules })
    }

    /// Parse a TOML rule file made of `[[rule]]` tables.
    pub fn from_toml_str(content: &str) -> NluResult<Self> {
        let file: RuleFile =
            toml::from_str(content).map_err(|e| NluError::Parse(e.to_string()))?;
        Self::new(file.rules)
    }

    /// Load rules from a TOML file on disk.
    pub fn from_file(path: &str) -> NluResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| NluError::Parse(format!("{path}: {e}")))?;
        Self::from_toml_str(&content)
    }

    /// Rules in firing order.
    pub fn rules(&self) -> &[IntentRule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Slot the given intent requires, if any.
    pub fn required_slot(&self, intent: IntentKind) -> Option<SlotName> {
        self.rules
            .iter()
            .find(|r| r.intent == intent)
            .and_then(|r| r.slot)
    }
}

impl Default for RuleTable {
    /// The built-in storefront rules.
    ///
    /// Order-changing requests come before generic order mentions, and
    /// store-policy questions before the broad product-shopping words.
    fn default() -> Self {
        let rules = vec![
            IntentRule::new(
                IntentKind::CancelOrder,
                10,
                0.87,
                &["cancel", "cancel my order", "cancel order", "cancellation", "stop my order"],
            )
            .with_slot(SlotName::OrderNumber),
            IntentRule::new(
                IntentKind::ReturnPolicy,
                20,
                0.92,
                &["return", "returns", "return policy", "refund", "refunds", "money back"],
            ),
            IntentRule::new(
                IntentKind::TrackOrder,
                30,
                0.95,
                &[
                    "track",
                    "track my order",
                    "tracking",
                    "my order",
                    "order status",
                    "status of",
                    "where is my order",
                    "where's my order",
                    "where is my package",
                ],
            )
            .with_slot(SlotName::OrderNumber),
            IntentRule::new(
                IntentKind::ShippingInfo,
                40,
                0.91,
                &["shipping", "ship", "delivery", "deliver"],
            ),
            IntentRule::new(
                IntentKind::PaymentMethods,
                50,
                0.89,
                &["payment", "payment methods", "pay", "credit card", "paypal"],
            ),
            IntentRule::new(
                IntentKind::ProductRecommendation,
                60,
                0.90,
                &[
                    "recommend",
                    "recommendation",
                    "recommendations",
                    "suggest",
                    "suggestion",
                    "suggestions",
                    "what should i",
                    "best",
                ],
            ),
            IntentRule::new(
                IntentKind::ProductSearch,
                70,
                0.88,
                &[
                    "looking for",
                    "need",
                    "want",
                    "buy",
                    "purchase",
                    "find",
                    "search",
                    "show me",
                ],
            ),
            IntentRule::new(
                IntentKind::Help,
                80,
                0.96,
                &["help", "assist", "assistance", "support", "what can you do"],
            ),
            IntentRule::new(
                IntentKind::Greeting,
                90,
                0.99,
                &["hi", "hello", "hey", "good morning", "good afternoon", "good evening"],
            ),
            IntentRule::new(
                IntentKind::Goodbye,
                100,
                0.94,
                &["bye", "goodbye", "thanks", "thank you", "see you"],
            ),
        ];
        Self::new(rules).unwrap_or_else(|e| unreachable!("built-in rule table is invalid: {e}"))
    }
}
