use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::intent::{IntentKind, SlotName};

/// Conversation/session identifier assigned by the host channel.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(pub String);

impl SessionId {
    /// Generate a fresh, time-sortable session id.
    pub fn generate() -> Self {
        Self(Uuid::now_v7().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SessionId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for SessionId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Raw user text as received from the channel. Immutable once built.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Utterance {
    pub session_id: SessionId,
    pub user_id: String,
    pub channel: String,
    pub text: String,
    pub received_at: DateTime<Utc>,
}

impl Utterance {
    pub fn new(
        session_id: impl Into<SessionId>,
        user_id: impl Into<String>,
        channel: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        Self {
            session_id: session_id.into(),
            user_id: user_id.into(),
            channel: channel.into(),
            text: text.into(),
            received_at: Utc::now(),
        }
    }
}

/// Per-session dialog position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum DialogState {
    #[default]
    Idle,
    /// Waiting for the user to supply `slot` so `target` can be resolved.
    AwaitingSlot {
        slot: SlotName,
        target: IntentKind,
        /// Consecutive turns that did not contain the slot.
        attempts: u8,
    },
}

impl std::fmt::Display for DialogState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DialogState::Idle => write!(f, "idle"),
            DialogState::AwaitingSlot { slot, target, .. } => {
                write!(f, "awaiting_slot({slot}, {target})")
            }
        }
    }
}

/// Everything the bot remembers about one session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationState {
    pub dialog: DialogState,
    /// Slot values collected for the dialog in progress.
    #[serde(default)]
    pub slots: BTreeMap<SlotName, String>,
    /// Number of completed turns in this session.
    #[serde(default)]
    pub turns: u32,
    pub updated_at: DateTime<Utc>,
}

impl ConversationState {
    pub fn new() -> Self {
        Self {
            dialog: DialogState::Idle,
            slots: BTreeMap::new(),
            turns: 0,
            updated_at: Utc::now(),
        }
    }

    pub fn is_idle(&self) -> bool {
        self.dialog == DialogState::Idle
    }

    /// Store a collected value, replacing any earlier one for the same slot.
    pub fn fill_slot(&mut self, slot: SlotName, value: impl Into<String>) {
        self.slots.insert(slot, value.into());
    }

    pub fn slot(&self, slot: SlotName) -> Option<&str> {
        self.slots.get(&slot).map(String::as_str)
    }

    /// Drop any dialog in progress and its collected slots.
    pub fn reset(&mut self) {
        self.dialog = DialogState::Idle;
        self.slots.clear();
    }

    /// True when the session has been inactive for longer than `timeout`.
    pub fn is_expired(&self, now: DateTime<Utc>, timeout: Duration) -> bool {
        now - self.updated_at > timeout
    }
}

impl Default for ConversationState {
    fn default() -> Self {
        Self::new()
    }
}

/// What the router did with a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    /// Answered from a static template.
    Reply,
    /// Asked the user for a missing slot.
    PromptSlot,
    /// Called an external collaborator and formatted its result.
    Lookup,
    /// Could not understand; generic clarification.
    Fallback,
    /// A collaborator failed; polite apology.
    Apology,
}

/// Identifies which response template produced a reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TemplateId {
    Welcome,
    Help,
    Farewell,
    ReturnPolicy,
    ShippingInfo,
    PaymentMethods,
    SlotPrompt,
    SlotReprompt,
    OrderStatus,
    OrderNotFound,
    CancellationConfirmed,
    CancellationRejected,
    ProductList,
    NoProducts,
    Recommendations,
    FaqAnswer,
    Fallback,
    Apology,
}

/// A rendered bot reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Response {
    pub template: TemplateId,
    pub text: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dialog_state_serializes_with_tag() {
        let state = DialogState::AwaitingSlot {
            slot: SlotName::OrderNumber,
            target: IntentKind::TrackOrder,
            attempts: 1,
        };
        let json = serde_json::to_value(state).unwrap();
        assert_eq!(json["state"], "awaiting_slot");
        assert_eq!(json["slot"], "order_number");
        assert_eq!(json["target"], "track_order");
        assert_eq!(json["attempts"], 1);
    }

    #[test]
    fn idle_roundtrip() {
        let json = serde_json::to_string(&DialogState::Idle).unwrap();
        assert_eq!(json, r#"{"state":"idle"}"#);
        let back: DialogState = serde_json::from_str(&json).unwrap();
        assert_eq!(back, DialogState::Idle);
    }

    #[test]
    fn reset_clears_slots() {
        let mut state = ConversationState::new();
        state.dialog = DialogState::AwaitingSlot {
            slot: SlotName::OrderNumber,
            target: IntentKind::CancelOrder,
            attempts: 0,
        };
        state.fill_slot(SlotName::OrderNumber, "ORD-2026-00001");
        state.reset();
        assert!(state.is_idle());
        assert!(state.slots.is_empty());
    }

    #[test]
    fn fill_slot_replaces_earlier_value() {
        let mut state = ConversationState::new();
        assert_eq!(state.slot(SlotName::OrderNumber), None);
        state.fill_slot(SlotName::OrderNumber, "ORD-2026-00001");
        state.fill_slot(SlotName::OrderNumber, "ORD-2026-00002");
        assert_eq!(state.slot(SlotName::OrderNumber), Some("ORD-2026-00002"));
        assert_eq!(state.slots.len(), 1);

        let json = serde_json::to_value(&state).unwrap();
        assert_eq!(json["slots"]["order_number"], "ORD-2026-00002");
    }

    #[test]
    fn expiry() {
        let mut state = ConversationState::new();
        let now = Utc::now();
        state.updated_at = now - Duration::minutes(31);
        assert!(state.is_expired(now, Duration::minutes(30)));
        assert!(!state.is_expired(now, Duration::minutes(45)));
    }

    #[test]
    fn session_id_generation_is_unique() {
        assert_ne!(SessionId::generate(), SessionId::generate());
    }

    #[test]
    fn action_serialization() {
        assert_eq!(
            serde_json::to_string(&Action::PromptSlot).unwrap(),
            r#""prompt_slot""#
        );
    }
}
