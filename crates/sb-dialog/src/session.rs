//! Keyed conversation state with expiry.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};
use tracing::{debug, info, warn};

use crate::config::DialogConfig;
use crate::error::DialogError;
use sb_nlu::IntentClassifier;
use sb_protocol::session::{ConversationState, DialogState, SessionId};

/// In-process session state store.
///
/// States are cloned out on load and written back on save, so two
/// sessions never share anything. Turns on the same session are serialized
/// through [`SessionStore::lock_turn`].
pub struct SessionStore {
    sessions: RwLock<HashMap<SessionId, ConversationState>>,
    turn_locks: Mutex<HashMap<SessionId, Arc<Mutex<()>>>>,
    classifier: Arc<dyn IntentClassifier>,
    timeout: chrono::Duration,
    max_reprompts: u8,
}

impl SessionStore {
    pub fn new(classifier: Arc<dyn IntentClassifier>, config: &DialogConfig) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            turn_locks: Mutex::new(HashMap::new()),
            classifier,
            timeout: config.session_timeout(),
            max_reprompts: config.max_reprompts,
        }
    }

    /// Begin (or restart) a session in the idle state.
    pub async fn start(&self, id: &SessionId) -> ConversationState {
        let state = ConversationState::new();
        self.sessions.write().await.insert(id.clone(), state.clone());
        info!(session = %id, "Session started");
        state
    }

    /// Wait for exclusive use of a session.
    ///
    /// Hold the guard from `load` until `save` so a concurrent turn on the
    /// same session sees the saved state instead of overwriting it. Other
    /// sessions are not blocked.
    pub async fn lock_turn(&self, id: &SessionId) -> OwnedMutexGuard<()> {
        let lock = self
            .turn_locks
            .lock()
            .await
            .entry(id.clone())
            .or_default()
            .clone();
        lock.lock_owned().await
    }

    /// Current state for a session, ready to route.
    ///
    /// Unknown sessions start fresh. Expired and inconsistent states are
    /// discarded and replaced with a fresh one.
    pub async fn load(&self, id: &SessionId) -> ConversationState {
        self.load_at(id, Utc::now()).await
    }

    pub async fn load_at(&self, id: &SessionId, now: DateTime<Utc>) -> ConversationState {
        let Some(state) = self.sessions.read().await.get(id).cloned() else {
            debug!(session = %id, "No stored state, starting fresh");
            return ConversationState::new();
        };

        if state.is_expired(now, self.timeout) {
            info!(session = %id, last_active = %state.updated_at, "Session expired, resetting");
            return ConversationState::new();
        }

        if let Err(err) = self.validate(id, &state) {
            warn!(session = %id, error = %err, "Discarding inconsistent session state");
            return ConversationState::new();
        }

        state
    }

    /// Check that a stored state is one the router could have produced.
    pub fn validate(&self, id: &SessionId, state: &ConversationState) -> Result<(), DialogError> {
        let DialogState::AwaitingSlot {
            slot,
            target,
            attempts,
        } = state.dialog
        else {
            return Ok(());
        };

        let reason = if self.classifier.required_slot(target) != Some(slot) {
            format!("{target} does not use slot {slot}")
        } else if attempts > self.max_reprompts {
            format!("{attempts} attempts exceeds limit of {}", self.max_reprompts)
        } else {
            return Ok(());
        };

        Err(DialogError::InvalidSession {
            session: id.clone(),
            reason,
        })
    }

    /// Stored state without any expiry or consistency handling.
    pub async fn get(&self, id: &SessionId) -> Option<ConversationState> {
        self.sessions.read().await.get(id).cloned()
    }

    pub async fn save(&self, id: &SessionId, state: ConversationState) {
        self.sessions.write().await.insert(id.clone(), state);
    }

    /// Forget a session. Returns false if it was not known.
    pub async fn end(&self, id: &SessionId) -> bool {
        let removed = self.sessions.write().await.remove(id).is_some();
        let mut locks = self.turn_locks.lock().await;
        if locks.get(id).is_some_and(|lock| Arc::strong_count(lock) == 1) {
            locks.remove(id);
        }
        if removed {
            info!(session = %id, "Session ended");
        }
        removed
    }

    /// Drop every expired session and return how many were removed.
    pub async fn purge_expired(&self) -> usize {
        let now = Utc::now();
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, state| !state.is_expired(now, self.timeout));
        let purged = before - sessions.len();
        // Locks still referenced belong to a turn in flight.
        self.turn_locks
            .lock()
            .await
            .retain(|id, lock| Arc::strong_count(lock) > 1 || sessions.contains_key(id));
        if purged > 0 {
            info!(purged, remaining = sessions.len(), "Purged expired sessions");
        }
        purged
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}
