//! Dialog tuning knobs.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Thresholds and limits for the dialog router and session store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DialogConfig {
    /// Classifications below this confidence are treated as unknown.
    #[serde(default = "default_min_confidence")]
    pub min_confidence: f64,
    /// Upper bound on any single collaborator call.
    #[serde(default = "default_collaborator_timeout_ms")]
    pub collaborator_timeout_ms: u64,
    /// Idle time after which a session starts over.
    #[serde(default = "default_session_timeout_secs")]
    pub session_timeout_secs: u64,
    /// Re-prompts allowed for a missing slot before giving up on it.
    #[serde(default = "default_max_reprompts")]
    pub max_reprompts: u8,
    /// Products shown per search or recommendation reply.
    #[serde(default = "default_result_limit")]
    pub result_limit: usize,
}

fn default_min_confidence() -> f64 {
    0.5
}

fn default_collaborator_timeout_ms() -> u64 {
    2000
}

fn default_session_timeout_secs() -> u64 {
    1800
}

fn default_max_reprompts() -> u8 {
    1
}

fn default_result_limit() -> usize {
    3
}

impl Default for DialogConfig {
    fn default() -> Self {
        Self {
            min_confidence: default_min_confidence(),
            collaborator_timeout_ms: default_collaborator_timeout_ms(),
            session_timeout_secs: default_session_timeout_secs(),
            max_reprompts: default_max_reprompts(),
            result_limit: default_result_limit(),
        }
    }
}

impl DialogConfig {
    pub fn collaborator_timeout(&self) -> Duration {
        Duration::from_millis(self.collaborator_timeout_ms)
    }

    pub fn session_timeout(&self) -> chrono::Duration {
        chrono::Duration::seconds(i64::try_from(self.session_timeout_secs).unwrap_or(i64::MAX))
    }
}
