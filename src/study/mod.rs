//! Study sessions
//!
//! A session turns a deck's cards into a review queue, applies the user's
//! outcomes, saves progress after a quiet period and resumes interrupted
//! sessions. Stores are reached through the [`CardStore`] and
//! [`SessionStore`] traits.

pub mod debounce;
pub mod engine;
pub mod errors;
pub mod queue;
pub mod stores;

use std::time::Duration;

use serde::{Deserialize, Serialize};

pub use engine::{InitOutcome, ResumeDecision, SessionEngine, SessionPhase};
pub use errors::{SessionError, SessionWarning, StoreError};
pub use queue::{Outcome, ReviewQueue, ReviewStep};
pub use stores::{CardStore, SessionStore};

/// Tunables for study sessions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StudyConfig {
    /// Quiet period before a snapshot is written
    pub save_debounce_ms: u64,
    /// Shuffle fresh queues. Off keeps the deck's card order.
    pub shuffle: bool,
    /// Retire a card as `good` after this many requeues. Unset keeps
    /// requeueing forever.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_requeues: Option<u32>,
}

impl Default for StudyConfig {
    fn default() -> Self {
        Self {
            save_debounce_ms: 2000,
            shuffle: true,
            max_requeues: None,
        }
    }
}

impl StudyConfig {
    pub fn save_debounce(&self) -> Duration {
        Duration::from_millis(self.save_debounce_ms)
    }
}
