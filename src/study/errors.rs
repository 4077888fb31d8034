use thiserror::Error;

/// Rejected engine calls. These indicate a caller/engine desync, never a
/// storage problem.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("Session has not been initialized")]
    NotInitialized,

    #[error("Session is already finished")]
    Finished,

    #[error("Review queue is empty")]
    EmptyQueue,

    #[error("Card {actual} is not at the head of the queue (expected {expected})")]
    HeadMismatch { expected: i64, actual: i64 },

    #[error("Invalid outcome: {0}")]
    InvalidOutcome(String),
}

/// Error type returned by card and session store implementations
pub type StoreError = Box<dyn std::error::Error + Send + Sync>;

/// Non-fatal store failures reported while a session keeps running
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionWarning {
    LoadFailed { deck_id: i64, message: String },
    SaveFailed { deck_id: i64, message: String },
    DeleteFailed { deck_id: i64, message: String },
    StatusUpdateFailed { card_id: i64, message: String },
}

impl std::fmt::Display for SessionWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::LoadFailed { deck_id, message } => {
                write!(f, "could not load session for deck {}: {}", deck_id, message)
            }
            Self::SaveFailed { deck_id, message } => {
                write!(f, "could not save session for deck {}: {}", deck_id, message)
            }
            Self::DeleteFailed { deck_id, message } => {
                write!(f, "could not delete session for deck {}: {}", deck_id, message)
            }
            Self::StatusUpdateFailed { card_id, message } => {
                write!(f, "could not update status of card {}: {}", card_id, message)
            }
        }
    }
}
