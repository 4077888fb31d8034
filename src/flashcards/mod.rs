//! Decks, cards and persisted study sessions
//!
//! This module provides:
//! - Deck management with derived card statistics
//! - Card CRUD and bulk import from pasted text
//! - Per-deck study session snapshots

pub mod import;
pub mod models;
pub mod storage;

pub use models::*;
pub use storage::{CardUpdate, DeckUpdate, FlashcardStorage, FlashcardStorageError};
