//! Flashcard decks with resumable study sessions.
//!
//! - [`flashcards`]: decks, cards and session snapshots on disk
//! - [`study`]: the session engine that drives a review queue
//! - [`ai`]: explanations from an OpenAI-compatible endpoint
//! - [`server`]: REST API over the store
//! - [`settings`]: user settings file

pub mod ai;
pub mod flashcards;
pub mod server;
pub mod settings;
pub mod study;
