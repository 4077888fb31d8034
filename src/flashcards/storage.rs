//! Storage operations for decks, cards and study sessions
//!
//! Directory structure:
//! ```text
//! {base}/flashcards/
//! ├── decks.json           # Array of all decks
//! ├── counters.json        # Next deck and card ids
//! ├── cards/
//! │   └── {card-id}.json   # Individual card files
//! └── sessions/
//!     └── {deck-id}.json   # At most one study session per deck
//! ```

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

use super::import::parse_import;
use super::models::*;

#[derive(Error, Debug)]
pub enum FlashcardStorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Deck not found: {0}")]
    DeckNotFound(i64),

    #[error("Card not found: {0}")]
    CardNotFound(i64),

    #[error("Data directory not found")]
    DataDirNotFound,
}

pub type Result<T> = std::result::Result<T, FlashcardStorageError>;

/// Partial update for a deck. `description: Some(None)` clears it.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeckUpdate {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub description: Option<Option<String>>,
}

/// Partial update for a card
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardUpdate {
    #[serde(default)]
    pub front: Option<String>,
    #[serde(default)]
    pub back: Option<String>,
    #[serde(default)]
    pub status: Option<CardStatus>,
}

/// Distinguishes an explicit `null` from a missing field
fn deserialize_some<'de, T, D>(deserializer: D) -> std::result::Result<Option<T>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Deserialize::deserialize(deserializer).map(Some)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Counters {
    next_deck_id: i64,
    next_card_id: i64,
}

impl Default for Counters {
    fn default() -> Self {
        Self {
            next_deck_id: 1,
            next_card_id: 1,
        }
    }
}

#[derive(Clone, Copy)]
enum IdKind {
    Deck,
    Card,
}

/// Storage manager for flashcard operations
pub struct FlashcardStorage {
    /// Base data path (e.g., ~/.local/share/cardstack)
    base_path: PathBuf,
    /// Serializes read-modify-write cycles on the shared JSON files
    write_lock: Mutex<()>,
}

impl FlashcardStorage {
    pub fn new(base_path: PathBuf) -> Self {
        Self {
            base_path,
            write_lock: Mutex::new(()),
        }
    }

    /// Get the default data directory
    pub fn default_data_dir() -> Result<PathBuf> {
        dirs::data_local_dir()
            .map(|p| p.join("cardstack"))
            .ok_or(FlashcardStorageError::DataDirNotFound)
    }

    fn flashcards_dir(&self) -> PathBuf {
        self.base_path.join("flashcards")
    }

    fn cards_dir(&self) -> PathBuf {
        self.flashcards_dir().join("cards")
    }

    fn sessions_dir(&self) -> PathBuf {
        self.flashcards_dir().join("sessions")
    }

    fn decks_path(&self) -> PathBuf {
        self.flashcards_dir().join("decks.json")
    }

    fn counters_path(&self) -> PathBuf {
        self.flashcards_dir().join("counters.json")
    }

    fn card_path(&self, card_id: i64) -> PathBuf {
        self.cards_dir().join(format!("{}.json", card_id))
    }

    fn session_path(&self, deck_id: i64) -> PathBuf {
        self.sessions_dir().join(format!("{}.json", deck_id))
    }

    fn lock(&self) -> MutexGuard<'_, ()> {
        self.write_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Initialize storage directories
    pub fn init(&self) -> Result<()> {
        fs::create_dir_all(self.cards_dir())?;
        fs::create_dir_all(self.sessions_dir())?;

        let decks_path = self.decks_path();
        if !decks_path.exists() {
            let empty_decks: Vec<Deck> = Vec::new();
            write_json(&decks_path, &empty_decks)?;
        }

        Ok(())
    }

    fn next_id(&self, kind: IdKind) -> Result<i64> {
        let path = self.counters_path();
        let mut counters: Counters = read_json(&path)?.unwrap_or_default();
        let slot = match kind {
            IdKind::Deck => &mut counters.next_deck_id,
            IdKind::Card => &mut counters.next_card_id,
        };
        let id = *slot;
        *slot += 1;
        write_json(&path, &counters)?;
        Ok(id)
    }

    // ==================== Deck Operations ====================

    fn read_decks(&self) -> Result<Vec<Deck>> {
        Ok(read_json(&self.decks_path())?.unwrap_or_default())
    }

    fn write_decks(&self, decks: &[Deck]) -> Result<()> {
        write_json(&self.decks_path(), &decks)
    }

    fn find_deck(&self, deck_id: i64) -> Result<Deck> {
        self.read_decks()?
            .into_iter()
            .find(|d| d.id == deck_id)
            .ok_or(FlashcardStorageError::DeckNotFound(deck_id))
    }

    /// List all decks with their derived card statistics
    pub fn list_decks(&self) -> Result<Vec<DeckWithStats>> {
        let decks = self.read_decks()?;

        let mut by_deck: HashMap<i64, Vec<Card>> = HashMap::new();
        for card in self.read_all_cards()? {
            by_deck.entry(card.deck_id).or_default().push(card);
        }

        Ok(decks
            .into_iter()
            .map(|deck| {
                let cards = by_deck.remove(&deck.id).unwrap_or_default();
                DeckWithStats::from_cards(deck, &cards)
            })
            .collect())
    }

    /// Get a specific deck with its derived card statistics
    pub fn get_deck(&self, deck_id: i64) -> Result<DeckWithStats> {
        let deck = self.find_deck(deck_id)?;
        let cards = self.list_cards(deck_id)?;
        Ok(DeckWithStats::from_cards(deck, &cards))
    }

    /// Create a new deck
    pub fn create_deck(&self, name: String, description: Option<String>) -> Result<DeckWithStats> {
        let _guard = self.lock();
        self.init()?;

        let mut deck = Deck::new(self.next_id(IdKind::Deck)?, name);
        deck.description = description;

        let mut decks = self.read_decks()?;
        decks.push(deck.clone());
        self.write_decks(&decks)?;

        log::info!("Created deck {} ({})", deck.id, deck.name);
        Ok(DeckWithStats::from_cards(deck, &[]))
    }

    /// Apply a partial update to a deck
    pub fn update_deck(&self, deck_id: i64, update: DeckUpdate) -> Result<DeckWithStats> {
        let deck = {
            let _guard = self.lock();
            let mut decks = self.read_decks()?;
            let deck = decks
                .iter_mut()
                .find(|d| d.id == deck_id)
                .ok_or(FlashcardStorageError::DeckNotFound(deck_id))?;

            if let Some(name) = update.name {
                deck.name = name;
            }
            if let Some(description) = update.description {
                deck.description = description;
            }

            let deck = deck.clone();
            self.write_decks(&decks)?;
            deck
        };

        let cards = self.list_cards(deck_id)?;
        Ok(DeckWithStats::from_cards(deck, &cards))
    }

    /// Record that a deck was just studied
    pub fn mark_deck_studied(&self, deck_id: i64) -> Result<()> {
        let _guard = self.lock();
        let mut decks = self.read_decks()?;
        let deck = decks
            .iter_mut()
            .find(|d| d.id == deck_id)
            .ok_or(FlashcardStorageError::DeckNotFound(deck_id))?;
        deck.last_studied_at = Some(Utc::now());
        self.write_decks(&decks)
    }

    /// Delete a deck together with its cards and its study session
    pub fn delete_deck(&self, deck_id: i64) -> Result<()> {
        let _guard = self.lock();

        let mut decks = self.read_decks()?;
        let before = decks.len();
        decks.retain(|d| d.id != deck_id);
        if decks.len() == before {
            return Err(FlashcardStorageError::DeckNotFound(deck_id));
        }

        remove_if_exists(&self.session_path(deck_id))?;
        for card in self.read_all_cards()? {
            if card.deck_id == deck_id {
                remove_if_exists(&self.card_path(card.id))?;
            }
        }
        self.write_decks(&decks)?;

        log::info!("Deleted deck {}", deck_id);
        Ok(())
    }

    // ==================== Card Operations ====================

    fn read_all_cards(&self) -> Result<Vec<Card>> {
        let cards_dir = self.cards_dir();
        if !cards_dir.exists() {
            return Ok(Vec::new());
        }

        let mut cards = Vec::new();
        for entry in fs::read_dir(&cards_dir)? {
            let entry = entry?;
            let path = entry.path();
            if path.extension().map_or(false, |ext| ext == "json") {
                let content = fs::read_to_string(&path)?;
                let card: Card = serde_json::from_str(&content)?;
                cards.push(card);
            }
        }

        cards.sort_by_key(|c| c.id);
        Ok(cards)
    }

    /// List all cards in a deck, oldest first
    pub fn list_cards(&self, deck_id: i64) -> Result<Vec<Card>> {
        let mut cards = self.read_all_cards()?;
        cards.retain(|c| c.deck_id == deck_id);
        Ok(cards)
    }

    /// Get a specific card
    pub fn get_card(&self, card_id: i64) -> Result<Card> {
        read_json(&self.card_path(card_id))?.ok_or(FlashcardStorageError::CardNotFound(card_id))
    }

    fn insert_card(&self, deck_id: i64, front: String, back: String) -> Result<Card> {
        let card = Card::new(self.next_id(IdKind::Card)?, deck_id, front, back);
        write_json(&self.card_path(card.id), &card)?;
        Ok(card)
    }

    /// Create a new card with status `new`
    pub fn create_card(&self, deck_id: i64, front: String, back: String) -> Result<Card> {
        let _guard = self.lock();
        self.init()?;
        self.find_deck(deck_id)?;
        self.insert_card(deck_id, front, back)
    }

    /// Bulk-create cards from pasted text, returning how many were created
    pub fn import_cards(&self, deck_id: i64, text: &str) -> Result<usize> {
        let _guard = self.lock();
        self.init()?;
        self.find_deck(deck_id)?;

        let pairs = parse_import(text);
        for (front, back) in &pairs {
            self.insert_card(deck_id, front.clone(), back.clone())?;
        }

        log::info!("Imported {} cards into deck {}", pairs.len(), deck_id);
        Ok(pairs.len())
    }

    /// Apply a partial update to a card
    pub fn update_card(&self, card_id: i64, update: CardUpdate) -> Result<Card> {
        let _guard = self.lock();
        let mut card = self.get_card(card_id)?;

        if let Some(front) = update.front {
            card.front = front;
        }
        if let Some(back) = update.back {
            card.back = back;
        }
        if let Some(status) = update.status {
            card.status = status;
            card.last_reviewed_at = Some(Utc::now());
        }

        write_json(&self.card_path(card_id), &card)?;
        Ok(card)
    }

    /// Set the review status of a card and stamp its review time
    pub fn update_card_status(&self, card_id: i64, deck_id: i64, status: CardStatus) -> Result<Card> {
        let _guard = self.lock();
        let mut card = self.get_card(card_id)?;
        if card.deck_id != deck_id {
            return Err(FlashcardStorageError::CardNotFound(card_id));
        }

        card.status = status;
        card.last_reviewed_at = Some(Utc::now());
        write_json(&self.card_path(card_id), &card)?;
        Ok(card)
    }

    /// Delete a card
    pub fn delete_card(&self, card_id: i64) -> Result<()> {
        let _guard = self.lock();
        let path = self.card_path(card_id);
        if !path.exists() {
            return Err(FlashcardStorageError::CardNotFound(card_id));
        }
        fs::remove_file(path)?;
        Ok(())
    }

    // ==================== Session Operations ====================

    /// Load the study session for a deck, if one exists
    pub fn get_session(&self, deck_id: i64) -> Result<Option<StudySession>> {
        read_json(&self.session_path(deck_id))
    }

    /// Create or overwrite the study session for a deck
    pub fn save_session(&self, deck_id: i64, state: SessionState) -> Result<StudySession> {
        let _guard = self.lock();
        fs::create_dir_all(self.sessions_dir())?;

        let session = StudySession {
            deck_id,
            state,
            updated_at: Utc::now(),
        };
        write_json(&self.session_path(deck_id), &session)?;
        Ok(session)
    }

    /// Delete the study session for a deck. Missing sessions are not an error.
    pub fn delete_session(&self, deck_id: i64) -> Result<()> {
        let _guard = self.lock();
        remove_if_exists(&self.session_path(deck_id))
    }

    // ==================== Seed Data ====================

    /// Populate two starter decks when no deck exists yet.
    ///
    /// Returns true if anything was created.
    pub fn seed_if_empty(&self) -> Result<bool> {
        if !self.read_decks()?.is_empty() {
            return Ok(false);
        }

        let js = self.create_deck(
            "JavaScript Basics".to_string(),
            Some("Core JS concepts".to_string()),
        )?;
        self.create_card(
            js.deck.id,
            "What is a closure?".to_string(),
            "A function bundled together with references to its surrounding lexical environment."
                .to_string(),
        )?;
        self.create_card(
            js.deck.id,
            "What is hoisting?".to_string(),
            "Moving variable and function declarations to the top of their scope before execution."
                .to_string(),
        )?;
        let mastered = self.create_card(
            js.deck.id,
            "const vs let".to_string(),
            "Both are block scoped; const cannot be reassigned, let can.".to_string(),
        )?;
        self.update_card_status(mastered.id, js.deck.id, CardStatus::Easy)?;

        let words = self.create_deck("Vocabulary".to_string(), Some("Everyday words".to_string()))?;
        let awesome = self.create_card(
            words.deck.id,
            "Awesome".to_string(),
            "Extremely impressive".to_string(),
        )?;
        self.update_card_status(awesome.id, words.deck.id, CardStatus::Easy)?;
        self.create_card(
            words.deck.id,
            "Fascinating".to_string(),
            "Extremely interesting".to_string(),
        )?;

        log::info!("Seeded starter decks");
        Ok(true)
    }
}

/// Read a JSON file, returning `None` when it does not exist
fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)?;
    Ok(Some(serde_json::from_str(&content)?))
}

/// Write JSON atomically (write to .tmp then rename)
fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let tmp_path = path.with_extension("json.tmp");
    fs::write(&tmp_path, serde_json::to_string_pretty(value)?)?;
    fs::rename(&tmp_path, path)?;
    Ok(())
}

fn remove_if_exists(path: &Path) -> Result<()> {
    if path.exists() {
        fs::remove_file(path)?;
    }
    Ok(())
}
