use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};

use cardstack_lib::flashcards::{Card, DeckWithStats, FlashcardStorage};
use cardstack_lib::settings::Settings;

/// Shared application state for CLI commands
pub struct App {
    pub settings: Settings,
    pub storage: Arc<FlashcardStorage>,
}

impl App {
    /// Load settings and open the flashcard store
    pub fn new(config: Option<&Path>, data_dir: Option<PathBuf>) -> Result<Self> {
        let settings = match config {
            Some(path) => Settings::load(path)
                .with_context(|| format!("Failed to load settings from {}", path.display()))?,
            None => Settings::load_default().context("Failed to load settings")?,
        };

        let data_dir = data_dir
            .or_else(|| settings.data_dir())
            .context("Failed to get data directory")?;

        let storage = FlashcardStorage::new(data_dir);
        storage
            .init()
            .context("Failed to initialize flashcard storage")?;

        Ok(Self {
            settings,
            storage: Arc::new(storage),
        })
    }

    /// Find a deck by id, or by name (case-insensitive, exact then prefix match)
    pub fn find_deck(&self, query: &str) -> Result<DeckWithStats> {
        let decks = self.storage.list_decks().context("Failed to list decks")?;

        if let Ok(id) = query.parse::<i64>() {
            if let Some(deck) = decks.iter().find(|d| d.deck.id == id) {
                return Ok(deck.clone());
            }
        }

        let query_lower = query.to_lowercase();

        if let Some(deck) = decks.iter().find(|d| d.deck.name.to_lowercase() == query_lower) {
            return Ok(deck.clone());
        }

        let matches: Vec<&DeckWithStats> = decks
            .iter()
            .filter(|d| d.deck.name.to_lowercase().starts_with(&query_lower))
            .collect();

        match matches.len() {
            0 => bail!(
                "No deck matching '{}'. Available decks:\n{}",
                query,
                decks
                    .iter()
                    .map(|d| format!("  {:>3}  {}", d.deck.id, d.deck.name))
                    .collect::<Vec<_>>()
                    .join("\n")
            ),
            1 => Ok(matches[0].clone()),
            _ => bail!(
                "Ambiguous deck name '{}'. Matches:\n{}",
                query,
                matches
                    .iter()
                    .map(|d| format!("  {:>3}  {}", d.deck.id, d.deck.name))
                    .collect::<Vec<_>>()
                    .join("\n")
            ),
        }
    }

    pub fn find_card(&self, card_id: i64) -> Result<Card> {
        self.storage
            .get_card(card_id)
            .with_context(|| format!("Card {} not found", card_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn test_app() -> (App, TempDir) {
        let temp = TempDir::new().unwrap();
        let config = temp.path().join("settings.toml");
        let app = App::new(Some(config.as_path()), Some(temp.path().join("data"))).unwrap();
        (app, temp)
    }

    #[test]
    fn test_find_deck_by_id_and_name() {
        let (app, _temp) = test_app();
        app.storage.create_deck("Spanish Verbs".to_string(), None).unwrap();
        app.storage.create_deck("Spanish Nouns".to_string(), None).unwrap();
        app.storage.create_deck("German".to_string(), None).unwrap();

        assert_eq!(app.find_deck("3").unwrap().deck.name, "German");
        assert_eq!(app.find_deck("german").unwrap().deck.id, 3);
        assert_eq!(app.find_deck("spanish v").unwrap().deck.id, 1);

        let err = app.find_deck("Spanish").unwrap_err().to_string();
        assert!(err.starts_with("Ambiguous deck name"));
        let err = app.find_deck("French").unwrap_err().to_string();
        assert!(err.starts_with("No deck matching"));
    }
}
