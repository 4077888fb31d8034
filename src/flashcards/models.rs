//! Data models for decks, cards and persisted study sessions

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A deck is a named collection of flashcards
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Deck {
    pub id: i64,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_studied_at: Option<DateTime<Utc>>,
}

impl Deck {
    pub fn new(id: i64, name: String) -> Self {
        Self {
            id,
            name,
            description: None,
            created_at: Utc::now(),
            last_studied_at: None,
        }
    }
}

/// A deck together with statistics derived from its live cards.
///
/// The counts are recomputed on every read and never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeckWithStats {
    #[serde(flatten)]
    pub deck: Deck,
    pub card_count: usize,
    /// Cards whose status is `easy`
    pub mastered_count: usize,
}

impl DeckWithStats {
    pub fn from_cards(deck: Deck, cards: &[Card]) -> Self {
        let mastered_count = cards
            .iter()
            .filter(|c| c.status == CardStatus::Easy)
            .count();
        Self {
            deck,
            card_count: cards.len(),
            mastered_count,
        }
    }
}

/// Review status of a card
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CardStatus {
    /// Never reviewed
    #[default]
    New,
    Easy,
    Good,
    Again,
}

impl CardStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::New => "new",
            Self::Easy => "easy",
            Self::Good => "good",
            Self::Again => "again",
        }
    }
}

impl fmt::Display for CardStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Error returned when a status string is not one of `new|easy|good|again`
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid card status: {0}")]
pub struct ParseStatusError(pub String);

impl FromStr for CardStatus {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "new" => Ok(Self::New),
            "easy" => Ok(Self::Easy),
            "good" => Ok(Self::Good),
            "again" => Ok(Self::Again),
            _ => Err(ParseStatusError(s.to_string())),
        }
    }
}

/// A flashcard with question (front) and answer (back)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Card {
    pub id: i64,
    pub deck_id: i64,
    pub front: String,
    pub back: String,
    #[serde(default)]
    pub status: CardStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_reviewed_at: Option<DateTime<Utc>>,
}

impl Card {
    pub fn new(id: i64, deck_id: i64, front: String, back: String) -> Self {
        Self {
            id,
            deck_id,
            front,
            back,
            status: CardStatus::New,
            last_reviewed_at: None,
        }
    }
}

/// Outcome counters for one study session
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionStats {
    #[serde(default)]
    pub easy: u32,
    #[serde(default)]
    pub good: u32,
    #[serde(default)]
    pub again: u32,
}

impl SessionStats {
    /// Total number of outcomes recorded
    pub fn total(&self) -> u32 {
        self.easy + self.good + self.again
    }
}

/// Serializable form of an in-progress study session
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionState {
    /// Remaining cards, head first. Copies, not live references.
    #[serde(default)]
    pub queue: Vec<Card>,
    #[serde(default)]
    pub stats: SessionStats,
    /// How many times each card has been requeued. Only tracked when a
    /// requeue cap is configured.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub requeues: HashMap<i64, u32>,
}

/// Persisted session record, unique per deck
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudySession {
    pub deck_id: i64,
    pub state: SessionState,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_parse() {
        assert_eq!("easy".parse::<CardStatus>(), Ok(CardStatus::Easy));
        assert_eq!(" Again ".parse::<CardStatus>(), Ok(CardStatus::Again));
        assert!("hard".parse::<CardStatus>().is_err());
    }

    #[test]
    fn test_deck_stats_counts_easy_only() {
        let mut cards = vec![
            Card::new(1, 7, "a".into(), "1".into()),
            Card::new(2, 7, "b".into(), "2".into()),
            Card::new(3, 7, "c".into(), "3".into()),
        ];
        cards[0].status = CardStatus::Easy;
        cards[1].status = CardStatus::Good;

        let stats = DeckWithStats::from_cards(Deck::new(7, "Deck".into()), &cards);
        assert_eq!(stats.card_count, 3);
        assert_eq!(stats.mastered_count, 1);
    }

    #[test]
    fn test_deck_with_stats_is_flat_camel_case() {
        let stats = DeckWithStats::from_cards(Deck::new(1, "Words".into()), &[]);
        let json = serde_json::to_value(&stats).unwrap();
        assert_eq!(json["name"], "Words");
        assert_eq!(json["cardCount"], 0);
        assert_eq!(json["masteredCount"], 0);
        assert!(json.get("deck").is_none());
    }

    #[test]
    fn test_session_state_reads_without_requeues() {
        let json = r#"{"queue":[{"id":1,"deckId":2,"front":"f","back":"b","status":"again"}],
                       "stats":{"easy":1,"good":0,"again":2}}"#;
        let state: SessionState = serde_json::from_str(json).unwrap();
        assert_eq!(state.queue.len(), 1);
        assert_eq!(state.queue[0].status, CardStatus::Again);
        assert_eq!(state.stats.total(), 3);
        assert!(state.requeues.is_empty());

        let out = serde_json::to_value(&state).unwrap();
        assert!(out.get("requeues").is_none());
    }
}
