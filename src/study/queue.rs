//! Review queue and requeue policy
//!
//! The queue is plain data: it knows nothing about stores or timers. The
//! session engine wraps it with persistence side effects.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::errors::SessionError;
use crate::flashcards::{Card, CardStatus, SessionState, SessionStats};

/// User judgment on the card at the head of the queue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    /// Mastered, remove
    Easy,
    /// Acceptable, remove
    Good,
    /// Failed, requeue
    Again,
}

impl Outcome {
    /// Card status written for this outcome
    pub fn status(&self) -> CardStatus {
        match self {
            Self::Easy => CardStatus::Easy,
            Self::Good => CardStatus::Good,
            Self::Again => CardStatus::Again,
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.status().as_str())
    }
}

impl FromStr for Outcome {
    type Err = SessionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "easy" | "e" => Ok(Self::Easy),
            "good" | "g" => Ok(Self::Good),
            "again" | "a" => Ok(Self::Again),
            _ => Err(SessionError::InvalidOutcome(s.to_string())),
        }
    }
}

/// Index at which a missed card is reinserted, given the queue length
/// after it was removed from the head.
pub fn requeue_index(remaining: usize) -> usize {
    (remaining / 2 + 1).min(remaining)
}

/// What a single outcome did to the queue
#[derive(Debug, Clone, PartialEq)]
pub struct ReviewStep {
    /// The reviewed card, carrying its new status
    pub card: Card,
    /// Outcome that was recorded in the stats. Differs from the requested
    /// outcome only when the requeue cap retired the card.
    pub recorded: Outcome,
    /// Position the card was reinserted at, if it was requeued
    pub requeued_at: Option<usize>,
}

/// Ordered remaining cards plus outcome counters
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReviewQueue {
    cards: Vec<Card>,
    stats: SessionStats,
    requeues: HashMap<i64, u32>,
    max_requeues: Option<u32>,
}

impl ReviewQueue {
    /// Build a fresh queue from a deck's cards with zeroed stats
    pub fn fresh<R: Rng + ?Sized>(mut cards: Vec<Card>, shuffle: bool, rng: &mut R) -> Self {
        if shuffle {
            cards.shuffle(rng);
        }
        Self {
            cards,
            ..Default::default()
        }
    }

    /// Adopt a persisted snapshot verbatim
    pub fn from_state(state: SessionState) -> Self {
        Self {
            cards: state.queue,
            stats: state.stats,
            requeues: state.requeues,
            max_requeues: None,
        }
    }

    /// Retire a card as `good` once it has been requeued this many times
    pub fn with_max_requeues(mut self, max_requeues: Option<u32>) -> Self {
        self.max_requeues = max_requeues;
        self
    }

    pub fn to_state(&self) -> SessionState {
        SessionState {
            queue: self.cards.clone(),
            stats: self.stats,
            requeues: self.requeues.clone(),
        }
    }

    pub fn head(&self) -> Option<&Card> {
        self.cards.first()
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn stats(&self) -> SessionStats {
        self.stats
    }

    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    /// Apply an outcome to the head card, which must be `card`
    pub fn apply(&mut self, outcome: Outcome, card: &Card) -> Result<ReviewStep, SessionError> {
        let head = self.cards.first().ok_or(SessionError::EmptyQueue)?;
        if head.id != card.id {
            return Err(SessionError::HeadMismatch {
                expected: head.id,
                actual: card.id,
            });
        }

        let mut reviewed = self.cards.remove(0);
        let recorded = match outcome {
            Outcome::Again if self.requeue_cap_reached(reviewed.id) => Outcome::Good,
            other => other,
        };

        match recorded {
            Outcome::Easy => self.stats.easy += 1,
            Outcome::Good => self.stats.good += 1,
            Outcome::Again => self.stats.again += 1,
        }
        reviewed.status = recorded.status();

        let requeued_at = if recorded == Outcome::Again {
            if self.max_requeues.is_some() {
                *self.requeues.entry(reviewed.id).or_insert(0) += 1;
            }
            let index = requeue_index(self.cards.len());
            self.cards.insert(index, reviewed.clone());
            Some(index)
        } else {
            self.requeues.remove(&reviewed.id);
            None
        };

        Ok(ReviewStep {
            card: reviewed,
            recorded,
            requeued_at,
        })
    }

    fn requeue_cap_reached(&self, card_id: i64) -> bool {
        match self.max_requeues {
            Some(max) => self.requeues.get(&card_id).copied().unwrap_or(0) >= max,
            None => false,
        }
    }
}
