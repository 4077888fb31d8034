//! Session engine: owns the review queue of one study session.
//!
//! States: `Uninitialized → Active → Finished`. An empty deck goes straight
//! to `Finished`. Every mutation spawns a fire-and-forget card status update
//! and reschedules a debounced snapshot save; store failures are reported as
//! [`SessionWarning`]s and never undo in-memory progress.
//!
//! The engine spawns Tokio tasks, so it must be driven inside a runtime.

use std::sync::Arc;

use rand::rngs::StdRng;
use rand::SeedableRng;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::debounce::PendingSave;
use super::errors::{SessionError, SessionWarning, StoreError};
use super::queue::{Outcome, ReviewQueue, ReviewStep};
use super::stores::{CardStore, SessionStore};
use super::StudyConfig;
use crate::flashcards::{Card, CardStatus, SessionState, SessionStats};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Uninitialized,
    Active,
    Finished,
}

/// Answer to "resume the previous session?"
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResumeDecision {
    Resume,
    Discard,
}

/// How initialization went
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitOutcome {
    /// Built a new queue from the deck's cards
    Fresh,
    /// Adopted the persisted snapshot
    Resumed,
    /// The engine was already initialized; nothing changed
    AlreadyInitialized,
}

/// Logs store failures and forwards them to an optional listener
#[derive(Clone, Default)]
struct Reporter {
    tx: Option<mpsc::UnboundedSender<SessionWarning>>,
}

impl Reporter {
    fn report(&self, warning: SessionWarning) {
        log::warn!("Study session: {}", warning);
        if let Some(tx) = &self.tx {
            let _ = tx.send(warning);
        }
    }
}

pub struct SessionEngine {
    deck_id: i64,
    phase: SessionPhase,
    queue: ReviewQueue,
    config: StudyConfig,
    rng: StdRng,
    card_store: Arc<dyn CardStore>,
    session_store: Arc<dyn SessionStore>,
    pending_save: PendingSave,
    /// Status updates and deletes that may still be running
    in_flight: Vec<JoinHandle<()>>,
    reporter: Reporter,
}

impl SessionEngine {
    pub fn new(
        deck_id: i64,
        card_store: Arc<dyn CardStore>,
        session_store: Arc<dyn SessionStore>,
        config: StudyConfig,
    ) -> Self {
        Self {
            deck_id,
            phase: SessionPhase::Uninitialized,
            queue: ReviewQueue::default(),
            config,
            rng: StdRng::from_entropy(),
            card_store,
            session_store,
            pending_save: PendingSave::new(),
            in_flight: Vec::new(),
            reporter: Reporter::default(),
        }
    }

    /// Use a specific random source for shuffling
    pub fn with_rng(mut self, rng: StdRng) -> Self {
        self.rng = rng;
        self
    }

    /// Receive store failures on a channel in addition to the log
    pub fn with_warnings(mut self, tx: mpsc::UnboundedSender<SessionWarning>) -> Self {
        self.reporter = Reporter { tx: Some(tx) };
        self
    }

    pub fn deck_id(&self) -> i64 {
        self.deck_id
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn is_finished(&self) -> bool {
        self.phase == SessionPhase::Finished
    }

    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    pub fn head(&self) -> Option<&Card> {
        self.queue.head()
    }

    pub fn queue(&self) -> &[Card] {
        self.queue.cards()
    }

    pub fn stats(&self) -> SessionStats {
        self.queue.stats()
    }

    /// Serializable form of the current queue and stats
    pub fn snapshot(&self) -> SessionState {
        self.queue.to_state()
    }

    pub fn has_pending_save(&self) -> bool {
        self.pending_save.is_pending()
    }

    /// Fetch any persisted snapshot from the session store, then initialize.
    ///
    /// A failed load counts as "no prior session".
    pub async fn load_and_initialize<F>(&mut self, cards: Vec<Card>, decide: F) -> InitOutcome
    where
        F: FnOnce(&SessionState) -> ResumeDecision,
    {
        if self.phase != SessionPhase::Uninitialized {
            return InitOutcome::AlreadyInitialized;
        }

        let existing = match self.session_store.get_session(self.deck_id).await {
            Ok(session) => session.map(|s| s.state),
            Err(e) => {
                self.reporter.report(SessionWarning::LoadFailed {
                    deck_id: self.deck_id,
                    message: e.to_string(),
                });
                None
            }
        };

        self.initialize(cards, existing, decide)
    }

    /// Build a fresh queue or resume `existing`, exactly once per engine.
    ///
    /// `decide` is only consulted when a non-empty snapshot exists. A
    /// declined (or empty) snapshot is deleted from the session store.
    pub fn initialize<F>(
        &mut self,
        cards: Vec<Card>,
        existing: Option<SessionState>,
        decide: F,
    ) -> InitOutcome
    where
        F: FnOnce(&SessionState) -> ResumeDecision,
    {
        if self.phase != SessionPhase::Uninitialized {
            log::debug!("Study session for deck {} already initialized", self.deck_id);
            return InitOutcome::AlreadyInitialized;
        }

        let resumed = match existing {
            Some(state) if !state.queue.is_empty() => match decide(&state) {
                ResumeDecision::Resume => Some(state),
                ResumeDecision::Discard => {
                    self.spawn_delete(None);
                    None
                }
            },
            Some(_) => {
                self.spawn_delete(None);
                None
            }
            None => None,
        };

        let (queue, outcome) = match resumed {
            Some(state) => (ReviewQueue::from_state(state), InitOutcome::Resumed),
            None => (
                ReviewQueue::fresh(cards, self.config.shuffle, &mut self.rng),
                InitOutcome::Fresh,
            ),
        };
        self.queue = queue.with_max_requeues(self.config.max_requeues);

        log::info!(
            "Study session for deck {} started ({:?}, {} cards)",
            self.deck_id,
            outcome,
            self.queue.len()
        );

        if self.queue.is_empty() {
            self.finish();
        } else {
            self.phase = SessionPhase::Active;
            self.schedule_save();
        }

        outcome
    }

    /// Apply the user's outcome to `card`, which must be the head card.
    ///
    /// The in-memory transition completes before this returns; store writes
    /// it triggers run in the background.
    pub fn apply_outcome(&mut self, outcome: Outcome, card: &Card) -> Result<ReviewStep, SessionError> {
        match self.phase {
            SessionPhase::Uninitialized => return Err(SessionError::NotInitialized),
            SessionPhase::Finished => return Err(SessionError::Finished),
            SessionPhase::Active => {}
        }

        let step = self.queue.apply(outcome, card)?;
        self.spawn_status_update(step.card.id, step.card.status);

        if self.queue.is_empty() {
            self.finish();
        } else {
            self.schedule_save();
        }

        Ok(step)
    }

    /// Write the current snapshot now instead of waiting for the quiet period
    pub async fn flush(&mut self) -> Result<(), StoreError> {
        if self.phase != SessionPhase::Active || self.queue.is_empty() {
            return Ok(());
        }
        if let Some(pending) = self.pending_save.cancel() {
            let _ = pending.await;
        }
        self.session_store
            .save_session(self.deck_id, self.queue.to_state())
            .await?;
        Ok(())
    }

    /// Wait for spawned status updates and deletes to complete.
    ///
    /// A pending debounced save is not waited for; call [`flush`](Self::flush)
    /// first to persist it.
    pub async fn wait_for_writes(&mut self) {
        for handle in self.in_flight.drain(..) {
            let _ = handle.await;
        }
    }

    fn track(&mut self, handle: JoinHandle<()>) {
        self.in_flight.retain(|h| !h.is_finished());
        self.in_flight.push(handle);
    }

    fn finish(&mut self) {
        self.phase = SessionPhase::Finished;
        let in_flight = self.pending_save.cancel();
        self.spawn_delete(in_flight);

        let stats = self.queue.stats();
        log::info!(
            "Study session for deck {} finished: {} easy, {} good, {} again",
            self.deck_id,
            stats.easy,
            stats.good,
            stats.again
        );
    }

    fn schedule_save(&mut self) {
        let store = Arc::clone(&self.session_store);
        let reporter = self.reporter.clone();
        let deck_id = self.deck_id;
        let state = self.queue.to_state();

        self.pending_save.schedule(self.config.save_debounce(), async move {
            match store.save_session(deck_id, state).await {
                Ok(_) => log::debug!("Saved study session for deck {}", deck_id),
                Err(e) => reporter.report(SessionWarning::SaveFailed {
                    deck_id,
                    message: e.to_string(),
                }),
            }
        });
    }

    /// Delete the persisted snapshot, after `after` has settled if given
    fn spawn_delete(&mut self, after: Option<JoinHandle<()>>) {
        let store = Arc::clone(&self.session_store);
        let reporter = self.reporter.clone();
        let deck_id = self.deck_id;

        let handle = tokio::spawn(async move {
            if let Some(handle) = after {
                let _ = handle.await;
            }
            if let Err(e) = store.delete_session(deck_id).await {
                reporter.report(SessionWarning::DeleteFailed {
                    deck_id,
                    message: e.to_string(),
                });
            }
        });
        self.track(handle);
    }

    fn spawn_status_update(&mut self, card_id: i64, status: CardStatus) {
        let store = Arc::clone(&self.card_store);
        let reporter = self.reporter.clone();
        let deck_id = self.deck_id;

        let handle = tokio::spawn(async move {
            if let Err(e) = store.update_card_status(card_id, deck_id, status).await {
                reporter.report(SessionWarning::StatusUpdateFailed {
                    card_id,
                    message: e.to_string(),
                });
            }
        });
        self.track(handle);
    }
}
