//! Store seams used by the session engine

use async_trait::async_trait;

use super::errors::StoreError;
use crate::flashcards::{Card, CardStatus, FlashcardStorage, SessionState, StudySession};

/// Card persistence as seen by a study session
#[async_trait]
pub trait CardStore: Send + Sync {
    async fn update_card_status(
        &self,
        card_id: i64,
        deck_id: i64,
        status: CardStatus,
    ) -> Result<Card, StoreError>;
}

/// Session snapshot persistence, at most one snapshot per deck
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn get_session(&self, deck_id: i64) -> Result<Option<StudySession>, StoreError>;

    async fn save_session(&self, deck_id: i64, state: SessionState) -> Result<StudySession, StoreError>;

    async fn delete_session(&self, deck_id: i64) -> Result<(), StoreError>;
}

#[async_trait]
impl CardStore for FlashcardStorage {
    async fn update_card_status(
        &self,
        card_id: i64,
        deck_id: i64,
        status: CardStatus,
    ) -> Result<Card, StoreError> {
        Ok(FlashcardStorage::update_card_status(self, card_id, deck_id, status)?)
    }
}

#[async_trait]
impl SessionStore for FlashcardStorage {
    async fn get_session(&self, deck_id: i64) -> Result<Option<StudySession>, StoreError> {
        Ok(FlashcardStorage::get_session(self, deck_id)?)
    }

    async fn save_session(&self, deck_id: i64, state: SessionState) -> Result<StudySession, StoreError> {
        Ok(FlashcardStorage::save_session(self, deck_id, state)?)
    }

    async fn delete_session(&self, deck_id: i64) -> Result<(), StoreError> {
        Ok(FlashcardStorage::delete_session(self, deck_id)?)
    }
}

/// In-memory stores with failure injection for engine tests
#[cfg(test)]
pub(crate) mod memory {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use chrono::Utc;

    use super::*;

    #[derive(Default)]
    struct Inner {
        sessions: HashMap<i64, StudySession>,
        status_updates: Vec<(i64, CardStatus)>,
        saves: usize,
        deletes: usize,
        fail_writes: bool,
        fail_loads: bool,
    }

    #[derive(Default)]
    pub struct MemoryStore {
        inner: Mutex<Inner>,
    }

    impl MemoryStore {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn set_fail_writes(&self, fail: bool) {
            self.inner.lock().unwrap().fail_writes = fail;
        }

        pub fn set_fail_loads(&self, fail: bool) {
            self.inner.lock().unwrap().fail_loads = fail;
        }

        pub fn insert_session(&self, deck_id: i64, state: SessionState) {
            self.inner.lock().unwrap().sessions.insert(
                deck_id,
                StudySession {
                    deck_id,
                    state,
                    updated_at: Utc::now(),
                },
            );
        }

        pub fn session(&self, deck_id: i64) -> Option<SessionState> {
            self.inner
                .lock()
                .unwrap()
                .sessions
                .get(&deck_id)
                .map(|s| s.state.clone())
        }

        pub fn status_updates(&self) -> Vec<(i64, CardStatus)> {
            self.inner.lock().unwrap().status_updates.clone()
        }

        pub fn save_count(&self) -> usize {
            self.inner.lock().unwrap().saves
        }

        pub fn delete_count(&self) -> usize {
            self.inner.lock().unwrap().deletes
        }
    }

    #[async_trait]
    impl CardStore for MemoryStore {
        async fn update_card_status(
            &self,
            card_id: i64,
            deck_id: i64,
            status: CardStatus,
        ) -> Result<Card, StoreError> {
            let mut inner = self.inner.lock().unwrap();
            if inner.fail_writes {
                return Err("card store unavailable".into());
            }
            inner.status_updates.push((card_id, status));
            let mut card = Card::new(card_id, deck_id, String::new(), String::new());
            card.status = status;
            Ok(card)
        }
    }

    #[async_trait]
    impl SessionStore for MemoryStore {
        async fn get_session(&self, deck_id: i64) -> Result<Option<StudySession>, StoreError> {
            let inner = self.inner.lock().unwrap();
            if inner.fail_loads {
                return Err("session store unavailable".into());
            }
            Ok(inner.sessions.get(&deck_id).cloned())
        }

        async fn save_session(&self, deck_id: i64, state: SessionState) -> Result<StudySession, StoreError> {
            let mut inner = self.inner.lock().unwrap();
            if inner.fail_writes {
                return Err("session store unavailable".into());
            }
            inner.saves += 1;
            let session = StudySession {
                deck_id,
                state,
                updated_at: Utc::now(),
            };
            inner.sessions.insert(deck_id, session.clone());
            Ok(session)
        }

        async fn delete_session(&self, deck_id: i64) -> Result<(), StoreError> {
            let mut inner = self.inner.lock().unwrap();
            if inner.fail_writes {
                return Err("session store unavailable".into());
            }
            inner.deletes += 1;
            inner.sessions.remove(&deck_id);
            Ok(())
        }
    }
}
