//! In-memory storage for testing.
//!
//! Thread-safe via `RwLock`; contents are lost when the store is dropped.

use std::sync::RwLock;

use crate::core::{AttemptRecord, DailyProgress, Flashcard, QuestionBank};
use crate::error::Result;
use crate::storage::CoachStore;

#[derive(Debug, Default)]
struct State {
    deck: Vec<Flashcard>,
    bank: QuestionBank,
    history: Vec<AttemptRecord>,
    progress: Option<DailyProgress>,
}

/// In-memory coach store.
#[derive(Debug, Default)]
pub struct MemoryCoachStore {
    state: RwLock<State>,
}

impl MemoryCoachStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-loaded with a deck and bank.
    pub fn with_data(deck: Vec<Flashcard>, bank: QuestionBank) -> Self {
        Self {
            state: RwLock::new(State {
                deck,
                bank,
                ..State::default()
            }),
        }
    }

    /// Number of recorded attempts.
    pub fn history_len(&self) -> usize {
        self.state.read().unwrap().history.len()
    }

    /// Drop everything.
    pub fn clear(&self) {
        *self.state.write().unwrap() = State::default();
    }
}

impl CoachStore for MemoryCoachStore {
    fn load_deck(&self) -> Result<Vec<Flashcard>> {
        Ok(self.state.read().unwrap().deck.clone())
    }

    fn save_deck(&self, deck: &[Flashcard]) -> Result<()> {
        self.state.write().unwrap().deck = deck.to_vec();
        Ok(())
    }

    fn load_bank(&self) -> Result<QuestionBank> {
        Ok(self.state.read().unwrap().bank.clone())
    }

    fn save_bank(&self, bank: &QuestionBank) -> Result<()> {
        self.state.write().unwrap().bank = bank.clone();
        Ok(())
    }

    fn load_history(&self) -> Result<Vec<AttemptRecord>> {
        Ok(self.state.read().unwrap().history.clone())
    }

    fn append_attempt(&self, record: &AttemptRecord) -> Result<()> {
        self.state.write().unwrap().history.push(record.clone());
        Ok(())
    }

    fn load_progress(&self) -> Result<Option<DailyProgress>> {
        Ok(self.state.read().unwrap().progress.clone())
    }

    fn save_progress(&self, progress: &DailyProgress) -> Result<()> {
        self.state.write().unwrap().progress = Some(progress.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::traits::tests::test_coach_store_roundtrip;
    use chrono::Utc;
    use serde_json::Map;
    use std::sync::Arc;

    #[test]
    fn test_memory_store_roundtrip() {
        let store = MemoryCoachStore::new();
        test_coach_store_roundtrip(&store);
    }

    #[test]
    fn test_arc_store_roundtrip() {
        let store = Arc::new(MemoryCoachStore::new());
        test_coach_store_roundtrip(&store);
    }

    #[test]
    fn test_clear() {
        let store = MemoryCoachStore::new();
        store
            .append_attempt(&AttemptRecord::new("x", 1, Map::new(), Utc::now()))
            .unwrap();
        assert_eq!(store.history_len(), 1);

        store.clear();
        assert_eq!(store.history_len(), 0);
    }

    #[test]
    fn test_concurrent_appends() {
        let store = Arc::new(MemoryCoachStore::new());
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || {
                    store
                        .append_attempt(&AttemptRecord::new(
                            format!("t{}", i),
                            50,
                            Map::new(),
                            Utc::now(),
                        ))
                        .unwrap();
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(store.history_len(), 8);
    }
}
