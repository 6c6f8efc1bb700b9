//! Persistence trait for the coach.
//!
//! The engine never touches storage; the CLI loads state through a
//! `CoachStore`, hands it to the engine, and saves what comes back.

use std::sync::Arc;

use crate::core::{AttemptRecord, DailyProgress, Flashcard, QuestionBank};
use crate::error::Result;

/// Trait for coach storage backends.
///
/// Missing data loads as empty (an empty deck, an empty bank, no history).
pub trait CoachStore: Send + Sync {
    /// Load the flashcard deck.
    fn load_deck(&self) -> Result<Vec<Flashcard>>;

    /// Replace the stored deck.
    fn save_deck(&self, deck: &[Flashcard]) -> Result<()>;

    /// Load the question bank. Stored banks are re-validated on load.
    fn load_bank(&self) -> Result<QuestionBank>;

    /// Replace the stored bank.
    fn save_bank(&self, bank: &QuestionBank) -> Result<()>;

    /// Load every attempt, oldest first.
    fn load_history(&self) -> Result<Vec<AttemptRecord>>;

    /// Append one attempt to the history.
    fn append_attempt(&self, record: &AttemptRecord) -> Result<()>;

    /// Load today's review counter, if any was saved.
    fn load_progress(&self) -> Result<Option<DailyProgress>>;

    /// Save the review counter.
    fn save_progress(&self, progress: &DailyProgress) -> Result<()>;
}

/// Blanket implementation of CoachStore for Arc-wrapped stores.
///
/// This allows sharing one store between tests and commands.
impl<T: CoachStore + ?Sized> CoachStore for Arc<T> {
    fn load_deck(&self) -> Result<Vec<Flashcard>> {
        (**self).load_deck()
    }

    fn save_deck(&self, deck: &[Flashcard]) -> Result<()> {
        (**self).save_deck(deck)
    }

    fn load_bank(&self) -> Result<QuestionBank> {
        (**self).load_bank()
    }

    fn save_bank(&self, bank: &QuestionBank) -> Result<()> {
        (**self).save_bank(bank)
    }

    fn load_history(&self) -> Result<Vec<AttemptRecord>> {
        (**self).load_history()
    }

    fn append_attempt(&self, record: &AttemptRecord) -> Result<()> {
        (**self).append_attempt(record)
    }

    fn load_progress(&self) -> Result<Option<DailyProgress>> {
        (**self).load_progress()
    }

    fn save_progress(&self, progress: &DailyProgress) -> Result<()> {
        (**self).save_progress(progress)
    }
}
