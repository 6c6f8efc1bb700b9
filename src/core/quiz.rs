//! Multiple-choice vocabulary quiz over the flashcard deck.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::core::card::Flashcard;
use crate::core::sampling::{sample, shuffled};
use crate::error::{CoachError, Result};

/// One selectable answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizOption {
    pub card_id: String,
    pub text: String,
}

/// A card to translate plus its shuffled options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizItem {
    pub card_id: String,
    /// Front text shown to the learner.
    pub prompt: String,
    pub options: Vec<QuizOption>,
}

impl QuizItem {
    /// Index of the option belonging to the asked card.
    pub fn answer_index(&self) -> usize {
        self.options
            .iter()
            .position(|o| o.card_id == self.card_id)
            .unwrap_or(0)
    }
}

/// Final tally of a quiz.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizOutcome {
    pub correct: usize,
    pub total: usize,
}

impl QuizOutcome {
    pub fn percent(&self) -> u8 {
        if self.total == 0 {
            return 0;
        }
        (self.correct as f64 / self.total as f64 * 100.0).round() as u8
    }
}

/// A quiz in progress.
#[derive(Debug, Clone)]
pub struct VocabQuiz {
    items: Vec<QuizItem>,
    position: usize,
    correct: usize,
}

impl VocabQuiz {
    /// Sample `min(size, deck)` cards; each gets up to `distractors` wrong
    /// options taken from other cards.
    pub fn build<R: Rng + ?Sized>(
        deck: &[Flashcard],
        size: usize,
        distractors: usize,
        rng: &mut R,
    ) -> Result<Self> {
        if deck.is_empty() {
            return Err(CoachError::input("cannot build a quiz from an empty deck"));
        }

        let asked = sample(deck, size, rng);
        let items = asked
            .iter()
            .map(|card| {
                let others: Vec<&Flashcard> = deck.iter().filter(|c| c.id != card.id).collect();
                let mut options: Vec<QuizOption> = sample(&others, distractors, rng)
                    .into_iter()
                    .map(option_for)
                    .collect();
                options.push(option_for(card));
                QuizItem {
                    card_id: card.id.clone(),
                    prompt: card.front_text.clone(),
                    options: shuffled(&options, rng),
                }
            })
            .collect();

        Ok(Self {
            items,
            position: 0,
            correct: 0,
        })
    }

    pub fn items(&self) -> &[QuizItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Zero-based index of the current item.
    pub fn position(&self) -> usize {
        self.position
    }

    pub fn correct_so_far(&self) -> usize {
        self.correct
    }

    pub fn current(&self) -> Option<&QuizItem> {
        self.items.get(self.position)
    }

    pub fn is_finished(&self) -> bool {
        self.position >= self.items.len()
    }

    /// Answer the current item with option `choice` and move on.
    ///
    /// Returns whether the answer was right.
    pub fn answer(&mut self, choice: usize) -> Result<bool> {
        let item = self
            .items
            .get(self.position)
            .ok_or_else(|| CoachError::invalid_state("Cannot answer a finished quiz"))?;
        let option = item.options.get(choice).ok_or_else(|| {
            CoachError::input(format!(
                "option {} out of range (item has {})",
                choice,
                item.options.len()
            ))
        })?;

        let right = option.card_id == item.card_id;
        if right {
            self.correct += 1;
        }
        self.position += 1;
        Ok(right)
    }

    /// Move past the current item without answering; it counts as wrong.
    pub fn skip(&mut self) -> Result<()> {
        if self.is_finished() {
            return Err(CoachError::invalid_state("Cannot skip in a finished quiz"));
        }
        self.position += 1;
        Ok(())
    }

    /// Tally once every item is answered.
    pub fn finish(&self) -> Result<QuizOutcome> {
        if !self.is_finished() {
            return Err(CoachError::invalid_state(format!(
                "Cannot finish quiz with {} of {} items unanswered",
                self.items.len() - self.position,
                self.items.len()
            )));
        }
        Ok(QuizOutcome {
            correct: self.correct,
            total: self.items.len(),
        })
    }
}

fn option_for(card: &Flashcard) -> QuizOption {
    QuizOption {
        card_id: card.id.clone(),
        text: card.back_text.clone(),
    }
}
