//! Reading and listening comprehension blocks.
//!
//! A set is a passage (read, or played back as speech) followed by
//! multiple-choice questions. Grading is a plain correct-count.

use serde::{Deserialize, Serialize};

use crate::error::{CoachError, Result};

/// Which skill a set trains.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Skill {
    Reading,
    Listening,
}

impl Skill {
    /// Suggested section time limit.
    pub fn section_minutes(self) -> u32 {
        match self {
            Skill::Reading => 15,
            Skill::Listening => 10,
        }
    }

    /// Prefix used for attempt labels.
    pub fn label(self) -> &'static str {
        match self {
            Skill::Reading => "B1 Reading",
            Skill::Listening => "B1 Listening",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComprehensionQuestion {
    pub text: String,
    pub options: Vec<String>,
    /// Index of the right option.
    pub answer: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComprehensionSet {
    pub id: String,
    pub title: String,
    pub skill: Skill,
    /// Text to read, or the script to play.
    pub passage: String,
    pub questions: Vec<ComprehensionQuestion>,
}

/// Graded comprehension block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComprehensionScore {
    pub correct: usize,
    pub total: usize,
    /// `round(correct / total * 100)`.
    pub score: u8,
}

impl ComprehensionSet {
    /// Grade one pick per question; `None` counts as wrong.
    pub fn grade(&self, picks: &[Option<usize>]) -> Result<ComprehensionScore> {
        if picks.len() != self.questions.len() {
            return Err(CoachError::input(format!(
                "expected {} answers for '{}', got {}",
                self.questions.len(),
                self.title,
                picks.len()
            )));
        }
        if self.questions.is_empty() {
            return Err(CoachError::input(format!("set '{}' has no questions", self.title)));
        }

        let correct = self
            .questions
            .iter()
            .zip(picks)
            .filter(|(q, pick)| **pick == Some(q.answer))
            .count();
        let total = self.questions.len();

        Ok(ComprehensionScore {
            correct,
            total,
            score: (correct as f64 / total as f64 * 100.0).round() as u8,
        })
    }
}
