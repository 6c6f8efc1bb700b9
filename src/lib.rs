//! Study coach - spaced repetition, civics mock exams and B1 skill scoring
//!
//! The coach keeps a Polish flashcard deck on a spaced repetition schedule,
//! runs timed multiple-choice civics exams from an importable question bank,
//! and scores written and spoken B1 answers with transparent heuristics.
//! Every graded activity lands in an attempt history that can be exported.

pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod storage;
pub mod util;

pub use config::Config;
pub use core::{
    AssessmentScorer, AttemptRecord, CardScheduler, Category, ComprehensionSet, DailyProgress,
    ExamSession, ExamSettings, Flashcard, QuestionBank, Rating, ScoreBreakdown, VocabQuiz,
};
pub use error::{CoachError, Result};
pub use storage::{CoachStore, FileCoachStore, MemoryCoachStore};

// CLI commands
pub use cli::{
    BankCommand, ComprehensionCommand, DeckCommand, DrillCommand, ExamCommand, HistoryCommand,
    InitCommand, QuizCommand, ReviewCommand, SpeakCommand, WriteCommand,
};
