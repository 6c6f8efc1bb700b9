//! The learning and assessment engine.
//!
//! Everything in here is synchronous and does no I/O: callers pass in the
//! deck, bank, clock and random source, and get plain result records back.

pub mod assessment;
pub mod attempt;
pub mod bank;
pub mod card;
pub mod comprehension;
pub mod exam;
pub mod progress;
pub mod quiz;
pub mod sampling;
pub mod scheduler;
pub mod starter;
pub mod text;
pub mod timer;

pub use assessment::{AssessmentScorer, DerivedStats, Metric, ScoreBreakdown, SpeechSample};
pub use attempt::{to_csv, AttemptRecord};
pub use bank::{
    validate, BankValidationError, Category, Drill, ExamQuestion, QuestionBank, QuestionReview,
    ValidationProblem,
};
pub use card::{reset_deck, seed_deck, DeckEntry, Flashcard, Rating, MIN_EASE, SEED_EASE};
pub use comprehension::{ComprehensionQuestion, ComprehensionScore, ComprehensionSet, Skill};
pub use exam::{CategoryScore, ExamPhase, ExamResult, ExamSession, ExamSettings, SubmitReason};
pub use progress::DailyProgress;
pub use quiz::{QuizItem, QuizOption, QuizOutcome, VocabQuiz};
pub use scheduler::CardScheduler;
pub use starter::{comprehension_sets, starter_deck};
pub use text::TextStats;
pub use timer::{Countdown, Tick, TimerState};
