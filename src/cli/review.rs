//! Review command.
//!
//! Shows the next flashcard to study, or grades it when a rating is given
//! and saves the updated deck and daily progress.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::config::Config;
use crate::core::{CardScheduler, DailyProgress, Flashcard, Rating};
use crate::error::{FailOpen, Result};
use crate::storage::CoachStore;

/// Options for the review command.
#[derive(Debug, Clone, Default)]
pub struct ReviewOptions {
    /// Output as JSON.
    pub json: bool,
    /// Suppress output.
    pub quiet: bool,
    /// Grade the shown card with this rating.
    pub rating: Option<Rating>,
    /// Review this card instead of the scheduler's pick.
    pub card_id: Option<String>,
}

/// A card as presented to the learner.
#[derive(Debug, Clone, Serialize)]
pub struct CardView {
    pub id: String,
    pub front: String,
    pub back: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub phonetic: String,
    pub interval_days: u32,
    pub due_at: DateTime<Utc>,
}

impl From<&Flashcard> for CardView {
    fn from(card: &Flashcard) -> Self {
        Self {
            id: card.id.clone(),
            front: card.front_text.clone(),
            back: card.back_text.clone(),
            phonetic: card.phonetic_hint.clone(),
            interval_days: card.interval_days,
            due_at: card.due_at,
        }
    }
}

/// Output format for the review command.
#[derive(Debug, Clone, Serialize)]
pub struct ReviewOutput {
    /// Whether the command succeeded.
    pub success: bool,
    /// The card shown, after grading when a rating was given.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub card: Option<CardView>,
    /// Rating applied, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rated: Option<String>,
    /// Cards due now (after grading).
    pub due: usize,
    /// Reviews done today.
    pub done_today: u32,
    /// Daily review goal.
    pub goal: u32,
    /// Error message if the command failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ReviewOutput {
    /// Create a successful output.
    pub fn success(
        card: Option<CardView>,
        rated: Option<Rating>,
        due: usize,
        done_today: u32,
        goal: u32,
    ) -> Self {
        Self {
            success: true,
            card,
            rated: rated.map(|r| r.to_string()),
            due,
            done_today,
            goal,
            error: None,
        }
    }

    /// Create a failed output.
    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            card: None,
            rated: None,
            due: 0,
            done_today: 0,
            goal: 0,
            error: Some(error.into()),
        }
    }
}

/// The review command implementation.
pub struct ReviewCommand<S: CoachStore> {
    store: S,
    config: Config,
}

impl<S: CoachStore> ReviewCommand<S> {
    /// Create a new review command.
    pub fn new(store: S, config: Config) -> Self {
        Self { store, config }
    }

    /// Run the review command.
    pub fn run(&self, options: &ReviewOptions) -> ReviewOutput {
        self.run_at(options, Utc::now())
    }

    /// Run the review command at a fixed instant.
    pub fn run_at(&self, options: &ReviewOptions, now: DateTime<Utc>) -> ReviewOutput {
        match self.review(options, now) {
            Ok(output) => output,
            Err(e) => ReviewOutput::failure(e.to_string()),
        }
    }

    fn review(&self, options: &ReviewOptions, now: DateTime<Utc>) -> Result<ReviewOutput> {
        let scheduler = CardScheduler::new(&self.config.scheduler);
        let mut deck = self.store.load_deck()?;
        let today = now.date_naive();

        let mut progress = self
            .store
            .load_progress()
            .fail_open_default("loading daily progress")
            .unwrap_or_else(|| DailyProgress::new(today, self.config.scheduler.daily_goal));
        progress.goal = self.config.scheduler.daily_goal;

        if deck.is_empty() {
            return Ok(ReviewOutput::success(
                None,
                None,
                0,
                progress.done_on(today),
                progress.goal,
            ));
        }

        let card_id = match &options.card_id {
            Some(id) => {
                if !deck.iter().any(|c| &c.id == id) {
                    return Ok(ReviewOutput::failure(format!("Card not found: {}", id)));
                }
                id.clone()
            }
            None => match scheduler.pick_next(&deck, now) {
                Some(card) => card.id.clone(),
                None => return Ok(ReviewOutput::failure("Deck is empty")),
            },
        };

        let Some(rating) = options.rating else {
            let card = deck.iter().find(|c| c.id == card_id).map(CardView::from);
            return Ok(ReviewOutput::success(
                card,
                None,
                scheduler.due_count(&deck, now),
                progress.done_on(today),
                progress.goal,
            ));
        };

        let updated = scheduler
            .review_in_deck(&mut deck, &card_id, rating, now)
            .map(|c| CardView::from(&c));
        self.store.save_deck(&deck)?;

        progress.record(today);
        self.store
            .save_progress(&progress)
            .fail_open_default("saving daily progress");

        tracing::info!(card = %card_id, %rating, done = progress.done, "review recorded");

        Ok(ReviewOutput::success(
            updated,
            Some(rating),
            scheduler.due_count(&deck, now),
            progress.done_on(today),
            progress.goal,
        ))
    }

    /// Format the output for display.
    pub fn format_output(&self, output: &ReviewOutput, options: &ReviewOptions) -> String {
        if options.quiet {
            return String::new();
        }

        if options.json {
            serde_json::to_string_pretty(output).unwrap_or_else(|_| "{}".to_string())
        } else {
            self.format_human_readable(output)
        }
    }

    fn format_human_readable(&self, output: &ReviewOutput) -> String {
        if !output.success {
            return format!(
                "Review failed: {}\n",
                output.error.as_deref().unwrap_or("unknown error")
            );
        }

        let mut out = String::new();
        match (&output.card, &output.rated) {
            (None, _) => out.push_str("No cards in the deck. Import one with `coach deck import`.\n"),
            (Some(card), None) => {
                out.push_str(&format!("{}\n", card.front));
                if !card.phonetic.is_empty() {
                    out.push_str(&format!("  [{}]\n", card.phonetic));
                }
                out.push_str(&format!("  → {}\n", card.back));
                out.push_str("Rate with --rating again|hard|easy\n");
            }
            (Some(card), Some(rating)) => {
                out.push_str(&format!(
                    "{} rated {}; next review in {} day(s).\n",
                    card.front, rating, card.interval_days
                ));
            }
        }
        out.push_str(&format!(
            "Due now: {} | Today: {}/{}\n",
            output.due, output.done_today, output.goal
        ));
        out
    }
}
