//! Deck command.
//!
//! Imports, resets and lists the flashcard deck.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::cli::review::CardView;
use crate::config::Config;
use crate::core::{reset_deck, seed_deck, starter_deck, CardScheduler, DeckEntry};
use crate::error::{CoachError, Result};
use crate::storage::CoachStore;
use crate::util::read_to_string_limited;

/// What to do with the deck.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeckAction {
    /// Replace the deck with seed entries from a JSON file.
    Import(PathBuf),
    /// Replace the deck with the built-in starter phrases.
    Starter,
    /// Put every card back into seed scheduling state.
    Reset,
    /// Show every card with its schedule.
    List,
}

impl DeckAction {
    fn name(&self) -> &'static str {
        match self {
            DeckAction::Import(_) => "import",
            DeckAction::Starter => "starter",
            DeckAction::Reset => "reset",
            DeckAction::List => "list",
        }
    }
}

/// Options for the deck command.
#[derive(Debug, Clone, Default)]
pub struct DeckOptions {
    /// Output as JSON.
    pub json: bool,
    /// Suppress output.
    pub quiet: bool,
}

/// Output format for the deck command.
#[derive(Debug, Clone, Serialize)]
pub struct DeckOutput {
    /// Whether the action succeeded.
    pub success: bool,
    pub action: String,
    /// Cards in the deck afterwards.
    pub count: usize,
    /// Cards due now.
    pub due: usize,
    /// Card listing, for `list`.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub cards: Vec<CardView>,
    /// Error message if the action failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl DeckOutput {
    /// Create a successful output.
    pub fn success(action: &DeckAction, count: usize, due: usize, cards: Vec<CardView>) -> Self {
        Self {
            success: true,
            action: action.name().to_string(),
            count,
            due,
            cards,
            error: None,
        }
    }

    /// Create a failed output.
    pub fn failure(action: &DeckAction, error: impl Into<String>) -> Self {
        Self {
            success: false,
            action: action.name().to_string(),
            count: 0,
            due: 0,
            cards: Vec::new(),
            error: Some(error.into()),
        }
    }
}

/// The deck command implementation.
pub struct DeckCommand<S: CoachStore> {
    store: S,
    config: Config,
}

impl<S: CoachStore> DeckCommand<S> {
    /// Create a new deck command.
    pub fn new(store: S, config: Config) -> Self {
        Self { store, config }
    }

    /// Run the deck command.
    pub fn run(&self, action: &DeckAction, _options: &DeckOptions) -> DeckOutput {
        self.run_at(action, Utc::now())
    }

    /// Run the deck command at a fixed instant.
    pub fn run_at(&self, action: &DeckAction, now: DateTime<Utc>) -> DeckOutput {
        match self.apply(action, now) {
            Ok(output) => output,
            Err(e) => DeckOutput::failure(action, e.to_string()),
        }
    }

    fn apply(&self, action: &DeckAction, now: DateTime<Utc>) -> Result<DeckOutput> {
        let scheduler = CardScheduler::new(&self.config.scheduler);
        let ease = scheduler.initial_ease();

        let deck = match action {
            DeckAction::Import(path) => {
                let deck = seed_deck(read_entries(path)?, ease, now);
                self.store.save_deck(&deck)?;
                deck
            }
            DeckAction::Starter => {
                let deck = seed_deck(starter_deck()?, ease, now);
                self.store.save_deck(&deck)?;
                deck
            }
            DeckAction::Reset => {
                let mut deck = self.store.load_deck()?;
                reset_deck(&mut deck, ease, now);
                self.store.save_deck(&deck)?;
                deck
            }
            DeckAction::List => self.store.load_deck()?,
        };

        tracing::debug!(action = action.name(), cards = deck.len(), "deck updated");

        let cards = match action {
            DeckAction::List => deck.iter().map(CardView::from).collect(),
            _ => Vec::new(),
        };
        Ok(DeckOutput::success(
            action,
            deck.len(),
            scheduler.due_count(&deck, now),
            cards,
        ))
    }

    /// Format the output for display.
    pub fn format_output(&self, output: &DeckOutput, options: &DeckOptions) -> String {
        if options.quiet {
            return String::new();
        }

        if options.json {
            serde_json::to_string_pretty(output).unwrap_or_else(|_| "{}".to_string())
        } else {
            self.format_human_readable(output)
        }
    }

    fn format_human_readable(&self, output: &DeckOutput) -> String {
        if !output.success {
            return format!(
                "Deck {} failed: {}\n",
                output.action,
                output.error.as_deref().unwrap_or("unknown error")
            );
        }

        let mut out = String::new();
        for card in &output.cards {
            out.push_str(&format!(
                "{:<4} {:<28} {:<30} {}\n",
                card.id,
                card.front,
                card.back,
                card.due_at.format("%Y-%m-%d")
            ));
        }
        out.push_str(&format!("{} card(s), {} due now.\n", output.count, output.due));
        out
    }
}

/// Read seed entries, rejecting duplicate ids.
fn read_entries(path: &Path) -> Result<Vec<DeckEntry>> {
    let text = read_to_string_limited(path)?;
    let entries: Vec<DeckEntry> = serde_json::from_str(&text)
        .map_err(|e| CoachError::input(format!("{}: {}", path.display(), e)))?;

    let mut seen = std::collections::HashSet::new();
    for entry in &entries {
        if !seen.insert(entry.id.as_str()) {
            return Err(CoachError::input(format!("duplicate card id '{}'", entry.id)));
        }
    }
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Rating;
    use crate::storage::MemoryCoachStore;
    use chrono::Duration;
    use std::sync::Arc;
    use tempfile::TempDir;

    #[test]
    fn test_starter_deck() {
        let store = Arc::new(MemoryCoachStore::new());
        let cmd = DeckCommand::new(Arc::clone(&store), Config::default());

        let output = cmd.run(&DeckAction::Starter, &DeckOptions::default());

        assert!(output.success);
        assert_eq!(output.count, 15);
        assert_eq!(output.due, 15);
        let deck = store.load_deck().unwrap();
        assert_eq!(deck[1].front_text, "Dzień dobry");
        assert_eq!(deck[1].category, "greeting");
    }

    #[test]
    fn test_import_uses_configured_ease() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("deck.json");
        std::fs::write(
            &path,
            r#"[{"id":"a","front":"kot","back":"cat"},{"id":"b","front":"pies","back":"dog","category":"animals"}]"#,
        )
        .unwrap();
        let store = Arc::new(MemoryCoachStore::new());
        let mut config = Config::default();
        config.scheduler.initial_ease = 2.0;
        let cmd = DeckCommand::new(Arc::clone(&store), config);

        let output = cmd.run(&DeckAction::Import(path), &DeckOptions::default());

        assert!(output.success, "{:?}", output.error);
        let deck = store.load_deck().unwrap();
        assert_eq!(deck.len(), 2);
        assert!(deck.iter().all(|c| c.ease == 2.0 && c.interval_days == 0));
    }

    #[test]
    fn test_import_rejects_duplicates() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("deck.json");
        std::fs::write(
            &path,
            r#"[{"id":"a","front":"kot","back":"cat"},{"id":"a","front":"pies","back":"dog"}]"#,
        )
        .unwrap();
        let store = Arc::new(MemoryCoachStore::new());
        let cmd = DeckCommand::new(Arc::clone(&store), Config::default());

        let output = cmd.run(&DeckAction::Import(path), &DeckOptions::default());

        assert!(!output.success);
        assert!(output.error.unwrap().contains("duplicate"));
        assert!(store.load_deck().unwrap().is_empty());
    }

    #[test]
    fn test_reset_restores_seed_state() {
        let now = Utc::now();
        let store = Arc::new(MemoryCoachStore::new());
        let cmd = DeckCommand::new(Arc::clone(&store), Config::default());
        cmd.run_at(&DeckAction::Starter, now);

        let scheduler = CardScheduler::default();
        let mut deck = store.load_deck().unwrap();
        for card in deck.iter_mut() {
            *card = scheduler.review(card, Rating::Easy, now);
        }
        store.save_deck(&deck).unwrap();

        let later = now + Duration::minutes(5);
        let output = cmd.run_at(&DeckAction::Reset, later);

        assert_eq!(output.due, 15);
        let deck = store.load_deck().unwrap();
        assert!(deck
            .iter()
            .all(|c| c.interval_days == 0 && c.due_at == later && c.ease == 2.5));
    }

    #[test]
    fn test_list_shows_cards() {
        let store = Arc::new(MemoryCoachStore::new());
        let cmd = DeckCommand::new(Arc::clone(&store), Config::default());
        cmd.run(&DeckAction::Starter, &DeckOptions::default());

        let output = cmd.run(&DeckAction::List, &DeckOptions::default());
        assert_eq!(output.cards.len(), 15);

        let text = cmd.format_output(&output, &DeckOptions::default());
        assert!(text.contains("Dziękuję"));
        assert!(text.ends_with("15 card(s), 15 due now.\n"));
    }
}
