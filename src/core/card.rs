//! Flashcard types.
//!
//! A card's scheduling fields (`ease`, `interval_days`, `due_at`) are only
//! ever changed by [`CardScheduler::review`](super::scheduler::CardScheduler::review);
//! everything else is seed content.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lowest ease a card can reach.
pub const MIN_EASE: f64 = 1.3;

/// Ease given to freshly seeded cards.
pub const SEED_EASE: f64 = 2.5;

/// A vocabulary flashcard with its scheduling state.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Flashcard {
    /// Stable card identifier.
    pub id: String,
    /// Prompt side (the target-language word or phrase).
    pub front_text: String,
    /// Answer side (translation).
    pub back_text: String,
    /// Pronunciation hint, usually IPA.
    #[serde(default)]
    pub phonetic_hint: String,
    /// Topic used for filtering (e.g. "greetings").
    #[serde(default)]
    pub category: String,
    /// Retention multiplier, never below [`MIN_EASE`].
    pub ease: f64,
    /// Days until the next review.
    pub interval_days: u32,
    /// When the card is next due.
    pub due_at: DateTime<Utc>,
}

impl Flashcard {
    /// Create a card in seed state: due now, zero interval, seed ease.
    pub fn new(
        id: impl Into<String>,
        front_text: impl Into<String>,
        back_text: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            front_text: front_text.into(),
            back_text: back_text.into(),
            phonetic_hint: String::new(),
            category: String::new(),
            ease: SEED_EASE,
            interval_days: 0,
            due_at: now,
        }
    }

    /// Set the pronunciation hint.
    pub fn with_phonetic(mut self, hint: impl Into<String>) -> Self {
        self.phonetic_hint = hint.into();
        self
    }

    /// Set the category.
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    /// Override the starting ease (clamped to the floor).
    pub fn with_ease(mut self, ease: f64) -> Self {
        self.ease = ease.max(MIN_EASE);
        self
    }

    /// Raise an ease below the floor back to [`MIN_EASE`].
    ///
    /// Returns whether the card changed.
    pub fn restore_ease_floor(&mut self) -> bool {
        if self.ease >= MIN_EASE {
            return false;
        }
        self.ease = MIN_EASE;
        true
    }

    /// Whether the card is due at `now`.
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.due_at <= now
    }

    /// Put the card back into seed state.
    pub fn reset(&mut self, ease: f64, now: DateTime<Utc>) {
        self.ease = ease.max(MIN_EASE);
        self.interval_days = 0;
        self.due_at = now;
    }
}

/// Seed content for one card, as shipped in a starter deck file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DeckEntry {
    pub id: String,
    pub front: String,
    pub back: String,
    #[serde(default)]
    pub phonetic: String,
    #[serde(default)]
    pub category: String,
}

impl DeckEntry {
    /// Turn seed content into a schedulable card.
    pub fn into_card(self, ease: f64, now: DateTime<Utc>) -> Flashcard {
        Flashcard::new(self.id, self.front, self.back, now)
            .with_phonetic(self.phonetic)
            .with_category(self.category)
            .with_ease(ease)
    }
}

/// Build a deck from seed entries.
pub fn seed_deck(
    entries: impl IntoIterator<Item = DeckEntry>,
    ease: f64,
    now: DateTime<Utc>,
) -> Vec<Flashcard> {
    entries
        .into_iter()
        .map(|e| e.into_card(ease, now))
        .collect()
}

/// Reset every card in a deck to seed scheduling state.
pub fn reset_deck(deck: &mut [Flashcard], ease: f64, now: DateTime<Utc>) {
    for card in deck.iter_mut() {
        card.reset(ease, now);
    }
}

/// Review outcome on the fixed three-point scale.
///
/// Ordinals are 0, 1 and 3. There is no tier between Hard and Easy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Rating {
    Again,
    Hard,
    Easy,
}

impl Rating {
    /// All ratings in ascending order.
    pub const ALL: [Rating; 3] = [Rating::Again, Rating::Hard, Rating::Easy];

    /// Numeric grade of this rating.
    pub fn ordinal(self) -> u8 {
        match self {
            Rating::Again => 0,
            Rating::Hard => 1,
            Rating::Easy => 3,
        }
    }

    /// Parse a numeric grade. `2` is not a valid grade.
    pub fn from_ordinal(value: u8) -> Option<Self> {
        match value {
            0 => Some(Rating::Again),
            1 => Some(Rating::Hard),
            3 => Some(Rating::Easy),
            _ => None,
        }
    }
}

impl fmt::Display for Rating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rating::Again => write!(f, "again"),
            Rating::Hard => write!(f, "hard"),
            Rating::Easy => write!(f, "easy"),
        }
    }
}

impl FromStr for Rating {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "again" | "0" => Ok(Rating::Again),
            "hard" | "1" => Ok(Rating::Hard),
            "easy" | "3" => Ok(Rating::Easy),
            other => Err(format!("unknown rating: {other} (expected again, hard or easy)")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_new_card_is_due_immediately() {
        let now = Utc::now();
        let card = Flashcard::new("1", "Dzień dobry", "Good morning", now);
        assert!(card.is_due(now));
        assert_eq!(card.interval_days, 0);
        assert!((card.ease - SEED_EASE).abs() < f64::EPSILON);
    }

    #[test]
    fn test_with_ease_respects_floor() {
        let card = Flashcard::new("1", "a", "b", Utc::now()).with_ease(0.5);
        assert!((card.ease - MIN_EASE).abs() < f64::EPSILON);
    }

    #[test]
    fn test_restore_ease_floor() {
        let mut card = Flashcard::new("1", "a", "b", Utc::now());
        assert!(!card.restore_ease_floor());

        card.ease = 0.9;
        assert!(card.restore_ease_floor());
        assert!((card.ease - MIN_EASE).abs() < f64::EPSILON);
    }

    #[test]
    fn test_reset_restores_seed_state() {
        let now = Utc::now();
        let mut card = Flashcard::new("1", "a", "b", now);
        card.ease = 1.9;
        card.interval_days = 12;
        card.due_at = now + Duration::days(12);

        card.reset(SEED_EASE, now);
        assert_eq!(card.interval_days, 0);
        assert_eq!(card.due_at, now);
        assert!((card.ease - SEED_EASE).abs() < f64::EPSILON);
    }

    #[test]
    fn test_seed_deck_from_entries() {
        let now = Utc::now();
        let entries = vec![DeckEntry {
            id: "5".to_string(),
            front: "Proszę".to_string(),
            back: "Please / You're welcome".to_string(),
            phonetic: "ˈprɔ.ʂɛ".to_string(),
            category: "politeness".to_string(),
        }];
        let deck = seed_deck(entries, 2.5, now);
        assert_eq!(deck.len(), 1);
        assert_eq!(deck[0].category, "politeness");
        assert_eq!(deck[0].phonetic_hint, "ˈprɔ.ʂɛ");
        assert!(deck[0].is_due(now));
    }

    #[test]
    fn test_rating_ordinals() {
        assert_eq!(Rating::Again.ordinal(), 0);
        assert_eq!(Rating::Hard.ordinal(), 1);
        assert_eq!(Rating::Easy.ordinal(), 3);
        assert_eq!(Rating::from_ordinal(2), None);
        for rating in Rating::ALL {
            assert_eq!(Rating::from_ordinal(rating.ordinal()), Some(rating));
        }
    }

    #[test]
    fn test_rating_from_str() {
        assert_eq!("Again".parse::<Rating>(), Ok(Rating::Again));
        assert_eq!("hard".parse::<Rating>(), Ok(Rating::Hard));
        assert_eq!("3".parse::<Rating>(), Ok(Rating::Easy));
        assert!("good".parse::<Rating>().is_err());
        assert!("2".parse::<Rating>().is_err());
    }

    #[test]
    fn test_card_serializes_camel_case() {
        let card = Flashcard::new("1", "a", "b", Utc::now());
        let json = serde_json::to_value(&card).unwrap();
        assert!(json.get("frontText").is_some());
        assert!(json.get("intervalDays").is_some());
        assert!(json.get("dueAt").is_some());
    }
}
