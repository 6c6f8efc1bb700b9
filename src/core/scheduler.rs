//! Spaced-repetition scheduling.
//!
//! Rules per rating:
//! - Again: ease -0.2 (floor 1.3), interval 0, due immediately
//! - Hard: ease -0.05 (floor 1.3), interval max(1, round(interval * 0.7))
//! - Easy: ease +0.05, interval 1 from zero, else round(interval * new ease)
//!
//! `now` is always passed in so callers and tests control the clock.

use chrono::{DateTime, Duration, Utc};

use crate::config::SchedulerConfig;
use crate::core::card::{Flashcard, Rating, MIN_EASE};

/// Ease lost on an Again rating.
const AGAIN_EASE_PENALTY: f64 = 0.2;
/// Ease lost on a Hard rating.
const HARD_EASE_PENALTY: f64 = 0.05;
/// Ease gained on an Easy rating.
const EASY_EASE_BONUS: f64 = 0.05;
/// Interval shrink factor on a Hard rating.
const HARD_INTERVAL_FACTOR: f64 = 0.7;

/// Decides how reviews move cards and which card to show next.
#[derive(Debug, Clone)]
pub struct CardScheduler {
    initial_ease: f64,
}

impl Default for CardScheduler {
    fn default() -> Self {
        Self::new(&SchedulerConfig::default())
    }
}

impl CardScheduler {
    /// Create a scheduler from configuration.
    pub fn new(config: &SchedulerConfig) -> Self {
        Self {
            initial_ease: config.initial_ease.max(MIN_EASE),
        }
    }

    /// Ease used when seeding or resetting cards.
    pub fn initial_ease(&self) -> f64 {
        self.initial_ease
    }

    /// Apply a review outcome and return the updated card.
    ///
    /// The input card is left untouched.
    pub fn review(&self, card: &Flashcard, rating: Rating, now: DateTime<Utc>) -> Flashcard {
        let (ease, interval_days) = next_schedule(card.ease, card.interval_days, rating);

        let due_at = now
            .checked_add_signed(Duration::days(i64::from(interval_days)))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);

        tracing::debug!(
            card = %card.id,
            %rating,
            ease,
            interval_days,
            "card reviewed"
        );

        Flashcard {
            ease,
            interval_days,
            due_at,
            ..card.clone()
        }
    }

    /// Pick the card to show next.
    ///
    /// The earliest-due card among those already due wins; when nothing is
    /// due, the soonest upcoming card is returned instead. Ties keep deck
    /// order. Returns `None` only for an empty deck.
    pub fn pick_next<'a>(&self, deck: &'a [Flashcard], now: DateTime<Utc>) -> Option<&'a Flashcard> {
        deck.iter()
            .filter(|c| c.is_due(now))
            .min_by_key(|c| c.due_at)
            .or_else(|| deck.iter().min_by_key(|c| c.due_at))
    }

    /// Number of cards due at `now`.
    pub fn due_count(&self, deck: &[Flashcard], now: DateTime<Utc>) -> usize {
        deck.iter().filter(|c| c.is_due(now)).count()
    }

    /// Review the card with `card_id` in place inside a deck.
    ///
    /// Returns the updated card, or `None` when the id is not in the deck.
    pub fn review_in_deck(
        &self,
        deck: &mut [Flashcard],
        card_id: &str,
        rating: Rating,
        now: DateTime<Utc>,
    ) -> Option<Flashcard> {
        let slot = deck.iter_mut().find(|c| c.id == card_id)?;
        let updated = self.review(slot, rating, now);
        *slot = updated.clone();
        Some(updated)
    }
}

/// Compute the next (ease, interval) pair.
fn next_schedule(ease: f64, interval_days: u32, rating: Rating) -> (f64, u32) {
    match rating {
        Rating::Again => ((ease - AGAIN_EASE_PENALTY).max(MIN_EASE), 0),
        Rating::Hard => {
            let ease = (ease - HARD_EASE_PENALTY).max(MIN_EASE);
            let interval = round_days(f64::from(interval_days) * HARD_INTERVAL_FACTOR).max(1);
            (ease, interval)
        }
        Rating::Easy => {
            let ease = ease + EASY_EASE_BONUS;
            let interval = if interval_days == 0 {
                1
            } else {
                round_days(f64::from(interval_days) * ease)
            };
            (ease, interval)
        }
    }
}

/// Round to whole days; float-to-int casts saturate on overflow.
fn round_days(days: f64) -> u32 {
    days.round() as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::card::SEED_EASE;

    fn card_with(ease: f64, interval_days: u32, now: DateTime<Utc>) -> Flashcard {
        let mut card = Flashcard::new("c1", "Dziękuję", "Thank you", now);
        card.ease = ease;
        card.interval_days = interval_days;
        card
    }

    #[test]
    fn test_again_resets_interval_and_is_due_now() {
        let now = Utc::now();
        let scheduler = CardScheduler::default();
        let card = card_with(2.5, 10, now - Duration::days(3));

        let updated = scheduler.review(&card, Rating::Again, now);
        assert_eq!(updated.interval_days, 0);
        assert_eq!(updated.due_at, now);
        assert!((updated.ease - 2.3).abs() < 1e-9);
    }

    #[test]
    fn test_hard_shrinks_interval_with_floor_of_one() {
        let now = Utc::now();
        let scheduler = CardScheduler::default();

        let updated = scheduler.review(&card_with(2.5, 10, now), Rating::Hard, now);
        assert_eq!(updated.interval_days, 7);
        assert!((updated.ease - 2.45).abs() < 1e-9);

        let updated = scheduler.review(&card_with(2.5, 0, now), Rating::Hard, now);
        assert_eq!(updated.interval_days, 1);
        assert_eq!(updated.due_at, now + Duration::days(1));
    }

    #[test]
    fn test_easy_from_zero_is_one_day() {
        let now = Utc::now();
        let scheduler = CardScheduler::default();

        let updated = scheduler.review(&card_with(SEED_EASE, 0, now), Rating::Easy, now);
        assert_eq!(updated.interval_days, 1);
        assert!((updated.ease - 2.55).abs() < 1e-9);
    }

    #[test]
    fn test_easy_multiplies_by_new_ease() {
        let now = Utc::now();
        let scheduler = CardScheduler::default();

        // 4 * 2.55 = 10.2 -> 10
        let updated = scheduler.review(&card_with(2.5, 4, now), Rating::Easy, now);
        assert_eq!(updated.interval_days, 10);
        assert_eq!(updated.due_at, now + Duration::days(10));
    }

    #[test]
    fn test_review_leaves_content_untouched() {
        let now = Utc::now();
        let scheduler = CardScheduler::default();
        let card = card_with(2.5, 3, now).with_category("politeness");

        let updated = scheduler.review(&card, Rating::Hard, now);
        assert_eq!(updated.id, card.id);
        assert_eq!(updated.front_text, card.front_text);
        assert_eq!(updated.category, "politeness");
        // Input not mutated
        assert_eq!(card.interval_days, 3);
    }

    #[test]
    fn test_huge_interval_does_not_panic() {
        let now = Utc::now();
        let scheduler = CardScheduler::default();
        let updated = scheduler.review(&card_with(3.0, u32::MAX, now), Rating::Easy, now);
        assert_eq!(updated.interval_days, u32::MAX);
        assert!(updated.due_at > now);
    }

    #[test]
    fn test_pick_next_prefers_earliest_due() {
        let now = Utc::now();
        let scheduler = CardScheduler::default();
        let mut a = Flashcard::new("a", "a", "a", now - Duration::hours(1));
        let b = Flashcard::new("b", "b", "b", now - Duration::hours(5));
        let c = Flashcard::new("c", "c", "c", now + Duration::days(2));
        a.interval_days = 1;

        let deck = vec![a, b, c];
        assert_eq!(scheduler.pick_next(&deck, now).unwrap().id, "b");
        assert_eq!(scheduler.due_count(&deck, now), 2);
    }

    #[test]
    fn test_pick_next_falls_back_to_soonest_upcoming() {
        let now = Utc::now();
        let scheduler = CardScheduler::default();
        let deck = vec![
            Flashcard::new("late", "x", "x", now + Duration::days(9)),
            Flashcard::new("soon", "y", "y", now + Duration::days(1)),
        ];
        assert_eq!(scheduler.pick_next(&deck, now).unwrap().id, "soon");
        assert_eq!(scheduler.due_count(&deck, now), 0);
    }

    #[test]
    fn test_pick_next_ties_keep_deck_order() {
        let now = Utc::now();
        let scheduler = CardScheduler::default();
        let deck = vec![
            Flashcard::new("first", "x", "x", now),
            Flashcard::new("second", "y", "y", now),
        ];
        assert_eq!(scheduler.pick_next(&deck, now).unwrap().id, "first");
    }

    #[test]
    fn test_pick_next_empty_deck() {
        let scheduler = CardScheduler::default();
        assert!(scheduler.pick_next(&[], Utc::now()).is_none());
    }

    #[test]
    fn test_review_in_deck() {
        let now = Utc::now();
        let scheduler = CardScheduler::default();
        let mut deck = vec![
            Flashcard::new("a", "a", "a", now),
            Flashcard::new("b", "b", "b", now),
        ];

        let updated = scheduler
            .review_in_deck(&mut deck, "b", Rating::Easy, now)
            .unwrap();
        assert_eq!(updated.interval_days, 1);
        assert_eq!(deck[1].interval_days, 1);
        assert_eq!(deck[0].interval_days, 0);

        assert!(scheduler
            .review_in_deck(&mut deck, "missing", Rating::Easy, now)
            .is_none());
    }

    #[test]
    fn test_initial_ease_from_config() {
        let config = SchedulerConfig {
            initial_ease: 1.0,
            ..SchedulerConfig::default()
        };
        let scheduler = CardScheduler::new(&config);
        assert!((scheduler.initial_ease() - MIN_EASE).abs() < f64::EPSILON);
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        fn arb_rating() -> impl Strategy<Value = Rating> {
            prop_oneof![Just(Rating::Again), Just(Rating::Hard), Just(Rating::Easy)]
        }

        proptest! {
            // Property: Again always zeroes the interval and is due now
            #[test]
            fn prop_again_is_due_now(ease in 1.3f64..5.0, interval in 0u32..10_000) {
                let now = Utc::now();
                let scheduler = CardScheduler::default();
                let updated = scheduler.review(&card_with(ease, interval, now), Rating::Again, now);
                prop_assert_eq!(updated.interval_days, 0);
                prop_assert!(updated.due_at <= now);
            }

            // Property: No sequence of ratings drives ease below the floor
            #[test]
            fn prop_ease_never_below_floor(ratings in proptest::collection::vec(arb_rating(), 0..60)) {
                let now = Utc::now();
                let scheduler = CardScheduler::default();
                let mut card = card_with(SEED_EASE, 0, now);
                for rating in ratings {
                    card = scheduler.review(&card, rating, now);
                    prop_assert!(card.ease >= MIN_EASE);
                }
            }

            // Property: pick_next on a non-empty deck returns one of its cards
            #[test]
            fn prop_pick_next_total(offsets in proptest::collection::vec(-1000i64..1000, 1..30)) {
                let now = Utc::now();
                let scheduler = CardScheduler::default();
                let deck: Vec<Flashcard> = offsets
                    .iter()
                    .enumerate()
                    .map(|(i, h)| Flashcard::new(i.to_string(), "f", "b", now + Duration::hours(*h)))
                    .collect();
                let picked = scheduler.pick_next(&deck, now);
                prop_assert!(picked.is_some());
                let picked = picked.unwrap();
                prop_assert!(deck.iter().any(|c| c.id == picked.id));
            }
        }
    }
}
