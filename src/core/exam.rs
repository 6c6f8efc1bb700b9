//! Timed mock exam state machine.
//!
//! A session samples questions from a bank, runs a countdown, captures
//! answers, and grades once on submission. Submission is manual or forced
//! when the countdown reaches zero.
//!
//! ```text
//! Configuring --start--> Active --submit / timeout--> Submitted
//!                                                         |
//!                      new session <--retry_incorrect-----+
//! ```

use std::collections::BTreeMap;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::config::ExamConfig;
use crate::core::bank::{Category, ExamQuestion, QuestionBank, QuestionReview, CHOICES_PER_QUESTION};
use crate::core::sampling::{sample, shuffled};
use crate::core::timer::{Countdown, Tick, TimerState};
use crate::error::{CoachError, Result};

/// Session phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExamPhase {
    Configuring,
    Active,
    Submitted,
}

impl std::fmt::Display for ExamPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ExamPhase::Configuring => "configuring",
            ExamPhase::Active => "active",
            ExamPhase::Submitted => "submitted",
        };
        write!(f, "{}", s)
    }
}

/// How the session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmitReason {
    Manual,
    TimedOut,
}

/// Session parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExamSettings {
    /// Restrict sampling to one category; `None` means all.
    pub category: Option<Category>,
    /// Requested number of questions.
    pub size: usize,
    pub time_minutes: u32,
}

impl ExamSettings {
    pub fn new(category: Option<Category>, size: usize, time_minutes: u32) -> Self {
        Self {
            category,
            size,
            time_minutes,
        }
    }

    /// Settings from configuration, for all categories.
    pub fn from_config(config: &ExamConfig) -> Self {
        Self::new(None, config.size, config.time_minutes)
    }
}

/// Correct over total for one category.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryScore {
    pub correct: usize,
    pub total: usize,
}

/// Grading of a submitted session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExamResult {
    pub correct: usize,
    pub total: usize,
    pub by_category: BTreeMap<Category, CategoryScore>,
    /// One entry per item, in session order.
    pub reviews: Vec<QuestionReview>,
    pub reason: SubmitReason,
}

impl ExamResult {
    fn grade(items: &[ExamQuestion], picks: &[Option<usize>], reason: SubmitReason) -> Self {
        let mut by_category: BTreeMap<Category, CategoryScore> = BTreeMap::new();
        let reviews: Vec<QuestionReview> = items
            .iter()
            .zip(picks)
            .map(|(q, pick)| q.review(*pick))
            .collect();

        for review in &reviews {
            let entry = by_category.entry(review.category).or_default();
            entry.total += 1;
            if review.is_correct {
                entry.correct += 1;
            }
        }

        Self {
            correct: reviews.iter().filter(|r| r.is_correct).count(),
            total: reviews.len(),
            by_category,
            reviews,
            reason,
        }
    }

    /// Percentage score, rounded.
    pub fn percent(&self) -> u8 {
        if self.total == 0 {
            return 0;
        }
        (self.correct as f64 / self.total as f64 * 100.0).round() as u8
    }

    /// Reviews of questions answered wrong or left blank.
    pub fn incorrect(&self) -> impl Iterator<Item = &QuestionReview> {
        self.reviews.iter().filter(|r| !r.is_correct)
    }

    pub fn incorrect_count(&self) -> usize {
        self.total - self.correct
    }
}

/// A single mock exam.
#[derive(Debug, Clone)]
pub struct ExamSession {
    settings: ExamSettings,
    /// Questions eligible for sampling; reused by `reset`.
    pool: Vec<ExamQuestion>,
    items: Vec<ExamQuestion>,
    picks: Vec<Option<usize>>,
    timer: Countdown,
    phase: ExamPhase,
    result: Option<ExamResult>,
}

impl ExamSession {
    /// Configure a session over `bank`.
    ///
    /// Draws `min(size, matching questions)` items without replacement in
    /// random order. Fails when nothing matches or the settings are zero.
    pub fn new<R: Rng + ?Sized>(
        bank: &QuestionBank,
        settings: ExamSettings,
        rng: &mut R,
    ) -> Result<Self> {
        let pool = bank.filter(settings.category);
        Self::from_pool(pool, settings, rng)
    }

    fn from_pool<R: Rng + ?Sized>(
        pool: Vec<ExamQuestion>,
        settings: ExamSettings,
        rng: &mut R,
    ) -> Result<Self> {
        if settings.size == 0 {
            return Err(CoachError::input("exam size must be at least 1"));
        }
        if settings.time_minutes == 0 {
            return Err(CoachError::input("exam time limit must be at least 1 minute"));
        }
        if pool.is_empty() {
            let scope = settings
                .category
                .map_or_else(|| "the bank".to_string(), |c| format!("category {}", c));
            return Err(CoachError::input(format!("no questions available in {}", scope)));
        }

        let items = sample(&pool, settings.size, rng);
        let picks = vec![None; items.len()];
        let timer = Countdown::from_minutes(settings.time_minutes);

        Ok(Self {
            settings,
            pool,
            items,
            picks,
            timer,
            phase: ExamPhase::Configuring,
            result: None,
        })
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn phase(&self) -> ExamPhase {
        self.phase
    }

    pub fn settings(&self) -> &ExamSettings {
        &self.settings
    }

    pub fn items(&self) -> &[ExamQuestion] {
        &self.items
    }

    pub fn picks(&self) -> &[Option<usize>] {
        &self.picks
    }

    pub fn time_remaining_secs(&self) -> u32 {
        self.timer.remaining_secs()
    }

    /// Whether the countdown is paused.
    pub fn is_paused(&self) -> bool {
        self.timer.state() == TimerState::Paused
    }

    pub fn answered_count(&self) -> usize {
        self.picks.iter().filter(|p| p.is_some()).count()
    }

    /// Answered share in percent, rounded.
    pub fn progress(&self) -> u8 {
        let total = self.items.len().max(1) as f64;
        (self.answered_count() as f64 / total * 100.0).round() as u8
    }

    /// Grading, once submitted.
    pub fn result(&self) -> Option<&ExamResult> {
        self.result.as_ref()
    }

    // =========================================================================
    // Transitions
    // =========================================================================

    /// Transition: Configuring → Active (countdown starts)
    pub fn start(&mut self) -> Result<()> {
        if self.phase != ExamPhase::Configuring {
            return Err(CoachError::invalid_state(format!(
                "Cannot start exam in {} state",
                self.phase
            )));
        }
        self.timer.start()?;
        self.phase = ExamPhase::Active;
        tracing::info!(
            items = self.items.len(),
            seconds = self.timer.total_secs(),
            category = ?self.settings.category,
            "exam started"
        );
        Ok(())
    }

    /// Record (or overwrite) the answer for item `question`.
    pub fn select_answer(&mut self, question: usize, choice: usize) -> Result<()> {
        if self.phase != ExamPhase::Active {
            return Err(CoachError::invalid_state(format!(
                "Cannot select an answer in {} state",
                self.phase
            )));
        }
        if question >= self.items.len() {
            return Err(CoachError::input(format!(
                "question {} out of range (session has {})",
                question,
                self.items.len()
            )));
        }
        if choice >= CHOICES_PER_QUESTION {
            return Err(CoachError::input(format!(
                "choice {} out of range 0..={}",
                choice,
                CHOICES_PER_QUESTION - 1
            )));
        }
        self.picks[question] = Some(choice);
        Ok(())
    }

    /// Count one second. Reaching zero submits the session.
    pub fn tick(&mut self) -> Tick {
        if self.phase != ExamPhase::Active {
            return Tick::Ignored;
        }
        let tick = self.timer.tick();
        if tick == Tick::Expired {
            self.finish(SubmitReason::TimedOut);
        }
        tick
    }

    /// Count `secs` seconds at once, submitting on expiry.
    pub fn advance(&mut self, secs: u32) -> Tick {
        if self.phase != ExamPhase::Active {
            return Tick::Ignored;
        }
        let tick = self.timer.advance(secs);
        if tick == Tick::Expired {
            self.finish(SubmitReason::TimedOut);
        }
        tick
    }

    pub fn pause(&mut self) -> Result<()> {
        self.require_active("pause")?;
        self.timer.pause()
    }

    pub fn resume(&mut self) -> Result<()> {
        self.require_active("resume")?;
        self.timer.resume()
    }

    /// Transition: Active → Submitted (manual)
    ///
    /// Requires at least one answered question.
    pub fn submit(&mut self) -> Result<&ExamResult> {
        self.require_active("submit")?;
        if self.answered_count() == 0 {
            return Err(CoachError::invalid_state(
                "Cannot submit without answering at least one question",
            ));
        }
        self.finish(SubmitReason::Manual);
        self.result
            .as_ref()
            .ok_or_else(|| CoachError::invalid_state("exam result missing after submit"))
    }

    /// Answer key for item `question`, available once submitted.
    pub fn reveal(&self, question: usize) -> Result<QuestionReview> {
        let result = self.result.as_ref().ok_or_else(|| {
            CoachError::invalid_state(format!("Cannot reveal answers in {} state", self.phase))
        })?;
        result.reviews.get(question).cloned().ok_or_else(|| {
            CoachError::input(format!(
                "question {} out of range (session has {})",
                question,
                self.items.len()
            ))
        })
    }

    /// New active session over exactly the questions this one got wrong
    /// (including unanswered ones), all categories, same time limit.
    pub fn retry_incorrect<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<ExamSession> {
        let result = self.result.as_ref().ok_or_else(|| {
            CoachError::invalid_state(format!("Cannot retry incorrect in {} state", self.phase))
        })?;

        let pool: Vec<ExamQuestion> = self
            .items
            .iter()
            .zip(&result.reviews)
            .filter(|(_, review)| !review.is_correct)
            .map(|(q, _)| q.clone())
            .collect();
        if pool.is_empty() {
            return Err(CoachError::invalid_state(
                "Cannot retry incorrect: every answer was correct",
            ));
        }

        let settings = ExamSettings::new(None, pool.len(), self.settings.time_minutes);
        let pool = shuffled(&pool, rng);
        let mut session = Self::from_pool(pool, settings, rng)?;
        session.start()?;
        tracing::debug!(items = session.items.len(), "retrying incorrect questions");
        Ok(session)
    }

    /// Draw a fresh sample from the same pool and restart the countdown.
    pub fn reset<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<()> {
        self.timer.stop();
        self.items = sample(&self.pool, self.settings.size, rng);
        self.picks = vec![None; self.items.len()];
        self.timer = Countdown::from_minutes(self.settings.time_minutes);
        self.result = None;
        self.phase = ExamPhase::Configuring;
        self.start()
    }

    /// Cancel the countdown without grading.
    ///
    /// The session stays active; answers can still be given and submitted
    /// manually, but time no longer runs out.
    pub fn stop_timer(&mut self) {
        self.timer.stop();
    }

    fn require_active(&self, action: &str) -> Result<()> {
        if self.phase != ExamPhase::Active {
            return Err(CoachError::invalid_state(format!(
                "Cannot {} exam in {} state",
                action, self.phase
            )));
        }
        Ok(())
    }

    /// Transition: Active → Submitted. Grades exactly once.
    fn finish(&mut self, reason: SubmitReason) {
        if self.phase == ExamPhase::Submitted {
            return;
        }
        self.timer.stop();
        let result = ExamResult::grade(&self.items, &self.picks, reason);
        match reason {
            SubmitReason::TimedOut => tracing::info!(
                correct = result.correct,
                total = result.total,
                "exam time expired, submitted automatically"
            ),
            SubmitReason::Manual => tracing::info!(
                correct = result.correct,
                total = result.total,
                "exam submitted"
            ),
        }
        self.result = Some(result);
        self.phase = ExamPhase::Submitted;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::bank::tests::question;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn rng() -> StdRng {
        StdRng::seed_from_u64(1234)
    }

    fn bank() -> QuestionBank {
        QuestionBank::new(vec![
            question("h1", Category::History, 0),
            question("h2", Category::History, 1),
            question("g1", Category::Geography, 2),
            question("c1", Category::Culture, 3),
            question("k1", Category::Constitution, 0),
        ])
    }

    fn active(size: usize, minutes: u32) -> ExamSession {
        let mut session =
            ExamSession::new(&bank(), ExamSettings::new(None, size, minutes), &mut rng()).unwrap();
        session.start().unwrap();
        session
    }

    /// Answer item `i` correctly or with a wrong choice.
    fn answer(session: &mut ExamSession, i: usize, correct: bool) {
        let key = session.items()[i].correct_index;
        let choice = if correct { key } else { (key + 1) % CHOICES_PER_QUESTION };
        session.select_answer(i, choice).unwrap();
    }

    #[test]
    fn test_new_samples_min_of_size_and_pool() {
        let session =
            ExamSession::new(&bank(), ExamSettings::new(None, 3, 5), &mut rng()).unwrap();
        assert_eq!(session.items().len(), 3);
        assert_eq!(session.phase(), ExamPhase::Configuring);
        assert_eq!(session.time_remaining_secs(), 300);

        let session =
            ExamSession::new(&bank(), ExamSettings::new(None, 50, 5), &mut rng()).unwrap();
        assert_eq!(session.items().len(), 5);

        let mut ids: Vec<&str> = session.items().iter().map(|q| q.id.as_str()).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), 5);
    }

    #[test]
    fn test_category_filter() {
        let settings = ExamSettings::new(Some(Category::History), 10, 5);
        let session = ExamSession::new(&bank(), settings, &mut rng()).unwrap();
        assert_eq!(session.items().len(), 2);
        assert!(session
            .items()
            .iter()
            .all(|q| q.category == Category::History));
    }

    #[test]
    fn test_new_rejects_empty_pool_and_zero_settings() {
        let empty = QuestionBank::default();
        assert!(ExamSession::new(&empty, ExamSettings::new(None, 5, 5), &mut rng()).is_err());
        assert!(ExamSession::new(&bank(), ExamSettings::new(None, 0, 5), &mut rng()).is_err());
        assert!(ExamSession::new(&bank(), ExamSettings::new(None, 5, 0), &mut rng()).is_err());
    }

    #[test]
    fn test_answers_rejected_before_start() {
        let mut session =
            ExamSession::new(&bank(), ExamSettings::new(None, 3, 5), &mut rng()).unwrap();
        assert!(session.select_answer(0, 0).is_err());
        assert_eq!(session.tick(), Tick::Ignored);
        assert_eq!(session.time_remaining_secs(), 300);
    }

    #[test]
    fn test_select_answer_overwrites() {
        let mut session = active(3, 5);
        session.select_answer(1, 0).unwrap();
        session.select_answer(1, 2).unwrap();
        assert_eq!(session.picks()[1], Some(2));
        assert_eq!(session.answered_count(), 1);
        assert_eq!(session.progress(), 33);
    }

    #[test]
    fn test_select_answer_bounds() {
        let mut session = active(3, 5);
        assert!(session.select_answer(3, 0).is_err());
        assert!(session.select_answer(0, 4).is_err());
        assert_eq!(session.answered_count(), 0);
    }

    #[test]
    fn test_submit_requires_an_answer() {
        let mut session = active(3, 5);
        let err = session.submit().unwrap_err();
        assert!(matches!(err, CoachError::InvalidState { .. }));
        assert_eq!(session.phase(), ExamPhase::Active);
    }

    #[test]
    fn test_grading_two_of_three() {
        let mut session = active(3, 5);
        answer(&mut session, 0, true);
        answer(&mut session, 1, false);
        answer(&mut session, 2, true);

        let result = session.submit().unwrap().clone();
        assert_eq!(result.correct, 2);
        assert_eq!(result.total, 3);
        assert_eq!(result.percent(), 67);
        assert_eq!(result.reason, SubmitReason::Manual);

        let sum_correct: usize = result.by_category.values().map(|s| s.correct).sum();
        let sum_total: usize = result.by_category.values().map(|s| s.total).sum();
        assert_eq!(sum_correct, 2);
        assert_eq!(sum_total, 3);
    }

    #[test]
    fn test_unanswered_counts_as_incorrect() {
        let mut session = active(3, 5);
        answer(&mut session, 0, true);
        let result = session.submit().unwrap();
        assert_eq!(result.correct, 1);
        assert_eq!(result.incorrect_count(), 2);
    }

    #[test]
    fn test_submitted_session_is_frozen() {
        let mut session = active(3, 5);
        answer(&mut session, 0, true);
        session.submit().unwrap();
        let before = session.result().cloned();

        assert!(session.select_answer(0, 3).is_err());
        assert!(session.submit().is_err());
        assert!(session.pause().is_err());
        assert_eq!(session.tick(), Tick::Ignored);
        assert_eq!(session.result().cloned(), before);
        assert_eq!(session.picks()[0], Some(session.items()[0].correct_index));
    }

    #[test]
    fn test_reveal_only_after_submit() {
        let mut session = active(3, 5);
        answer(&mut session, 0, false);
        assert!(session.reveal(0).is_err());

        session.submit().unwrap();
        let review = session.reveal(0).unwrap();
        assert!(!review.is_correct);
        assert_eq!(review.correct_index, session.items()[0].correct_index);
        assert!(session.reveal(9).is_err());
    }

    #[test]
    fn test_countdown_forces_submit_once() {
        let mut session = active(3, 1);
        answer(&mut session, 0, true);

        for _ in 0..59 {
            assert!(matches!(session.tick(), Tick::Remaining(_)));
        }
        assert_eq!(session.tick(), Tick::Expired);
        assert_eq!(session.phase(), ExamPhase::Submitted);
        let result = session.result().cloned().unwrap();
        assert_eq!(result.reason, SubmitReason::TimedOut);
        assert_eq!(result.correct, 1);

        for _ in 0..10 {
            assert_eq!(session.tick(), Tick::Ignored);
        }
        assert_eq!(session.advance(100), Tick::Ignored);
        assert_eq!(session.result().cloned().unwrap(), result);
    }

    #[test]
    fn test_timeout_without_answers_still_grades() {
        let mut session = active(2, 1);
        assert_eq!(session.advance(60), Tick::Expired);
        let result = session.result().unwrap();
        assert_eq!(result.correct, 0);
        assert_eq!(result.total, 2);
    }

    #[test]
    fn test_pause_stops_the_clock() {
        let mut session = active(2, 1);
        session.advance(10);
        session.pause().unwrap();
        assert!(session.is_paused());
        assert_eq!(session.advance(500), Tick::Ignored);
        assert_eq!(session.time_remaining_secs(), 50);
        assert_eq!(session.phase(), ExamPhase::Active);

        session.resume().unwrap();
        assert_eq!(session.tick(), Tick::Remaining(49));
    }

    #[test]
    fn test_stopped_timer_never_expires() {
        let mut session = active(2, 1);
        session.advance(30);
        session.stop_timer();

        assert_eq!(session.advance(600), Tick::Ignored);
        assert_eq!(session.phase(), ExamPhase::Active);
        assert_eq!(session.time_remaining_secs(), 30);

        answer(&mut session, 0, true);
        assert_eq!(session.submit().unwrap().reason, SubmitReason::Manual);
    }

    #[test]
    fn test_retry_incorrect_scope() {
        let mut session = active(3, 7);
        answer(&mut session, 0, true);
        answer(&mut session, 1, false);
        answer(&mut session, 2, true);
        session.submit().unwrap();

        let retry = session.retry_incorrect(&mut rng()).unwrap();
        assert_eq!(retry.items().len(), 1);
        assert_eq!(retry.items()[0].id, session.items()[1].id);
        assert_eq!(retry.phase(), ExamPhase::Active);
        assert_eq!(retry.settings().category, None);
        assert_eq!(retry.settings().time_minutes, 7);
        assert_eq!(retry.time_remaining_secs(), 7 * 60);
    }

    #[test]
    fn test_retry_requires_submitted_session() {
        let session = active(3, 5);
        let err = session.retry_incorrect(&mut rng()).unwrap_err();
        assert!(err.to_string().contains("active"));
    }

    #[test]
    fn test_retry_with_all_correct_fails() {
        let mut session = active(2, 5);
        answer(&mut session, 0, true);
        answer(&mut session, 1, true);
        session.submit().unwrap();
        assert!(session.retry_incorrect(&mut rng()).is_err());
    }

    #[test]
    fn test_reset_resamples_and_restarts() {
        let mut session = active(3, 2);
        answer(&mut session, 0, true);
        session.submit().unwrap();

        session.reset(&mut rng()).unwrap();
        assert_eq!(session.phase(), ExamPhase::Active);
        assert_eq!(session.answered_count(), 0);
        assert!(session.result().is_none());
        assert_eq!(session.items().len(), 3);
        assert_eq!(session.time_remaining_secs(), 120);
    }

    #[test]
    fn test_bank_untouched_by_session() {
        let bank = bank();
        let before = bank.clone();
        let mut session =
            ExamSession::new(&bank, ExamSettings::new(None, 5, 1), &mut rng()).unwrap();
        session.start().unwrap();
        answer(&mut session, 0, false);
        session.submit().unwrap();
        assert_eq!(bank, before);
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            // Property: the category breakdown always sums to the overall score
            #[test]
            fn prop_breakdown_sums_to_total(
                seed in any::<u64>(),
                size in 1usize..6,
                picks in proptest::collection::vec(proptest::option::of(0usize..4), 6),
            ) {
                let mut rng = StdRng::seed_from_u64(seed);
                let mut session = ExamSession::new(&bank(), ExamSettings::new(None, size, 1), &mut rng).unwrap();
                session.start().unwrap();
                for (i, pick) in picks.iter().enumerate().take(session.items().len()) {
                    if let Some(choice) = pick {
                        session.select_answer(i, *choice).unwrap();
                    }
                }
                session.advance(60);
                let result = session.result().unwrap();
                let correct: usize = result.by_category.values().map(|s| s.correct).sum();
                let total: usize = result.by_category.values().map(|s| s.total).sum();
                prop_assert_eq!(correct, result.correct);
                prop_assert_eq!(total, result.total);
                prop_assert_eq!(result.total, session.items().len());
            }
        }
    }
}
