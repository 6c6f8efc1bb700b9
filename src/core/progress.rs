//! Daily review goal tracking.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// How many reviews were done on a given day against a goal.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DailyProgress {
    /// Calendar day the count belongs to.
    pub date: NaiveDate,
    /// Reviews done on `date`.
    pub done: u32,
    /// Target reviews per day.
    pub goal: u32,
}

impl DailyProgress {
    /// Start a fresh day.
    pub fn new(date: NaiveDate, goal: u32) -> Self {
        Self {
            date,
            done: 0,
            goal,
        }
    }

    /// Record one review on `today`. A new calendar day restarts the count.
    pub fn record(&mut self, today: NaiveDate) {
        if today != self.date {
            self.date = today;
            self.done = 0;
        }
        self.done = self.done.saturating_add(1);
    }

    /// Reviews done as seen from `today` (zero if the stored day is stale).
    pub fn done_on(&self, today: NaiveDate) -> u32 {
        if today == self.date {
            self.done
        } else {
            0
        }
    }

    /// Reviews still needed on `today` to meet the goal.
    pub fn remaining(&self, today: NaiveDate) -> u32 {
        self.goal.saturating_sub(self.done_on(today))
    }

    /// Whether the goal is met on `today`.
    pub fn is_goal_met(&self, today: NaiveDate) -> bool {
        self.done_on(today) >= self.goal
    }

    /// Completion in percent, capped at 100.
    pub fn percent(&self, today: NaiveDate) -> u32 {
        if self.goal == 0 {
            return 100;
        }
        (self.done_on(today).saturating_mul(100) / self.goal).min(100)
    }
}
