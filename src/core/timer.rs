//! Cancellable per-second countdown.
//!
//! The countdown never reads a clock. Whoever owns it calls [`Countdown::tick`]
//! once per elapsed second (or [`Countdown::advance`] with a batch), so
//! pausing, stopping and expiry are deterministic and testable without
//! waiting on wall time.

use serde::{Deserialize, Serialize};

use crate::error::{CoachError, Result};

/// Lifecycle of a countdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimerState {
    /// Created, not started.
    Idle,
    Running,
    Paused,
    /// Cancelled before reaching zero.
    Stopped,
    /// Reached zero.
    Expired,
}

impl std::fmt::Display for TimerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            TimerState::Idle => "idle",
            TimerState::Running => "running",
            TimerState::Paused => "paused",
            TimerState::Stopped => "stopped",
            TimerState::Expired => "expired",
        };
        write!(f, "{}", s)
    }
}

/// Effect of a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
    /// Countdown not running; nothing changed.
    Ignored,
    /// One second counted; this many remain.
    Remaining(u32),
    /// This tick reached zero. Reported exactly once.
    Expired,
}

/// A countdown from a fixed number of seconds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Countdown {
    total_secs: u32,
    remaining_secs: u32,
    state: TimerState,
}

impl Countdown {
    pub fn new(total_secs: u32) -> Self {
        Self {
            total_secs,
            remaining_secs: total_secs,
            state: TimerState::Idle,
        }
    }

    /// Countdown of whole minutes.
    pub fn from_minutes(minutes: u32) -> Self {
        Self::new(minutes.saturating_mul(60))
    }

    pub fn state(&self) -> TimerState {
        self.state
    }

    pub fn total_secs(&self) -> u32 {
        self.total_secs
    }

    pub fn remaining_secs(&self) -> u32 {
        self.remaining_secs
    }

    pub fn elapsed_secs(&self) -> u32 {
        self.total_secs - self.remaining_secs
    }

    pub fn is_running(&self) -> bool {
        self.state == TimerState::Running
    }

    /// Begin counting down.
    pub fn start(&mut self) -> Result<()> {
        match self.state {
            TimerState::Idle => {
                self.state = TimerState::Running;
                Ok(())
            }
            other => Err(CoachError::invalid_state(format!(
                "Cannot start timer in {} state",
                other
            ))),
        }
    }

    /// Suspend ticking. Ticks while paused are ignored.
    pub fn pause(&mut self) -> Result<()> {
        match self.state {
            TimerState::Running => {
                self.state = TimerState::Paused;
                Ok(())
            }
            other => Err(CoachError::invalid_state(format!(
                "Cannot pause timer in {} state",
                other
            ))),
        }
    }

    pub fn resume(&mut self) -> Result<()> {
        match self.state {
            TimerState::Paused => {
                self.state = TimerState::Running;
                Ok(())
            }
            other => Err(CoachError::invalid_state(format!(
                "Cannot resume timer in {} state",
                other
            ))),
        }
    }

    /// Cancel the countdown. No later tick has any effect.
    ///
    /// Stopping an expired or already stopped countdown is a no-op.
    pub fn stop(&mut self) {
        if self.state != TimerState::Expired {
            self.state = TimerState::Stopped;
        }
    }

    /// Count one second.
    pub fn tick(&mut self) -> Tick {
        if self.state != TimerState::Running {
            return Tick::Ignored;
        }
        self.remaining_secs = self.remaining_secs.saturating_sub(1);
        if self.remaining_secs == 0 {
            self.state = TimerState::Expired;
            Tick::Expired
        } else {
            Tick::Remaining(self.remaining_secs)
        }
    }

    /// Count `secs` seconds at once, stopping early on expiry.
    ///
    /// Returns the effect of the last counted second, or [`Tick::Ignored`]
    /// when nothing was counted.
    pub fn advance(&mut self, secs: u32) -> Tick {
        let mut last = Tick::Ignored;
        for _ in 0..secs {
            match self.tick() {
                Tick::Ignored => break,
                tick @ Tick::Expired => return tick,
                tick => last = tick,
            }
        }
        last
    }

    /// Back to a fresh idle countdown of the same length.
    pub fn reset(&mut self) {
        self.remaining_secs = self.total_secs;
        self.state = TimerState::Idle;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ticks_only_while_running() {
        let mut timer = Countdown::new(3);
        assert_eq!(timer.tick(), Tick::Ignored);
        assert_eq!(timer.remaining_secs(), 3);

        timer.start().unwrap();
        assert_eq!(timer.tick(), Tick::Remaining(2));
        assert_eq!(timer.elapsed_secs(), 1);
    }

    #[test]
    fn test_expires_exactly_once() {
        let mut timer = Countdown::new(2);
        timer.start().unwrap();
        assert_eq!(timer.tick(), Tick::Remaining(1));
        assert_eq!(timer.tick(), Tick::Expired);
        assert_eq!(timer.state(), TimerState::Expired);
        assert_eq!(timer.tick(), Tick::Ignored);
        assert_eq!(timer.remaining_secs(), 0);
    }

    #[test]
    fn test_pause_and_resume_keep_count() {
        let mut timer = Countdown::from_minutes(1);
        timer.start().unwrap();
        timer.advance(10);
        timer.pause().unwrap();

        assert_eq!(timer.advance(30), Tick::Ignored);
        assert_eq!(timer.remaining_secs(), 50);

        timer.resume().unwrap();
        assert_eq!(timer.tick(), Tick::Remaining(49));
    }

    #[test]
    fn test_stop_cancels_future_ticks() {
        let mut timer = Countdown::new(5);
        timer.start().unwrap();
        timer.tick();
        timer.stop();

        assert_eq!(timer.tick(), Tick::Ignored);
        assert_eq!(timer.remaining_secs(), 4);
        assert!(timer.resume().is_err());
        assert!(timer.start().is_err());
    }

    #[test]
    fn test_advance_stops_at_expiry() {
        let mut timer = Countdown::new(5);
        timer.start().unwrap();
        assert_eq!(timer.advance(100), Tick::Expired);
        assert_eq!(timer.remaining_secs(), 0);
        assert_eq!(timer.advance(1), Tick::Ignored);
    }

    #[test]
    fn test_invalid_transitions() {
        let mut timer = Countdown::new(5);
        assert!(timer.pause().is_err());
        assert!(timer.resume().is_err());
        timer.start().unwrap();
        let err = timer.start().unwrap_err();
        assert!(err.to_string().contains("running"));
    }

    #[test]
    fn test_reset() {
        let mut timer = Countdown::new(5);
        timer.start().unwrap();
        timer.advance(5);
        timer.reset();
        assert_eq!(timer.state(), TimerState::Idle);
        assert_eq!(timer.remaining_secs(), 5);
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            // Property: however ticks are batched, remaining never goes
            // negative and expiry is reported once
            #[test]
            fn prop_expiry_reported_once(total in 1u32..500, batches in proptest::collection::vec(0u32..50, 0..80)) {
                let mut timer = Countdown::new(total);
                timer.start().unwrap();
                let mut expiries = 0;
                let mut counted = 0u32;
                for batch in batches {
                    let before = timer.remaining_secs();
                    if timer.advance(batch) == Tick::Expired {
                        expiries += 1;
                    }
                    counted += before - timer.remaining_secs();
                }
                prop_assert!(expiries <= 1);
                prop_assert_eq!(counted, timer.elapsed_secs());
                prop_assert_eq!(expiries == 1, timer.state() == TimerState::Expired);
            }
        }
    }
}
