//! Unified error types for the coach.
//!
//! The engine itself is mostly infallible: scorers degrade to zero instead
//! of failing. Errors surface at three places only: importing a question
//! bank, driving an exam session out of order, and the persistence layer
//! used by the CLI.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

use crate::core::bank::BankValidationError;

/// The main error type for coach operations.
#[derive(Error, Debug)]
pub enum CoachError {
    /// A question bank failed validation. Carries the first offending element.
    #[error(transparent)]
    Validation(#[from] BankValidationError),

    /// Caller supplied input the engine cannot work with.
    #[error("invalid input: {message}")]
    Input { message: String },

    /// State machine violations (answering after submit, retrying too early).
    #[error("invalid state: {message}")]
    InvalidState { message: String },

    /// I/O errors from deck, bank or history files.
    #[error("storage error at {path}: {source}")]
    Storage {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// JSON or TOML parsing/serialization errors.
    #[error("serialization error: {message}")]
    Serde { message: String },

    /// Configuration loading errors.
    #[error("config error: {message}")]
    Config { message: String },
}

/// A specialized Result type for coach operations.
pub type Result<T> = std::result::Result<T, CoachError>;

impl CoachError {
    /// Create an input error.
    pub fn input(message: impl Into<String>) -> Self {
        Self::Input {
            message: message.into(),
        }
    }

    /// Create an invalid state error.
    pub fn invalid_state(message: impl Into<String>) -> Self {
        Self::InvalidState {
            message: message.into(),
        }
    }

    /// Create a storage error from an I/O error.
    pub fn storage(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Storage {
            path: path.into(),
            source,
        }
    }

    /// Create a serialization error.
    pub fn serde(message: impl Into<String>) -> Self {
        Self::Serde {
            message: message.into(),
        }
    }

    /// Create a config error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Whether the message is meant to be shown to the learner verbatim.
    ///
    /// Only bank validation failures are user-facing; everything else points
    /// at a bug in the calling code or the environment.
    pub fn is_user_facing(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}

impl From<io::Error> for CoachError {
    fn from(err: io::Error) -> Self {
        Self::Storage {
            path: PathBuf::new(),
            source: err,
        }
    }
}

impl From<serde_json::Error> for CoachError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serde {
            message: err.to_string(),
        }
    }
}

/// Trait for fail-open error handling.
///
/// Used where a failure must not throw away work already done, e.g. a score
/// is still printed when appending it to the history file fails.
pub trait FailOpen<T> {
    /// Handle an error by logging a warning and returning the default value.
    fn fail_open_default(self, context: &str) -> T
    where
        T: Default;

    /// Handle an error by logging a warning and returning the provided fallback.
    fn fail_open_with(self, context: &str, fallback: T) -> T;
}

impl<T> FailOpen<T> for Result<T> {
    fn fail_open_default(self, context: &str) -> T
    where
        T: Default,
    {
        match self {
            Ok(value) => value,
            Err(err) => {
                tracing::warn!("{}: {} (fail-open: using default)", context, err);
                T::default()
            }
        }
    }

    fn fail_open_with(self, context: &str, fallback: T) -> T {
        match self {
            Ok(value) => value,
            Err(err) => {
                tracing::warn!("{}: {} (fail-open: using fallback)", context, err);
                fallback
            }
        }
    }
}

/// Exit codes for the coach CLI.
pub mod exit_codes {
    /// Command completed.
    pub const SUCCESS: i32 = 0;

    /// Command ran but reported a failure (bad bank, bad input).
    pub const ERROR: i32 = 1;

    /// The process panicked.
    pub const CRASH: i32 = 3;
}
