//! Configuration loading for the coach.
//!
//! Configuration follows a precedence chain:
//! 1. Environment variables (highest priority)
//! 2. Project config (`.coach/config.toml`)
//! 3. User config (`~/.coach/config.toml`)
//! 4. Defaults (lowest priority)
//!
//! All configuration is optional. Without a config the coach runs
//! 20-question mock exams in 25 minutes, expects 80-160 word essays and
//! sets a goal of 20 reviews a day.

use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use crate::core::card::SEED_EASE;
use crate::core::text::{POLISH_CONNECTORS, POLISH_FILLERS};
use crate::error::{CoachError, Result};

/// Main configuration struct.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Flashcard scheduling.
    pub scheduler: SchedulerConfig,
    /// Writing task scoring.
    pub writing: WritingConfig,
    /// Speaking task scoring.
    pub speaking: SpeakingConfig,
    /// Mock exam sessions.
    pub exam: ExamConfig,
    /// Vocabulary multiple-choice quiz.
    pub quiz: QuizConfig,
}

/// Flashcard scheduling configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Ease given to new or reset cards.
    pub initial_ease: f64,
    /// Reviews per day the learner aims for.
    pub daily_goal: u32,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            initial_ease: SEED_EASE,
            daily_goal: 20,
        }
    }
}

/// Writing task configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct WritingConfig {
    /// Lower bound of the target word range.
    pub min_words: u32,
    /// Upper bound of the target word range.
    pub max_words: u32,
    /// Connector vocabulary used for the cohesion sub-score.
    pub connectors: Vec<String>,
}

impl WritingConfig {
    /// Check that the word range is usable (`min_words <= max_words`).
    pub fn is_valid_range(min_words: u32, max_words: u32) -> bool {
        min_words <= max_words
    }
}

impl Default for WritingConfig {
    fn default() -> Self {
        Self {
            min_words: 80,
            max_words: 160,
            connectors: POLISH_CONNECTORS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// Speaking task configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SpeakingConfig {
    /// Filler vocabulary used for the fluency sub-score.
    pub fillers: Vec<String>,
    /// Speech rate assumed when no transcript is supplied.
    pub assumed_words_per_minute: f64,
}

impl Default for SpeakingConfig {
    fn default() -> Self {
        Self {
            fillers: POLISH_FILLERS.iter().map(|s| s.to_string()).collect(),
            assumed_words_per_minute: 100.0,
        }
    }
}

/// Mock exam configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ExamConfig {
    /// Questions drawn per session.
    pub size: usize,
    /// Time limit per session in minutes.
    pub time_minutes: u32,
}

/// Minimum valid exam size.
pub const MIN_EXAM_SIZE: usize = 1;

/// Minimum valid exam time limit in minutes.
pub const MIN_EXAM_MINUTES: u32 = 1;

impl ExamConfig {
    /// Check if an exam size is valid (must be >= 1).
    pub fn is_valid_size(value: usize) -> bool {
        value >= MIN_EXAM_SIZE
    }

    /// Check if a time limit is valid (must be >= 1 minute).
    pub fn is_valid_minutes(value: u32) -> bool {
        value >= MIN_EXAM_MINUTES
    }
}

impl Default for ExamConfig {
    fn default() -> Self {
        Self {
            size: 20,
            time_minutes: 25,
        }
    }
}

/// Vocabulary quiz configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct QuizConfig {
    /// Cards asked per quiz.
    pub size: usize,
    /// Wrong options shown next to the right one.
    pub distractors: usize,
}

impl Default for QuizConfig {
    fn default() -> Self {
        Self {
            size: 10,
            distractors: 3,
        }
    }
}

impl Config {
    /// Load configuration with full precedence chain.
    pub fn load() -> Self {
        match env::current_dir() {
            Ok(cwd) => Self::load_from_cwd(&cwd),
            Err(_) => {
                let mut config = Config::default();
                if let Some(user_config) = Self::load_user_config() {
                    config = config.merge(user_config);
                }
                config.apply_env_overrides();
                config
            }
        }
    }

    /// Load configuration with a specific working directory.
    pub fn load_from_cwd(cwd: &Path) -> Self {
        let mut config = Config::default();

        if let Some(user_config) = Self::load_user_config() {
            config = config.merge(user_config);
        }

        if let Some(project_config) = Self::load_project_config(cwd) {
            config = config.merge(project_config);
        }

        config.apply_env_overrides();

        config
    }

    /// Load user config from `~/.coach/config.toml`.
    fn load_user_config() -> Option<Config> {
        let home = coach_home()?;
        Self::load_from_file(&home.join("config.toml")).ok()
    }

    /// Load project config from `.coach/config.toml` in the given directory.
    fn load_project_config(cwd: &Path) -> Option<Config> {
        Self::load_from_file(&project_coach_dir(cwd).join("config.toml")).ok()
    }

    /// Load config from a specific file path.
    pub fn load_from_file(path: &Path) -> Result<Config> {
        let content = fs::read_to_string(path).map_err(|e| CoachError::storage(path, e))?;
        toml::from_str(&content).map_err(|e| CoachError::config(e.to_string()))
    }

    /// Apply environment variable overrides.
    fn apply_env_overrides(&mut self) {
        // COACH_DAILY_GOAL
        if let Ok(val) = env::var("COACH_DAILY_GOAL") {
            match val.parse::<u32>() {
                Ok(n) => self.scheduler.daily_goal = n,
                Err(_) => eprintln!(
                    "Warning: Invalid COACH_DAILY_GOAL value '{}'. \
                    Expected a non-negative integer. Using '{}'.",
                    val, self.scheduler.daily_goal
                ),
            }
        }

        // COACH_EXAM_SIZE
        if let Ok(val) = env::var("COACH_EXAM_SIZE") {
            match val.parse::<usize>() {
                Ok(n) if ExamConfig::is_valid_size(n) => self.exam.size = n,
                _ => eprintln!(
                    "Warning: Invalid COACH_EXAM_SIZE value '{}'. \
                    Must be an integer >= {}. Using '{}'.",
                    val, MIN_EXAM_SIZE, self.exam.size
                ),
            }
        }

        // COACH_EXAM_MINUTES
        if let Ok(val) = env::var("COACH_EXAM_MINUTES") {
            match val.parse::<u32>() {
                Ok(n) if ExamConfig::is_valid_minutes(n) => self.exam.time_minutes = n,
                _ => eprintln!(
                    "Warning: Invalid COACH_EXAM_MINUTES value '{}'. \
                    Must be an integer >= {}. Using '{}'.",
                    val, MIN_EXAM_MINUTES, self.exam.time_minutes
                ),
            }
        }

        // COACH_WRITING_MIN_WORDS / COACH_WRITING_MAX_WORDS, applied as a pair
        let min = env::var("COACH_WRITING_MIN_WORDS").ok();
        let max = env::var("COACH_WRITING_MAX_WORDS").ok();
        if min.is_some() || max.is_some() {
            let new_min = min
                .as_deref()
                .map(str::parse::<u32>)
                .unwrap_or(Ok(self.writing.min_words));
            let new_max = max
                .as_deref()
                .map(str::parse::<u32>)
                .unwrap_or(Ok(self.writing.max_words));
            match (new_min, new_max) {
                (Ok(lo), Ok(hi)) if WritingConfig::is_valid_range(lo, hi) => {
                    self.writing.min_words = lo;
                    self.writing.max_words = hi;
                }
                _ => eprintln!(
                    "Warning: Invalid COACH_WRITING_MIN_WORDS/COACH_WRITING_MAX_WORDS \
                    ({:?}/{:?}). Expected integers with min <= max. Using {}-{}.",
                    min, max, self.writing.min_words, self.writing.max_words
                ),
            }
        }
    }

    /// Merge another config into this one.
    ///
    /// The `other` config takes precedence field by field. A value equal to
    /// the default counts as "not set", so a higher layer cannot reset a
    /// lower layer's customization back to the default.
    fn merge(mut self, other: Config) -> Self {
        let default_scheduler = SchedulerConfig::default();
        if other.scheduler.initial_ease != default_scheduler.initial_ease {
            self.scheduler.initial_ease = other.scheduler.initial_ease;
        }
        if other.scheduler.daily_goal != default_scheduler.daily_goal {
            self.scheduler.daily_goal = other.scheduler.daily_goal;
        }

        let default_writing = WritingConfig::default();
        if other.writing.min_words != default_writing.min_words {
            self.writing.min_words = other.writing.min_words;
        }
        if other.writing.max_words != default_writing.max_words {
            self.writing.max_words = other.writing.max_words;
        }
        if other.writing.connectors != default_writing.connectors {
            self.writing.connectors = other.writing.connectors;
        }

        let default_speaking = SpeakingConfig::default();
        if other.speaking.fillers != default_speaking.fillers {
            self.speaking.fillers = other.speaking.fillers;
        }
        if other.speaking.assumed_words_per_minute != default_speaking.assumed_words_per_minute {
            self.speaking.assumed_words_per_minute = other.speaking.assumed_words_per_minute;
        }

        let default_exam = ExamConfig::default();
        if other.exam.size != default_exam.size {
            self.exam.size = other.exam.size;
        }
        if other.exam.time_minutes != default_exam.time_minutes {
            self.exam.time_minutes = other.exam.time_minutes;
        }

        let default_quiz = QuizConfig::default();
        if other.quiz.size != default_quiz.size {
            self.quiz.size = other.quiz.size;
        }
        if other.quiz.distractors != default_quiz.distractors {
            self.quiz.distractors = other.quiz.distractors;
        }

        self
    }

    /// Save configuration to the project config file.
    ///
    /// Writes `.coach/config.toml` under `cwd` via temp file + rename.
    pub fn save_project(&self, cwd: &Path) -> Result<PathBuf> {
        let coach_dir = project_coach_dir(cwd);
        if !coach_dir.exists() {
            fs::create_dir_all(&coach_dir).map_err(|e| CoachError::storage(&coach_dir, e))?;
        }

        let config_path = coach_dir.join("config.toml");
        let content =
            toml::to_string_pretty(self).map_err(|e| CoachError::config(e.to_string()))?;

        let temp_path = coach_dir.join(".config.toml.tmp");
        fs::write(&temp_path, &content).map_err(|e| CoachError::storage(&temp_path, e))?;
        fs::rename(&temp_path, &config_path).map_err(|e| CoachError::storage(&config_path, e))?;

        Ok(config_path)
    }
}

/// Get the coach home directory.
///
/// Checks `COACH_HOME` first, then falls back to `~/.coach`, then to a
/// per-user temp directory when no home directory is known.
pub fn coach_home() -> Option<PathBuf> {
    if let Ok(home) = env::var("COACH_HOME") {
        if home.is_empty() {
            tracing::warn!("COACH_HOME is empty, using default");
        } else {
            return Some(PathBuf::from(home));
        }
    }

    if let Some(home) = dirs::home_dir() {
        return Some(home.join(".coach"));
    }

    let fallback = env::temp_dir().join("coach");
    tracing::warn!(
        "HOME not set, using fallback location: {}",
        fallback.display()
    );
    Some(fallback)
}

/// Get the project coach directory (`<cwd>/.coach`).
pub fn project_coach_dir(cwd: &Path) -> PathBuf {
    cwd.join(".coach")
}
