//! File-based storage for the coach.
//!
//! Everything lives as JSON files in `~/.coach/` (or `$COACH_HOME`).
//! Atomic writes are achieved via temp file + rename pattern.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::config::coach_home;
use crate::core::{AttemptRecord, DailyProgress, Flashcard, QuestionBank};
use crate::error::{CoachError, Result};
use crate::storage::CoachStore;
use crate::util::read_to_string_limited;

const DECK_FILE: &str = "deck.json";
const BANK_FILE: &str = "bank.json";
const HISTORY_FILE: &str = "history.json";
const PROGRESS_FILE: &str = "progress.json";

/// File-based coach storage.
#[derive(Debug, Clone)]
pub struct FileCoachStore {
    /// Directory holding the data files.
    dir: PathBuf,
}

impl FileCoachStore {
    /// Create a store in the coach home directory.
    pub fn new() -> Result<Self> {
        let dir = coach_home().ok_or_else(|| {
            CoachError::config("Could not determine coach directory (no home directory)")
        })?;
        Self::with_dir(dir)
    }

    /// Create a store in a custom directory, creating it if needed.
    pub fn with_dir(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        if !dir.exists() {
            fs::create_dir_all(&dir).map_err(|e| CoachError::storage(&dir, e))?;
        }
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.join(name)
    }

    fn temp_path(&self, name: &str) -> PathBuf {
        self.dir.join(format!(".{}.tmp", name))
    }

    /// Read a file, or `None` if it does not exist.
    fn read(&self, name: &str) -> Result<Option<String>> {
        let path = self.path(name);
        if !path.exists() {
            return Ok(None);
        }
        read_to_string_limited(&path).map(Some)
    }

    fn read_json<T: DeserializeOwned>(&self, name: &str) -> Result<Option<T>> {
        match self.read(name)? {
            Some(content) => {
                let value = serde_json::from_str(&content).map_err(|e| {
                    CoachError::serde(format!("{}: {}", self.path(name).display(), e))
                })?;
                Ok(Some(value))
            }
            None => Ok(None),
        }
    }

    /// Write a value atomically using temp file + rename.
    fn write_json<T: Serialize + ?Sized>(&self, name: &str, value: &T) -> Result<()> {
        let final_path = self.path(name);
        let temp_path = self.temp_path(name);

        let json = serde_json::to_string_pretty(value)?;

        {
            let mut file =
                fs::File::create(&temp_path).map_err(|e| CoachError::storage(&temp_path, e))?;
            file.write_all(json.as_bytes())
                .map_err(|e| CoachError::storage(&temp_path, e))?;
            file.sync_all()
                .map_err(|e| CoachError::storage(&temp_path, e))?;
        }

        // Rename temp file to final path (atomic on POSIX)
        fs::rename(&temp_path, &final_path).map_err(|e| CoachError::storage(&final_path, e))?;

        Ok(())
    }
}

impl CoachStore for FileCoachStore {
    fn load_deck(&self) -> Result<Vec<Flashcard>> {
        let mut deck: Vec<Flashcard> = self.read_json(DECK_FILE)?.unwrap_or_default();
        for card in deck.iter_mut() {
            if card.restore_ease_floor() {
                tracing::warn!(card = %card.id, "ease below floor in {}, raised", DECK_FILE);
            }
        }
        Ok(deck)
    }

    fn save_deck(&self, deck: &[Flashcard]) -> Result<()> {
        self.write_json(DECK_FILE, deck)
    }

    fn load_bank(&self) -> Result<QuestionBank> {
        match self.read(BANK_FILE)? {
            Some(content) => Ok(QuestionBank::from_json(&content)?),
            None => Ok(QuestionBank::default()),
        }
    }

    fn save_bank(&self, bank: &QuestionBank) -> Result<()> {
        self.write_json(BANK_FILE, bank)
    }

    fn load_history(&self) -> Result<Vec<AttemptRecord>> {
        Ok(self.read_json(HISTORY_FILE)?.unwrap_or_default())
    }

    fn append_attempt(&self, record: &AttemptRecord) -> Result<()> {
        let mut history = self.load_history()?;
        history.push(record.clone());
        self.write_json(HISTORY_FILE, &history)
    }

    fn load_progress(&self) -> Result<Option<DailyProgress>> {
        self.read_json(PROGRESS_FILE)
    }

    fn save_progress(&self, progress: &DailyProgress) -> Result<()> {
        self.write_json(PROGRESS_FILE, progress)
    }
}
