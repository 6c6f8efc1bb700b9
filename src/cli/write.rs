//! Write command.
//!
//! Scores a written answer from a text file and optionally records the
//! attempt in history.

use std::path::Path;

use chrono::Utc;
use serde::Serialize;

use crate::config::{Config, WritingConfig};
use crate::core::{AssessmentScorer, AttemptRecord, ScoreBreakdown};
use crate::error::{CoachError, FailOpen, Result};
use crate::storage::CoachStore;
use crate::util::read_to_string_limited;

/// Options for the write command.
#[derive(Debug, Clone, Default)]
pub struct WriteOptions {
    /// Output as JSON.
    pub json: bool,
    /// Suppress output.
    pub quiet: bool,
    /// Lower bound of the target word range (default from config).
    pub min_words: Option<u32>,
    /// Upper bound of the target word range (default from config).
    pub max_words: Option<u32>,
    /// Record the attempt in history.
    pub save: bool,
    /// Prompt identifier stored with the attempt.
    pub prompt_id: Option<String>,
    /// Prompt title used in the attempt label.
    pub title: Option<String>,
}

/// Output format for the write command.
#[derive(Debug, Clone, Serialize)]
pub struct WriteOutput {
    /// Whether scoring succeeded.
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub breakdown: Option<ScoreBreakdown>,
    pub min_words: u32,
    pub max_words: u32,
    /// Whether the attempt was written to history.
    pub saved: bool,
    /// Error message if scoring failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl WriteOutput {
    /// Create a successful output.
    pub fn success(breakdown: ScoreBreakdown, min_words: u32, max_words: u32, saved: bool) -> Self {
        Self {
            success: true,
            breakdown: Some(breakdown),
            min_words,
            max_words,
            saved,
            error: None,
        }
    }

    /// Create a failed output.
    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            breakdown: None,
            min_words: 0,
            max_words: 0,
            saved: false,
            error: Some(error.into()),
        }
    }
}

/// The write command implementation.
pub struct WriteCommand<S: CoachStore> {
    store: S,
    config: Config,
}

impl<S: CoachStore> WriteCommand<S> {
    /// Create a new write command.
    pub fn new(store: S, config: Config) -> Self {
        Self { store, config }
    }

    /// Score the text in `path`.
    pub fn run(&self, path: &Path, options: &WriteOptions) -> WriteOutput {
        match read_to_string_limited(path) {
            Ok(text) => self.run_text(&text, options),
            Err(e) => WriteOutput::failure(e.to_string()),
        }
    }

    /// Score `text` directly.
    pub fn run_text(&self, text: &str, options: &WriteOptions) -> WriteOutput {
        match self.score(text, options) {
            Ok(output) => output,
            Err(e) => WriteOutput::failure(e.to_string()),
        }
    }

    fn score(&self, text: &str, options: &WriteOptions) -> Result<WriteOutput> {
        let min_words = options.min_words.unwrap_or(self.config.writing.min_words);
        let max_words = options.max_words.unwrap_or(self.config.writing.max_words);
        if !WritingConfig::is_valid_range(min_words, max_words) {
            return Err(CoachError::input(format!(
                "invalid word range: min {} is above max {}",
                min_words, max_words
            )));
        }

        let scorer = AssessmentScorer::new(&self.config.writing, &self.config.speaking);
        let breakdown = scorer.score_writing(text, min_words, max_words);

        let saved = options.save && {
            let prompt_id = options.prompt_id.as_deref().unwrap_or("free");
            let title = options.title.as_deref().unwrap_or("Free writing");
            let record = AttemptRecord::writing(prompt_id, title, &breakdown, Utc::now());
            self.store
                .append_attempt(&record)
                .map(|()| true)
                .fail_open_with("recording writing attempt", false)
        };

        Ok(WriteOutput::success(breakdown, min_words, max_words, saved))
    }

    /// Format the output for display.
    pub fn format_output(&self, output: &WriteOutput, options: &WriteOptions) -> String {
        if options.quiet {
            return String::new();
        }

        if options.json {
            serde_json::to_string_pretty(output).unwrap_or_else(|_| "{}".to_string())
        } else {
            self.format_human_readable(output)
        }
    }

    fn format_human_readable(&self, output: &WriteOutput) -> String {
        let Some(breakdown) = output.breakdown.as_ref().filter(|_| output.success) else {
            return format!(
                "Scoring failed: {}\n",
                output.error.as_deref().unwrap_or("unknown error")
            );
        };

        let stats = &breakdown.derived_stats;
        let mut out = format!("Writing score: {}/100\n", breakdown.total);
        for (metric, score) in &breakdown.subscores {
            out.push_str(&format!("  {:<12} {:>3.0}\n", metric.to_string(), score));
        }
        out.push_str(&format!(
            "Words: {} (target {}-{}), sentences: {}, avg length: {}, connectors: {}\n",
            stats.word_count,
            output.min_words,
            output.max_words,
            stats.sentence_count,
            stats.avg_sentence_length,
            stats.connector_count.unwrap_or(0)
        ));
        if output.saved {
            out.push_str("Saved to history.\n");
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Metric;
    use crate::storage::MemoryCoachStore;
    use std::sync::Arc;
    use tempfile::TempDir;

    const ESSAY: &str = "Mieszkam w Krakowie od pięciu lat. Lubię to miasto, ponieważ \
        jest piękne i spokojne. Jednak zimą bywa tu zimno. Dlatego często \
        podróżuję do Hiszpanii.";

    #[test]
    fn test_scores_text_without_saving() {
        let store = Arc::new(MemoryCoachStore::new());
        let cmd = WriteCommand::new(Arc::clone(&store), Config::default());

        let output = cmd.run_text(ESSAY, &WriteOptions::default());

        assert!(output.success);
        let breakdown = output.breakdown.unwrap();
        assert!(breakdown.total > 0);
        assert_eq!(breakdown.subscores.len(), 5);
        assert_eq!(breakdown.derived_stats.sentence_count, 4);
        assert!(!output.saved);
        assert_eq!(store.history_len(), 0);
    }

    #[test]
    fn test_save_records_attempt() {
        let store = Arc::new(MemoryCoachStore::new());
        let cmd = WriteCommand::new(Arc::clone(&store), Config::default());
        let options = WriteOptions {
            save: true,
            prompt_id: Some("w1".to_string()),
            title: Some("Moje miasto".to_string()),
            ..Default::default()
        };

        let output = cmd.run_text(ESSAY, &options);

        assert!(output.saved);
        let history = store.load_history().unwrap();
        assert_eq!(history[0].label, "B1 Writing – Moje miasto");
        assert_eq!(history[0].meta["prompt"], "w1");
    }

    #[test]
    fn test_word_range_override() {
        let store = Arc::new(MemoryCoachStore::new());
        let cmd = WriteCommand::new(store, Config::default());
        let options = WriteOptions {
            min_words: Some(10),
            max_words: Some(40),
            ..Default::default()
        };

        let output = cmd.run_text(ESSAY, &options);

        let length = output.breakdown.unwrap().subscore(Metric::Length).unwrap();
        assert_eq!(length, 100.0);
    }

    #[test]
    fn test_reversed_range_rejected() {
        let store = Arc::new(MemoryCoachStore::new());
        let cmd = WriteCommand::new(store, Config::default());
        let options = WriteOptions {
            min_words: Some(200),
            max_words: Some(100),
            ..Default::default()
        };

        let output = cmd.run_text(ESSAY, &options);

        assert!(!output.success);
        assert!(output.error.unwrap().contains("word range"));
    }

    #[test]
    fn test_reads_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("essay.txt");
        std::fs::write(&path, ESSAY).unwrap();
        let cmd = WriteCommand::new(Arc::new(MemoryCoachStore::new()), Config::default());

        let output = cmd.run(&path, &WriteOptions::default());
        assert!(output.success);

        let missing = cmd.run(&dir.path().join("missing.txt"), &WriteOptions::default());
        assert!(!missing.success);
    }

    #[test]
    fn test_human_output_lists_metrics() {
        let cmd = WriteCommand::new(Arc::new(MemoryCoachStore::new()), Config::default());
        let output = cmd.run_text(ESSAY, &WriteOptions::default());

        let text = cmd.format_output(&output, &WriteOptions::default());
        assert!(text.starts_with("Writing score: "));
        assert!(text.contains("connectors"));
        assert!(text.contains("punctuation"));
    }
}
