//! Speak command.
//!
//! Scores a spoken answer from its recording length and an optional
//! transcript file.

use std::path::Path;

use chrono::Utc;
use serde::Serialize;

use crate::config::Config;
use crate::core::{AssessmentScorer, AttemptRecord, ScoreBreakdown, SpeechSample};
use crate::error::{FailOpen, Result};
use crate::storage::CoachStore;
use crate::util::{format_clock, read_to_string_limited};

/// Options for the speak command.
#[derive(Debug, Clone, Default)]
pub struct SpeakOptions {
    /// Output as JSON.
    pub json: bool,
    /// Suppress output.
    pub quiet: bool,
    /// Record the attempt in history.
    pub save: bool,
    /// Speaking card identifier stored with the attempt.
    pub card_id: Option<String>,
    /// Card title used in the attempt label.
    pub title: Option<String>,
}

/// Output format for the speak command.
#[derive(Debug, Clone, Serialize)]
pub struct SpeakOutput {
    /// Whether scoring succeeded.
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub breakdown: Option<ScoreBreakdown>,
    /// Whether the attempt was written to history.
    pub saved: bool,
    /// Error message if scoring failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SpeakOutput {
    /// Create a successful output.
    pub fn success(breakdown: ScoreBreakdown, saved: bool) -> Self {
        Self {
            success: true,
            breakdown: Some(breakdown),
            saved,
            error: None,
        }
    }

    /// Create a failed output.
    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            breakdown: None,
            saved: false,
            error: Some(error.into()),
        }
    }
}

/// The speak command implementation.
pub struct SpeakCommand<S: CoachStore> {
    store: S,
    config: Config,
}

impl<S: CoachStore> SpeakCommand<S> {
    /// Create a new speak command.
    pub fn new(store: S, config: Config) -> Self {
        Self { store, config }
    }

    /// Score a recording of `duration_sec` seconds, reading the transcript
    /// from `transcript` when given.
    pub fn run(
        &self,
        duration_sec: f64,
        transcript: Option<&Path>,
        options: &SpeakOptions,
    ) -> SpeakOutput {
        match self.score(duration_sec, transcript, options) {
            Ok(output) => output,
            Err(e) => SpeakOutput::failure(e.to_string()),
        }
    }

    /// Score an already assembled sample.
    pub fn run_sample(&self, sample: &SpeechSample, options: &SpeakOptions) -> SpeakOutput {
        let scorer = AssessmentScorer::new(&self.config.writing, &self.config.speaking);
        let breakdown = scorer.score_speaking(sample);

        let saved = options.save && {
            let card_id = options.card_id.as_deref().unwrap_or("free");
            let title = options.title.as_deref().unwrap_or("Free speaking");
            let record = AttemptRecord::speaking(card_id, title, &breakdown, Utc::now());
            self.store
                .append_attempt(&record)
                .map(|()| true)
                .fail_open_with("recording speaking attempt", false)
        };

        SpeakOutput::success(breakdown, saved)
    }

    fn score(
        &self,
        duration_sec: f64,
        transcript: Option<&Path>,
        options: &SpeakOptions,
    ) -> Result<SpeakOutput> {
        let transcript = transcript.map(read_to_string_limited).transpose()?;
        let sample = SpeechSample::new(duration_sec, transcript);
        Ok(self.run_sample(&sample, options))
    }

    /// Format the output for display.
    pub fn format_output(&self, output: &SpeakOutput, options: &SpeakOptions) -> String {
        if options.quiet {
            return String::new();
        }

        if options.json {
            serde_json::to_string_pretty(output).unwrap_or_else(|_| "{}".to_string())
        } else {
            self.format_human_readable(output)
        }
    }

    fn format_human_readable(&self, output: &SpeakOutput) -> String {
        let Some(breakdown) = output.breakdown.as_ref().filter(|_| output.success) else {
            return format!(
                "Scoring failed: {}\n",
                output.error.as_deref().unwrap_or("unknown error")
            );
        };

        let stats = &breakdown.derived_stats;
        let mut out = format!("Speaking score: {}/100\n", breakdown.total);
        for (metric, score) in &breakdown.subscores {
            out.push_str(&format!("  {:<12} {:>3.0}\n", metric.to_string(), score));
        }

        let secs = stats.duration_sec.unwrap_or(0.0).round() as u32;
        out.push_str(&format!("Length: {}", format_clock(secs)));
        if stats.transcript_used == Some(true) {
            out.push_str(&format!(
                ", words: {}, sentences: {}\n",
                stats.word_count, stats.sentence_count
            ));
        } else {
            out.push_str(" (no transcript, fluency and vocabulary estimated)\n");
        }
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

    #[test]
    fn test_duration_only() {
        let cmd = SpeakCommand::new(Arc::new(MemoryCoachStore::new()), Config::default());

        let output = cmd.run(90.0, None, &SpeakOptions::default());

        assert!(output.success);
        let breakdown = output.breakdown.unwrap();
        assert_eq!(breakdown.subscore(Metric::Duration), Some(100.0));
        assert_eq!(breakdown.derived_stats.transcript_used, Some(false));
    }

    #[test]
    fn test_transcript_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("answer.txt");
        std::fs::write(
            &path,
            "Moim ulubionym miejscem jest park. Chodzę tam z psem, bo jest cicho.",
        )
        .unwrap();
        let cmd = SpeakCommand::new(Arc::new(MemoryCoachStore::new()), Config::default());

        let output = cmd.run(75.0, Some(&path), &SpeakOptions::default());

        let breakdown = output.breakdown.unwrap();
        assert_eq!(breakdown.derived_stats.transcript_used, Some(true));
        assert_eq!(breakdown.derived_stats.sentence_count, 2);
    }

    #[test]
    fn test_missing_transcript_file_fails() {
        let dir = TempDir::new().unwrap();
        let cmd = SpeakCommand::new(Arc::new(MemoryCoachStore::new()), Config::default());

        let output = cmd.run(60.0, Some(&dir.path().join("nope.txt")), &SpeakOptions::default());

        assert!(!output.success);
        assert!(output.error.is_some());
    }

    #[test]
    fn test_save_records_card_and_duration() {
        let store = Arc::new(MemoryCoachStore::new());
        let cmd = SpeakCommand::new(Arc::clone(&store), Config::default());
        let options = SpeakOptions {
            save: true,
            card_id: Some("s3".to_string()),
            title: Some("Moja rodzina".to_string()),
            ..Default::default()
        };

        let output = cmd.run(64.4, None, &options);

        assert!(output.saved);
        let history = store.load_history().unwrap();
        assert_eq!(history[0].label, "B1 Speaking – Moja rodzina");
        assert_eq!(history[0].meta["card"], "s3");
        assert_eq!(history[0].meta["duration"], 64.0);
    }

    #[test]
    fn test_human_output_mentions_estimate() {
        let cmd = SpeakCommand::new(Arc::new(MemoryCoachStore::new()), Config::default());
        let output = cmd.run(30.0, None, &SpeakOptions::default());

        let text = cmd.format_output(&output, &SpeakOptions::default());
        assert!(text.contains("Length: 00:30"));
        assert!(text.contains("no transcript"));
    }
}
