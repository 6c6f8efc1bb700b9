//! History command.
//!
//! Lists recorded attempts, or exports them as CSV.

use serde::Serialize;

use crate::core::{to_csv, AttemptRecord};
use crate::error::Result;
use crate::storage::CoachStore;

/// Options for the history command.
#[derive(Debug, Clone, Default)]
pub struct HistoryOptions {
    /// Output as JSON.
    pub json: bool,
    /// Suppress output.
    pub quiet: bool,
    /// Print CSV instead of a table.
    pub csv: bool,
    /// Only show the most recent attempts.
    pub limit: Option<usize>,
}

/// Output format for the history command.
#[derive(Debug, Clone, Serialize)]
pub struct HistoryOutput {
    /// Whether the history could be read.
    pub success: bool,
    /// Attempts, oldest first.
    pub attempts: Vec<AttemptRecord>,
    /// CSV rendering, when requested.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub csv: Option<String>,
    /// Error message if the history could not be read.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl HistoryOutput {
    /// Create a successful output.
    pub fn success(attempts: Vec<AttemptRecord>, csv: Option<String>) -> Self {
        Self {
            success: true,
            attempts,
            csv,
            error: None,
        }
    }

    /// Create a failed output.
    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            attempts: Vec::new(),
            csv: None,
            error: Some(error.into()),
        }
    }
}

/// The history command implementation.
pub struct HistoryCommand<S: CoachStore> {
    store: S,
}

impl<S: CoachStore> HistoryCommand<S> {
    /// Create a new history command.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Run the history command.
    pub fn run(&self, options: &HistoryOptions) -> HistoryOutput {
        match self.history(options) {
            Ok(output) => output,
            Err(e) => HistoryOutput::failure(e.to_string()),
        }
    }

    fn history(&self, options: &HistoryOptions) -> Result<HistoryOutput> {
        let mut attempts = self.store.load_history()?;
        if let Some(limit) = options.limit {
            let skip = attempts.len().saturating_sub(limit);
            attempts.drain(..skip);
        }
        let csv = options.csv.then(|| to_csv(&attempts));
        Ok(HistoryOutput::success(attempts, csv))
    }

    /// Format the output for display.
    pub fn format_output(&self, output: &HistoryOutput, options: &HistoryOptions) -> String {
        if options.quiet {
            return String::new();
        }

        if options.json {
            serde_json::to_string_pretty(output).unwrap_or_else(|_| "{}".to_string())
        } else {
            self.format_human_readable(output)
        }
    }

    fn format_human_readable(&self, output: &HistoryOutput) -> String {
        if !output.success {
            return format!(
                "Could not read history: {}\n",
                output.error.as_deref().unwrap_or("unknown error")
            );
        }

        if let Some(csv) = &output.csv {
            return if csv.ends_with('\n') {
                csv.clone()
            } else {
                format!("{}\n", csv)
            };
        }

        if output.attempts.is_empty() {
            return "No attempts recorded yet.\n".to_string();
        }

        let mut out = String::new();
        for attempt in &output.attempts {
            out.push_str(&format!(
                "{}  {:>3}%  {}\n",
                attempt.timestamp.format("%Y-%m-%d %H:%M"),
                attempt.score,
                attempt.label
            ));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryCoachStore;
    use chrono::{Duration, TimeZone, Utc};
    use serde_json::Map;
    use std::sync::Arc;

    fn setup() -> Arc<MemoryCoachStore> {
        let store = Arc::new(MemoryCoachStore::new());
        let start = Utc.with_ymd_and_hms(2026, 10, 1, 9, 30, 0).unwrap();
        for (i, (label, score)) in [("Vocab Quiz", 70), ("Civics Mock", 85), ("Vocab Quiz", 90)]
            .into_iter()
            .enumerate()
        {
            let at = start + Duration::days(i as i64);
            store
                .append_attempt(&AttemptRecord::new(label, score, Map::new(), at))
                .unwrap();
        }
        store
    }

    #[test]
    fn test_lists_attempts_oldest_first() {
        let cmd = HistoryCommand::new(setup());

        let output = cmd.run(&HistoryOptions::default());

        assert!(output.success);
        assert_eq!(output.attempts.len(), 3);
        assert_eq!(output.attempts[1].label, "Civics Mock");
        assert!(output.csv.is_none());

        let text = cmd.format_output(&output, &HistoryOptions::default());
        assert!(text.starts_with("2026-10-01 09:30   70%  Vocab Quiz\n"));
    }

    #[test]
    fn test_limit_keeps_most_recent() {
        let cmd = HistoryCommand::new(setup());
        let options = HistoryOptions {
            limit: Some(2),
            ..Default::default()
        };

        let output = cmd.run(&options);

        assert_eq!(output.attempts.len(), 2);
        assert_eq!(output.attempts[0].score, 85);
    }

    #[test]
    fn test_csv_export() {
        let cmd = HistoryCommand::new(setup());
        let options = HistoryOptions {
            csv: true,
            ..Default::default()
        };

        let output = cmd.run(&options);
        let text = cmd.format_output(&output, &options);

        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0], "ts,label,score,meta");
        assert!(lines[2].contains("\"Civics Mock\",\"85\""));
        assert!(text.ends_with('\n'));
    }

    #[test]
    fn test_empty_history() {
        let cmd = HistoryCommand::new(Arc::new(MemoryCoachStore::new()));

        let output = cmd.run(&HistoryOptions::default());
        let text = cmd.format_output(&output, &HistoryOptions::default());

        assert_eq!(text, "No attempts recorded yet.\n");
    }

    #[test]
    fn test_json_uses_ts_millis() {
        let cmd = HistoryCommand::new(setup());
        let options = HistoryOptions {
            json: true,
            limit: Some(1),
            ..Default::default()
        };

        let output = cmd.run(&options);
        let value: serde_json::Value =
            serde_json::from_str(&cmd.format_output(&output, &options)).unwrap();

        let expected = Utc.with_ymd_and_hms(2026, 10, 3, 9, 30, 0).unwrap();
        assert_eq!(value["attempts"][0]["ts"], expected.timestamp_millis());
    }
}
