//! Comprehension command.
//!
//! Shows a reading passage or listening script, asks its questions one
//! answer per line, and records the graded block.

use std::io::{BufRead, Write};

use chrono::Utc;
use serde::Serialize;

use crate::cli::answers::{Answer, AnswerReader};
use crate::core::{comprehension_sets, AttemptRecord, ComprehensionSet, Skill};
use crate::error::{CoachError, FailOpen, Result};
use crate::storage::CoachStore;

/// Options for the comprehension command.
#[derive(Debug, Clone, Default)]
pub struct ComprehensionOptions {
    /// Output as JSON.
    pub json: bool,
    /// Suppress output.
    pub quiet: bool,
    /// Set to run (default: the first one).
    pub set_id: Option<String>,
    /// List the available sets instead of running one.
    pub list: bool,
}

/// One available set.
#[derive(Debug, Clone, Serialize)]
pub struct SetSummary {
    pub id: String,
    pub title: String,
    pub skill: Skill,
    pub questions: usize,
    pub minutes: u32,
}

impl From<&ComprehensionSet> for SetSummary {
    fn from(set: &ComprehensionSet) -> Self {
        Self {
            id: set.id.clone(),
            title: set.title.clone(),
            skill: set.skill,
            questions: set.questions.len(),
            minutes: set.skill.section_minutes(),
        }
    }
}

/// Output format for the comprehension command.
#[derive(Debug, Clone, Serialize)]
pub struct ComprehensionOutput {
    /// Whether the command succeeded.
    pub success: bool,
    /// The set that was graded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub set: Option<SetSummary>,
    pub correct: usize,
    pub total: usize,
    pub score: u8,
    /// Available sets, when listing.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub sets: Vec<SetSummary>,
    /// Error message if the command failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ComprehensionOutput {
    /// Create a successful output for a graded set.
    pub fn graded(set: SetSummary, correct: usize, total: usize, score: u8) -> Self {
        Self {
            success: true,
            set: Some(set),
            correct,
            total,
            score,
            sets: Vec::new(),
            error: None,
        }
    }

    /// Create a successful listing output.
    pub fn listing(sets: Vec<SetSummary>) -> Self {
        Self {
            success: true,
            set: None,
            correct: 0,
            total: 0,
            score: 0,
            sets,
            error: None,
        }
    }

    /// Create a failed output.
    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            set: None,
            correct: 0,
            total: 0,
            score: 0,
            sets: Vec::new(),
            error: Some(error.into()),
        }
    }
}

/// The comprehension command implementation.
pub struct ComprehensionCommand<S: CoachStore> {
    store: S,
    sets: Vec<ComprehensionSet>,
}

impl<S: CoachStore> ComprehensionCommand<S> {
    /// Create a command over the built-in sets.
    pub fn new(store: S) -> Result<Self> {
        Ok(Self::with_sets(store, comprehension_sets()?))
    }

    /// Create a command over custom sets.
    pub fn with_sets(store: S, sets: Vec<ComprehensionSet>) -> Self {
        Self { store, sets }
    }

    /// Run the command, reading answers from `input` and prompting on `prompt`.
    pub fn run<R: BufRead, W: Write>(
        &self,
        options: &ComprehensionOptions,
        input: R,
        prompt: W,
    ) -> ComprehensionOutput {
        if options.list {
            return ComprehensionOutput::listing(self.sets.iter().map(SetSummary::from).collect());
        }
        match self.sit(options, AnswerReader::new(input, prompt)) {
            Ok(output) => output,
            Err(e) => ComprehensionOutput::failure(e.to_string()),
        }
    }

    fn find(&self, id: Option<&str>) -> Result<&ComprehensionSet> {
        match id {
            Some(id) => self
                .sets
                .iter()
                .find(|s| s.id == id)
                .ok_or_else(|| CoachError::input(format!("no comprehension set '{}'", id))),
            None => self
                .sets
                .first()
                .ok_or_else(|| CoachError::input("no comprehension sets available")),
        }
    }

    fn sit<R: BufRead, W: Write>(
        &self,
        options: &ComprehensionOptions,
        mut reader: AnswerReader<R, W>,
    ) -> Result<ComprehensionOutput> {
        let set = self.find(options.set_id.as_deref())?;

        reader.say(&format!(
            "{} – {} (suggested {} min)\n\n{}\n",
            set.skill.label(),
            set.title,
            set.skill.section_minutes(),
            set.passage
        ));

        let mut picks = Vec::with_capacity(set.questions.len());
        for (n, question) in set.questions.iter().enumerate() {
            reader.say(&format!("\n{}. {}\n", n + 1, question.text));
            for (i, option) in question.options.iter().enumerate() {
                reader.say(&format!("  {}) {}\n", i + 1, option));
            }
            reader.say("> ");

            match reader.next_answer(question.options.len()) {
                Answer::Pick(choice) => picks.push(Some(choice)),
                Answer::Skip | Answer::Invalid => picks.push(None),
                Answer::Quit => {
                    return Err(CoachError::input(format!(
                        "stopped after {} of {} questions",
                        n,
                        set.questions.len()
                    )));
                }
            }
        }

        let score = set.grade(&picks)?;
        self.store
            .append_attempt(&AttemptRecord::comprehension(set, &score, Utc::now()))
            .fail_open_default("recording comprehension attempt");

        Ok(ComprehensionOutput::graded(
            SetSummary::from(set),
            score.correct,
            score.total,
            score.score,
        ))
    }

    /// Format the output for display.
    pub fn format_output(
        &self,
        output: &ComprehensionOutput,
        options: &ComprehensionOptions,
    ) -> String {
        if options.quiet {
            return String::new();
        }

        if options.json {
            serde_json::to_string_pretty(output).unwrap_or_else(|_| "{}".to_string())
        } else {
            self.format_human_readable(output)
        }
    }

    fn format_human_readable(&self, output: &ComprehensionOutput) -> String {
        if !output.success {
            return format!(
                "Comprehension failed: {}\n",
                output.error.as_deref().unwrap_or("unknown error")
            );
        }

        match &output.set {
            Some(set) => format!(
                "\n{}: {}/{} ({}%)\n",
                set.title, output.correct, output.total, output.score
            ),
            None => output
                .sets
                .iter()
                .map(|s| {
                    format!(
                        "{:<4} {:<10} {} ({} questions, {} min)\n",
                        s.id,
                        s.skill.label().trim_start_matches("B1 "),
                        s.title,
                        s.questions,
                        s.minutes
                    )
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryCoachStore;
    use std::io::{sink, Cursor};
    use std::sync::Arc;

    #[test]
    fn test_list_sets() {
        let cmd = ComprehensionCommand::new(Arc::new(MemoryCoachStore::new())).unwrap();
        let options = ComprehensionOptions {
            list: true,
            ..Default::default()
        };

        let output = cmd.run(&options, Cursor::new(""), sink());

        assert!(output.success);
        assert_eq!(output.sets.len(), 4);
        assert_eq!(output.sets[0].minutes, 15);
        let text = cmd.format_output(&output, &options);
        assert!(text.contains("l1   Listening"));
    }

    #[test]
    fn test_graded_set_is_recorded() {
        let store = Arc::new(MemoryCoachStore::new());
        let cmd = ComprehensionCommand::new(Arc::clone(&store)).unwrap();
        let options = ComprehensionOptions {
            set_id: Some("l2".to_string()),
            ..Default::default()
        };

        // Right, then wrong
        let output = cmd.run(&options, Cursor::new("3\n1\n"), sink());

        assert!(output.success, "{:?}", output.error);
        assert_eq!((output.correct, output.total, output.score), (1, 2, 50));
        let history = store.load_history().unwrap();
        assert_eq!(history[0].label, "B1 Listening – Zgłoszenie awarii");
        assert_eq!(history[0].score, 50);
    }

    #[test]
    fn test_skip_counts_as_wrong() {
        let store = Arc::new(MemoryCoachStore::new());
        let cmd = ComprehensionCommand::new(Arc::clone(&store)).unwrap();

        let output = cmd.run(&ComprehensionOptions::default(), Cursor::new("\n2\nc\n"), sink());

        assert_eq!(output.set.unwrap().id, "r1");
        assert_eq!(output.correct, 2);
    }

    #[test]
    fn test_quit_records_nothing() {
        let store = Arc::new(MemoryCoachStore::new());
        let cmd = ComprehensionCommand::new(Arc::clone(&store)).unwrap();

        let output = cmd.run(&ComprehensionOptions::default(), Cursor::new("2\nq\n"), sink());

        assert!(!output.success);
        assert_eq!(store.history_len(), 0);
    }

    #[test]
    fn test_unknown_set() {
        let cmd = ComprehensionCommand::new(Arc::new(MemoryCoachStore::new())).unwrap();
        let options = ComprehensionOptions {
            set_id: Some("zz".to_string()),
            ..Default::default()
        };

        let output = cmd.run(&options, Cursor::new(""), sink());

        assert!(output.error.unwrap().contains("zz"));
    }

    #[test]
    fn test_passage_is_shown() {
        let cmd = ComprehensionCommand::with_sets(
            Arc::new(MemoryCoachStore::new()),
            comprehension_sets().unwrap(),
        );
        let mut prompt = Vec::new();

        cmd.run(&ComprehensionOptions::default(), Cursor::new("1\n1\n1\n"), &mut prompt);

        let shown = String::from_utf8(prompt).unwrap();
        assert!(shown.starts_with("B1 Reading – Ogłoszenie o mieszkaniu (suggested 15 min)"));
        assert!(shown.contains("Czynsz 2200 zł"));
    }
}
