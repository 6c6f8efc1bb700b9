//! Quiz command.
//!
//! Runs a multiple-choice vocabulary quiz over the deck, reading one
//! answer per line.

use std::io::{BufRead, Write};

use chrono::Utc;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;

use crate::cli::answers::{Answer, AnswerReader};
use crate::config::Config;
use crate::core::{AttemptRecord, DailyProgress, QuizOutcome, VocabQuiz};
use crate::error::{FailOpen, Result};
use crate::storage::CoachStore;

/// Options for the quiz command.
#[derive(Debug, Clone, Default)]
pub struct QuizOptions {
    /// Output as JSON.
    pub json: bool,
    /// Suppress output.
    pub quiet: bool,
    /// Number of questions (default from config).
    pub size: Option<usize>,
    /// Seed for a reproducible quiz.
    pub seed: Option<u64>,
}

/// Output format for the quiz command.
#[derive(Debug, Clone, Serialize)]
pub struct QuizOutput {
    /// Whether the quiz ran to completion.
    pub success: bool,
    pub correct: usize,
    pub total: usize,
    pub percent: u8,
    /// Prompts answered wrong or skipped.
    pub missed: Vec<String>,
    /// Error message if the quiz failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl QuizOutput {
    /// Create a successful output.
    pub fn success(outcome: QuizOutcome, missed: Vec<String>) -> Self {
        Self {
            success: true,
            correct: outcome.correct,
            total: outcome.total,
            percent: outcome.percent(),
            missed,
            error: None,
        }
    }

    /// Create a failed output.
    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            correct: 0,
            total: 0,
            percent: 0,
            missed: Vec::new(),
            error: Some(error.into()),
        }
    }
}

/// The quiz command implementation.
pub struct QuizCommand<S: CoachStore> {
    store: S,
    config: Config,
}

impl<S: CoachStore> QuizCommand<S> {
    /// Create a new quiz command.
    pub fn new(store: S, config: Config) -> Self {
        Self { store, config }
    }

    /// Run the quiz, reading answers from `input` and prompting on `prompt`.
    pub fn run<R: BufRead, W: Write>(
        &self,
        options: &QuizOptions,
        input: R,
        prompt: W,
    ) -> QuizOutput {
        match self.quiz(options, AnswerReader::new(input, prompt)) {
            Ok(output) => output,
            Err(e) => QuizOutput::failure(e.to_string()),
        }
    }

    fn quiz<R: BufRead, W: Write>(
        &self,
        options: &QuizOptions,
        mut reader: AnswerReader<R, W>,
    ) -> Result<QuizOutput> {
        let deck = self.store.load_deck()?;
        let mut rng = match options.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let size = options.size.unwrap_or(self.config.quiz.size);
        let mut quiz = VocabQuiz::build(&deck, size, self.config.quiz.distractors, &mut rng)?;

        let mut missed = Vec::new();
        while let Some(item) = quiz.current().cloned() {
            reader.say(&format!(
                "\n[{}/{}] {}\n",
                quiz.position() + 1,
                quiz.len(),
                item.prompt
            ));
            for (i, option) in item.options.iter().enumerate() {
                reader.say(&format!("  {}) {}\n", i + 1, option.text));
            }
            reader.say("> ");

            let right = match reader.next_answer(item.options.len()) {
                Answer::Pick(choice) => quiz.answer(choice)?,
                Answer::Quit => {
                    return Ok(QuizOutput::failure(format!(
                        "Quiz stopped after {} of {} questions",
                        quiz.position(),
                        quiz.len()
                    )));
                }
                Answer::Skip | Answer::Invalid => {
                    quiz.skip()?;
                    false
                }
            };

            if right {
                reader.say("Correct.\n");
            } else {
                let answer = &item.options[item.answer_index()].text;
                reader.say(&format!("Wrong: {}\n", answer));
                missed.push(item.prompt.clone());
            }
        }

        let outcome = quiz.finish()?;
        let now = Utc::now();
        self.store
            .append_attempt(&AttemptRecord::quiz(&outcome, now))
            .fail_open_default("recording quiz attempt");

        let today = now.date_naive();
        let mut progress = self
            .store
            .load_progress()
            .fail_open_default("loading daily progress")
            .unwrap_or_else(|| DailyProgress::new(today, self.config.scheduler.daily_goal));
        progress.record(today);
        self.store
            .save_progress(&progress)
            .fail_open_default("saving daily progress");

        Ok(QuizOutput::success(outcome, missed))
    }

    /// Format the output for display.
    pub fn format_output(&self, output: &QuizOutput, options: &QuizOptions) -> String {
        if options.quiet {
            return String::new();
        }

        if options.json {
            serde_json::to_string_pretty(output).unwrap_or_else(|_| "{}".to_string())
        } else {
            self.format_human_readable(output)
        }
    }

    fn format_human_readable(&self, output: &QuizOutput) -> String {
        if !output.success {
            return format!(
                "Quiz failed: {}\n",
                output.error.as_deref().unwrap_or("unknown error")
            );
        }

        let mut out = format!(
            "\nScore: {}/{} ({}%)\n",
            output.correct, output.total, output.percent
        );
        if !output.missed.is_empty() {
            out.push_str(&format!("Practice again: {}\n", output.missed.join(", ")));
        }
        out
    }
}
