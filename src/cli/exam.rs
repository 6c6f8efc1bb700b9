//! Exam command.
//!
//! Runs a timed civics mock exam on the terminal, one answer per line,
//! then offers to retry the questions that were missed.

use std::collections::BTreeMap;
use std::io::{BufRead, Write};
use std::time::Instant;

use chrono::Utc;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;

use crate::cli::answers::{Answer, AnswerReader};
use crate::config::{Config, ExamConfig};
use crate::core::{
    AttemptRecord, Category, CategoryScore, ExamPhase, ExamResult, ExamSession, ExamSettings,
    QuestionReview, SubmitReason,
};
use crate::error::{CoachError, FailOpen, Result};
use crate::storage::CoachStore;
use crate::util::format_clock;

/// Options for the exam command.
#[derive(Debug, Clone, Default)]
pub struct ExamOptions {
    /// Output as JSON.
    pub json: bool,
    /// Suppress output.
    pub quiet: bool,
    /// Only ask questions from this category.
    pub category: Option<Category>,
    /// Number of questions (default from config).
    pub size: Option<usize>,
    /// Time limit in minutes (default from config).
    pub minutes: Option<u32>,
    /// Seed for a reproducible question draw.
    pub seed: Option<u64>,
    /// Do not offer to retry missed questions.
    pub no_retry: bool,
}

/// One graded pass through the exam.
#[derive(Debug, Clone, Serialize)]
pub struct ExamRound {
    pub correct: usize,
    pub total: usize,
    pub percent: u8,
    pub reason: SubmitReason,
    pub by_category: BTreeMap<Category, CategoryScore>,
    /// Questions answered wrong or left blank.
    pub missed: Vec<QuestionReview>,
    /// Whether this round retried an earlier one's misses.
    pub retry: bool,
}

impl ExamRound {
    fn from_result(result: &ExamResult, retry: bool) -> Self {
        Self {
            correct: result.correct,
            total: result.total,
            percent: result.percent(),
            reason: result.reason,
            by_category: result.by_category.clone(),
            missed: result.incorrect().cloned().collect(),
            retry,
        }
    }
}

/// Output format for the exam command.
#[derive(Debug, Clone, Serialize)]
pub struct ExamOutput {
    /// Whether at least one round was graded.
    pub success: bool,
    pub rounds: Vec<ExamRound>,
    /// Error message if the exam failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ExamOutput {
    /// Create a successful output.
    pub fn success(rounds: Vec<ExamRound>) -> Self {
        Self {
            success: true,
            rounds,
            error: None,
        }
    }

    /// Create a failed output.
    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            rounds: Vec::new(),
            error: Some(error.into()),
        }
    }
}

/// Counts whole seconds between answers so the session clock can be
/// advanced in steps.
struct Stopwatch {
    started: Instant,
    counted: u64,
}

impl Stopwatch {
    fn start() -> Self {
        Self {
            started: Instant::now(),
            counted: 0,
        }
    }

    /// Whole seconds since the last lap.
    fn lap(&mut self) -> u32 {
        let total = self.started.elapsed().as_secs();
        let lap = total.saturating_sub(self.counted);
        self.counted = total;
        u32::try_from(lap).unwrap_or(u32::MAX)
    }
}

/// The exam command implementation.
pub struct ExamCommand<S: CoachStore> {
    store: S,
    config: Config,
}

impl<S: CoachStore> ExamCommand<S> {
    /// Create a new exam command.
    pub fn new(store: S, config: Config) -> Self {
        Self { store, config }
    }

    /// Run the exam, reading answers from `input` and prompting on `prompt`.
    pub fn run<R: BufRead, W: Write>(
        &self,
        options: &ExamOptions,
        input: R,
        prompt: W,
    ) -> ExamOutput {
        match self.exam(options, AnswerReader::new(input, prompt)) {
            Ok(rounds) => ExamOutput::success(rounds),
            Err(e) => ExamOutput::failure(e.to_string()),
        }
    }

    /// Resolve the session settings from options and configuration.
    pub fn settings(&self, options: &ExamOptions) -> Result<ExamSettings> {
        let size = options.size.unwrap_or(self.config.exam.size);
        let minutes = options.minutes.unwrap_or(self.config.exam.time_minutes);
        if !ExamConfig::is_valid_size(size) {
            return Err(CoachError::input("exam size must be at least 1"));
        }
        if !ExamConfig::is_valid_minutes(minutes) {
            return Err(CoachError::input("exam time limit must be at least 1 minute"));
        }
        Ok(ExamSettings::new(options.category, size, minutes))
    }

    fn exam<R: BufRead, W: Write>(
        &self,
        options: &ExamOptions,
        mut reader: AnswerReader<R, W>,
    ) -> Result<Vec<ExamRound>> {
        let settings = self.settings(options)?;
        let bank = self.store.load_bank()?;
        if bank.is_empty() {
            return Err(CoachError::input(
                "question bank is empty; import one with `coach bank import`",
            ));
        }

        let mut rng = match options.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let mut session = ExamSession::new(&bank, settings, &mut rng)?;
        session.start()?;

        let mut rounds = Vec::new();
        loop {
            let retry = !rounds.is_empty();
            let result = match self.sit(&mut session, &mut reader)? {
                Some(result) => result,
                // Leaving a retry early keeps the rounds already graded
                None if retry => break,
                None => return Err(CoachError::input("exam abandoned before any answer")),
            };
            self.store
                .append_attempt(&AttemptRecord::exam(&result, session.settings(), Utc::now()))
                .fail_open_default("recording exam attempt");

            reader.say(&format!(
                "\nScore: {}/{} ({}%)\n",
                result.correct,
                result.total,
                result.percent()
            ));
            let missed = result.incorrect_count();
            rounds.push(ExamRound::from_result(&result, retry));

            if missed == 0
                || options.no_retry
                || !reader.confirm(&format!("Retry {} missed question(s)?", missed))
            {
                break;
            }
            session = session.retry_incorrect(&mut rng)?;
        }

        Ok(rounds)
    }

    /// Ask every question of an active session and grade it.
    ///
    /// Returns `None` when the learner quits before answering anything.
    fn sit<R: BufRead, W: Write>(
        &self,
        session: &mut ExamSession,
        reader: &mut AnswerReader<R, W>,
    ) -> Result<Option<ExamResult>> {
        let mut stopwatch = Stopwatch::start();
        let total = session.items().len();

        for index in 0..total {
            let question = session.items()[index].clone();
            reader.say(&format!(
                "\n[{}/{}] {} left | {}\n{}\n",
                index + 1,
                total,
                format_clock(session.time_remaining_secs()),
                question.category,
                question.text
            ));
            for (i, choice) in question.choices.iter().enumerate() {
                reader.say(&format!("  {}) {}\n", i + 1, choice));
            }
            reader.say("> ");

            let answer = reader.next_answer(question.choices.len());
            session.advance(stopwatch.lap());
            if session.phase() == ExamPhase::Submitted {
                reader.say("\nTime is up.\n");
                break;
            }

            match answer {
                Answer::Pick(choice) => session.select_answer(index, choice)?,
                Answer::Skip | Answer::Invalid => {}
                Answer::Quit => break,
            }
        }

        if session.phase() == ExamPhase::Active {
            if session.answered_count() == 0 {
                return Ok(None);
            }
            session.submit()?;
        }

        session
            .result()
            .cloned()
            .map(Some)
            .ok_or_else(|| CoachError::invalid_state("exam finished without a result"))
    }

    /// Format the output for display.
    pub fn format_output(&self, output: &ExamOutput, options: &ExamOptions) -> String {
        if options.quiet {
            return String::new();
        }

        if options.json {
            serde_json::to_string_pretty(output).unwrap_or_else(|_| "{}".to_string())
        } else {
            self.format_human_readable(output)
        }
    }

    fn format_human_readable(&self, output: &ExamOutput) -> String {
        if !output.success {
            return format!(
                "Exam failed: {}\n",
                output.error.as_deref().unwrap_or("unknown error")
            );
        }

        let mut out = String::new();
        for (n, round) in output.rounds.iter().enumerate() {
            let kind = if round.retry { "Retry" } else { "Exam" };
            let timed_out = match round.reason {
                SubmitReason::TimedOut => " (time ran out)",
                SubmitReason::Manual => "",
            };
            out.push_str(&format!(
                "\n{} {}: {}/{} ({}%){}\n",
                kind,
                n + 1,
                round.correct,
                round.total,
                round.percent,
                timed_out
            ));
            for (category, score) in &round.by_category {
                out.push_str(&format!(
                    "  {:<13} {}/{}\n",
                    category.as_str(),
                    score.correct,
                    score.total
                ));
            }
            for review in &round.missed {
                let picked = review.picked_choice.as_deref().unwrap_or("(no answer)");
                out.push_str(&format!(
                    "  ✗ {}\n    yours: {} | correct: {}\n    {}\n",
                    review.text, picked, review.correct_choice, review.explanation
                ));
            }
        }
        out
    }
}
