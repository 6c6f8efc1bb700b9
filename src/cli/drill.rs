//! Drill command.
//!
//! Untimed practice over the question bank: answer, see the key and the
//! explanation right away, move on. Drills are not recorded in history.

use std::io::{BufRead, Write};

use serde::Serialize;

use crate::cli::answers::{Answer, AnswerReader};
use crate::core::{Category, Drill};
use crate::error::{CoachError, Result};
use crate::storage::CoachStore;

/// Options for the drill command.
#[derive(Debug, Clone, Default)]
pub struct DrillOptions {
    /// Output as JSON.
    pub json: bool,
    /// Suppress output.
    pub quiet: bool,
    /// Only drill questions from this category.
    pub category: Option<Category>,
    /// Questions to ask (default: one pass over the filtered bank).
    pub count: Option<usize>,
}

/// Output format for the drill command.
#[derive(Debug, Clone, Serialize)]
pub struct DrillOutput {
    /// Whether the drill ran.
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<Category>,
    pub answered: usize,
    pub correct: usize,
    pub skipped: usize,
    /// Error message if the drill could not run.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl DrillOutput {
    /// Create a failed output.
    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            category: None,
            answered: 0,
            correct: 0,
            skipped: 0,
            error: Some(error.into()),
        }
    }
}

/// The drill command implementation.
pub struct DrillCommand<S: CoachStore> {
    store: S,
}

impl<S: CoachStore> DrillCommand<S> {
    /// Create a new drill command.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Run the drill, reading answers from `input` and prompting on `prompt`.
    pub fn run<R: BufRead, W: Write>(
        &self,
        options: &DrillOptions,
        input: R,
        prompt: W,
    ) -> DrillOutput {
        match self.drill(options, AnswerReader::new(input, prompt)) {
            Ok(output) => output,
            Err(e) => DrillOutput::failure(e.to_string()),
        }
    }

    fn drill<R: BufRead, W: Write>(
        &self,
        options: &DrillOptions,
        mut reader: AnswerReader<R, W>,
    ) -> Result<DrillOutput> {
        let bank = self.store.load_bank()?;
        let mut drill = Drill::new(&bank, options.category);
        if drill.is_empty() {
            return Err(CoachError::input(match options.category {
                Some(category) => format!("no questions in category '{}'", category),
                None => "question bank is empty; import one with `coach bank import`".to_string(),
            }));
        }

        let count = options.count.unwrap_or(drill.len());
        let mut output = DrillOutput {
            success: true,
            category: options.category,
            answered: 0,
            correct: 0,
            skipped: 0,
            error: None,
        };

        for n in 0..count {
            let Some(question) = drill.current().cloned() else {
                break;
            };
            reader.say(&format!(
                "\n[{}/{}] {}\n{}\n",
                n + 1,
                count,
                question.category,
                question.text
            ));
            for (i, choice) in question.choices.iter().enumerate() {
                reader.say(&format!("  {}) {}\n", i + 1, choice));
            }
            reader.say("> ");

            match reader.next_answer(question.choices.len()) {
                Answer::Pick(choice) => {
                    drill.pick(choice)?;
                    let review = drill.reveal()?;
                    output.answered += 1;
                    if review.is_correct {
                        output.correct += 1;
                        reader.say("Correct.\n");
                    } else {
                        reader.say(&format!("Wrong, it is: {}\n", review.correct_choice));
                    }
                    reader.say(&format!("{}\n", review.explanation));
                    drill.advance()?;
                }
                Answer::Skip | Answer::Invalid => {
                    output.skipped += 1;
                    drill.skip()?;
                }
                Answer::Quit => break,
            }
        }

        tracing::debug!(
            answered = output.answered,
            correct = output.correct,
            "drill finished"
        );
        Ok(output)
    }

    /// Format the output for display.
    pub fn format_output(&self, output: &DrillOutput, options: &DrillOptions) -> String {
        if options.quiet {
            return String::new();
        }

        if options.json {
            serde_json::to_string_pretty(output).unwrap_or_else(|_| "{}".to_string())
        } else {
            self.format_human_readable(output)
        }
    }

    fn format_human_readable(&self, output: &DrillOutput) -> String {
        if !output.success {
            return format!(
                "Drill failed: {}\n",
                output.error.as_deref().unwrap_or("unknown error")
            );
        }

        format!(
            "\nDrill: {}/{} correct, {} skipped\n",
            output.correct, output.answered, output.skipped
        )
    }
}
