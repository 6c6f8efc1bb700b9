//! Study coach CLI
//!
//! Entry point with global panic handler.

use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use coach::config::{coach_home, Config};
use coach::core::{Category, Rating};
use coach::error::exit_codes;
use coach::storage::FileCoachStore;

// =============================================================================
// CLI Definition
// =============================================================================

/// Spaced repetition, civics mock exams and B1 skill scoring
#[derive(Parser)]
#[command(name = "coach")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the next flashcard, or grade it with --rating
    Review {
        /// Rating for the shown card (again, hard, easy or 0, 1, 3)
        #[arg(long, short)]
        rating: Option<String>,
        /// Review this card instead of the next due one
        #[arg(long)]
        card: Option<String>,
        /// Output as JSON
        #[arg(long, short)]
        json: bool,
        /// Suppress output
        #[arg(long, short)]
        quiet: bool,
    },

    /// Multiple-choice vocabulary quiz (answers on stdin)
    Quiz {
        /// Number of questions
        #[arg(long)]
        size: Option<usize>,
        /// Seed for a reproducible quiz
        #[arg(long)]
        seed: Option<u64>,
        /// Output as JSON
        #[arg(long, short)]
        json: bool,
        /// Suppress output
        #[arg(long, short)]
        quiet: bool,
    },

    /// Timed civics mock exam (answers on stdin)
    Exam {
        /// Only ask questions from this category
        #[arg(long, short)]
        category: Option<String>,
        /// Number of questions
        #[arg(long)]
        size: Option<usize>,
        /// Time limit in minutes
        #[arg(long)]
        minutes: Option<u32>,
        /// Seed for a reproducible question draw
        #[arg(long)]
        seed: Option<u64>,
        /// Do not offer to retry missed questions
        #[arg(long)]
        no_retry: bool,
        /// Output as JSON
        #[arg(long, short)]
        json: bool,
        /// Suppress output
        #[arg(long, short)]
        quiet: bool,
    },

    /// Untimed practice over the question bank (answers on stdin)
    Drill {
        /// Only drill questions from this category
        #[arg(long, short)]
        category: Option<String>,
        /// Number of questions (default: one pass)
        #[arg(long)]
        count: Option<usize>,
        /// Output as JSON
        #[arg(long, short)]
        json: bool,
        /// Suppress output
        #[arg(long, short)]
        quiet: bool,
    },

    /// B1 reading or listening block (answers on stdin)
    Comprehension {
        /// Set to run
        #[arg(long)]
        set: Option<String>,
        /// List the available sets
        #[arg(long)]
        list: bool,
        /// Output as JSON
        #[arg(long, short)]
        json: bool,
        /// Suppress output
        #[arg(long, short)]
        quiet: bool,
    },

    /// Score a written answer
    Write {
        /// Text file to score
        file: PathBuf,
        /// Lower bound of the target word range
        #[arg(long)]
        min: Option<u32>,
        /// Upper bound of the target word range
        #[arg(long)]
        max: Option<u32>,
        /// Record the attempt in history
        #[arg(long)]
        save: bool,
        /// Prompt identifier stored with the attempt
        #[arg(long)]
        prompt: Option<String>,
        /// Prompt title used in the attempt label
        #[arg(long)]
        title: Option<String>,
        /// Output as JSON
        #[arg(long, short)]
        json: bool,
        /// Suppress output
        #[arg(long, short)]
        quiet: bool,
    },

    /// Score a spoken answer from its length and optional transcript
    Speak {
        /// Recording length in seconds
        #[arg(long, short)]
        duration: f64,
        /// Transcript file
        #[arg(long, short)]
        transcript: Option<PathBuf>,
        /// Record the attempt in history
        #[arg(long)]
        save: bool,
        /// Speaking card identifier stored with the attempt
        #[arg(long)]
        card: Option<String>,
        /// Card title used in the attempt label
        #[arg(long)]
        title: Option<String>,
        /// Output as JSON
        #[arg(long, short)]
        json: bool,
        /// Suppress output
        #[arg(long, short)]
        quiet: bool,
    },

    /// Manage the flashcard deck
    Deck {
        /// Action to perform
        #[command(subcommand)]
        action: DeckSubcommand,
        /// Output as JSON
        #[arg(long, short, global = true)]
        json: bool,
        /// Suppress output
        #[arg(long, short, global = true)]
        quiet: bool,
    },

    /// Validate, import or export the question bank
    Bank {
        /// Action to perform
        #[command(subcommand)]
        action: BankSubcommand,
        /// Output as JSON
        #[arg(long, short, global = true)]
        json: bool,
        /// Suppress output
        #[arg(long, short, global = true)]
        quiet: bool,
    },

    /// Show recorded attempts
    History {
        /// Print CSV
        #[arg(long)]
        csv: bool,
        /// Only show the most recent attempts
        #[arg(long)]
        limit: Option<usize>,
        /// Output as JSON
        #[arg(long, short)]
        json: bool,
        /// Suppress output
        #[arg(long, short)]
        quiet: bool,
    },

    /// Write a default project config and seed the starter deck
    Init {
        /// Overwrite the config and reseed the deck
        #[arg(long)]
        force: bool,
        /// Output as JSON
        #[arg(long, short)]
        json: bool,
        /// Suppress output
        #[arg(long, short)]
        quiet: bool,
    },
}

#[derive(Subcommand)]
enum DeckSubcommand {
    /// Replace the deck with entries from a JSON file
    Import {
        /// File with `[{id, front, back, phonetic?, category?}]`
        file: PathBuf,
    },
    /// Replace the deck with the built-in starter phrases
    Starter,
    /// Put every card back into its first-review state
    Reset,
    /// List every card with its due date
    List,
}

#[derive(Subcommand)]
enum BankSubcommand {
    /// Check a bank file without storing it
    Validate {
        /// Bank file
        file: PathBuf,
    },
    /// Replace the stored bank with a file (only if it validates)
    Import {
        /// Bank file
        file: PathBuf,
    },
    /// Write the stored bank to a file
    Export {
        /// Destination file
        file: PathBuf,
    },
}

// =============================================================================
// Main Entry Point
// =============================================================================

fn main() -> ExitCode {
    // Set up panic handler
    setup_panic_handler();

    match run() {
        Ok(code) => code,
        Err(e) => {
            eprintln!("coach error: {}", e);
            ExitCode::from(exit_codes::ERROR as u8)
        }
    }
}

/// Set up a global panic handler.
///
/// Logs the panic to stderr and to the crash log in the coach home.
fn setup_panic_handler() {
    std::panic::set_hook(Box::new(|info| {
        eprintln!("coach panic: {}", info);

        if let Some(home) = coach_home() {
            let crash_log = home.join("crash.log");
            if let Ok(mut file) = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(&crash_log)
            {
                let timestamp = chrono::Utc::now().format("%Y-%m-%d %H:%M:%S UTC");
                let _ = writeln!(file, "[{}] {}", timestamp, info);
            }
        }

        std::process::exit(exit_codes::CRASH);
    }));
}

fn run() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let cwd = std::env::current_dir()?;

    match cli.command {
        Commands::Review {
            rating,
            card,
            json,
            quiet,
        } => run_review(rating, card, json, quiet, &cwd),
        Commands::Quiz {
            size,
            seed,
            json,
            quiet,
        } => run_quiz(size, seed, json, quiet, &cwd),
        Commands::Exam {
            category,
            size,
            minutes,
            seed,
            no_retry,
            json,
            quiet,
        } => {
            use coach::cli::exam::ExamOptions;
            let category = category.map(|c| c.parse::<Category>()).transpose()?;
            let options = ExamOptions {
                json,
                quiet,
                category,
                size,
                minutes,
                seed,
                no_retry,
            };
            run_exam(options, &cwd)
        }
        Commands::Drill {
            category,
            count,
            json,
            quiet,
        } => {
            let category = category.map(|c| c.parse::<Category>()).transpose()?;
            run_drill(category, count, json, quiet)
        }
        Commands::Comprehension {
            set,
            list,
            json,
            quiet,
        } => run_comprehension(set, list, json, quiet),
        Commands::Write {
            file,
            min,
            max,
            save,
            prompt,
            title,
            json,
            quiet,
        } => {
            use coach::cli::write::WriteOptions;
            let options = WriteOptions {
                json,
                quiet,
                min_words: min,
                max_words: max,
                save,
                prompt_id: prompt,
                title,
            };
            run_write(&file, options, &cwd)
        }
        Commands::Speak {
            duration,
            transcript,
            save,
            card,
            title,
            json,
            quiet,
        } => {
            use coach::cli::speak::SpeakOptions;
            let options = SpeakOptions {
                json,
                quiet,
                save,
                card_id: card,
                title,
            };
            run_speak(duration, transcript.as_deref(), options, &cwd)
        }
        Commands::Deck {
            action,
            json,
            quiet,
        } => run_deck(action, json, quiet, &cwd),
        Commands::Bank {
            action,
            json,
            quiet,
        } => run_bank(action, json, quiet),
        Commands::History {
            csv,
            limit,
            json,
            quiet,
        } => run_history(csv, limit, json, quiet),
        Commands::Init { force, json, quiet } => run_init(force, json, quiet, &cwd),
    }
}

// =============================================================================
// Command Handlers
// =============================================================================

/// Convert a success boolean to an exit code.
fn success_to_exit_code(success: bool) -> ExitCode {
    if success {
        ExitCode::from(exit_codes::SUCCESS as u8)
    } else {
        ExitCode::from(exit_codes::ERROR as u8)
    }
}

/// Print formatted output, ending it with a newline.
fn emit(formatted: &str) {
    if formatted.ends_with('\n') {
        print!("{}", formatted);
    } else if !formatted.is_empty() {
        println!("{}", formatted);
    }
}

/// Where interactive prompts go: stdout normally, stderr when stdout
/// carries JSON or nothing.
fn prompt_stream(json: bool, quiet: bool) -> Box<dyn Write> {
    if json || quiet {
        Box::new(io::stderr())
    } else {
        Box::new(io::stdout())
    }
}

fn run_review(
    rating: Option<String>,
    card: Option<String>,
    json: bool,
    quiet: bool,
    cwd: &Path,
) -> Result<ExitCode, Box<dyn std::error::Error>> {
    use coach::cli::review::{ReviewCommand, ReviewOptions};

    let rating = rating.map(|r| r.parse::<Rating>()).transpose()?;
    let config = Config::load_from_cwd(cwd);
    let store = FileCoachStore::new()?;

    let cmd = ReviewCommand::new(store, config);
    let options = ReviewOptions {
        json,
        quiet,
        rating,
        card_id: card,
    };

    let output = cmd.run(&options);
    emit(&cmd.format_output(&output, &options));

    Ok(success_to_exit_code(output.success))
}

fn run_quiz(
    size: Option<usize>,
    seed: Option<u64>,
    json: bool,
    quiet: bool,
    cwd: &Path,
) -> Result<ExitCode, Box<dyn std::error::Error>> {
    use coach::cli::quiz::{QuizCommand, QuizOptions};

    let config = Config::load_from_cwd(cwd);
    let store = FileCoachStore::new()?;

    let cmd = QuizCommand::new(store, config);
    let options = QuizOptions {
        json,
        quiet,
        size,
        seed,
    };

    let output = cmd.run(&options, io::stdin().lock(), prompt_stream(json, quiet));
    emit(&cmd.format_output(&output, &options));

    Ok(success_to_exit_code(output.success))
}

fn run_exam(
    options: coach::cli::exam::ExamOptions,
    cwd: &Path,
) -> Result<ExitCode, Box<dyn std::error::Error>> {
    use coach::cli::exam::ExamCommand;

    let config = Config::load_from_cwd(cwd);
    let store = FileCoachStore::new()?;

    let cmd = ExamCommand::new(store, config);
    let output = cmd.run(
        &options,
        io::stdin().lock(),
        prompt_stream(options.json, options.quiet),
    );
    emit(&cmd.format_output(&output, &options));

    Ok(success_to_exit_code(output.success))
}

fn run_drill(
    category: Option<Category>,
    count: Option<usize>,
    json: bool,
    quiet: bool,
) -> Result<ExitCode, Box<dyn std::error::Error>> {
    use coach::cli::drill::{DrillCommand, DrillOptions};

    let store = FileCoachStore::new()?;

    let cmd = DrillCommand::new(store);
    let options = DrillOptions {
        json,
        quiet,
        category,
        count,
    };

    let output = cmd.run(&options, io::stdin().lock(), prompt_stream(json, quiet));
    emit(&cmd.format_output(&output, &options));

    Ok(success_to_exit_code(output.success))
}

fn run_comprehension(
    set: Option<String>,
    list: bool,
    json: bool,
    quiet: bool,
) -> Result<ExitCode, Box<dyn std::error::Error>> {
    use coach::cli::comprehension::{ComprehensionCommand, ComprehensionOptions};

    let store = FileCoachStore::new()?;

    let cmd = ComprehensionCommand::new(store)?;
    let options = ComprehensionOptions {
        json,
        quiet,
        set_id: set,
        list,
    };

    let output = cmd.run(&options, io::stdin().lock(), prompt_stream(json, quiet));
    emit(&cmd.format_output(&output, &options));

    Ok(success_to_exit_code(output.success))
}

fn run_write(
    file: &Path,
    options: coach::cli::write::WriteOptions,
    cwd: &Path,
) -> Result<ExitCode, Box<dyn std::error::Error>> {
    use coach::cli::write::WriteCommand;

    let config = Config::load_from_cwd(cwd);
    let store = FileCoachStore::new()?;

    let cmd = WriteCommand::new(store, config);
    let output = cmd.run(file, &options);
    emit(&cmd.format_output(&output, &options));

    Ok(success_to_exit_code(output.success))
}

fn run_speak(
    duration: f64,
    transcript: Option<&Path>,
    options: coach::cli::speak::SpeakOptions,
    cwd: &Path,
) -> Result<ExitCode, Box<dyn std::error::Error>> {
    use coach::cli::speak::SpeakCommand;

    let config = Config::load_from_cwd(cwd);
    let store = FileCoachStore::new()?;

    let cmd = SpeakCommand::new(store, config);
    let output = cmd.run(duration, transcript, &options);
    emit(&cmd.format_output(&output, &options));

    Ok(success_to_exit_code(output.success))
}

fn run_deck(
    action: DeckSubcommand,
    json: bool,
    quiet: bool,
    cwd: &Path,
) -> Result<ExitCode, Box<dyn std::error::Error>> {
    use coach::cli::deck::{DeckAction, DeckCommand, DeckOptions};

    let config = Config::load_from_cwd(cwd);
    let store = FileCoachStore::new()?;

    let action = match action {
        DeckSubcommand::Import { file } => DeckAction::Import(file),
        DeckSubcommand::Starter => DeckAction::Starter,
        DeckSubcommand::Reset => DeckAction::Reset,
        DeckSubcommand::List => DeckAction::List,
    };

    let cmd = DeckCommand::new(store, config);
    let options = DeckOptions { json, quiet };

    let output = cmd.run(&action, &options);
    emit(&cmd.format_output(&output, &options));

    Ok(success_to_exit_code(output.success))
}

fn run_bank(
    action: BankSubcommand,
    json: bool,
    quiet: bool,
) -> Result<ExitCode, Box<dyn std::error::Error>> {
    use coach::cli::bank::{BankAction, BankCommand, BankOptions};

    let store = FileCoachStore::new()?;

    let action = match action {
        BankSubcommand::Validate { file } => BankAction::Validate(file),
        BankSubcommand::Import { file } => BankAction::Import(file),
        BankSubcommand::Export { file } => BankAction::Export(file),
    };

    let cmd = BankCommand::new(store);
    let options = BankOptions { json, quiet };

    let output = cmd.run(&action, &options);
    emit(&cmd.format_output(&output, &options));

    Ok(success_to_exit_code(output.success))
}

fn run_history(
    csv: bool,
    limit: Option<usize>,
    json: bool,
    quiet: bool,
) -> Result<ExitCode, Box<dyn std::error::Error>> {
    use coach::cli::history::{HistoryCommand, HistoryOptions};

    let store = FileCoachStore::new()?;

    let cmd = HistoryCommand::new(store);
    let options = HistoryOptions {
        json,
        quiet,
        csv,
        limit,
    };

    let output = cmd.run(&options);
    emit(&cmd.format_output(&output, &options));

    Ok(success_to_exit_code(output.success))
}

fn run_init(
    force: bool,
    json: bool,
    quiet: bool,
    cwd: &Path,
) -> Result<ExitCode, Box<dyn std::error::Error>> {
    use coach::cli::init::{InitCommand, InitOptions};

    let store = FileCoachStore::new()?;

    let cmd = InitCommand::new(store, cwd);
    let options = InitOptions { json, quiet, force };

    let output = cmd.run(&options);
    emit(&cmd.format_output(&output, &options));

    Ok(success_to_exit_code(output.success))
}

// =============================================================================
// Tests
// =============================================================================
