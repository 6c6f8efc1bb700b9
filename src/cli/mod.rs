//! CLI commands for the coach.
//!
//! Commands are grouped into:
//! - **Study**: review, quiz, exam, drill, comprehension (interactive)
//! - **Assessment**: write, speak (scored submissions)
//! - **Data**: deck, bank, history, init

pub mod answers;

// Study commands
pub mod comprehension;
pub mod drill;
pub mod exam;
pub mod quiz;
pub mod review;

// Assessment commands
pub mod speak;
pub mod write;

// Data commands
pub mod bank;
pub mod deck;
pub mod history;
pub mod init;

pub use bank::BankCommand;
pub use comprehension::ComprehensionCommand;
pub use deck::DeckCommand;
pub use drill::DrillCommand;
pub use exam::ExamCommand;
pub use history::HistoryCommand;
pub use init::InitCommand;
pub use quiz::QuizCommand;
pub use review::ReviewCommand;
pub use speak::SpeakCommand;
pub use write::WriteCommand;
