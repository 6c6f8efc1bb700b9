//! Persistence for decks, question banks, attempt history and progress.
//!
//! This module provides file-based and in-memory backends.

pub mod file;
pub mod memory;
pub mod traits;

pub use file::FileCoachStore;
pub use memory::MemoryCoachStore;
pub use traits::CoachStore;
