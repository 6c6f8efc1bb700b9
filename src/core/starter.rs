//! Built-in starter content shipped with the binary.

use crate::core::card::DeckEntry;
use crate::core::comprehension::ComprehensionSet;
use crate::error::{CoachError, Result};

const STARTER_DECK: &str = include_str!("../../data/starter_deck.json");
const COMPREHENSION_SETS: &str = include_str!("../../data/comprehension.json");

/// Seed entries for a first deck of everyday Polish phrases.
pub fn starter_deck() -> Result<Vec<DeckEntry>> {
    serde_json::from_str(STARTER_DECK)
        .map_err(|e| CoachError::serde(format!("starter deck: {}", e)))
}

/// Reading and listening blocks.
pub fn comprehension_sets() -> Result<Vec<ComprehensionSet>> {
    serde_json::from_str(COMPREHENSION_SETS)
        .map_err(|e| CoachError::serde(format!("comprehension sets: {}", e)))
}
