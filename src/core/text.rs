//! Lexical and structural signals extracted from free text.
//!
//! Everything here is a pure function over `&str`. Letters are matched with
//! Unicode semantics, so Polish diacritics tokenize as ordinary letters.

use std::collections::HashSet;

/// Default discourse connectors (Polish).
pub const POLISH_CONNECTORS: &[&str] = &[
    "ponieważ",
    "dlatego",
    "chociaż",
    "jednak",
    "więc",
    "bo",
    "gdy",
    "kiedy",
    "następnie",
    "poza tym",
    "co więcej",
    "na przykład",
    "podsumowując",
    "w rezultacie",
    "zatem",
    "aby",
    "żeby",
];

/// Default disfluency fillers (Polish).
pub const POLISH_FILLERS: &[&str] = &[
    "eee",
    "yyy",
    "no",
    "tak jakby",
    "w sumie",
    "generalnie",
    "że tak powiem",
];

/// Characters that end a sentence.
const SENTENCE_TERMINATORS: &[char] = &['.', '!', '?', '…'];

/// Minimum token length considered by [`spelling_proxy`].
const SPELLING_MIN_LEN: usize = 3;

/// Lowercase, keep only letters, whitespace and apostrophes, split on
/// whitespace.
pub fn tokenize(text: &str) -> Vec<String> {
    let cleaned: String = text
        .to_lowercase()
        .chars()
        .map(|c| {
            if c.is_alphabetic() || c.is_whitespace() || c == '\'' {
                c
            } else {
                ' '
            }
        })
        .collect();

    cleaned.split_whitespace().map(str::to_string).collect()
}

/// Count runs of sentence-ending punctuation.
///
/// `"Hi... there!"` is two sentences. Non-blank text without any terminator
/// counts as one sentence; blank text counts as zero.
pub fn count_sentences(text: &str) -> usize {
    let mut runs = 0;
    let mut in_run = false;
    for c in text.chars() {
        let terminator = SENTENCE_TERMINATORS.contains(&c);
        if terminator && !in_run {
            runs += 1;
        }
        in_run = terminator;
    }

    if runs > 0 {
        runs
    } else if text.trim().is_empty() {
        0
    } else {
        1
    }
}

/// Count how many connectors from the vocabulary appear in the text.
///
/// Matching is case-insensitive on whole words; multi-word connectors must
/// appear as the same word sequence. Each connector counts at most once, so
/// the result rewards variety rather than repetition.
pub fn count_connectors<S: AsRef<str>>(text: &str, connectors: &[S]) -> usize {
    let haystack = padded(&tokenize(text));
    if haystack.trim().is_empty() {
        return 0;
    }

    connectors
        .iter()
        .map(|c| tokenize(c.as_ref()))
        .filter(|phrase| !phrase.is_empty())
        .filter(|phrase| haystack.contains(&padded(phrase)))
        .count()
}

/// Commas and semicolons per sentence, halved and clamped to `[0, 1]`.
///
/// Two clause separators per sentence counts as fully balanced.
pub fn punctuation_balance(text: &str) -> f64 {
    let separators = text.chars().filter(|c| matches!(c, ',' | ';')).count();
    let sentences = count_sentences(text).max(1);
    (separators as f64 / (2.0 * sentences as f64)).clamp(0.0, 1.0)
}

/// Distinct tokens over total tokens; 0 when there are no tokens.
pub fn unique_word_ratio(text: &str) -> f64 {
    let tokens = tokenize(text);
    if tokens.is_empty() {
        return 0.0;
    }
    let distinct: HashSet<&str> = tokens.iter().map(String::as_str).collect();
    distinct.len() as f64 / tokens.len() as f64
}

/// Share of tokens (3+ letters long) made only of letters.
///
/// A cheap plausibility signal, not a spellchecker: it only catches stray
/// symbols such as apostrophes glued into words. Returns 0 for text without
/// tokens and 1 when no token is long enough to judge.
pub fn spelling_proxy(text: &str) -> f64 {
    let tokens = tokenize(text);
    if tokens.is_empty() {
        return 0.0;
    }

    let eligible: Vec<&String> = tokens
        .iter()
        .filter(|t| t.chars().count() >= SPELLING_MIN_LEN)
        .collect();
    if eligible.is_empty() {
        return 1.0;
    }

    let clean = eligible
        .iter()
        .filter(|t| t.chars().all(char::is_alphabetic))
        .count();
    clean as f64 / eligible.len() as f64
}

/// Share of tokens that belong to a filler word or phrase.
///
/// Multi-word fillers ("tak jakby") cover all their tokens. Longer fillers
/// are matched first so they are not split into shorter ones.
pub fn filler_ratio<S: AsRef<str>>(text: &str, fillers: &[S]) -> f64 {
    let tokens = tokenize(text);
    if tokens.is_empty() {
        return 0.0;
    }

    let mut phrases: Vec<Vec<String>> = fillers
        .iter()
        .map(|f| tokenize(f.as_ref()))
        .filter(|p| !p.is_empty())
        .collect();
    phrases.sort_by(|a, b| b.len().cmp(&a.len()));

    let mut covered = 0;
    let mut i = 0;
    while i < tokens.len() {
        let hit = phrases
            .iter()
            .find(|p| tokens[i..].starts_with(p.as_slice()))
            .map(Vec::len);
        match hit {
            Some(len) => {
                covered += len;
                i += len;
            }
            None => i += 1,
        }
    }

    covered as f64 / tokens.len() as f64
}

/// Word and sentence counts for a piece of text.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextStats {
    pub word_count: usize,
    pub sentence_count: usize,
    /// Words per sentence, with at least one sentence assumed.
    pub avg_sentence_length: f64,
}

impl TextStats {
    /// Compute counts for `text`.
    pub fn of(text: &str) -> Self {
        let word_count = tokenize(text).len();
        let sentence_count = count_sentences(text);
        Self {
            word_count,
            sentence_count,
            avg_sentence_length: word_count as f64 / sentence_count.max(1) as f64,
        }
    }
}

fn padded(tokens: &[String]) -> String {
    format!(" {} ", tokens.join(" "))
}
