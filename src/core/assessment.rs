//! Heuristic auto-scoring for writing and speaking tasks.
//!
//! Scores are weighted sums of 0–100 sub-scores built from
//! [`text`](super::text) signals. They are proxies meant for self-study
//! feedback: they reward length, sentence structure, connector variety and
//! low hesitation, but they do not check grammar or meaning and must not be
//! presented as an examiner's grade.
//!
//! Writing weights:
//! - length: 0.25
//! - structure: 0.25
//! - connectors: 0.25
//! - spelling proxy: 0.15
//! - punctuation: 0.10
//!
//! Speaking weights:
//! - duration: 0.35
//! - fluency: 0.25
//! - lexical variety: 0.20
//! - structure: 0.20

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::{SpeakingConfig, WritingConfig};
use crate::core::text::{
    count_connectors, filler_ratio, punctuation_balance, spelling_proxy, unique_word_ratio,
    TextStats,
};

/// Sub-score weights.
pub mod weights {
    pub const WRITING_LENGTH: f64 = 0.25;
    pub const WRITING_STRUCTURE: f64 = 0.25;
    pub const WRITING_CONNECTORS: f64 = 0.25;
    pub const WRITING_SPELLING: f64 = 0.15;
    pub const WRITING_PUNCTUATION: f64 = 0.10;

    pub const SPEAKING_DURATION: f64 = 0.35;
    pub const SPEAKING_FLUENCY: f64 = 0.25;
    pub const SPEAKING_LEXICAL: f64 = 0.20;
    pub const SPEAKING_STRUCTURE: f64 = 0.20;
}

/// Words per sentence that earn a full structure score.
const TARGET_SENTENCE_LENGTH: f64 = 12.0;
/// Distinct connectors that earn a full connector score.
const TARGET_CONNECTORS: f64 = 4.0;
/// Cap on the length score when the text is too short.
const SHORT_TEXT_CAP: f64 = 0.6;
/// Cap on the length score when the text is too long.
const LONG_TEXT_CAP: f64 = 0.8;

/// Ideal speaking window in seconds.
const IDEAL_MIN_SECS: f64 = 60.0;
const IDEAL_MAX_SECS: f64 = 150.0;
/// Cap on the duration score below the ideal window.
const SHORT_SPEECH_CAP: f64 = 0.7;
/// Cap on the duration score above the ideal window.
const LONG_SPEECH_CAP: f64 = 0.85;
/// Type/token ratio at which lexical credit starts, and the span to full credit.
const LEXICAL_FLOOR: f64 = 0.35;
const LEXICAL_SPAN: f64 = 0.35;

/// Neutral stand-ins used when no transcript was supplied.
const NEUTRAL_UNIQUE_RATIO: f64 = 0.4;
const NEUTRAL_FILLER_RATIO: f64 = 0.1;
const SECONDS_PER_SENTENCE: f64 = 45.0;

/// Named sub-score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Metric {
    Length,
    Structure,
    Connectors,
    Spelling,
    Punctuation,
    Duration,
    Fluency,
    Lexical,
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Metric::Length => "length",
            Metric::Structure => "structure",
            Metric::Connectors => "connectors",
            Metric::Spelling => "spelling",
            Metric::Punctuation => "punctuation",
            Metric::Duration => "duration",
            Metric::Fluency => "fluency",
            Metric::Lexical => "lexical",
        };
        write!(f, "{name}")
    }
}

/// Counts the sub-scores were derived from.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DerivedStats {
    pub word_count: usize,
    pub sentence_count: usize,
    /// Rounded to one decimal.
    pub avg_sentence_length: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connector_count: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_sec: Option<f64>,
    /// False when speaking was scored on neutral stand-ins.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transcript_used: Option<bool>,
}

/// Result of one scoring call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreBreakdown {
    /// Weighted total, 0–100.
    pub total: u8,
    /// Individual sub-scores, each 0–100 (unrounded).
    pub subscores: BTreeMap<Metric, f64>,
    pub derived_stats: DerivedStats,
}

impl ScoreBreakdown {
    fn from_parts(parts: &[(Metric, f64, f64)], derived_stats: DerivedStats) -> Self {
        let weighted: f64 = parts.iter().map(|(_, score, weight)| score * weight).sum();
        Self {
            total: to_total(weighted),
            subscores: parts.iter().map(|(m, s, _)| (*m, *s)).collect(),
            derived_stats,
        }
    }

    fn zero(metrics: &[Metric], derived_stats: DerivedStats) -> Self {
        Self {
            total: 0,
            subscores: metrics.iter().map(|m| (*m, 0.0)).collect(),
            derived_stats,
        }
    }

    /// Look up one sub-score.
    pub fn subscore(&self, metric: Metric) -> Option<f64> {
        self.subscores.get(&metric).copied()
    }
}

/// Input for speaking assessment, supplied by the audio collaborator.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpeechSample {
    /// Length of the recording in seconds.
    pub duration_sec: f64,
    /// Optional transcript of the recording.
    #[serde(default)]
    pub transcript: Option<String>,
}

impl SpeechSample {
    pub fn new(duration_sec: f64, transcript: Option<String>) -> Self {
        Self {
            duration_sec,
            transcript,
        }
    }

    /// Transcript if present and not blank.
    fn transcript_text(&self) -> Option<&str> {
        self.transcript
            .as_deref()
            .filter(|t| !t.trim().is_empty())
    }
}

/// Scores writing and speaking submissions.
#[derive(Debug, Clone)]
pub struct AssessmentScorer {
    connectors: Vec<String>,
    fillers: Vec<String>,
    assumed_words_per_minute: f64,
}

impl Default for AssessmentScorer {
    fn default() -> Self {
        Self::new(&WritingConfig::default(), &SpeakingConfig::default())
    }
}

impl AssessmentScorer {
    /// Create a scorer with the given vocabularies.
    pub fn new(writing: &WritingConfig, speaking: &SpeakingConfig) -> Self {
        Self {
            connectors: writing.connectors.clone(),
            fillers: speaking.fillers.clone(),
            assumed_words_per_minute: speaking.assumed_words_per_minute.max(0.0),
        }
    }

    /// Score a written text against a target word range.
    ///
    /// Empty text scores 0. A reversed range is treated as its swap.
    pub fn score_writing(&self, text: &str, min_words: u32, max_words: u32) -> ScoreBreakdown {
        const METRICS: [Metric; 5] = [
            Metric::Length,
            Metric::Structure,
            Metric::Connectors,
            Metric::Spelling,
            Metric::Punctuation,
        ];

        let (min_words, max_words) = if min_words <= max_words {
            (min_words, max_words)
        } else {
            (max_words, min_words)
        };

        let stats = TextStats::of(text);
        let connectors = count_connectors(text, &self.connectors);
        let derived = DerivedStats {
            word_count: stats.word_count,
            sentence_count: stats.sentence_count,
            avg_sentence_length: round1(stats.avg_sentence_length),
            connector_count: Some(connectors),
            ..Default::default()
        };

        if stats.word_count == 0 {
            return ScoreBreakdown::zero(&METRICS, derived);
        }

        let length = length_score(stats.word_count, min_words, max_words);
        let structure = structure_score(stats.avg_sentence_length);
        let connector = 100.0 * (connectors as f64 / TARGET_CONNECTORS).clamp(0.0, 1.0);
        let spelling = 100.0 * spelling_proxy(text);
        let punctuation = 100.0 * punctuation_balance(text);

        ScoreBreakdown::from_parts(
            &[
                (Metric::Length, length, weights::WRITING_LENGTH),
                (Metric::Structure, structure, weights::WRITING_STRUCTURE),
                (Metric::Connectors, connector, weights::WRITING_CONNECTORS),
                (Metric::Spelling, spelling, weights::WRITING_SPELLING),
                (Metric::Punctuation, punctuation, weights::WRITING_PUNCTUATION),
            ],
            derived,
        )
    }

    /// Score a spoken answer from its duration and optional transcript.
    ///
    /// A missing transcript is not penalized: lexical and fluency inputs
    /// fall back to neutral values and structure is estimated from the
    /// duration. A sample with neither duration nor transcript scores 0.
    pub fn score_speaking(&self, sample: &SpeechSample) -> ScoreBreakdown {
        const METRICS: [Metric; 4] = [
            Metric::Duration,
            Metric::Fluency,
            Metric::Lexical,
            Metric::Structure,
        ];

        let duration_sec = if sample.duration_sec.is_finite() && sample.duration_sec > 0.0 {
            sample.duration_sec
        } else {
            if sample.duration_sec != 0.0 {
                tracing::debug!(duration = sample.duration_sec, "unusable duration, using 0");
            }
            0.0
        };
        let transcript = sample.transcript_text();

        let (unique_ratio, fillers, word_count, sentence_count) = match transcript {
            Some(text) => {
                let stats = TextStats::of(text);
                (
                    unique_word_ratio(text),
                    filler_ratio(text, &self.fillers),
                    stats.word_count as f64,
                    stats.sentence_count,
                )
            }
            None => (
                NEUTRAL_UNIQUE_RATIO,
                NEUTRAL_FILLER_RATIO,
                duration_sec / 60.0 * self.assumed_words_per_minute,
                ((duration_sec / SECONDS_PER_SENTENCE).round() as usize).max(1),
            ),
        };
        let avg_words = word_count / sentence_count.max(1) as f64;

        let derived = DerivedStats {
            word_count: word_count.round() as usize,
            sentence_count,
            avg_sentence_length: round1(avg_words),
            duration_sec: Some(duration_sec),
            transcript_used: Some(transcript.is_some()),
            ..Default::default()
        };

        if duration_sec == 0.0 && transcript.is_none() {
            return ScoreBreakdown::zero(&METRICS, derived);
        }

        let duration = duration_score(duration_sec);
        let fluency = 100.0 * (1.0 - 2.0 * fillers).clamp(0.0, 1.0);
        let lexical = 100.0 * ((unique_ratio - LEXICAL_FLOOR) / LEXICAL_SPAN).clamp(0.0, 1.0);
        let structure = structure_score(avg_words);

        ScoreBreakdown::from_parts(
            &[
                (Metric::Duration, duration, weights::SPEAKING_DURATION),
                (Metric::Fluency, fluency, weights::SPEAKING_FLUENCY),
                (Metric::Lexical, lexical, weights::SPEAKING_LEXICAL),
                (Metric::Structure, structure, weights::SPEAKING_STRUCTURE),
            ],
            derived,
        )
    }
}

/// Length sub-score for a word count against `[min_words, max_words]`.
fn length_score(words: usize, min_words: u32, max_words: u32) -> f64 {
    let words = words as f64;
    if words == 0.0 {
        0.0
    } else if words < f64::from(min_words) {
        100.0 * (words / f64::from(min_words)).clamp(0.0, 1.0) * SHORT_TEXT_CAP
    } else if words > f64::from(max_words) {
        100.0 * (f64::from(max_words) / words).clamp(0.0, 1.0) * LONG_TEXT_CAP
    } else {
        100.0
    }
}

/// Structure sub-score; never below 50.
fn structure_score(avg_words_per_sentence: f64) -> f64 {
    100.0 * (avg_words_per_sentence / TARGET_SENTENCE_LENGTH).clamp(0.5, 1.0)
}

/// Duration sub-score for a recording length in seconds.
fn duration_score(secs: f64) -> f64 {
    if secs <= 0.0 {
        0.0
    } else if secs < IDEAL_MIN_SECS {
        100.0 * (secs / IDEAL_MIN_SECS) * SHORT_SPEECH_CAP
    } else if secs > IDEAL_MAX_SECS {
        100.0 * (IDEAL_MAX_SECS / secs).clamp(0.0, 1.0) * LONG_SPEECH_CAP
    } else {
        100.0
    }
}

fn to_total(weighted: f64) -> u8 {
    if weighted.is_finite() {
        weighted.round().clamp(0.0, 100.0) as u8
    } else {
        0
    }
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
