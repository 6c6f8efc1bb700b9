//! Attempt records handed to the history sink, and CSV export of them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::core::assessment::ScoreBreakdown;
use crate::core::comprehension::{ComprehensionScore, ComprehensionSet};
use crate::core::exam::{ExamResult, ExamSettings};
use crate::core::quiz::QuizOutcome;

/// Label used for mock exam attempts.
pub const EXAM_LABEL: &str = "Civics Mock";
/// Label used for vocabulary quiz attempts.
pub const QUIZ_LABEL: &str = "Vocab Quiz";

const CSV_HEADER: &str = "ts,label,score,meta";

/// One graded attempt, as stored in history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttemptRecord {
    /// Milliseconds since the Unix epoch.
    #[serde(rename = "ts", with = "chrono::serde::ts_milliseconds")]
    pub timestamp: DateTime<Utc>,
    pub label: String,
    /// 0–100.
    pub score: u8,
    /// Free-form details; the history sink does not interpret them.
    #[serde(default)]
    pub meta: Map<String, Value>,
}

impl AttemptRecord {
    pub fn new(
        label: impl Into<String>,
        score: u8,
        meta: Map<String, Value>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            timestamp: now,
            label: label.into(),
            score: score.min(100),
            meta,
        }
    }

    /// Saved writing task.
    pub fn writing(
        prompt_id: &str,
        prompt_title: &str,
        breakdown: &ScoreBreakdown,
        now: DateTime<Utc>,
    ) -> Self {
        Self::new(
            format!("B1 Writing – {}", prompt_title),
            breakdown.total,
            object(json!({
                "prompt": prompt_id,
                "words": breakdown.derived_stats.word_count,
            })),
            now,
        )
    }

    /// Saved speaking task.
    pub fn speaking(
        card_id: &str,
        card_title: &str,
        breakdown: &ScoreBreakdown,
        now: DateTime<Utc>,
    ) -> Self {
        Self::new(
            format!("B1 Speaking – {}", card_title),
            breakdown.total,
            object(json!({
                "card": card_id,
                "duration": breakdown.derived_stats.duration_sec.unwrap_or(0.0).round(),
            })),
            now,
        )
    }

    /// Graded mock exam.
    pub fn exam(result: &ExamResult, settings: &ExamSettings, now: DateTime<Utc>) -> Self {
        let category = settings
            .category
            .map_or_else(|| "all".to_string(), |c| c.to_string());
        Self::new(
            EXAM_LABEL,
            result.percent(),
            object(json!({
                "got": result.correct,
                "total": result.total,
                "category": category,
                "size": settings.size,
                "timeMinutes": settings.time_minutes,
            })),
            now,
        )
    }

    /// Finished vocabulary quiz.
    pub fn quiz(outcome: &QuizOutcome, now: DateTime<Utc>) -> Self {
        Self::new(
            QUIZ_LABEL,
            outcome.percent(),
            object(json!({
                "got": outcome.correct,
                "total": outcome.total,
            })),
            now,
        )
    }

    /// Graded reading or listening block.
    pub fn comprehension(
        set: &ComprehensionSet,
        score: &ComprehensionScore,
        now: DateTime<Utc>,
    ) -> Self {
        Self::new(
            format!("{} – {}", set.skill.label(), set.title),
            score.score,
            object(json!({
                "set": set.id,
                "got": score.correct,
                "total": score.total,
            })),
            now,
        )
    }
}

fn object(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

/// Render records as CSV.
///
/// Columns are `ts,label,score,meta`. Every field is quoted with inner
/// quotes doubled; `meta` is embedded as JSON. Rows are newline separated
/// without a trailing newline. An empty list yields the header and a newline.
pub fn to_csv(records: &[AttemptRecord]) -> String {
    if records.is_empty() {
        return format!("{}\n", CSV_HEADER);
    }

    let mut lines = Vec::with_capacity(records.len() + 1);
    lines.push(CSV_HEADER.to_string());
    for record in records {
        // Map<String, Value> always serializes
        let meta = serde_json::to_string(&record.meta).unwrap_or_default();
        let fields = [
            record.timestamp.timestamp_millis().to_string(),
            record.label.clone(),
            record.score.to_string(),
            meta,
        ];
        let row: Vec<String> = fields.iter().map(|f| quote(f)).collect();
        lines.push(row.join(","));
    }
    lines.join("\n")
}

fn quote(field: &str) -> String {
    format!("\"{}\"", field.replace('"', "\"\""))
}
