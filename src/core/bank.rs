//! Multiple-choice question banks for the civics exam.
//!
//! Banks arrive as untrusted JSON (imported files, saved state). [`validate`]
//! checks a parsed document element by element and stops at the first
//! problem, reporting the element's position and the offending field so the
//! learner gets one actionable message at a time.
//!
//! Expected element shape:
//!
//! ```json
//! {"id": "q1", "category": "history", "text": "...",
//!  "choices": ["a", "b", "c", "d"], "correctIndex": 1, "explanation": "..."}
//! ```
//!
//! Older exports used the short keys `cat`, `q`, `answer` and `expl`; they
//! are accepted on import and always written back with the long names.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{CoachError, Result};

/// Number of choices every question carries.
pub const CHOICES_PER_QUESTION: usize = 4;

/// Exam subject areas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Constitution,
    History,
    Geography,
    Culture,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::Constitution,
        Category::History,
        Category::Geography,
        Category::Culture,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Category::Constitution => "constitution",
            Category::History => "history",
            Category::Geography => "geography",
            Category::Culture => "culture",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = CoachError;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim().to_lowercase();
        Category::ALL
            .into_iter()
            .find(|c| c.as_str() == wanted)
            .ok_or_else(|| {
                CoachError::input(format!(
                    "unknown category '{}' (expected constitution, history, geography or culture)",
                    s
                ))
            })
    }
}

/// A validated exam question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExamQuestion {
    pub id: String,
    pub category: Category,
    pub text: String,
    pub choices: [String; CHOICES_PER_QUESTION],
    /// Index into `choices`, always below [`CHOICES_PER_QUESTION`].
    pub correct_index: usize,
    pub explanation: String,
}

impl ExamQuestion {
    /// Text of the correct choice.
    pub fn correct_choice(&self) -> &str {
        &self.choices[self.correct_index]
    }

    /// Whether `pick` is the correct choice. Unanswered is never correct.
    pub fn is_correct(&self, pick: Option<usize>) -> bool {
        pick == Some(self.correct_index)
    }

    /// Snapshot of the answer key for review, paired with the learner's pick.
    pub fn review(&self, pick: Option<usize>) -> QuestionReview {
        QuestionReview {
            question_id: self.id.clone(),
            category: self.category,
            text: self.text.clone(),
            picked: pick,
            picked_choice: pick.and_then(|i| self.choices.get(i)).cloned(),
            correct_index: self.correct_index,
            correct_choice: self.correct_choice().to_string(),
            explanation: self.explanation.clone(),
            is_correct: self.is_correct(pick),
        }
    }
}

/// Answer key for one question, as shown after it is answered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionReview {
    pub question_id: String,
    pub category: Category,
    pub text: String,
    pub picked: Option<usize>,
    pub picked_choice: Option<String>,
    pub correct_index: usize,
    pub correct_choice: String,
    pub explanation: String,
    pub is_correct: bool,
}

// =============================================================================
// Validation
// =============================================================================

/// What was wrong with a bank field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationProblem {
    /// The document is not valid JSON.
    Malformed(String),
    /// The document is not an array.
    NotAnArray,
    /// The element is not an object.
    NotAnObject,
    /// Required field is absent or null.
    Missing,
    /// Field has the wrong JSON type.
    WrongType { expected: &'static str },
    /// Category outside the fixed set.
    InvalidCategory(String),
    /// Choices array does not hold exactly four entries.
    WrongChoiceCount(usize),
    /// Correct index outside `0..=3`.
    IndexOutOfRange(i64),
}

/// First problem found in a candidate bank.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BankValidationError {
    /// Position of the offending element; `None` when the whole document is bad.
    pub index: Option<usize>,
    /// Field name, empty for document-level problems.
    pub field: String,
    pub problem: ValidationProblem,
}

impl BankValidationError {
    /// Problem with `field` of the element at `index`.
    pub fn at(index: usize, field: impl Into<String>, problem: ValidationProblem) -> Self {
        Self {
            index: Some(index),
            field: field.into(),
            problem,
        }
    }

    /// Problem with the document as a whole.
    pub fn document(problem: ValidationProblem) -> Self {
        Self {
            index: None,
            field: String::new(),
            problem,
        }
    }
}

impl fmt::Display for BankValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let field = &self.field;
        match &self.problem {
            ValidationProblem::Malformed(msg) => write!(f, "bank is not valid JSON: {}", msg),
            ValidationProblem::NotAnArray => write!(f, "bank must be an array"),
            ValidationProblem::NotAnObject => write!(f, "question must be an object"),
            ValidationProblem::Missing => write!(f, "{} missing", field),
            ValidationProblem::WrongType { expected } => {
                write!(f, "{} must be {}", field, expected)
            }
            ValidationProblem::InvalidCategory(value) => {
                write!(f, "invalid {} '{}'", field, value)
            }
            ValidationProblem::WrongChoiceCount(found) => write!(
                f,
                "{} {} needed, found {}",
                CHOICES_PER_QUESTION, field, found
            ),
            ValidationProblem::IndexOutOfRange(value) => write!(
                f,
                "{} {} out of range 0..={}",
                field,
                value,
                CHOICES_PER_QUESTION - 1
            ),
        }?;
        if let Some(index) = self.index {
            write!(f, " at #{}", index)?;
        }
        Ok(())
    }
}

impl std::error::Error for BankValidationError {}

/// Pairs of (canonical key, legacy key).
const ID: (&str, &str) = ("id", "id");
const CATEGORY: (&str, &str) = ("category", "cat");
const TEXT: (&str, &str) = ("text", "q");
const CHOICES: (&str, &str) = ("choices", "choices");
const CORRECT_INDEX: (&str, &str) = ("correctIndex", "answer");
const EXPLANATION: (&str, &str) = ("explanation", "expl");

/// Validate a parsed bank document.
///
/// Fails on the first invalid element. Fields are checked in the order id,
/// category, text, choices, correctIndex, explanation.
pub fn validate(candidate: &Value) -> std::result::Result<Vec<ExamQuestion>, BankValidationError> {
    let items = candidate
        .as_array()
        .ok_or_else(|| BankValidationError::document(ValidationProblem::NotAnArray))?;

    items
        .iter()
        .enumerate()
        .map(|(i, item)| validate_question(i, item))
        .collect()
}

/// Field access for one bank element, tagging errors with its position.
struct Element<'a> {
    index: usize,
    obj: &'a serde_json::Map<String, Value>,
}

impl<'a> Element<'a> {
    fn error(&self, field: impl Into<String>, problem: ValidationProblem) -> BankValidationError {
        BankValidationError::at(self.index, field, problem)
    }

    fn field(&self, key: (&str, &str)) -> std::result::Result<&'a Value, BankValidationError> {
        self.obj
            .get(key.0)
            .or_else(|| self.obj.get(key.1))
            .filter(|v| !v.is_null())
            .ok_or_else(|| self.error(key.0, ValidationProblem::Missing))
    }

    fn string(&self, key: (&str, &str)) -> std::result::Result<String, BankValidationError> {
        self.field(key)?.as_str().map(str::to_string).ok_or_else(|| {
            self.error(
                key.0,
                ValidationProblem::WrongType {
                    expected: "a string",
                },
            )
        })
    }
}

fn validate_question(
    index: usize,
    item: &Value,
) -> std::result::Result<ExamQuestion, BankValidationError> {
    let obj = item
        .as_object()
        .ok_or_else(|| BankValidationError::at(index, "", ValidationProblem::NotAnObject))?;
    let element = Element { index, obj };

    let id = element.string(ID)?;

    let raw_category = element.string(CATEGORY)?;
    let category = Category::ALL
        .into_iter()
        .find(|c| c.as_str() == raw_category)
        .ok_or_else(|| {
            element.error(
                CATEGORY.0,
                ValidationProblem::InvalidCategory(raw_category.clone()),
            )
        })?;

    let text = element.string(TEXT)?;

    let raw_choices = element.field(CHOICES)?.as_array().ok_or_else(|| {
        element.error(
            CHOICES.0,
            ValidationProblem::WrongType {
                expected: "an array",
            },
        )
    })?;
    if raw_choices.len() != CHOICES_PER_QUESTION {
        return Err(element.error(
            CHOICES.0,
            ValidationProblem::WrongChoiceCount(raw_choices.len()),
        ));
    }
    let mut choices: [String; CHOICES_PER_QUESTION] = Default::default();
    for (k, (slot, choice)) in choices.iter_mut().zip(raw_choices).enumerate() {
        *slot = choice.as_str().map(str::to_string).ok_or_else(|| {
            element.error(
                format!("{}[{}]", CHOICES.0, k),
                ValidationProblem::WrongType {
                    expected: "a string",
                },
            )
        })?;
    }

    let raw_index = element.field(CORRECT_INDEX)?.as_i64().ok_or_else(|| {
        element.error(
            CORRECT_INDEX.0,
            ValidationProblem::WrongType {
                expected: "an integer",
            },
        )
    })?;
    let correct_index = usize::try_from(raw_index)
        .ok()
        .filter(|i| *i < CHOICES_PER_QUESTION)
        .ok_or_else(|| element.error(CORRECT_INDEX.0, ValidationProblem::IndexOutOfRange(raw_index)))?;

    let explanation = element.string(EXPLANATION)?;

    Ok(ExamQuestion {
        id,
        category,
        text,
        choices,
        correct_index,
        explanation,
    })
}

// =============================================================================
// Bank
// =============================================================================

/// An ordered, validated set of exam questions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct QuestionBank {
    questions: Vec<ExamQuestion>,
}

impl QuestionBank {
    /// Bank from questions that are already validated (typed values are
    /// valid by construction).
    pub fn new(questions: Vec<ExamQuestion>) -> Self {
        Self { questions }
    }

    /// Parse and validate a JSON document.
    pub fn from_json(text: &str) -> std::result::Result<Self, BankValidationError> {
        let value: Value = serde_json::from_str(text).map_err(|e| {
            BankValidationError::document(ValidationProblem::Malformed(e.to_string()))
        })?;
        Self::from_value(&value)
    }

    /// Validate an already parsed document.
    pub fn from_value(value: &Value) -> std::result::Result<Self, BankValidationError> {
        validate(value).map(Self::new)
    }

    /// Pretty-printed JSON for export.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.questions)?)
    }

    /// Replace the held questions with a validated candidate.
    ///
    /// On failure the current questions are left untouched. Returns the new
    /// question count.
    pub fn replace_with(&mut self, text: &str) -> Result<usize> {
        let incoming = Self::from_json(text)?;
        tracing::info!(
            previous = self.questions.len(),
            imported = incoming.len(),
            "question bank replaced"
        );
        *self = incoming;
        Ok(self.questions.len())
    }

    pub fn questions(&self) -> &[ExamQuestion] {
        &self.questions
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    /// Questions in `category`, or all of them for `None`, in bank order.
    pub fn filter(&self, category: Option<Category>) -> Vec<ExamQuestion> {
        self.questions
            .iter()
            .filter(|q| category.map_or(true, |c| q.category == c))
            .cloned()
            .collect()
    }

    /// Categories that have at least one question, in fixed order.
    pub fn categories(&self) -> Vec<Category> {
        Category::ALL
            .into_iter()
            .filter(|c| self.questions.iter().any(|q| q.category == *c))
            .collect()
    }
}

// =============================================================================
// Drill
// =============================================================================

/// Untimed practice: one question at a time, reveal, next, wrap around.
#[derive(Debug, Clone)]
pub struct Drill {
    items: Vec<ExamQuestion>,
    position: usize,
    pick: Option<usize>,
    revealed: bool,
}

impl Drill {
    /// Drill over the bank questions in `category` (all for `None`).
    pub fn new(bank: &QuestionBank, category: Option<Category>) -> Self {
        Self {
            items: bank.filter(category),
            position: 0,
            pick: None,
            revealed: false,
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Zero-based position of the current question.
    pub fn position(&self) -> usize {
        self.position
    }

    pub fn current(&self) -> Option<&ExamQuestion> {
        self.items.get(self.position)
    }

    pub fn is_revealed(&self) -> bool {
        self.revealed
    }

    /// Choose an answer for the current question. Can change until revealed.
    pub fn pick(&mut self, choice: usize) -> Result<()> {
        if self.is_empty() {
            return Err(CoachError::invalid_state("Cannot pick in an empty drill"));
        }
        if self.revealed {
            return Err(CoachError::invalid_state(
                "Cannot change the answer after reveal",
            ));
        }
        if choice >= CHOICES_PER_QUESTION {
            return Err(CoachError::input(format!(
                "choice {} out of range 0..={}",
                choice,
                CHOICES_PER_QUESTION - 1
            )));
        }
        self.pick = Some(choice);
        Ok(())
    }

    /// Show the answer key for the current question. Requires a pick.
    pub fn reveal(&mut self) -> Result<QuestionReview> {
        let question = self
            .items
            .get(self.position)
            .ok_or_else(|| CoachError::invalid_state("Cannot reveal in an empty drill"))?;
        if self.pick.is_none() {
            return Err(CoachError::invalid_state("Cannot reveal before picking"));
        }
        self.revealed = true;
        Ok(question.review(self.pick))
    }

    /// Move to the next question, wrapping after the last. Requires reveal.
    pub fn advance(&mut self) -> Result<()> {
        if !self.revealed {
            return Err(CoachError::invalid_state("Cannot advance before reveal"));
        }
        self.next();
        Ok(())
    }

    /// Move on without answering the current question.
    pub fn skip(&mut self) -> Result<()> {
        if self.is_empty() {
            return Err(CoachError::invalid_state("Cannot skip in an empty drill"));
        }
        self.next();
        Ok(())
    }

    fn next(&mut self) {
        self.position = (self.position + 1) % self.items.len().max(1);
        self.pick = None;
        self.revealed = false;
    }
}
