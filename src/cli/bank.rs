//! Bank command.
//!
//! Validates, imports and exports the civics question bank. An import
//! replaces the stored bank only when every question validates.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::core::{Category, QuestionBank};
use crate::error::{CoachError, Result};
use crate::storage::CoachStore;
use crate::util::read_to_string_limited;

/// What to do with the bank.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BankAction {
    /// Check a candidate file without storing it.
    Validate(PathBuf),
    /// Replace the stored bank with a candidate file.
    Import(PathBuf),
    /// Write the stored bank to a file.
    Export(PathBuf),
}

impl BankAction {
    fn name(&self) -> &'static str {
        match self {
            BankAction::Validate(_) => "validate",
            BankAction::Import(_) => "import",
            BankAction::Export(_) => "export",
        }
    }

    fn path(&self) -> &Path {
        match self {
            BankAction::Validate(p) | BankAction::Import(p) | BankAction::Export(p) => p,
        }
    }
}

/// Options for the bank command.
#[derive(Debug, Clone, Default)]
pub struct BankOptions {
    /// Output as JSON.
    pub json: bool,
    /// Suppress output.
    pub quiet: bool,
}

/// Output format for the bank command.
#[derive(Debug, Clone, Serialize)]
pub struct BankOutput {
    /// Whether the action succeeded.
    pub success: bool,
    pub action: String,
    pub path: String,
    /// Questions validated, imported or exported.
    pub count: usize,
    /// Categories present in the bank handled.
    pub categories: Vec<Category>,
    /// Position of the first invalid question, for validation failures.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub index: Option<usize>,
    /// Offending field, for validation failures.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    /// Error message if the action failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl BankOutput {
    /// Create a successful output.
    pub fn success(action: &BankAction, bank: &QuestionBank) -> Self {
        Self {
            success: true,
            action: action.name().to_string(),
            path: action.path().display().to_string(),
            count: bank.len(),
            categories: bank.categories(),
            index: None,
            field: None,
            error: None,
        }
    }

    /// Create a failed output.
    pub fn failure(action: &BankAction, error: &CoachError) -> Self {
        let (index, field) = match error {
            CoachError::Validation(inner) => (inner.index, Some(inner.field.clone())),
            _ => (None, None),
        };
        Self {
            success: false,
            action: action.name().to_string(),
            path: action.path().display().to_string(),
            count: 0,
            categories: Vec::new(),
            index,
            field: field.filter(|f| !f.is_empty()),
            error: Some(error.to_string()),
        }
    }
}

/// The bank command implementation.
pub struct BankCommand<S: CoachStore> {
    store: S,
}

impl<S: CoachStore> BankCommand<S> {
    /// Create a new bank command.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Run the bank command.
    pub fn run(&self, action: &BankAction, _options: &BankOptions) -> BankOutput {
        let result = match action {
            BankAction::Validate(path) => self.validate(path),
            BankAction::Import(path) => self.import(path),
            BankAction::Export(path) => self.export(path),
        };
        match result {
            Ok(bank) => BankOutput::success(action, &bank),
            Err(e) => BankOutput::failure(action, &e),
        }
    }

    fn validate(&self, path: &Path) -> Result<QuestionBank> {
        let text = read_to_string_limited(path)?;
        Ok(QuestionBank::from_json(&text)?)
    }

    fn import(&self, path: &Path) -> Result<QuestionBank> {
        let text = read_to_string_limited(path)?;
        let mut bank = self.store.load_bank()?;
        bank.replace_with(&text)?;
        self.store.save_bank(&bank)?;
        Ok(bank)
    }

    fn export(&self, path: &Path) -> Result<QuestionBank> {
        let bank = self.store.load_bank()?;
        if bank.is_empty() {
            return Err(CoachError::input(
                "question bank is empty; import one with `coach bank import`",
            ));
        }
        fs::write(path, bank.to_json()?).map_err(|e| CoachError::storage(path, e))?;
        Ok(bank)
    }

    /// Format the output for display.
    pub fn format_output(&self, output: &BankOutput, options: &BankOptions) -> String {
        if options.quiet {
            return String::new();
        }

        if options.json {
            serde_json::to_string_pretty(output).unwrap_or_else(|_| "{}".to_string())
        } else {
            self.format_human_readable(output)
        }
    }

    fn format_human_readable(&self, output: &BankOutput) -> String {
        if !output.success {
            return format!(
                "Bank {} failed: {}\n",
                output.action,
                output.error.as_deref().unwrap_or("unknown error")
            );
        }

        let categories: Vec<&str> = output.categories.iter().map(|c| c.as_str()).collect();
        let verb = match output.action.as_str() {
            "validate" => "Valid",
            "import" => "Imported",
            _ => "Exported",
        };
        format!(
            "{}: {} question(s) [{}] ({})\n",
            verb,
            output.count,
            categories.join(", "),
            output.path
        )
    }
}
