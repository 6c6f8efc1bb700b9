//! Init command.
//!
//! Writes a project configuration file with the defaults and seeds the
//! starter deck when no deck exists yet.

use std::path::PathBuf;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::config::{project_coach_dir, Config};
use crate::core::{seed_deck, starter_deck, CardScheduler};
use crate::error::Result;
use crate::storage::CoachStore;

/// Options for the init command.
#[derive(Debug, Clone, Default)]
pub struct InitOptions {
    /// Output as JSON.
    pub json: bool,
    /// Suppress output.
    pub quiet: bool,
    /// Overwrite the config and reseed the deck.
    pub force: bool,
}

/// Output format for the init command.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InitOutput {
    /// Whether initialization was successful.
    pub success: bool,
    /// Things written.
    pub created: Vec<String>,
    /// Things that already existed (skipped).
    pub skipped: Vec<String>,
    /// Error message if initialization failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl InitOutput {
    /// Create a successful output.
    pub fn success(created: Vec<String>, skipped: Vec<String>) -> Self {
        Self {
            success: true,
            created,
            skipped,
            error: None,
        }
    }

    /// Create a failed output with partial success information.
    ///
    /// Reports what was created before the failure occurred.
    pub fn failure(error: impl Into<String>, created: Vec<String>, skipped: Vec<String>) -> Self {
        Self {
            success: false,
            created,
            skipped,
            error: Some(error.into()),
        }
    }
}

/// The init command implementation.
pub struct InitCommand<S: CoachStore> {
    store: S,
    cwd: PathBuf,
}

impl<S: CoachStore> InitCommand<S> {
    /// Create a new init command for the project in `cwd`.
    pub fn new(store: S, cwd: impl Into<PathBuf>) -> Self {
        Self {
            store,
            cwd: cwd.into(),
        }
    }

    /// Run the init command.
    pub fn run(&self, options: &InitOptions) -> InitOutput {
        let mut created = Vec::new();
        let mut skipped = Vec::new();

        match self.ensure_config(options.force) {
            Ok((path, true)) => created.push(path),
            Ok((path, false)) => skipped.push(path),
            Err(e) => return InitOutput::failure(e.to_string(), created, skipped),
        }

        match self.ensure_deck(options.force) {
            Ok((what, true)) => created.push(what),
            Ok((what, false)) => skipped.push(what),
            Err(e) => return InitOutput::failure(e.to_string(), created, skipped),
        }

        InitOutput::success(created, skipped)
    }

    /// Write `.coach/config.toml`. Returns the path and whether it was written.
    fn ensure_config(&self, force: bool) -> Result<(String, bool)> {
        let path = project_coach_dir(&self.cwd).join("config.toml");
        if path.exists() && !force {
            return Ok((path.display().to_string(), false));
        }
        let written = Config::default().save_project(&self.cwd)?;
        Ok((written.display().to_string(), true))
    }

    /// Seed the starter deck unless a deck is already stored.
    fn ensure_deck(&self, force: bool) -> Result<(String, bool)> {
        let existing = self.store.load_deck()?;
        if !existing.is_empty() && !force {
            return Ok((format!("deck ({} cards)", existing.len()), false));
        }

        let ease = CardScheduler::default().initial_ease();
        let deck = seed_deck(starter_deck()?, ease, Utc::now());
        self.store.save_deck(&deck)?;
        Ok((format!("starter deck ({} cards)", deck.len()), true))
    }

    /// Format output based on options.
    pub fn format_output(&self, output: &InitOutput, options: &InitOptions) -> String {
        if options.quiet {
            return String::new();
        }

        if options.json {
            serde_json::to_string_pretty(output).unwrap_or_else(|_| "{}".to_string())
        } else {
            self.format_human_readable(output)
        }
    }

    /// Format output as human-readable text.
    fn format_human_readable(&self, output: &InitOutput) -> String {
        let mut lines = Vec::new();

        if !output.success {
            lines.push(format!(
                "Init failed: {}",
                output.error.as_deref().unwrap_or("unknown error")
            ));
            if !output.created.is_empty() {
                lines.push("Created before failure:".to_string());
                lines.extend(output.created.iter().map(|p| format!("  {}", p)));
            }
            return lines.join("\n") + "\n";
        }

        if !output.created.is_empty() {
            lines.push("Created:".to_string());
            lines.extend(output.created.iter().map(|p| format!("  {}", p)));
        }
        if !output.skipped.is_empty() {
            lines.push("Already exists (skipped):".to_string());
            lines.extend(output.skipped.iter().map(|p| format!("  {}", p)));
        }
        if output.created.is_empty() {
            lines.push("Already initialized. Use --force to start over.".to_string());
        }

        lines.join("\n") + "\n"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Flashcard, QuestionBank};
    use crate::storage::MemoryCoachStore;
    use std::fs;
    use std::sync::Arc;
    use tempfile::TempDir;

    #[test]
    fn test_init_writes_config_and_deck() {
        let temp = TempDir::new().unwrap();
        let store = Arc::new(MemoryCoachStore::new());
        let cmd = InitCommand::new(Arc::clone(&store), temp.path());

        let output = cmd.run(&InitOptions::default());

        assert!(output.success);
        assert_eq!(output.created.len(), 2);
        let config_path = temp.path().join(".coach").join("config.toml");
        let loaded = Config::load_from_file(&config_path).unwrap();
        assert_eq!(loaded.exam.size, Config::default().exam.size);
        assert_eq!(store.load_deck().unwrap().len(), 15);
    }

    #[test]
    fn test_init_idempotent() {
        let temp = TempDir::new().unwrap();
        let store = Arc::new(MemoryCoachStore::new());
        let cmd = InitCommand::new(Arc::clone(&store), temp.path());

        cmd.run(&InitOptions::default());
        let output = cmd.run(&InitOptions::default());

        assert!(output.success);
        assert!(output.created.is_empty());
        assert_eq!(output.skipped.len(), 2);
        assert!(cmd
            .format_output(&output, &InitOptions::default())
            .contains("Already initialized"));
    }

    #[test]
    fn test_existing_deck_is_kept() {
        let temp = TempDir::new().unwrap();
        let deck = vec![Flashcard::new("mine", "kot", "cat", Utc::now())];
        let store = Arc::new(MemoryCoachStore::with_data(deck, QuestionBank::default()));
        let cmd = InitCommand::new(Arc::clone(&store), temp.path());

        let output = cmd.run(&InitOptions::default());

        assert_eq!(output.skipped, vec!["deck (1 cards)".to_string()]);
        assert_eq!(store.load_deck().unwrap()[0].id, "mine");
    }

    #[test]
    fn test_force_rewrites() {
        let temp = TempDir::new().unwrap();
        let store = Arc::new(MemoryCoachStore::new());
        let cmd = InitCommand::new(Arc::clone(&store), temp.path());
        cmd.run(&InitOptions::default());

        let config_path = temp.path().join(".coach").join("config.toml");
        fs::write(&config_path, "# modified").unwrap();

        let options = InitOptions {
            force: true,
            ..Default::default()
        };
        let output = cmd.run(&options);

        assert_eq!(output.created.len(), 2);
        let content = fs::read_to_string(&config_path).unwrap();
        assert!(content.contains("[exam]"));
    }

    #[test]
    fn test_format_output_json_and_quiet() {
        let temp = TempDir::new().unwrap();
        let cmd = InitCommand::new(Arc::new(MemoryCoachStore::new()), temp.path());
        let output = InitOutput::success(vec!["x".to_string()], vec![]);

        let json = InitOptions {
            json: true,
            ..Default::default()
        };
        assert!(cmd.format_output(&output, &json).contains("\"success\": true"));

        let quiet = InitOptions {
            quiet: true,
            ..Default::default()
        };
        assert!(cmd.format_output(&output, &quiet).is_empty());
    }

    #[test]
    fn test_format_output_partial_failure() {
        let temp = TempDir::new().unwrap();
        let cmd = InitCommand::new(Arc::new(MemoryCoachStore::new()), temp.path());
        let output = InitOutput::failure("permission denied", vec!["cfg".to_string()], vec![]);

        let text = cmd.format_output(&output, &InitOptions::default());

        assert!(text.contains("Init failed: permission denied"));
        assert!(text.contains("Created before failure:"));
    }
}
