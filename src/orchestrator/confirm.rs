//! Confirmation prompts for destructive operations

use anyhow::{Context, Result};
use std::io::{stdin, stdout, BufRead, Write};

/// Asks the user to approve a destructive step
pub trait Confirm {
    fn confirm(&self, prompt: &str) -> Result<bool>;
}

/// Interactive y/N prompt on the terminal. EOF counts as "no".
#[derive(Debug, Clone, Copy, Default)]
pub struct StdinConfirm;

impl Confirm for StdinConfirm {
    fn confirm(&self, prompt: &str) -> Result<bool> {
        let mut out = stdout();
        write!(out, "{prompt} [y/N]: ")?;
        out.flush()?;

        let mut input = String::new();
        stdin()
            .lock()
            .read_line(&mut input)
            .context("Failed to read confirmation")?;
        if input.is_empty() {
            writeln!(out)?;
        }

        Ok(matches!(input.trim().to_lowercase().as_str(), "y" | "yes"))
    }
}

/// Fixed answer, for `--yes` and tests
#[derive(Debug, Clone, Copy)]
pub struct AutoConfirm(pub bool);

impl Confirm for AutoConfirm {
    fn confirm(&self, prompt: &str) -> Result<bool> {
        tracing::debug!(answer = self.0, "auto-confirm: {prompt}");
        Ok(self.0)
    }
}
