//! Operator confirmation

use std::io::{self, BufRead, Write};

/// Asked once per operation before anything is mutated
pub trait Confirm: Send + Sync {
    fn confirm(&self, prompt: &str) -> bool;
}

/// Answers yes without asking (`--yes`)
#[derive(Debug, Clone, Copy, Default)]
pub struct AssumeYes;

impl Confirm for AssumeYes {
    fn confirm(&self, _prompt: &str) -> bool {
        true
    }
}

/// Reads a y/n answer from stdin
#[derive(Debug, Clone, Copy, Default)]
pub struct StdinPrompt;

impl Confirm for StdinPrompt {
    fn confirm(&self, prompt: &str) -> bool {
        let mut stdout = io::stdout();
        let _ = write!(stdout, "{prompt} [y/N] ");
        let _ = stdout.flush();

        let mut answer = String::new();
        if io::stdin().lock().read_line(&mut answer).is_err() {
            return false;
        }
        is_yes(&answer)
    }
}

fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_lowercase().as_str(), "y" | "yes")
}
