//! Progress indicators for the sendblocks CLI.

use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use reconcile::{ItemResult, Outcome, ProgressCallback, ResourceKind};
use std::time::Duration;

/// Create a spinner with a message
pub fn spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏ ")
            .template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}

/// Stop a spinner and leave nothing behind
pub fn finish_clear(pb: &ProgressBar) {
    pb.finish_and_clear();
}

/// Spinner-backed progress for deploy and destroy runs.
///
/// One spinner runs per API call; every finished item leaves a status line.
pub struct SpinnerProgress {
    current: Option<ProgressBar>,
    quiet: bool,
}

impl SpinnerProgress {
    pub fn new(quiet: bool) -> Self {
        Self {
            current: None,
            quiet,
        }
    }

    fn clear(&mut self) {
        if let Some(pb) = self.current.take() {
            pb.finish_and_clear();
        }
    }
}

impl Drop for SpinnerProgress {
    fn drop(&mut self) {
        self.clear();
    }
}

impl ProgressCallback for SpinnerProgress {
    fn on_phase_start(&mut self, kind: ResourceKind, count: usize) {
        self.clear();
        if !self.quiet && count > 0 {
            println!();
            println!("  {} {}", "→".cyan(), capitalize(kind.plural()).bold());
        }
    }

    fn on_item_start(&mut self, kind: ResourceKind, name: &str, action: &str) {
        self.clear();
        if !self.quiet {
            self.current = Some(spinner(&format!("{action} {kind} {name}...")));
        }
    }

    fn on_item_complete(&mut self, result: &ItemResult) {
        self.clear();
        if self.quiet {
            return;
        }
        match &result.outcome {
            Outcome::Deployed => println!("    {} {}", "✓".green(), result.name),
            Outcome::Destroyed => println!("    {} {} {}", "✓".green(), result.name, "(deleted)".dimmed()),
            Outcome::Skipped { reason: Some(reason) } => {
                println!("    {} {} {}", "○".yellow(), result.name, format!("({reason})").dimmed());
            }
            Outcome::Skipped { reason: None } => {
                log::debug!("Skipped {} {}", result.kind, result.name);
            }
            Outcome::Failed { error } => println!("    {} {}: {}", "✗".red(), result.name, error),
        }
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    chars
        .next()
        .map(|first| first.to_uppercase().chain(chars).collect())
        .unwrap_or_default()
}
