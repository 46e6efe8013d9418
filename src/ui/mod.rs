//! Terminal output for the command-line tool.
//!
//! Colored per-document status lines, a progress bar for directory runs and
//! the final summary. Everything here is presentation only; the log sink
//! remains the record of what happened.

use owo_colors::OwoColorize;
use std::io::IsTerminal;

use crate::models::{DocumentOutcome, PipelineState};
use crate::pipeline::RunSummary;

/// Check if stdout is a terminal.
pub fn is_terminal() -> bool {
    std::io::stdout().is_terminal()
}

/// Icon for a terminal pipeline state
pub fn state_icon(outcome: &DocumentOutcome) -> &'static str {
    match (outcome.state, outcome.renamed()) {
        (PipelineState::Done, true) => "✓",
        (PipelineState::Done, false) => "○",
        (PipelineState::Fallback, true) => "≈",
        _ => "✗",
    }
}

/// Truncate a string to `max_chars` characters, ending in "..." when cut
pub fn truncate_with_ellipsis(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        return s.to_string();
    }
    if max_chars <= 3 {
        return "...".to_string();
    }
    let kept: String = s.chars().take(max_chars - 3).collect();
    format!("{}...", kept)
}

/// One line describing a processed document
pub fn outcome_line(outcome: &DocumentOutcome) -> String {
    let old_name = outcome
        .source
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let icon = state_icon(outcome);

    let detail = match (&outcome.rename, &outcome.citation, &outcome.error) {
        (Some(rename), _, _) if rename.success => rename.final_name.clone(),
        (None, Some(citation), None) => format!("{} (dry run)", citation),
        (_, _, Some(error)) => truncate_with_ellipsis(error, 120),
        _ => String::new(),
    };

    let line = format!("{} {} → {}", icon, old_name, detail);
    if !is_terminal() {
        return line;
    }
    match icon {
        "✓" => line.green().to_string(),
        "≈" | "○" => line.yellow().to_string(),
        _ => line.red().to_string(),
    }
}

/// Progress bar for a directory run
pub fn create_progress_bar(len: u64) -> indicatif::ProgressBar {
    if !is_terminal() {
        return indicatif::ProgressBar::hidden();
    }

    let pb = indicatif::ProgressBar::new(len);
    if let Ok(style) = indicatif::ProgressStyle::with_template(
        "{spinner:.cyan} {bar:40.cyan/blue} {pos}/{len} {msg}",
    ) {
        pb.set_style(style.progress_chars("█▓▒░ "));
    }
    pb
}

/// Print the end-of-run summary
pub fn print_summary(summary: &RunSummary) {
    let done = summary.count(PipelineState::Done);
    let fallback = summary.count(PipelineState::Fallback);
    let aborted = summary.count(PipelineState::Aborted);

    println!();
    println!("{}", "Summary".bold());
    println!("  {} documents", summary.total());
    println!("  {} renamed", done.green());
    println!("  {} went through the sanitized fallback", fallback.yellow());
    println!("  {} left untouched", aborted.red());
}
