//! Pure formatting functions for UI output.
//!
//! `format_*` functions build the text; `display_*` functions print it.

use crate::outcome::{ReleasePlan, SkipReason};
use console::style;

/// Format and print an error message in red.
pub fn display_error(message: &str) {
    eprintln!("{} {}", style("ERROR:").red(), message);
}

/// Format and print a success message with green checkmark.
pub fn display_success(message: &str) {
    println!("{} {}", style("✓").green(), message);
}

/// Format and print a status message with yellow arrow.
pub fn display_status(message: &str) {
    println!("{} {}", style("→").yellow(), message);
}

/// Display a skip reason.
///
/// Shows a yellow marker followed by the reason; skipping is not a failure.
pub fn display_skip(reason: &SkipReason) {
    println!("{}", format_skip(reason));
}

pub fn format_skip(reason: &SkipReason) -> String {
    format!("{} {}", style("⚠ SKIPPED:").yellow(), reason)
}

/// Headline for a planned or created release
///
/// # Arguments
/// * `plan` - The computed release
/// * `dry_run` - Whether the release was only previewed
pub fn format_release_headline(plan: &ReleasePlan, dry_run: bool) -> String {
    let verb = if dry_run {
        "Would release"
    } else {
        "Released"
    };
    format!(
        "{} {} as tag {} on '{}'",
        verb,
        style(plan.version.to_string()).green().bold(),
        style(&plan.tag).cyan(),
        plan.branch
    )
}

/// Display the release notes, indented under a bold title
pub fn display_release_notes(description: &str) {
    println!("\n{}", style("Release notes:").bold());
    for line in description.lines() {
        println!("  {}", line);
    }
}
