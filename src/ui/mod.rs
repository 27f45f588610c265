//! User interface module - console reporting of the release decision.
//!
//! - `formatter` - Pure formatting functions
//! - This module - Reporting a whole [ReleaseOutcome]

pub mod formatter;

pub use formatter::{
    display_error, display_release_notes, display_skip, display_status, display_success,
    format_release_headline, format_skip,
};

use crate::outcome::ReleaseOutcome;

/// Print the outcome of a run.
///
/// Releases print their headline, URL and notes to stdout, skips print
/// the reason, failures go to stderr.
pub fn display_outcome(outcome: &ReleaseOutcome) {
    match outcome {
        ReleaseOutcome::Released { plan, release } => {
            display_success(&format_release_headline(plan, release.is_none()));
            if let Some(release) = release {
                display_status(&release.html_url);
            }
            display_release_notes(&plan.description);
        }
        ReleaseOutcome::Skipped { reason } => display_skip(reason),
        ReleaseOutcome::Failed { error } => display_error(&error.to_string()),
    }
}
