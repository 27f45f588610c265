pub mod checks;
pub mod config;
pub mod domain;
pub mod engine;
pub mod error;
pub mod hosting;
pub mod matcher;
pub mod outcome;
pub mod ui;

pub use error::{ReleaseError, Result};
pub use outcome::{ReleaseOutcome, ReleasePlan, SkipReason};
