use crate::domain::Version;
use crate::error::ReleaseError;
use crate::hosting::Release;
use std::fmt;

/// Reasons a run ends without a release.
/// These are not errors: the run succeeds and only reports why.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// No tag decodes to a version under the accepted prefixes
    NoVersionTags { repository_url: String },
    /// The last version carries a suffix such as `-SNAPSHOT`
    LastVersionHasSuffix { tag: String, version: String },
    /// Default branch head is the tagged commit
    NoCommits { tag: String, comparison_url: String },
    /// None of the changed files matches the expected globs
    NoExpectedFilesChanged { patterns: Vec<String> },
    /// A commit matched no prefix and no pull request label
    NotAllowedCommit {
        sha: String,
        message: String,
        html_url: String,
    },
    NoChangelogItems,
    ReleaseAlreadyExists { tag: String },
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::NoVersionTags { repository_url } => {
                write!(f, "No version tags found in {}", repository_url)
            }
            SkipReason::LastVersionHasSuffix { tag, version } => write!(
                f,
                "Last version '{}' (tag '{}') has a suffix",
                version, tag
            ),
            SkipReason::NoCommits {
                tag,
                comparison_url,
            } => write!(f, "No commits since tag '{}': {}", tag, comparison_url),
            SkipReason::NoExpectedFilesChanged { patterns } => write!(
                f,
                "No files changed that match expected patterns: {}",
                patterns.join(", ")
            ),
            SkipReason::NotAllowedCommit {
                sha,
                message,
                html_url,
            } => {
                let short_sha = sha.get(..7).unwrap_or(sha.as_str());
                write!(
                    f,
                    "Not allowed commit {} '{}': {}",
                    short_sha, message, html_url
                )
            }
            SkipReason::NoChangelogItems => write!(f, "No changelog items collected"),
            SkipReason::ReleaseAlreadyExists { tag } => {
                write!(f, "Release for tag '{}' already exists", tag)
            }
        }
    }
}

/// What the engine decided to publish
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleasePlan {
    pub branch: String,
    pub version: Version,
    pub tag: String,
    /// Rendered Markdown release notes
    pub description: String,
}

/// Result of one engine run
#[derive(Debug)]
pub enum ReleaseOutcome {
    /// `release` is `None` on dry run
    Released {
        plan: ReleasePlan,
        release: Option<Release>,
    },
    Skipped { reason: SkipReason },
    Failed { error: ReleaseError },
}

impl ReleaseOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(self, ReleaseOutcome::Failed { .. })
    }

    /// Process exit code for this outcome
    pub fn exit_code(&self) -> i32 {
        if self.is_failure() {
            1
        } else {
            0
        }
    }

    pub fn skip_reason(&self) -> Option<&SkipReason> {
        match self {
            ReleaseOutcome::Skipped { reason } => Some(reason),
            _ => None,
        }
    }
}

impl From<SkipReason> for ReleaseOutcome {
    fn from(reason: SkipReason) -> Self {
        ReleaseOutcome::Skipped { reason }
    }
}

impl From<ReleaseError> for ReleaseOutcome {
    fn from(error: ReleaseError) -> Self {
        ReleaseOutcome::Failed { error }
    }
}
