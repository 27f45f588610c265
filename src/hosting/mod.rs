//! Hosting platform abstraction layer
//!
//! The release engine only talks to the source-hosting platform through the
//! [Hosting] trait, which returns plain data values. Implementations:
//!
//! - [github::GitHubClient]: REST client for the GitHub API
//! - [mock::MockHosting]: in-memory implementation for testing
//!
//! Every call is awaited one at a time by the engine; implementations are
//! responsible for pagination and any transport-level retry.

pub mod github;
pub mod mock;

pub use github::{GitHubClient, GitHubSettings};
pub use mock::MockHosting;

use crate::domain::{Commit, Tag};
use crate::error::Result;
use async_trait::async_trait;
use std::future::Future;

/// Page size used for every paginated request
pub const PER_PAGE: usize = 100;

/// Repository information
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Repository {
    pub full_name: String,
    pub html_url: String,
    pub default_branch: String,
}

/// A branch and the commit at its tip
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Branch {
    pub name: String,
    pub commit_sha: String,
}

/// A file touched in a commit range
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangedFile {
    pub filename: String,
    pub blob_url: Option<String>,
}

/// Commits between a base and a head, oldest first
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitComparison {
    pub html_url: String,
    pub commits: Vec<Commit>,
    /// `None` when the platform did not report files
    pub files: Option<Vec<ChangedFile>>,
}

/// A single commit with the files it touched
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitDetails {
    pub commit: Commit,
    pub files: Vec<ChangedFile>,
}

/// A pull request associated with a commit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullRequest {
    pub number: u64,
    pub title: String,
    pub html_url: String,
    pub author_login: Option<String>,
    pub labels: Vec<String>,
}

/// A CI check run reported for a commit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckRun {
    pub id: u64,
    pub name: String,
    pub html_url: Option<String>,
    /// `None` while the run is still in progress
    pub conclusion: Option<String>,
    pub check_suite_id: Option<u64>,
    /// Slug of the application that created the run
    pub app_slug: Option<String>,
}

/// A workflow run of the platform's CI
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkflowRun {
    pub id: u64,
    pub check_suite_id: Option<u64>,
    pub actor_login: Option<String>,
    /// Workflow file path, e.g. `.github/workflows/build.yml`
    pub path: String,
    pub html_url: String,
}

/// A published release
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Release {
    pub id: u64,
    pub tag_name: String,
    pub name: Option<String>,
    pub html_url: String,
}

/// Parameters for creating a release
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRelease {
    pub target_commitish: String,
    pub tag_name: String,
    pub name: String,
    pub body: String,
}

/// Hosting operations the release engine needs
///
/// ## Error Handling
///
/// All methods return [crate::error::Result<T>]; transport and HTTP failures
/// map to [crate::error::ReleaseError::Hosting].
#[async_trait]
pub trait Hosting: Send + Sync {
    /// Repository the engine runs against
    async fn repository(&self) -> Result<Repository>;

    /// Branch by name
    async fn branch(&self, name: &str) -> Result<Branch>;

    /// All tags of the repository
    async fn list_tags(&self) -> Result<Vec<Tag>>;

    /// Commits reachable from `head_sha` but not from `base_sha`, oldest first
    async fn compare_commits(&self, base_sha: &str, head_sha: &str) -> Result<CommitComparison>;

    /// Single commit including its changed files
    async fn commit(&self, sha: &str) -> Result<CommitDetails>;

    /// Pull requests a commit belongs to
    async fn pull_requests_for_commit(&self, sha: &str) -> Result<Vec<PullRequest>>;

    /// Latest check runs reported for a commit
    async fn check_runs_for_ref(&self, sha: &str) -> Result<Vec<CheckRun>>;

    /// Workflow run by id
    async fn workflow_run(&self, run_id: u64) -> Result<WorkflowRun>;

    /// Release for a tag, `None` if there is none
    async fn release_by_tag(&self, tag: &str) -> Result<Option<Release>>;

    /// Create a release
    async fn create_release(&self, release: &NewRelease) -> Result<Release>;
}

/// Fetch pages 1, 2, ... while the last page was full, concatenating items
pub async fn collect_pages<T, F, Fut>(mut fetch_page: F) -> Result<Vec<T>>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<Vec<T>>>,
{
    let mut items = Vec::new();
    let mut page = 1;
    loop {
        let batch = fetch_page(page).await?;
        let loaded = batch.len();
        items.extend(batch);
        if loaded < PER_PAGE {
            return Ok(items);
        }
        page += 1;
    }
}
