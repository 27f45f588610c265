use crate::domain::{Commit, Tag};
use crate::error::{ReleaseError, Result};
use crate::hosting::{
    Branch, ChangedFile, CheckRun, CommitComparison, CommitDetails, Hosting, NewRelease,
    PullRequest, Release, Repository, WorkflowRun,
};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

/// In-memory hosting for testing without network access
///
/// `compare_commits` returns every added commit in insertion order,
/// regardless of the requested range.
pub struct MockHosting {
    repository: Repository,
    branches: HashMap<String, Branch>,
    tags: Vec<Tag>,
    commits: Vec<Commit>,
    comparison_files: Option<Vec<ChangedFile>>,
    commit_files: HashMap<String, Vec<ChangedFile>>,
    pull_requests: HashMap<String, Vec<PullRequest>>,
    check_runs: HashMap<String, Vec<CheckRun>>,
    workflow_runs: HashMap<u64, WorkflowRun>,
    releases: Mutex<Vec<Release>>,
    created: Mutex<Vec<NewRelease>>,
    requested_workflow_runs: Mutex<Vec<u64>>,
}

impl MockHosting {
    /// Create a mock repository with `main` as default branch
    pub fn new() -> Self {
        MockHosting {
            repository: Repository {
                full_name: "acme/widgets".to_string(),
                html_url: "https://github.com/acme/widgets".to_string(),
                default_branch: "main".to_string(),
            },
            branches: HashMap::new(),
            tags: Vec::new(),
            commits: Vec::new(),
            comparison_files: None,
            commit_files: HashMap::new(),
            pull_requests: HashMap::new(),
            check_runs: HashMap::new(),
            workflow_runs: HashMap::new(),
            releases: Mutex::new(Vec::new()),
            created: Mutex::new(Vec::new()),
            requested_workflow_runs: Mutex::new(Vec::new()),
        }
    }

    pub fn repository_url(&self) -> &str {
        &self.repository.html_url
    }

    /// Set a branch head
    pub fn set_branch_head(&mut self, name: impl Into<String>, sha: impl Into<String>) {
        let name = name.into();
        self.branches.insert(
            name.clone(),
            Branch {
                name,
                commit_sha: sha.into(),
            },
        );
    }

    /// Add a tag pointing to a commit
    pub fn add_tag(&mut self, name: impl Into<String>, sha: impl Into<String>) {
        self.tags.push(Tag::new(name, sha));
    }

    /// Add a commit to the compared range
    pub fn add_commit(&mut self, commit: Commit) {
        self.commits.push(commit);
    }

    /// Files reported by the comparison
    pub fn set_comparison_files(&mut self, filenames: &[&str]) {
        self.comparison_files = Some(filenames.iter().map(|f| changed_file(f)).collect());
    }

    /// Files reported for a single commit
    pub fn set_commit_files(&mut self, sha: impl Into<String>, filenames: &[&str]) {
        self.commit_files.insert(
            sha.into(),
            filenames.iter().map(|f| changed_file(f)).collect(),
        );
    }

    /// Associate a pull request with a commit
    pub fn add_pull_request(&mut self, sha: impl Into<String>, pull_request: PullRequest) {
        self.pull_requests
            .entry(sha.into())
            .or_default()
            .push(pull_request);
    }

    /// Report a check run for a commit
    pub fn add_check_run(&mut self, sha: impl Into<String>, check_run: CheckRun) {
        self.check_runs.entry(sha.into()).or_default().push(check_run);
    }

    pub fn add_workflow_run(&mut self, run: WorkflowRun) {
        self.workflow_runs.insert(run.id, run);
    }

    /// Register an already published release
    pub fn add_release(&mut self, tag_name: impl Into<String>) {
        if let Ok(mut releases) = self.releases.lock() {
            let id = releases.len() as u64 + 1;
            let tag_name = tag_name.into();
            releases.push(Release {
                id,
                html_url: format!("{}/releases/tag/{}", self.repository.html_url, tag_name),
                name: Some(tag_name.clone()),
                tag_name,
            });
        }
    }

    /// Releases created through [Hosting::create_release]
    pub fn created_releases(&self) -> Vec<NewRelease> {
        self.created
            .lock()
            .map(|created| created.clone())
            .unwrap_or_default()
    }

    /// Workflow run ids looked up so far
    pub fn requested_workflow_runs(&self) -> Vec<u64> {
        self.requested_workflow_runs
            .lock()
            .map(|ids| ids.clone())
            .unwrap_or_default()
    }
}

impl Default for MockHosting {
    fn default() -> Self {
        Self::new()
    }
}

fn changed_file(filename: &str) -> ChangedFile {
    ChangedFile {
        filename: filename.to_string(),
        blob_url: None,
    }
}

fn poisoned() -> ReleaseError {
    ReleaseError::hosting("mock state lock poisoned")
}

fn not_found(what: String) -> ReleaseError {
    ReleaseError::Hosting {
        status: Some(404),
        message: format!("Not Found: {}", what),
    }
}

#[async_trait]
impl Hosting for MockHosting {
    async fn repository(&self) -> Result<Repository> {
        Ok(self.repository.clone())
    }

    async fn branch(&self, name: &str) -> Result<Branch> {
        self.branches
            .get(name)
            .cloned()
            .ok_or_else(|| not_found(format!("branch {}", name)))
    }

    async fn list_tags(&self) -> Result<Vec<Tag>> {
        Ok(self.tags.clone())
    }

    async fn compare_commits(&self, base_sha: &str, head_sha: &str) -> Result<CommitComparison> {
        Ok(CommitComparison {
            html_url: format!(
                "{}/compare/{}...{}",
                self.repository.html_url, base_sha, head_sha
            ),
            commits: self.commits.clone(),
            files: self.comparison_files.clone(),
        })
    }

    async fn commit(&self, sha: &str) -> Result<CommitDetails> {
        let commit = self
            .commits
            .iter()
            .find(|c| c.sha == sha)
            .cloned()
            .ok_or_else(|| not_found(format!("commit {}", sha)))?;
        Ok(CommitDetails {
            commit,
            files: self.commit_files.get(sha).cloned().unwrap_or_default(),
        })
    }

    async fn pull_requests_for_commit(&self, sha: &str) -> Result<Vec<PullRequest>> {
        Ok(self.pull_requests.get(sha).cloned().unwrap_or_default())
    }

    async fn check_runs_for_ref(&self, sha: &str) -> Result<Vec<CheckRun>> {
        Ok(self.check_runs.get(sha).cloned().unwrap_or_default())
    }

    async fn workflow_run(&self, run_id: u64) -> Result<WorkflowRun> {
        self.requested_workflow_runs
            .lock()
            .map_err(|_| poisoned())?
            .push(run_id);
        self.workflow_runs
            .get(&run_id)
            .cloned()
            .ok_or_else(|| not_found(format!("workflow run {}", run_id)))
    }

    async fn release_by_tag(&self, tag: &str) -> Result<Option<Release>> {
        let releases = self.releases.lock().map_err(|_| poisoned())?;
        Ok(releases.iter().find(|r| r.tag_name == tag).cloned())
    }

    async fn create_release(&self, release: &NewRelease) -> Result<Release> {
        self.created
            .lock()
            .map_err(|_| poisoned())?
            .push(release.clone());

        let mut releases = self.releases.lock().map_err(|_| poisoned())?;
        let created = Release {
            id: releases.len() as u64 + 1,
            tag_name: release.tag_name.clone(),
            name: Some(release.name.clone()),
            html_url: format!(
                "{}/releases/tag/{}",
                self.repository.html_url, release.tag_name
            ),
        };
        releases.push(created.clone());
        Ok(created)
    }
}
