//! GitHub REST implementation of [Hosting]

use crate::domain::{Commit, Tag};
use crate::error::{ReleaseError, Result};
use crate::hosting::{
    collect_pages, Branch, ChangedFile, CheckRun, CommitComparison, CommitDetails, Hosting,
    NewRelease, PullRequest, Release, Repository, WorkflowRun, PER_PAGE,
};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, USER_AGENT};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

pub const DEFAULT_API_URL: &str = "https://api.github.com";
const API_VERSION: &str = "2022-11-28";

/// Connection settings for the GitHub API
#[derive(Debug, Clone)]
pub struct GitHubSettings {
    pub api_url: String,
    pub owner: String,
    pub repo: String,
    pub token: String,
}

impl GitHubSettings {
    /// Build settings from an `owner/name` repository slug
    pub fn new(api_url: &str, repository: &str, token: impl Into<String>) -> Result<Self> {
        let (owner, repo) = repository
            .split_once('/')
            .filter(|(owner, repo)| !owner.is_empty() && !repo.is_empty() && !repo.contains('/'))
            .ok_or_else(|| {
                ReleaseError::config(format!(
                    "Repository must be given as 'owner/name', got '{}'",
                    repository
                ))
            })?;

        Ok(GitHubSettings {
            api_url: api_url.trim_end_matches('/').to_string(),
            owner: owner.to_string(),
            repo: repo.to_string(),
            token: token.into(),
        })
    }
}

/// GitHub REST API client
#[derive(Debug, Clone)]
pub struct GitHubClient {
    settings: GitHubSettings,
    http: reqwest::Client,
}

impl GitHubClient {
    pub fn new(settings: GitHubSettings) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/vnd.github+json"),
        );
        headers.insert(
            "x-github-api-version",
            HeaderValue::from_static(API_VERSION),
        );
        let auth = HeaderValue::from_str(&format!("Bearer {}", settings.token))
            .map_err(|_| ReleaseError::config("GitHub token contains invalid characters"))?;
        headers.insert(AUTHORIZATION, auth);
        headers.insert(
            USER_AGENT,
            HeaderValue::from_static(concat!("release-gate/", env!("CARGO_PKG_VERSION"))),
        );

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;

        Ok(GitHubClient { settings, http })
    }

    fn repo_url(&self, path: &str) -> String {
        format!(
            "{}/repos/{}/{}{}",
            self.settings.api_url, self.settings.owner, self.settings.repo, path
        )
    }

    async fn get<T: DeserializeOwned>(&self, url: &str, query: &[(&str, String)]) -> Result<T> {
        debug!(url = %url, ?query, "GET");
        let response = self.http.get(url).query(query).send().await?;
        parse_response(response).await
    }

    async fn get_page<T: DeserializeOwned>(&self, url: &str, page: u32) -> Result<T> {
        self.get(
            url,
            &[
                ("per_page", PER_PAGE.to_string()),
                ("page", page.to_string()),
            ],
        )
        .await
    }
}

async fn parse_response<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
    let status = response.status();
    let body = response.text().await?;

    if !status.is_success() {
        return Err(ReleaseError::Hosting {
            status: Some(status.as_u16()),
            message: format!("GitHub API error {}: {}", status, body),
        });
    }

    serde_json::from_str(&body).map_err(|err| ReleaseError::Hosting {
        status: Some(status.as_u16()),
        message: format!("Invalid GitHub API response: {}", err),
    })
}

impl From<reqwest::Error> for ReleaseError {
    fn from(err: reqwest::Error) -> Self {
        ReleaseError::Hosting {
            status: err.status().map(|s| s.as_u16()),
            message: format!("HTTP request failed: {}", err),
        }
    }
}

#[async_trait]
impl Hosting for GitHubClient {
    async fn repository(&self) -> Result<Repository> {
        let repo: RepoPayload = self.get(&self.repo_url(""), &[]).await?;
        Ok(repo.into())
    }

    async fn branch(&self, name: &str) -> Result<Branch> {
        let branch: BranchPayload = self
            .get(&self.repo_url(&format!("/branches/{}", name)), &[])
            .await?;
        Ok(Branch {
            name: branch.name,
            commit_sha: branch.commit.sha,
        })
    }

    async fn list_tags(&self) -> Result<Vec<Tag>> {
        let url = self.repo_url("/tags");
        let tags: Vec<TagPayload> =
            collect_pages(|page| self.get_page::<Vec<TagPayload>>(&url, page)).await?;
        Ok(tags
            .into_iter()
            .map(|tag| Tag::new(tag.name, tag.commit.sha))
            .collect())
    }

    async fn compare_commits(&self, base_sha: &str, head_sha: &str) -> Result<CommitComparison> {
        let url = self.repo_url(&format!("/compare/{}...{}", base_sha, head_sha));
        let first: ComparisonPayload = self.get_page(&url, 1).await?;

        let mut commits = first.commits;
        let mut loaded = commits.len();
        let mut page = 2;
        while loaded >= PER_PAGE {
            let next: ComparisonPayload = self.get_page(&url, page).await?;
            loaded = next.commits.len();
            debug!(page, loaded, "Loaded commit comparison page");
            commits.extend(next.commits);
            page += 1;
        }

        Ok(CommitComparison {
            html_url: first.html_url,
            commits: commits.into_iter().map(Commit::from).collect(),
            files: first
                .files
                .map(|files| files.into_iter().map(ChangedFile::from).collect()),
        })
    }

    async fn commit(&self, sha: &str) -> Result<CommitDetails> {
        let commit: CommitPayload = self
            .get(&self.repo_url(&format!("/commits/{}", sha)), &[])
            .await?;
        let files = commit
            .files
            .clone()
            .unwrap_or_default()
            .into_iter()
            .map(ChangedFile::from)
            .collect();
        Ok(CommitDetails {
            commit: commit.into(),
            files,
        })
    }

    async fn pull_requests_for_commit(&self, sha: &str) -> Result<Vec<PullRequest>> {
        let url = self.repo_url(&format!("/commits/{}/pulls", sha));
        let pulls: Vec<PullRequestPayload> =
            collect_pages(|page| self.get_page::<Vec<PullRequestPayload>>(&url, page)).await?;
        Ok(pulls.into_iter().map(PullRequest::from).collect())
    }

    async fn check_runs_for_ref(&self, sha: &str) -> Result<Vec<CheckRun>> {
        let url = self.repo_url(&format!("/commits/{}/check-runs", sha));
        let runs: Vec<CheckRunPayload> = collect_pages(|page| {
            let url = url.as_str();
            async move {
                let list: CheckRunListPayload = self
                    .get(
                        url,
                        &[
                            ("filter", "latest".to_string()),
                            ("per_page", PER_PAGE.to_string()),
                            ("page", page.to_string()),
                        ],
                    )
                    .await?;
                Ok(list.check_runs)
            }
        })
        .await?;
        Ok(runs.into_iter().map(CheckRun::from).collect())
    }

    async fn workflow_run(&self, run_id: u64) -> Result<WorkflowRun> {
        let run: WorkflowRunPayload = self
            .get(&self.repo_url(&format!("/actions/runs/{}", run_id)), &[])
            .await?;
        Ok(run.into())
    }

    async fn release_by_tag(&self, tag: &str) -> Result<Option<Release>> {
        let url = self.repo_url(&format!("/releases/tags/{}", tag));
        match self.get::<ReleasePayload>(&url, &[]).await {
            Ok(release) => Ok(Some(release.into())),
            Err(err) if err.status() == Some(StatusCode::NOT_FOUND.as_u16()) => Ok(None),
            Err(err) => Err(err),
        }
    }

    async fn create_release(&self, release: &NewRelease) -> Result<Release> {
        let request = CreateReleaseRequest {
            tag_name: &release.tag_name,
            target_commitish: &release.target_commitish,
            name: &release.name,
            body: &release.body,
        };
        let response = self
            .http
            .post(self.repo_url("/releases"))
            .json(&request)
            .send()
            .await?;
        let created: ReleasePayload = parse_response(response).await?;
        Ok(created.into())
    }
}

// Wire formats, reduced to the fields the engine uses.

#[derive(Debug, Deserialize)]
struct RepoPayload {
    full_name: String,
    html_url: String,
    default_branch: String,
}

#[derive(Debug, Deserialize)]
struct ShaPayload {
    sha: String,
}

#[derive(Debug, Deserialize)]
struct BranchPayload {
    name: String,
    commit: ShaPayload,
}

#[derive(Debug, Deserialize)]
struct TagPayload {
    name: String,
    commit: ShaPayload,
}

#[derive(Debug, Deserialize)]
struct LoginPayload {
    login: String,
}

#[derive(Debug, Deserialize)]
struct GitCommitPayload {
    message: String,
}

#[derive(Debug, Deserialize)]
struct CommitPayload {
    sha: String,
    #[serde(default)]
    html_url: String,
    commit: GitCommitPayload,
    #[serde(default)]
    author: Option<LoginPayload>,
    #[serde(default)]
    files: Option<Vec<FilePayload>>,
}

#[derive(Debug, Clone, Deserialize)]
struct FilePayload {
    filename: String,
    #[serde(default)]
    blob_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ComparisonPayload {
    html_url: String,
    #[serde(default)]
    commits: Vec<CommitPayload>,
    #[serde(default)]
    files: Option<Vec<FilePayload>>,
}

#[derive(Debug, Deserialize)]
struct LabelPayload {
    name: String,
}

#[derive(Debug, Deserialize)]
struct PullRequestPayload {
    number: u64,
    title: String,
    html_url: String,
    #[serde(default)]
    user: Option<LoginPayload>,
    #[serde(default)]
    labels: Vec<LabelPayload>,
}

#[derive(Debug, Deserialize)]
struct IdPayload {
    id: u64,
}

#[derive(Debug, Deserialize)]
struct AppPayload {
    #[serde(default)]
    slug: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CheckRunPayload {
    id: u64,
    name: String,
    #[serde(default)]
    html_url: Option<String>,
    #[serde(default)]
    conclusion: Option<String>,
    #[serde(default)]
    check_suite: Option<IdPayload>,
    #[serde(default)]
    app: Option<AppPayload>,
}

#[derive(Debug, Deserialize)]
struct CheckRunListPayload {
    check_runs: Vec<CheckRunPayload>,
}

#[derive(Debug, Deserialize)]
struct WorkflowRunPayload {
    id: u64,
    #[serde(default)]
    check_suite_id: Option<u64>,
    #[serde(default)]
    actor: Option<LoginPayload>,
    path: String,
    html_url: String,
}

#[derive(Debug, Deserialize)]
struct ReleasePayload {
    id: u64,
    tag_name: String,
    #[serde(default)]
    name: Option<String>,
    html_url: String,
}

#[derive(Debug, Serialize)]
struct CreateReleaseRequest<'a> {
    tag_name: &'a str,
    target_commitish: &'a str,
    name: &'a str,
    body: &'a str,
}

impl From<RepoPayload> for Repository {
    fn from(repo: RepoPayload) -> Self {
        Repository {
            full_name: repo.full_name,
            html_url: repo.html_url,
            default_branch: repo.default_branch,
        }
    }
}

impl From<CommitPayload> for Commit {
    fn from(commit: CommitPayload) -> Self {
        Commit {
            sha: commit.sha,
            message: commit.commit.message,
            html_url: commit.html_url,
            author_login: commit.author.map(|a| a.login),
        }
    }
}

impl From<FilePayload> for ChangedFile {
    fn from(file: FilePayload) -> Self {
        ChangedFile {
            filename: file.filename,
            blob_url: file.blob_url,
        }
    }
}

impl From<PullRequestPayload> for PullRequest {
    fn from(pr: PullRequestPayload) -> Self {
        PullRequest {
            number: pr.number,
            title: pr.title,
            html_url: pr.html_url,
            author_login: pr.user.map(|u| u.login),
            labels: pr.labels.into_iter().map(|l| l.name).collect(),
        }
    }
}

impl From<CheckRunPayload> for CheckRun {
    fn from(run: CheckRunPayload) -> Self {
        CheckRun {
            id: run.id,
            name: run.name,
            html_url: run.html_url,
            conclusion: run.conclusion,
            check_suite_id: run.check_suite.map(|s| s.id),
            app_slug: run.app.and_then(|a| a.slug),
        }
    }
}

impl From<WorkflowRunPayload> for WorkflowRun {
    fn from(run: WorkflowRunPayload) -> Self {
        WorkflowRun {
            id: run.id,
            check_suite_id: run.check_suite_id,
            actor_login: run.actor.map(|a| a.login),
            path: run.path,
            html_url: run.html_url,
        }
    }
}

impl From<ReleasePayload> for Release {
    fn from(release: ReleasePayload) -> Self {
        Release {
            id: release.id,
            tag_name: release.tag_name,
            name: release.name,
            html_url: release.html_url,
        }
    }
}
