//! Release eligibility engine
//!
//! Orchestrates one release decision against a [Hosting] implementation:
//!
//! 1. select the last version tag
//! 2. compare the default branch with it
//! 3. require expected files to change
//! 4. gate on CI health
//! 5. walk the commits into changelog items
//! 6. compute the next version and publish the release
//!
//! Every hosting call is awaited in order; the first disallowed commit ends
//! the walk.

use crate::checks::CiHealthGate;
use crate::config::Config;
use crate::domain::{
    last_version_tag, render, ChangeLogEntry, ChangeLogItemType, ChangelogAggregator, Commit,
    TagPrefixes, RELEASE_SECTIONS,
};
use crate::error::{ReleaseError, Result};
use crate::hosting::{Hosting, NewRelease, PullRequest};
use crate::matcher::{
    any_label_matches, find_boundary_prefix, has_not_empty_intersection, login_allowed,
    parse_label_conditions, LabelCondition,
};
use crate::outcome::{ReleaseOutcome, ReleasePlan, SkipReason};
use glob::{MatchOptions, Pattern};
use tracing::{debug, info, warn};

/// `*` stays within one path segment and skips dotfiles
const EXPECTED_FILES_MATCH: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: true,
};

/// Result of processing one commit of the range
#[derive(Debug)]
pub enum CommitStep {
    Continue,
    AbortSkip(SkipReason),
    AbortFatal(ReleaseError),
}

/// Decides and publishes one release
pub struct ReleaseEngine<'a, H: Hosting + ?Sized> {
    hosting: &'a H,
    config: &'a Config,
    current_run_id: Option<u64>,
    allowed_labels: Vec<LabelCondition>,
    expected_files: Vec<Pattern>,
    check_actors: Vec<String>,
}

impl<'a, H: Hosting + ?Sized> ReleaseEngine<'a, H> {
    /// Compile the configured matchers
    ///
    /// # Errors
    /// * `Config` - A label regex or a file glob is invalid
    pub fn new(hosting: &'a H, config: &'a Config, current_run_id: Option<u64>) -> Result<Self> {
        let allowed_labels = parse_label_conditions(&config.allowed_pull_request_labels)?;
        let expected_files = config
            .expected_files_to_change
            .iter()
            .map(|glob| {
                Pattern::new(glob).map_err(|e| {
                    ReleaseError::config(format!("Invalid file pattern '{}': {}", glob, e))
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(ReleaseEngine {
            hosting,
            config,
            current_run_id,
            allowed_labels,
            expected_files,
            check_actors: config.check_actors_allowed_to_fail(),
        })
    }

    /// Run the decision, folding fatal errors into the outcome
    pub async fn run(&self) -> ReleaseOutcome {
        match self.decide().await {
            Ok(outcome) => outcome,
            Err(error) => {
                warn!(error = %error, "Release failed");
                ReleaseOutcome::Failed { error }
            }
        }
    }

    async fn decide(&self) -> Result<ReleaseOutcome> {
        let repository = self.hosting.repository().await?;
        info!(repository = %repository.full_name, "Deciding release");

        let prefixes = TagPrefixes::new(self.config.version_tag_prefixes());
        let tags = self.hosting.list_tags().await?;
        debug!(count = tags.len(), prefixes = ?prefixes.as_slice(), "Loaded tags");

        let Some(last) = last_version_tag(&tags, &prefixes) else {
            return Ok(SkipReason::NoVersionTags {
                repository_url: repository.html_url,
            }
            .into());
        };
        info!(tag = %last.tag.name, version = %last.version, "Last version tag");

        if last.version.has_suffix() {
            return Ok(SkipReason::LastVersionHasSuffix {
                tag: last.tag.name,
                version: last.version.to_string(),
            }
            .into());
        }

        let branch = self.hosting.branch(&repository.default_branch).await?;
        let comparison = self
            .hosting
            .compare_commits(&last.tag.commit_sha, &branch.commit_sha)
            .await?;
        info!(
            branch = %branch.name,
            count = comparison.commits.len(),
            "Compared {}",
            comparison.html_url
        );
        if comparison.commits.is_empty() {
            return Ok(SkipReason::NoCommits {
                tag: last.tag.name,
                comparison_url: comparison.html_url,
            }
            .into());
        }

        if !self.config.ignore_expected_files_to_change && !self.expected_files.is_empty() {
            let changed = match comparison.files {
                Some(files) => files.into_iter().map(|f| f.filename).collect(),
                None => self.changed_files(&comparison.commits).await?,
            };
            if !self.matches_expected_files(&changed) {
                return Ok(SkipReason::NoExpectedFilesChanged {
                    patterns: self.config.expected_files_to_change.clone(),
                }
                .into());
            }
        }

        CiHealthGate::new(
            self.hosting,
            &repository.html_url,
            &self.check_actors,
            &self.config.action_paths_allowed_to_fail,
            self.current_run_id,
        )
        .check(&branch.commit_sha)
        .await?;

        let mut changelog =
            ChangelogAggregator::new(self.config.skipped_changelog_commit_prefixes.clone());
        for commit in &comparison.commits {
            match self.process_commit(commit, &mut changelog).await {
                CommitStep::Continue => {}
                CommitStep::AbortSkip(reason) => return Ok(reason.into()),
                CommitStep::AbortFatal(error) => return Err(error),
            }
        }
        if changelog.is_empty() {
            return Ok(SkipReason::NoChangelogItems.into());
        }

        let version = last
            .version
            .increment(self.config.version_increment_mode)?;
        let tag = format!("{}{}", self.config.version_tag_prefix, version);
        info!(version = %version, tag = %tag, "Next release");

        if let Some(existing) = self.hosting.release_by_tag(&tag).await? {
            info!(url = %existing.html_url, "Release already exists");
            return Ok(SkipReason::ReleaseAlreadyExists { tag }.into());
        }

        let plan = ReleasePlan {
            branch: branch.name,
            description: render(changelog.items(), &RELEASE_SECTIONS),
            version,
            tag,
        };

        if self.config.dry_run {
            info!(tag = %plan.tag, "Dry run, not creating the release");
            return Ok(ReleaseOutcome::Released {
                plan,
                release: None,
            });
        }

        let release = self
            .hosting
            .create_release(&NewRelease {
                target_commitish: plan.branch.clone(),
                tag_name: plan.tag.clone(),
                name: plan.version.to_string(),
                body: plan.description.clone(),
            })
            .await?;
        info!(url = %release.html_url, "Release created");

        Ok(ReleaseOutcome::Released {
            plan,
            release: Some(release),
        })
    }

    /// Register one commit in the changelog or decide to stop
    pub async fn process_commit(
        &self,
        commit: &Commit,
        changelog: &mut ChangelogAggregator,
    ) -> CommitStep {
        let pull_requests = match self.hosting.pull_requests_for_commit(&commit.sha).await {
            Ok(pull_requests) => pull_requests,
            Err(error) => return CommitStep::AbortFatal(error),
        };

        // only the first allowed pull request describes the commit
        if let Some(pr) = pull_requests
            .iter()
            .find(|pr| any_label_matches(&pr.labels, &self.allowed_labels))
        {
            let item_type = self.classify_pull_request(pr);
            debug!(sha = %commit.sha, number = pr.number, "Commit allowed by pull request");
            changelog.add(ChangeLogEntry {
                commit,
                item_type,
                message: &pr.title,
                original_message: &pr.title,
                author: pr.author_login.as_deref(),
                pull_request_number: Some(pr.number),
            });
            return CommitStep::Continue;
        }

        let subject = commit.subject();
        if let Some(prefix) = find_boundary_prefix(subject, &self.config.allowed_commit_prefixes) {
            let author = commit.author_login.as_deref();
            let item_type = author
                .filter(|login| login_allowed(login, &self.config.dependency_updates_authors))
                .map(|_| ChangeLogItemType::Dependency);
            debug!(sha = %commit.sha, prefix = %prefix, "Commit allowed by prefix");
            changelog.add(ChangeLogEntry {
                commit,
                item_type,
                message: message_after_prefix(subject, prefix),
                original_message: subject,
                author,
                pull_request_number: None,
            });
            return CommitStep::Continue;
        }

        if self.config.fail_on_not_allowed_commits {
            return CommitStep::AbortFatal(ReleaseError::NotAllowedCommit {
                sha: commit.sha.clone(),
                message: subject.to_string(),
            });
        }

        warn!(sha = %commit.sha, "Not allowed commit: {}", subject);
        CommitStep::AbortSkip(SkipReason::NotAllowedCommit {
            sha: commit.sha.clone(),
            message: subject.to_string(),
            html_url: commit.html_url.clone(),
        })
    }

    fn classify_pull_request(&self, pr: &PullRequest) -> Option<ChangeLogItemType> {
        if has_not_empty_intersection(&pr.labels, &self.config.misc_pull_request_labels) {
            return Some(ChangeLogItemType::Misc);
        }

        let dependency_label = has_not_empty_intersection(
            &pr.labels,
            &self.config.dependency_updates_pull_request_labels,
        );
        let dependency_author = pr
            .author_login
            .as_deref()
            .is_some_and(|login| login_allowed(login, &self.config.dependency_updates_authors));
        if dependency_label || dependency_author {
            return Some(ChangeLogItemType::Dependency);
        }

        None
    }

    async fn changed_files(&self, commits: &[Commit]) -> Result<Vec<String>> {
        let mut files = Vec::new();
        for commit in commits {
            let details = self.hosting.commit(&commit.sha).await?;
            files.extend(details.files.into_iter().map(|f| f.filename));
        }
        debug!(count = files.len(), "Collected changed files from commits");
        Ok(files)
    }

    fn matches_expected_files(&self, files: &[String]) -> bool {
        files.iter().any(|file| {
            self.expected_files
                .iter()
                .any(|pattern| pattern.matches_with(file, EXPECTED_FILES_MATCH))
        })
    }
}

/// Changelog message of a prefix-allowed commit
///
/// The prefix is removed along with leading `:` and whitespace; an empty
/// remainder falls back to the whole subject.
pub fn message_after_prefix<'m>(subject: &'m str, prefix: &str) -> &'m str {
    let rest = subject
        .strip_prefix(prefix)
        .unwrap_or(subject)
        .trim_start_matches(|c: char| c == ':' || c.is_whitespace())
        .trim_end();
    if rest.is_empty() {
        subject
    } else {
        rest
    }
}
