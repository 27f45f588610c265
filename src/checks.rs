//! CI health gate
//!
//! Failing check runs on the release commit block the release unless they
//! belong to the workflow run executing this process, come from an
//! allow-listed actor, or come from an allow-listed workflow file.

use crate::error::{ReleaseError, Result};
use crate::hosting::{CheckRun, Hosting};
use crate::matcher::login_allowed;
use regex::Regex;
use std::fmt;
use tracing::{debug, info, warn};

/// Conclusions that never count as a failure
pub const ACCEPTED_CONCLUSIONS: [&str; 5] = [
    "success",
    "neutral",
    "cancelled",
    "skipped",
    "action_required",
];

/// How a failing check run was resolved
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExemptionDecision {
    /// Sibling job of the workflow run executing this process
    SelfRun,
    ActorExempt { actor: String },
    PathExempt { path: String },
    Blocking,
}

impl ExemptionDecision {
    pub fn is_blocking(&self) -> bool {
        matches!(self, ExemptionDecision::Blocking)
    }
}

impl fmt::Display for ExemptionDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExemptionDecision::SelfRun => write!(f, "belongs to the current workflow run"),
            ExemptionDecision::ActorExempt { actor } => {
                write!(f, "actor '{}' is allowed to fail", actor)
            }
            ExemptionDecision::PathExempt { path } => {
                write!(f, "workflow '{}' is allowed to fail", path)
            }
            ExemptionDecision::Blocking => write!(f, "blocking"),
        }
    }
}

/// A failing check run together with its resolution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckRunFailure {
    pub check_run: CheckRun,
    pub decision: ExemptionDecision,
}

/// Whether a check run's conclusion counts as a failure
///
/// A missing conclusion (still running) counts as a failure.
pub fn is_failed(check_run: &CheckRun) -> bool {
    match check_run.conclusion.as_deref() {
        Some(conclusion) => !ACCEPTED_CONCLUSIONS.contains(&conclusion),
        None => true,
    }
}

/// Extract `(run id, job id)` from a check run URL of the form
/// `{repository_url}/actions/runs/{run}/job/{job}`
pub fn parse_job_url(url: &str, repository_url: &str) -> Option<(u64, u64)> {
    let rest = url.strip_prefix(repository_url.trim_end_matches('/'))?;
    let captures = Regex::new(r"^/actions/runs/(\d+)/job/(\d+)")
        .ok()
        .and_then(|re| re.captures(rest))?;
    let run_id = captures.get(1)?.as_str().parse().ok()?;
    let job_id = captures.get(2)?.as_str().parse().ok()?;
    Some((run_id, job_id))
}

/// Checks the CI health of the release commit
pub struct CiHealthGate<'a, H: Hosting + ?Sized> {
    hosting: &'a H,
    repository_url: &'a str,
    allowed_actors: &'a [String],
    allowed_paths: &'a [String],
    current_run_id: Option<u64>,
}

impl<'a, H: Hosting + ?Sized> CiHealthGate<'a, H> {
    pub fn new(
        hosting: &'a H,
        repository_url: &'a str,
        allowed_actors: &'a [String],
        allowed_paths: &'a [String],
        current_run_id: Option<u64>,
    ) -> Self {
        CiHealthGate {
            hosting,
            repository_url,
            allowed_actors,
            allowed_paths,
            current_run_id,
        }
    }

    /// Resolve every failing check run of `sha`
    ///
    /// # Returns
    /// * `Ok(failures)` - All failures are exempt (possibly none)
    /// * `Err(BlockingCheckRuns)` - At least one failure blocks the release
    pub async fn check(&self, sha: &str) -> Result<Vec<CheckRunFailure>> {
        let failed: Vec<CheckRun> = self
            .hosting
            .check_runs_for_ref(sha)
            .await?
            .into_iter()
            .filter(is_failed)
            .collect();
        if failed.is_empty() {
            debug!(sha = %sha, "No failed check runs");
            return Ok(Vec::new());
        }

        let current_suite_id = match self.current_run_id {
            Some(run_id) => self.hosting.workflow_run(run_id).await?.check_suite_id,
            None => None,
        };

        let mut failures = Vec::with_capacity(failed.len());
        for check_run in failed {
            let decision = self.resolve(&check_run, current_suite_id).await?;
            match &decision {
                ExemptionDecision::Blocking => warn!(
                    check_run = %check_run.name,
                    conclusion = check_run.conclusion.as_deref().unwrap_or("in progress"),
                    "Check run failed"
                ),
                exempt => info!(
                    check_run = %check_run.name,
                    "Ignoring failed check run: {}",
                    exempt
                ),
            }
            failures.push(CheckRunFailure {
                check_run,
                decision,
            });
        }

        let blocking: Vec<&CheckRunFailure> = failures
            .iter()
            .filter(|failure| failure.decision.is_blocking())
            .collect();
        if !blocking.is_empty() {
            return Err(ReleaseError::BlockingCheckRuns {
                count: blocking.len(),
                details: describe_failures(&blocking),
            });
        }

        Ok(failures)
    }

    /// Decide whether one failing check run blocks the release
    pub async fn resolve(
        &self,
        check_run: &CheckRun,
        current_suite_id: Option<u64>,
    ) -> Result<ExemptionDecision> {
        if current_suite_id.is_some() && check_run.check_suite_id == current_suite_id {
            return Ok(ExemptionDecision::SelfRun);
        }

        if let Some(slug) = check_run.app_slug.as_deref() {
            if login_allowed(slug, self.allowed_actors) {
                return Ok(ExemptionDecision::ActorExempt {
                    actor: slug.to_string(),
                });
            }
        }

        let Some((run_id, _job_id)) = check_run
            .html_url
            .as_deref()
            .and_then(|url| parse_job_url(url, self.repository_url))
        else {
            return Ok(ExemptionDecision::Blocking);
        };

        let workflow_run = self.hosting.workflow_run(run_id).await?;
        if let Some(actor) = workflow_run.actor_login.as_deref() {
            if login_allowed(actor, self.allowed_actors) {
                return Ok(ExemptionDecision::ActorExempt {
                    actor: actor.to_string(),
                });
            }
        }
        if self.allowed_paths.contains(&workflow_run.path) {
            return Ok(ExemptionDecision::PathExempt {
                path: workflow_run.path,
            });
        }

        Ok(ExemptionDecision::Blocking)
    }
}

fn describe_failures(failures: &[&CheckRunFailure]) -> String {
    failures
        .iter()
        .map(|failure| {
            let run = &failure.check_run;
            format!(
                "  {}: {}: {}",
                run.html_url.as_deref().unwrap_or("(no url)"),
                run.name,
                run.conclusion.as_deref().unwrap_or("in progress")
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}
