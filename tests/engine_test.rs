use release_gate::config::Config;
use release_gate::domain::{ChangelogAggregator, Commit, Version};
use release_gate::engine::{CommitStep, ReleaseEngine};
use release_gate::hosting::{CheckRun, MockHosting, PullRequest, WorkflowRun};
use release_gate::{ReleaseError, ReleaseOutcome, SkipReason};

// ============================================================================
// Fixtures
// ============================================================================

fn base_config() -> Config {
    Config {
        version_tag_prefix: "v".to_string(),
        allowed_commit_prefixes: vec!["feat".to_string(), "fix".to_string()],
        allowed_pull_request_labels: vec!["release".to_string(), "/^deps/".to_string()],
        dependency_updates_pull_request_labels: vec!["deps".to_string()],
        dependency_updates_authors: vec!["dependabot".to_string()],
        misc_pull_request_labels: vec!["internal".to_string()],
        ..Config::default()
    }
}

fn commit(sha: &str, message: &str) -> Commit {
    Commit::new(sha, message)
        .with_html_url(format!("https://github.com/acme/widgets/commit/{}", sha))
}

fn pull_request(number: u64, title: &str, author: &str, labels: &[&str]) -> PullRequest {
    PullRequest {
        number,
        title: title.to_string(),
        html_url: format!("https://github.com/acme/widgets/pull/{}", number),
        author_login: Some(author.to_string()),
        labels: labels.iter().map(|l| l.to_string()).collect(),
    }
}

fn failing_check(id: u64, html_url: &str) -> CheckRun {
    CheckRun {
        id,
        name: format!("build-{}", id),
        html_url: Some(html_url.to_string()),
        conclusion: Some("failure".to_string()),
        check_suite_id: Some(id * 10),
        app_slug: Some("github-actions".to_string()),
    }
}

/// Repository with tag `v1.2.0` on `base` and `main` at `head`
fn hosting() -> MockHosting {
    let mut hosting = MockHosting::new();
    hosting.add_tag("v1.1.0", "older");
    hosting.add_tag("v1.2.0", "base");
    hosting.add_tag("nightly", "base");
    hosting.set_branch_head("main", "head");
    hosting
}

async fn run(hosting: &MockHosting, config: &Config) -> ReleaseOutcome {
    ReleaseEngine::new(hosting, config, None)
        .expect("engine should build")
        .run()
        .await
}

fn expect_released(outcome: ReleaseOutcome) -> (release_gate::ReleasePlan, bool) {
    match outcome {
        ReleaseOutcome::Released { plan, release } => (plan, release.is_some()),
        other => panic!("expected a release, got {:?}", other),
    }
}

fn expect_skipped(outcome: ReleaseOutcome) -> SkipReason {
    match outcome {
        ReleaseOutcome::Skipped { reason } => reason,
        other => panic!("expected a skip, got {:?}", other),
    }
}

fn expect_failed(outcome: ReleaseOutcome) -> ReleaseError {
    match outcome {
        ReleaseOutcome::Failed { error } => error,
        other => panic!("expected a failure, got {:?}", other),
    }
}

// ============================================================================
// Happy path
// ============================================================================

#[tokio::test]
async fn test_release_from_prefixed_commits() {
    let mut hosting = hosting();
    hosting.add_commit(commit("c1", "feat: add login\n\nLong description"));
    hosting.add_commit(commit("c2", "fix: handle empty password").with_author("alice"));
    let config = base_config();

    let (plan, created) = expect_released(run(&hosting, &config).await);

    assert!(created);
    assert_eq!(plan.branch, "main");
    assert_eq!(plan.version, Version::new(vec![1, 3, 0], None));
    assert_eq!(plan.tag, "v1.3.0");
    assert_eq!(
        plan.description,
        "# What's Changed\n\n* add login (c1)\n* handle empty password (c2) @alice"
    );

    let created = hosting.created_releases();
    assert_eq!(created.len(), 1);
    assert_eq!(created[0].tag_name, "v1.3.0");
    assert_eq!(created[0].name, "1.3.0");
    assert_eq!(created[0].target_commitish, "main");
    assert_eq!(created[0].body, plan.description);
}

#[tokio::test]
async fn test_pull_request_labels_classify_items() {
    let mut hosting = hosting();
    hosting.add_commit(commit("c1", "Merge pull request #11"));
    hosting.add_commit(commit("c2", "Merge pull request #12"));
    hosting.add_commit(commit("c3", "Merge pull request #13"));
    hosting.add_commit(commit("c4", "Merge pull request #14"));
    hosting.add_pull_request("c1", pull_request(11, "Add search", "bob", &["release"]));
    hosting.add_pull_request(
        "c2",
        pull_request(12, "Bump serde", "dependabot[bot]", &["deps-rust"]),
    );
    hosting.add_pull_request(
        "c3",
        pull_request(13, "Tidy CI", "carol", &["release", "internal"]),
    );
    hosting.add_pull_request("c4", pull_request(14, "Bump tokio", "dave", &["release", "deps"]));
    let config = base_config();

    let (plan, _) = expect_released(run(&hosting, &config).await);
    assert_eq!(
        plan.description,
        "# What's Changed\n\n* Add search (#11) @bob\n\n\
         ## Dependency updates\n\n* Bump serde (#12) @dependabot\n* Bump tokio (#14) @dave\n\n\
         ## Misc\n\n* Tidy CI (#13) @carol"
    );
}

#[tokio::test]
async fn test_first_allowed_pull_request_describes_commit() {
    let mut hosting = hosting();
    hosting.add_commit(commit("c1", "Merge pull request #11"));
    hosting.add_pull_request("c1", pull_request(11, "Add search", "bob", &["release"]));
    hosting.add_pull_request(
        "c1",
        pull_request(12, "Backport: add search", "bob", &["release"]),
    );
    let config = base_config();

    let (plan, _) = expect_released(run(&hosting, &config).await);
    assert_eq!(plan.description, "# What's Changed\n\n* Add search (#11) @bob");
}

#[tokio::test]
async fn test_dependency_author_commit_is_dependency_item() {
    let mut hosting = hosting();
    hosting.add_commit(commit("c1", "fix: bump regex").with_author("dependabot[bot]"));
    let config = base_config();

    let (plan, _) = expect_released(run(&hosting, &config).await);
    assert_eq!(
        plan.description,
        "## Dependency updates\n\n* bump regex (c1) @dependabot"
    );
}

#[tokio::test]
async fn test_duplicate_items_merge() {
    let mut hosting = hosting();
    hosting.add_commit(commit("c1", "Merge pull request #11"));
    hosting.add_commit(commit("c2", "Merge pull request #12"));
    hosting.add_pull_request("c1", pull_request(11, "Bump serde", "renovate", &["release"]));
    hosting.add_pull_request("c2", pull_request(12, "Bump serde", "renovate", &["deps"]));
    let config = base_config();

    // the type is backfilled from the second pull request
    let (plan, _) = expect_released(run(&hosting, &config).await);
    assert_eq!(
        plan.description,
        "## Dependency updates\n\n* Bump serde (#11, #12) @renovate"
    );
}

#[tokio::test]
async fn test_skipped_changelog_prefix_does_not_block() {
    let mut hosting = hosting();
    hosting.add_commit(commit("c1", "feat: add export"));
    hosting.add_commit(commit("c2", "fix(ci): cache"));
    let config = Config {
        skipped_changelog_commit_prefixes: vec!["fix(ci)".to_string()],
        ..base_config()
    };

    let (plan, _) = expect_released(run(&hosting, &config).await);
    assert_eq!(plan.description, "# What's Changed\n\n* add export (c1)");
}

#[tokio::test]
async fn test_dry_run_creates_nothing() {
    let mut hosting = hosting();
    hosting.add_commit(commit("c1", "feat: add login"));
    let config = Config {
        dry_run: true,
        ..base_config()
    };

    let (plan, created) = expect_released(run(&hosting, &config).await);
    assert!(!created);
    assert_eq!(plan.tag, "v1.3.0");
    assert!(hosting.created_releases().is_empty());
}

#[tokio::test]
async fn test_increment_mode_and_prefix_fallback() {
    let mut hosting = MockHosting::new();
    hosting.add_tag("release-2.4", "base");
    hosting.add_tag("3.0-rc1", "other");
    hosting.set_branch_head("main", "head");
    hosting.add_commit(commit("c1", "fix: overflow"));
    let config = Config {
        version_tag_prefix: "v".to_string(),
        allowed_version_tag_prefixes: vec!["release".to_string()],
        allowed_commit_prefixes: vec!["fix".to_string()],
        version_increment_mode: "patch".parse().unwrap(),
        ..Config::default()
    };

    // `3.0-rc1` orders highest and has a suffix
    let reason = expect_skipped(run(&hosting, &config).await);
    assert!(matches!(reason, SkipReason::LastVersionHasSuffix { .. }));

    let mut hosting = MockHosting::new();
    hosting.add_tag("release-2.4", "base");
    hosting.set_branch_head("main", "head");
    hosting.add_commit(commit("c1", "fix: overflow"));
    let (plan, _) = expect_released(run(&hosting, &config).await);
    assert_eq!(plan.tag, "v2.4.1");
}

// ============================================================================
// Skips
// ============================================================================

#[tokio::test]
async fn test_not_allowed_commit_skips_whole_release() {
    let mut hosting = hosting();
    hosting.add_commit(commit("c1", "feat: add login"));
    hosting.add_commit(commit("c2", "update readme"));
    hosting.add_commit(commit("c3", "fix: typo"));
    let config = base_config();

    let reason = expect_skipped(run(&hosting, &config).await);
    assert_eq!(
        reason,
        SkipReason::NotAllowedCommit {
            sha: "c2".to_string(),
            message: "update readme".to_string(),
            html_url: "https://github.com/acme/widgets/commit/c2".to_string(),
        }
    );
    assert!(hosting.created_releases().is_empty());
}

#[tokio::test]
async fn test_prefix_boundary_applies_to_commits() {
    let mut hosting = hosting();
    hosting.add_commit(commit("c1", "fixture: add sample"));
    let config = base_config();

    let reason = expect_skipped(run(&hosting, &config).await);
    assert!(matches!(reason, SkipReason::NotAllowedCommit { .. }));
}

#[tokio::test]
async fn test_no_version_tags() {
    let mut hosting = MockHosting::new();
    hosting.add_tag("nightly", "a");
    hosting.set_branch_head("main", "head");
    let config = base_config();

    let reason = expect_skipped(run(&hosting, &config).await);
    assert_eq!(
        reason,
        SkipReason::NoVersionTags {
            repository_url: "https://github.com/acme/widgets".to_string()
        }
    );
}

#[tokio::test]
async fn test_no_commits() {
    let hosting = hosting();
    let config = base_config();

    let reason = expect_skipped(run(&hosting, &config).await);
    match reason {
        SkipReason::NoCommits { tag, comparison_url } => {
            assert_eq!(tag, "v1.2.0");
            assert!(comparison_url.ends_with("/compare/base...head"));
        }
        other => panic!("unexpected skip: {:?}", other),
    }
}

#[tokio::test]
async fn test_expected_files_from_comparison() {
    let mut hosting = hosting();
    hosting.add_commit(commit("c1", "feat: add login"));
    hosting.set_comparison_files(&["docs/README.md"]);
    let config = Config {
        expected_files_to_change: vec!["src/**".to_string(), "Cargo.toml".to_string()],
        ..base_config()
    };

    let reason = expect_skipped(run(&hosting, &config).await);
    assert_eq!(
        reason,
        SkipReason::NoExpectedFilesChanged {
            patterns: vec!["src/**".to_string(), "Cargo.toml".to_string()]
        }
    );

    let ignored = Config {
        ignore_expected_files_to_change: true,
        ..config
    };
    expect_released(run(&hosting, &ignored).await);
}

#[tokio::test]
async fn test_expected_files_fall_back_to_commits() {
    let mut hosting = hosting();
    hosting.add_commit(commit("c1", "feat: add login"));
    hosting.add_commit(commit("c2", "fix: typo"));
    hosting.set_commit_files("c2", &["src/lib.rs"]);
    let config = Config {
        expected_files_to_change: vec!["src/*.rs".to_string()],
        ..base_config()
    };

    expect_released(run(&hosting, &config).await);
}

#[tokio::test]
async fn test_expected_file_star_stays_in_one_directory() {
    let mut hosting = hosting();
    hosting.add_commit(commit("c1", "feat: add login"));
    hosting.set_comparison_files(&["sub/dir/build.gradle", ".hidden.gradle"]);
    let config = Config {
        expected_files_to_change: vec!["*.gradle".to_string()],
        ..base_config()
    };

    let reason = expect_skipped(run(&hosting, &config).await);
    assert_eq!(
        reason,
        SkipReason::NoExpectedFilesChanged {
            patterns: vec!["*.gradle".to_string()]
        }
    );

    let mut top_level = self::hosting();
    top_level.add_commit(commit("c1", "feat: add login"));
    top_level.set_comparison_files(&["build.gradle"]);
    expect_released(run(&top_level, &config).await);
}

#[tokio::test]
async fn test_no_changelog_items() {
    let mut hosting = hosting();
    hosting.add_commit(commit("c1", "fix: [skip] typo"));
    let config = Config {
        skipped_changelog_commit_prefixes: vec!["fix".to_string()],
        ..base_config()
    };

    let reason = expect_skipped(run(&hosting, &config).await);
    assert_eq!(reason, SkipReason::NoChangelogItems);
}

#[tokio::test]
async fn test_existing_release_skips() {
    let mut hosting = hosting();
    hosting.add_commit(commit("c1", "feat: add login"));
    hosting.add_release("v1.3.0");
    let config = base_config();

    let reason = expect_skipped(run(&hosting, &config).await);
    assert_eq!(
        reason,
        SkipReason::ReleaseAlreadyExists {
            tag: "v1.3.0".to_string()
        }
    );
    assert!(hosting.created_releases().is_empty());
}

// ============================================================================
// Failures
// ============================================================================

#[tokio::test]
async fn test_not_allowed_commit_fails_when_configured() {
    let mut hosting = hosting();
    hosting.add_commit(commit("c1", "update readme"));
    let config = Config {
        fail_on_not_allowed_commits: true,
        ..base_config()
    };

    let error = expect_failed(run(&hosting, &config).await);
    assert!(matches!(error, ReleaseError::NotAllowedCommit { ref sha, .. } if sha == "c1"));
}

#[tokio::test]
async fn test_blocking_check_run_fails() {
    let mut hosting = hosting();
    hosting.add_commit(commit("c1", "feat: add login"));
    hosting.add_check_run(
        "head",
        failing_check(1, "https://ci.example.com/builds/1"),
    );
    let config = base_config();

    let outcome = run(&hosting, &config).await;
    assert_eq!(outcome.exit_code(), 1);
    let error = expect_failed(outcome);
    assert!(matches!(error, ReleaseError::BlockingCheckRuns { count: 1, .. }));
    assert!(hosting.created_releases().is_empty());
}

#[tokio::test]
async fn test_exempt_check_runs_do_not_block() {
    let mut hosting = hosting();
    hosting.add_commit(commit("c1", "feat: add login"));
    hosting.add_workflow_run(WorkflowRun {
        id: 100,
        check_suite_id: Some(10),
        actor_login: Some("octocat".to_string()),
        path: ".github/workflows/release.yml".to_string(),
        html_url: "https://github.com/acme/widgets/actions/runs/100".to_string(),
    });
    hosting.add_workflow_run(WorkflowRun {
        id: 200,
        check_suite_id: Some(20),
        actor_login: Some("dependabot[bot]".to_string()),
        path: ".github/workflows/build.yml".to_string(),
        html_url: "https://github.com/acme/widgets/actions/runs/200".to_string(),
    });
    // sibling job of the running workflow
    hosting.add_check_run(
        "head",
        failing_check(1, "https://github.com/acme/widgets/actions/runs/100/job/1"),
    );
    // started by a dependency author, exempt through the union
    hosting.add_check_run(
        "head",
        failing_check(2, "https://github.com/acme/widgets/actions/runs/200/job/2"),
    );
    let config = base_config();

    let engine = ReleaseEngine::new(&hosting, &config, Some(100)).unwrap();
    expect_released(engine.run().await);
}

// ============================================================================
// Per-commit step
// ============================================================================

#[tokio::test]
async fn test_process_commit_steps() {
    let mut hosting = hosting();
    hosting.add_pull_request("c1", pull_request(5, "Add search", "bob", &["wip"]));
    let config = base_config();
    let engine = ReleaseEngine::new(&hosting, &config, None).unwrap();
    let mut changelog = ChangelogAggregator::default();

    // a pull request without allowed labels falls through to the prefix rule
    let step = engine
        .process_commit(&commit("c1", "feat: search"), &mut changelog)
        .await;
    assert!(matches!(step, CommitStep::Continue));
    assert_eq!(changelog.items()[0].message, "search");
    assert_eq!(changelog.items()[0].item_type, None);

    let step = engine
        .process_commit(&commit("c2", "docs: search"), &mut changelog)
        .await;
    assert!(matches!(step, CommitStep::AbortSkip(SkipReason::NotAllowedCommit { .. })));
    assert_eq!(changelog.items().len(), 1);
}
