use anyhow::{Context, Result};
use clap::Parser;
use release_gate::config;
use release_gate::engine::ReleaseEngine;
use release_gate::hosting::{GitHubClient, GitHubSettings};
use release_gate::ui;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(clap::Parser)]
#[command(
    name = "release-gate",
    version,
    about = "Decide, gate and publish the next release of a GitHub repository"
)]
struct Args {
    #[arg(short, long, help = "Custom configuration file path")]
    config: Option<String>,

    #[arg(
        long,
        env = "GITHUB_REPOSITORY",
        help = "Repository as owner/name"
    )]
    repository: String,

    #[arg(
        long,
        env = "GITHUB_API_URL",
        default_value = release_gate::hosting::github::DEFAULT_API_URL,
        help = "GitHub REST API base URL"
    )]
    api_url: String,

    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true, help = "API token")]
    token: String,

    #[arg(
        long,
        env = "GITHUB_RUN_ID",
        help = "Id of the workflow run executing this process"
    )]
    run_id: Option<u64>,

    #[arg(long, help = "Compute the release without creating it")]
    dry_run: bool,

    #[arg(long, help = "Fail instead of skipping on a not allowed commit")]
    fail_on_not_allowed_commits: bool,

    #[arg(long, help = "Enable debug logging")]
    debug: bool,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();
    setup_logging(args.debug);

    match run(args).await {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            ui::display_error(&format!("{:#}", e));
            std::process::exit(1);
        }
    }
}

async fn run(args: Args) -> Result<i32> {
    let mut config = config::load_with_env(args.config.as_deref())
        .context("Failed to load configuration")?;
    if args.dry_run {
        config.dry_run = true;
    }
    if args.fail_on_not_allowed_commits {
        config.fail_on_not_allowed_commits = true;
    }
    tracing::debug!(?config, "Configuration loaded");

    let settings = GitHubSettings::new(&args.api_url, &args.repository, &args.token)?;
    let client = GitHubClient::new(settings).context("Failed to create GitHub client")?;
    let engine = ReleaseEngine::new(&client, &config, args.run_id)?;

    let outcome = engine.run().await;
    ui::display_outcome(&outcome);
    Ok(outcome.exit_code())
}

/// Set up logging/tracing.
fn setup_logging(debug: bool) {
    let filter = if debug {
        EnvFilter::try_new("warn,release_gate=debug").unwrap_or_else(|_| EnvFilter::new("warn"))
    } else {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("warn,release_gate=info"))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    if debug {
        tracing::debug!("Debug logging enabled");
    }
}
