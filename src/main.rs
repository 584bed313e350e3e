//! starchart - GitHub star history from the command line.
//!
//! Fetches repository details and the full stargazer timeline for each
//! repository given on the command line and prints a monthly summary.

mod report;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use starchart_config::Config;
use starchart_github::{GitHubClient, MetricsSink, TracingMetrics, connect_cache};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::report::{StarReport, describe};

#[derive(Parser)]
#[command(name = "starchart")]
#[command(version)]
#[command(about = "Plot the star history of GitHub repositories")]
#[command(after_long_help = r#"EXAMPLES
    Show the star history of one repository:
        $ starchart caarlos0/starcharts

    Rotate through several tokens:
        $ GITHUB_TOKENS=ghp_a,ghp_b starchart rust-lang/rust tokio-rs/tokio

CONFIGURATION
    starchart reads configuration from the first file found among:
      1. ./starchart.json5, ./starchart.json
      2. ~/.config/starchart/config.json5, ~/.config/starchart/config.json
    Environment variables override file settings.

ENVIRONMENT VARIABLES
    GITHUB_TOKENS                Comma separated personal access tokens
    GITHUB_PAGE_SIZE             Stargazers per page (default: 100)
    GITHUB_MAX_RATE_LIMIT_USAGE  Max quota usage per token, in percent (default: 80)
    GITHUB_MAX_PAGES             Refuse repositories needing more pages (default: 400)
    GITHUB_API_URL               REST API base URL (default: https://api.github.com)
    REDIS_URL                    Redis cache URL (default: in-memory cache)
    RUST_LOG                     Log filter (default: info)
"#)]
struct Cli {
    /// Configuration file to use instead of the default locations.
    #[arg(short, long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Log at debug level when RUST_LOG is not set.
    #[arg(short, long)]
    verbose: bool,

    /// Repositories to chart.
    #[arg(required = true, value_name = "OWNER/REPO")]
    repositories: Vec<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = match &cli.config {
        Some(path) => Config::load_with_env(path)
            .with_context(|| format!("failed to load configuration from {}", path.display()))?,
        None => Config::load().context("failed to load configuration")?,
    };

    let metrics: Arc<dyn MetricsSink> = Arc::new(TracingMetrics);
    let cache = connect_cache(&config.cache, metrics.clone()).await;
    let client = GitHubClient::from_config(&config.github, cache, metrics)
        .context("failed to create GitHub client")?;
    if client.is_authenticated() {
        info!(tokens = client.token_count(), "using token pool");
    } else {
        warn!("no GitHub tokens configured, requests are limited to 60 per hour");
    }

    let cancel = CancellationToken::new();
    tokio::spawn({
        let cancel = cancel.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("interrupted, cancelling outstanding requests");
                cancel.cancel();
            }
        }
    });

    let mut failures = 0usize;
    for (index, name) in cli.repositories.iter().enumerate() {
        if index > 0 {
            println!();
        }
        match chart(&client, &cancel, name).await {
            Ok(report) => print!("{report}"),
            Err(err) => {
                failures += 1;
                error!(repo = %name, error = %err, "failed to chart repository");
                eprintln!("{name}: {}", describe(&err));
            }
        }
        if cancel.is_cancelled() {
            break;
        }
    }

    if failures > 0 {
        anyhow::bail!(
            "{failures} of {} repositories could not be charted",
            cli.repositories.len()
        );
    }
    Ok(())
}

async fn chart(
    client: &GitHubClient,
    cancel: &CancellationToken,
    name: &str,
) -> starchart_github::Result<StarReport> {
    let repo = client.fetch_repository(cancel, name).await?;
    let timeline = client.fetch_stargazers(cancel, &repo).await?;
    Ok(StarReport::new(repo, &timeline))
}

fn init_tracing(verbose: bool) {
    let default = if verbose {
        "starchart=debug,starchart_github=debug,starchart_config=debug"
    } else {
        "info"
    };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn cli_requires_a_repository() {
        assert!(Cli::try_parse_from(["starchart"]).is_err());
    }

    #[test]
    fn cli_parses_flags_and_repositories() {
        let cli = Cli::try_parse_from([
            "starchart",
            "--verbose",
            "--config",
            "custom.json5",
            "rust-lang/rust",
            "tokio-rs/tokio",
        ])
        .unwrap();
        assert!(cli.verbose);
        assert_eq!(cli.config, Some(PathBuf::from("custom.json5")));
        assert_eq!(cli.repositories, vec!["rust-lang/rust", "tokio-rs/tokio"]);
    }
}
