//! `codepath-notify` - notify code owners about pull request changes.

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

use std::process::ExitCode;

use clap::Parser;
use clap::error::ErrorKind;
use tracing::error;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use codepath_notify::{Cli, GitHubClient, OAuthTokenSource, RunOutcome, SmtpSender, run};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            let _ = e.print();
            return ExitCode::SUCCESS;
        }
        Err(e) => {
            let _ = e.print();
            return ExitCode::FAILURE;
        }
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "codepath_notify=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match execute(cli).await {
        // individual delivery failures are already logged and do not fail the run
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "run failed");
            ExitCode::FAILURE
        }
    }
}

async fn execute(cli: Cli) -> codepath_notify::Result<RunOutcome> {
    let config = cli.into_config()?;
    let changes = GitHubClient::new(&config.github)?;
    let tokens = OAuthTokenSource::new(&config.oauth)?;
    let relay = config.relay.clone();

    run(&config, &changes, &tokens, |token| SmtpSender::new(relay, token)).await
}
