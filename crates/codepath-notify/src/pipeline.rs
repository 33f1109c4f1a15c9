//! One notification run, stage by stage.

use crate::changes::ChangeSource;
use crate::config::RunConfig;
use crate::error::Result;
use crate::matcher::match_files;
use crate::notifier::{MessageSender, Notification, Report, notify_all};
use crate::rules::load_rules;
use crate::token::{AccessToken, TokenSource};
use tracing::info;

/// How a successful run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// No changed file matched any rule; nothing was requested or sent.
    NoMatches,
    /// Every matched recipient was attempted.
    Processed(Report),
}

/// Loads the rules, lists the changed files, matches them and notifies owners.
///
/// The token is requested and the sender opened only when at least one
/// file matched. Individual delivery failures are part of the outcome, not
/// an error.
///
/// # Errors
///
/// Returns the first fatal failure: unreadable rules, listing failure, or
/// token failure.
pub async fn run<C, T, S, F>(
    config: &RunConfig,
    changes: &C,
    tokens: &T,
    open_sender: F,
) -> Result<RunOutcome>
where
    C: ChangeSource,
    T: TokenSource,
    S: MessageSender,
    F: FnOnce(AccessToken) -> S,
{
    let rules = load_rules(&config.rules_path)?;
    info!(rules = rules.len(), "loaded ownership rules");

    let pull_request = &config.pull_request;
    let files = changes.changed_files(pull_request).await?;
    info!(
        repository = %pull_request.repository,
        pull_request = pull_request.number,
        files = files.len(),
        "listed changed files"
    );

    let matches = match_files(&files, &rules);
    if matches.is_empty() {
        info!("no changed file is owned by anyone; nothing to send");
        return Ok(RunOutcome::NoMatches);
    }
    info!(recipients = matches.len(), "matched owners");

    let notifications: Vec<Notification> = matches
        .iter()
        .map(|(recipient, files)| {
            Notification::compose(pull_request, &config.relay.sender, recipient, files)
        })
        .collect();

    let token = tokens.access_token().await?;
    let mut sender = open_sender(token);
    let report = notify_all(&mut sender, &notifications).await;
    sender.close().await;

    info!(
        sent = report.sent.len(),
        failed = report.failed.len(),
        "run complete"
    );
    Ok(RunOutcome::Processed(report))
}
