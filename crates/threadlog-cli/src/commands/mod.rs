//! CLI command implementations.

pub mod config;
pub mod history;
pub mod page;
pub mod replay;

use tokio_util::sync::CancellationToken;
use tracing::info;

use threadlog_core::error::format_error_with_suggestion;
use threadlog_core::Error;
use threadlog_history::HistoryStream;

use crate::output;

/// Print a session's actions until it ends, `max` actions were shown or
/// Ctrl-C is pressed. Fails when the session reports a fetch error.
pub async fn print_stream(
    stream: HistoryStream,
    cancel: CancellationToken,
    max: Option<usize>,
    json: bool,
) -> anyhow::Result<usize> {
    let (mut actions, errors) = stream.split();
    let interrupt = tokio::signal::ctrl_c();
    tokio::pin!(interrupt);

    let mut shown = 0usize;
    loop {
        if max.is_some_and(|max| shown >= max) {
            cancel.cancel();
            break;
        }

        let action = tokio::select! {
            _ = &mut interrupt => {
                info!("Interrupted, stopping");
                cancel.cancel();
                break;
            }
            next = actions.recv() => match next {
                Some(action) => action,
                None => break,
            },
        };

        println!("{}", output::format_action(&action, json)?);
        shown += 1;
    }
    drop(actions);

    if let Some(e) = errors.wait().await {
        anyhow::bail!(
            "{}\n  ({} actions printed before the failure)",
            format_error_with_suggestion(&Error::from(e)),
            shown
        );
    }
    Ok(shown)
}
