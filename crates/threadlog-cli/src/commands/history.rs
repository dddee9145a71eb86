//! Full history streaming.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::info;

use threadlog_history::ThreadHistory;

use super::print_stream;
use crate::AppContext;

pub async fn run(thread: &str, max: Option<usize>, json: bool, ctx: &Arc<AppContext>) -> anyhow::Result<()> {
    let history = ThreadHistory::from_config(&ctx.config)?;
    let cancel = CancellationToken::new();
    let stream = history.stream_full_history(thread, Some(cancel.clone()));

    let shown = print_stream(stream, cancel, max, json).await?;
    info!(thread, shown, "Done");
    Ok(())
}
