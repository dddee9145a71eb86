//! Single page fetch.

use std::sync::Arc;

use threadlog_core::error::format_error_with_suggestion;
use threadlog_core::Cursor;
use threadlog_history::ThreadHistory;

use crate::output;
use crate::AppContext;

pub async fn run(
    thread: &str,
    before: Option<i64>,
    limit: Option<usize>,
    json: bool,
    ctx: &Arc<AppContext>,
) -> anyhow::Result<()> {
    let history = ThreadHistory::from_config(&ctx.config)?;
    let cursor = before.map(Cursor::from_millis).unwrap_or_default();
    let limit = limit.unwrap_or(ctx.config.history.page_size);

    let page = history
        .fetch_page(thread, cursor, limit)
        .await
        .map_err(|e| anyhow::anyhow!(format_error_with_suggestion(&e)))?;

    for action in &page {
        println!("{}", output::format_action(action, json)?);
    }
    if !json {
        match page.last() {
            Some(oldest) => eprintln!(
                "{} actions; next page: --before {}",
                page.len(),
                oldest.timestamp_ms()
            ),
            None => eprintln!("No actions ({})", cursor),
        }
    }
    Ok(())
}
