//! Replay of an exported action list through the pager.
//!
//! The file is a JSON array. Each element is either an action as printed by
//! `--json` or a raw history node as the server sends it (recognised by its
//! `__typename`).

use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::info;

use threadlog_client::{decode_action, MemoryFetcher};
use threadlog_core::Action;
use threadlog_history::ThreadHistory;

use super::print_stream;
use crate::AppContext;

const REPLAY_THREAD: &str = "replay";

pub async fn run(file: &Path, page_size: Option<usize>, json: bool, ctx: &Arc<AppContext>) -> anyhow::Result<()> {
    let actions = load_actions(file)?;
    info!(file = %file.display(), count = actions.len(), "Loaded actions");

    let mut config = ctx.config.history.clone();
    if let Some(page_size) = page_size {
        anyhow::ensure!(page_size > 0, "--page-size must be greater than 0");
        config.page_size = page_size;
    }

    let history = ThreadHistory::new(Arc::new(MemoryFetcher::new(REPLAY_THREAD, actions))).with_config(config);
    let cancel = CancellationToken::new();
    let stream = history.stream_full_history(REPLAY_THREAD, Some(cancel.clone()));

    print_stream(stream, cancel, None, json).await?;
    Ok(())
}

/// Read an exported action list.
pub fn load_actions(file: &Path) -> anyhow::Result<Vec<Action>> {
    let content = std::fs::read_to_string(file).with_context(|| format!("Failed to read {}", file.display()))?;
    let items: Vec<Value> =
        serde_json::from_str(&content).with_context(|| format!("{} is not a JSON array", file.display()))?;

    items
        .into_iter()
        .enumerate()
        .map(|(i, item)| {
            let action = if item.get("__typename").is_some() {
                decode_action(item).map_err(anyhow::Error::from)
            } else {
                serde_json::from_value(item).map_err(anyhow::Error::from)
            };
            action.with_context(|| format!("Invalid action at index {}", i))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    use threadlog_core::ActionKind;

    fn write_file(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_load_mixed_export() {
        let file = write_file(
            r#"[
                {"id": "mid.1", "kind": "message", "actor_id": "7",
                 "timestamp": "2017-07-14T02:40:00.123Z", "text": "hi"},
                {"__typename": "ParticipantLeftMessage", "message_id": "mid.2",
                 "timestamp_precise": "1500000001000", "message_sender": {"id": "8"}}
            ]"#,
        );

        let actions = load_actions(file.path()).unwrap();
        assert_eq!(actions.len(), 2);
        assert_eq!(actions[0].kind(), &ActionKind::Message);
        assert_eq!(actions[0].timestamp_ms(), 1_500_000_000_123);
        assert_eq!(actions[1].kind(), &ActionKind::ParticipantLeft);
        assert_eq!(actions[1].actor_id(), "8");
    }

    #[test]
    fn test_load_rejects_bad_element() {
        let file = write_file(r#"[{"kind": "message"}]"#);
        let err = load_actions(file.path()).unwrap_err();
        assert!(err.to_string().contains("index 0"));
    }

    #[test]
    fn test_load_rejects_non_array() {
        let file = write_file(r#"{"kind": "message"}"#);
        assert!(load_actions(file.path()).is_err());
    }
}
