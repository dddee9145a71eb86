//! Action rendering for stdout.

use chrono::SecondsFormat;

use threadlog_core::Action;

/// Render one action as a single line.
pub fn format_action(action: &Action, json: bool) -> anyhow::Result<String> {
    if json {
        return Ok(serde_json::to_string(action)?);
    }

    let mut line = format!(
        "{}  {:<18} {}",
        action.timestamp().to_rfc3339_opts(SecondsFormat::Millis, true),
        action.kind(),
        if action.actor_id().is_empty() { "-" } else { action.actor_id() },
    );
    if let Some(text) = action.text() {
        line.push_str("  ");
        line.push_str(&text.replace('\n', " "));
    }
    Ok(line)
}
