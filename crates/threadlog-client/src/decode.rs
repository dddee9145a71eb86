//! Decoding of raw action log nodes.
//!
//! Only the fields the history engine needs are lifted out of a node; the
//! node itself is kept as the action's raw payload.

use serde_json::Value;

use threadlog_core::action::timestamp_from_millis;
use threadlog_core::{Action, ActionKind, FetchError};

/// Decode one action log node into an [`Action`].
///
/// A node without a usable `timestamp_precise` is rejected, since the
/// timestamp is the ordering key for pagination.
pub fn decode_action(node: Value) -> Result<Action, FetchError> {
    let typename = node.get("__typename").and_then(Value::as_str).unwrap_or_default();
    let kind = kind_for(typename, &node);

    let timestamp_ms = node
        .get("timestamp_precise")
        .and_then(parse_millis)
        .ok_or_else(|| FetchError::Decode(format!("{} node has no usable timestamp_precise", typename)))?;
    let timestamp = timestamp_from_millis(timestamp_ms)
        .ok_or_else(|| FetchError::Decode(format!("timestamp out of range: {}", timestamp_ms)))?;

    let actor_id = node
        .get("message_sender")
        .and_then(|sender| {
            sender
                .get("id")
                .or_else(|| sender.get("messaging_actor").and_then(|actor| actor.get("id")))
        })
        .and_then(id_string)
        .unwrap_or_default();

    let id = node.get("message_id").and_then(id_string);
    let non_empty = |v: &Value| v.as_str().filter(|t| !t.is_empty()).map(str::to_string);
    let text = node
        .get("message")
        .and_then(|m| m.get("text"))
        .and_then(non_empty)
        .or_else(|| node.get("snippet").and_then(non_empty));

    let mut action = Action::new(kind, actor_id, timestamp);
    if let Some(id) = id {
        action = action.with_id(id);
    }
    if let Some(text) = text {
        action = action.with_text(text);
    }
    Ok(action.with_raw(node))
}

fn kind_for(typename: &str, node: &Value) -> ActionKind {
    match typename {
        "UserMessage" => {
            if node.get("sticker").map(|s| !s.is_null()).unwrap_or(false) {
                ActionKind::Sticker
            } else {
                ActionKind::Message
            }
        }
        "MessageReaction" => ActionKind::Reaction,
        "ParticipantsAddedMessage" => ActionKind::ParticipantsAdded,
        "ParticipantLeftMessage" => ActionKind::ParticipantLeft,
        "ThreadNameMessage" => ActionKind::ThreadRename,
        "ThreadImageMessage" => ActionKind::ThreadImage,
        "GenericAdminTextMessage" => ActionKind::AdminText,
        "VideoCallMessage" | "VoiceCallMessage" => ActionKind::Call,
        other => ActionKind::Other(other.to_string()),
    }
}

/// Millisecond timestamps arrive as strings, but accept numbers too.
fn parse_millis(value: &Value) -> Option<i64> {
    match value {
        Value::String(s) => s.trim().parse().ok(),
        Value::Number(n) => n.as_i64(),
        _ => None,
    }
}

fn id_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
