//! Thread history actions.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// What kind of event an [`Action`] records.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ActionKind {
    /// Plain text (or attachment) message
    Message,
    /// Sticker message
    Sticker,
    /// Reaction to an earlier message
    Reaction,
    /// Participants were added to the thread
    ParticipantsAdded,
    /// A participant left or was removed
    ParticipantLeft,
    /// Thread was renamed
    ThreadRename,
    /// Thread image was changed
    ThreadImage,
    /// Generic administrative notice (nicknames, colors, ...)
    AdminText,
    /// Voice or video call log entry
    Call,
    /// Anything else, keyed by the server's type name
    Other(String),
}

impl ActionKind {
    /// Stable label used for display and serialization.
    pub fn as_str(&self) -> &str {
        match self {
            ActionKind::Message => "message",
            ActionKind::Sticker => "sticker",
            ActionKind::Reaction => "reaction",
            ActionKind::ParticipantsAdded => "participants_added",
            ActionKind::ParticipantLeft => "participant_left",
            ActionKind::ThreadRename => "thread_rename",
            ActionKind::ThreadImage => "thread_image",
            ActionKind::AdminText => "admin_text",
            ActionKind::Call => "call",
            ActionKind::Other(name) => name,
        }
    }

    /// Whether this action changed who is in the thread.
    pub fn is_membership_change(&self) -> bool {
        matches!(self, ActionKind::ParticipantsAdded | ActionKind::ParticipantLeft)
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<String> for ActionKind {
    fn from(label: String) -> Self {
        match label.as_str() {
            "message" => ActionKind::Message,
            "sticker" => ActionKind::Sticker,
            "reaction" => ActionKind::Reaction,
            "participants_added" => ActionKind::ParticipantsAdded,
            "participant_left" => ActionKind::ParticipantLeft,
            "thread_rename" => ActionKind::ThreadRename,
            "thread_image" => ActionKind::ThreadImage,
            "admin_text" => ActionKind::AdminText,
            "call" => ActionKind::Call,
            _ => ActionKind::Other(label),
        }
    }
}

impl From<ActionKind> for String {
    fn from(kind: ActionKind) -> Self {
        match kind {
            ActionKind::Other(name) => name,
            other => other.as_str().to_string(),
        }
    }
}

/// Identity of an action, used to recognise the same record across pages.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ActionKey {
    /// Server-assigned message id
    Id(String),
    /// Fallback for records without an id
    Composite {
        timestamp_ms: i64,
        actor_id: String,
        kind: ActionKind,
    },
}

/// One normalized event in a thread's history.
///
/// Actions are built once, when a page is decoded, and never mutated
/// afterwards; all fields are read through accessors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Action {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    id: Option<String>,
    kind: ActionKind,
    actor_id: String,
    timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    raw: serde_json::Value,
}

impl Action {
    /// Create an action with no id, text or raw payload.
    pub fn new(kind: ActionKind, actor_id: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            id: None,
            kind,
            actor_id: actor_id.into(),
            timestamp,
            text: None,
            raw: serde_json::Value::Null,
        }
    }

    /// Attach the server message id.
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Attach the message body.
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    /// Attach the undecoded server payload.
    pub fn with_raw(mut self, raw: serde_json::Value) -> Self {
        self.raw = raw;
        self
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn kind(&self) -> &ActionKind {
        &self.kind
    }

    pub fn actor_id(&self) -> &str {
        &self.actor_id
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    /// Kind-specific fields the decoder does not model.
    pub fn raw(&self) -> &serde_json::Value {
        &self.raw
    }

    /// Timestamp as milliseconds since the Unix epoch.
    pub fn timestamp_ms(&self) -> i64 {
        self.timestamp.timestamp_millis()
    }

    /// Identity used for boundary deduplication.
    pub fn key(&self) -> ActionKey {
        match &self.id {
            Some(id) => ActionKey::Id(id.clone()),
            None => ActionKey::Composite {
                timestamp_ms: self.timestamp_ms(),
                actor_id: self.actor_id.clone(),
                kind: self.kind.clone(),
            },
        }
    }
}

/// Convert epoch milliseconds to a UTC timestamp.
pub fn timestamp_from_millis(ms: i64) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp_millis(ms)
}
