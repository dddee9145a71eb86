//! Error types for Threadlog.
//!
//! Fetch failures carry enough structure for the CLI to suggest a fix.
//! Running out of history and caller cancellation are not errors and have
//! no variant here.

use thiserror::Error;

/// Result type alias using the top-level [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for Threadlog.
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Page fetch error with structured details
    #[error("{0}")]
    Fetch(#[from] FetchError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Validation error
    #[error("Validation error: {0}")]
    Validation(String),
}

impl Error {
    /// Get a recovery suggestion for this error.
    pub fn recovery_suggestion(&self) -> Option<&'static str> {
        match self {
            Error::Config(_) => Some("Check your config file at ~/.config/threadlog/config.toml"),
            Error::Fetch(e) => e.recovery_suggestion(),
            Error::Json(_) => Some("Check that the input is a JSON array of exported actions"),
            _ => None,
        }
    }
}

/// Failure of a single page fetch or one of its collaborators.
///
/// These are surfaced verbatim to the caller; nothing in the history engine
/// retries them.
#[derive(Error, Debug)]
pub enum FetchError {
    /// Server answered with a non-success status
    #[error("HTTP request failed: {status} - {message}")]
    Http { status: u16, message: String },

    /// Could not reach the server
    #[error("Network error: {0}")]
    Network(String),

    /// Request exceeded the configured timeout
    #[error("Request timed out after {seconds}s")]
    Timeout { seconds: u64 },

    /// The structured query itself reported an error
    #[error("Query failed: {message}")]
    Query { message: String },

    /// Response body could not be decoded
    #[error("Failed to decode response: {0}")]
    Decode(String),

    /// Thread does not exist or is not visible to this session
    #[error("Thread not found: {0}")]
    ThreadNotFound(String),

    /// Caller passed arguments the fetcher cannot honour
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl FetchError {
    /// Get a recovery suggestion for this error.
    pub fn recovery_suggestion(&self) -> Option<&'static str> {
        match self {
            FetchError::Http {
                status: 401 | 403, ..
            } => Some("Session values are missing or expired; refresh the cookie in your config"),
            FetchError::Http { status: 429, .. } => {
                Some("You've hit rate limits. Wait a moment and try again")
            }
            FetchError::Http {
                status: 500..=599, ..
            } => Some("The service is having issues. Try again later"),
            FetchError::Network(_) => Some("Check your internet connection"),
            FetchError::Timeout { .. } => Some("Raise client.timeout_secs or use a smaller page size"),
            FetchError::Query { .. } => Some("The query document id may be outdated; check client.action_log_doc_id"),
            FetchError::ThreadNotFound(_) => Some("Check the thread id (user id for 1:1 chats, thread id for groups)"),
            _ => None,
        }
    }

    /// Create a decode error from any displayable cause.
    pub fn decode(cause: impl std::fmt::Display) -> Self {
        FetchError::Decode(cause.to_string())
    }
}

/// Format an error with its recovery suggestion.
pub fn format_error_with_suggestion(error: &Error) -> String {
    let mut output = error.to_string();
    if let Some(suggestion) = error.recovery_suggestion() {
        output.push_str(&format!("\n  Suggestion: {}", suggestion));
    }
    output
}
