//! Collaborator trait definitions.
//!
//! The history engine only ever sees [`PageFetcher`]. The two lower traits
//! exist so the HTTP and query layers can be swapped out in tests.

use async_trait::async_trait;

use threadlog_core::{Action, Cursor, FetchError};

/// Ordered form parameters for a POST request.
pub type FormParams = Vec<(String, String)>;

/// Opaque request execution, including whatever session headers apply.
#[async_trait]
pub trait Transport: Send + Sync {
    /// POST form parameters to `url` and return the raw response body.
    async fn post(&self, url: &str, params: FormParams) -> Result<Vec<u8>, FetchError>;
}

/// Structured query executor.
#[async_trait]
pub trait QueryExecutor: Send + Sync {
    /// Run a stored query document and return its decoded `data` object.
    async fn run_query(
        &self,
        doc_id: &str,
        variables: serde_json::Value,
    ) -> Result<serde_json::Value, FetchError>;
}

/// Fetches one bounded page of a thread's action log.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Fetch up to `limit` actions at or older than `cursor`.
    ///
    /// The page is ordered newest first. Implementations may re-include the
    /// action whose timestamp equals the cursor bound. `limit` must be
    /// greater than zero.
    async fn fetch(
        &self,
        thread_id: &str,
        cursor: Cursor,
        limit: usize,
    ) -> Result<Vec<Action>, FetchError>;
}
