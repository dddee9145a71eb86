//! Action log page adapter.
//!
//! Turns one action log query into a newest-first page of [`Action`]s.

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::{debug, instrument};

use threadlog_core::config::DEFAULT_ACTION_LOG_DOC_ID;
use threadlog_core::{Action, Cursor, FetchError};

use crate::decode::decode_action;
use crate::traits::{PageFetcher, QueryExecutor};

/// [`PageFetcher`] backed by the action log query document.
pub struct ActionLogFetcher<Q: QueryExecutor> {
    executor: Q,
    doc_id: String,
}

impl<Q: QueryExecutor> ActionLogFetcher<Q> {
    pub fn new(executor: Q) -> Self {
        Self {
            executor,
            doc_id: DEFAULT_ACTION_LOG_DOC_ID.to_string(),
        }
    }

    /// Override the query document id.
    pub fn with_doc_id(mut self, doc_id: impl Into<String>) -> Self {
        self.doc_id = doc_id.into();
        self
    }

    fn variables(thread_id: &str, cursor: Cursor, limit: usize) -> Value {
        let before = match cursor.as_millis() {
            Some(ms) => Value::String(ms.to_string()),
            None => Value::Null,
        };
        json!({
            "id": thread_id,
            "message_limit": limit,
            "load_messages": 1,
            "load_read_receipts": true,
            "before": before,
        })
    }
}

#[async_trait]
impl<Q: QueryExecutor> PageFetcher for ActionLogFetcher<Q> {
    #[instrument(skip(self, cursor), fields(cursor = %cursor))]
    async fn fetch(
        &self,
        thread_id: &str,
        cursor: Cursor,
        limit: usize,
    ) -> Result<Vec<Action>, FetchError> {
        if limit == 0 {
            return Err(FetchError::InvalidRequest("limit must be greater than 0".to_string()));
        }

        let data = self
            .executor
            .run_query(&self.doc_id, Self::variables(thread_id, cursor, limit))
            .await?;

        let thread = match data.get("message_thread") {
            Some(thread) if !thread.is_null() => thread,
            _ => return Err(FetchError::ThreadNotFound(thread_id.to_string())),
        };

        let nodes = match thread.pointer("/messages/nodes") {
            Some(Value::Array(nodes)) => nodes.clone(),
            Some(Value::Null) | None => Vec::new(),
            Some(other) => {
                return Err(FetchError::Decode(format!("messages.nodes is not an array: {}", other)))
            }
        };

        // The server lists the page oldest first.
        let mut page = nodes
            .into_iter()
            .map(decode_action)
            .collect::<Result<Vec<_>, _>>()?;
        page.reverse();

        debug!(actions = page.len(), "Fetched action log page");
        Ok(page)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    struct RecordingExecutor {
        data: Value,
        calls: Mutex<Vec<(String, Value)>>,
    }

    impl RecordingExecutor {
        fn new(data: Value) -> Self {
            Self {
                data,
                calls: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl QueryExecutor for RecordingExecutor {
        async fn run_query(&self, doc_id: &str, variables: Value) -> Result<Value, FetchError> {
            self.calls.lock().push((doc_id.to_string(), variables));
            Ok(self.data.clone())
        }
    }

    fn node(id: &str, ts: i64) -> Value {
        json!({
            "__typename": "UserMessage",
            "message_id": id,
            "timestamp_precise": ts.to_string(),
            "message_sender": {"id": "1"},
            "message": {"text": id}
        })
    }

    #[tokio::test]
    async fn test_page_is_newest_first() {
        let data = json!({
            "message_thread": {"messages": {"nodes": [node("a", 100), node("b", 200), node("c", 300)]}}
        });
        let fetcher = ActionLogFetcher::new(RecordingExecutor::new(data));

        let page = fetcher.fetch("thread", Cursor::Latest, 3).await.unwrap();
        let ids: Vec<_> = page.iter().map(|a| a.id().unwrap()).collect();
        assert_eq!(ids, vec!["c", "b", "a"]);
    }

    #[tokio::test]
    async fn test_query_variables() {
        let data = json!({"message_thread": {"messages": {"nodes": []}}});
        let fetcher = ActionLogFetcher::new(RecordingExecutor::new(data)).with_doc_id("99");

        fetcher.fetch("123", Cursor::Latest, 20).await.unwrap();
        fetcher.fetch("123", Cursor::from_millis(1_234), 20).await.unwrap();

        let calls = fetcher.executor.calls.lock();
        assert_eq!(calls[0].0, "99");
        assert_eq!(calls[0].1["id"], "123");
        assert_eq!(calls[0].1["message_limit"], 20);
        assert!(calls[0].1["before"].is_null());
        assert_eq!(calls[1].1["before"], "1234");
    }

    #[tokio::test]
    async fn test_missing_thread() {
        let fetcher = ActionLogFetcher::new(RecordingExecutor::new(json!({"message_thread": null})));
        let err = fetcher.fetch("404", Cursor::Latest, 10).await.unwrap_err();
        assert!(matches!(err, FetchError::ThreadNotFound(ref id) if id == "404"));
    }

    #[tokio::test]
    async fn test_zero_limit_rejected() {
        let fetcher = ActionLogFetcher::new(RecordingExecutor::new(json!({})));
        let err = fetcher.fetch("1", Cursor::Latest, 0).await.unwrap_err();
        assert!(matches!(err, FetchError::InvalidRequest(_)));
        assert!(fetcher.executor.calls.lock().is_empty());
    }

    #[tokio::test]
    async fn test_bad_node_fails_whole_page() {
        let data = json!({
            "message_thread": {"messages": {"nodes": [node("a", 100), {"__typename": "UserMessage"}]}}
        });
        let fetcher = ActionLogFetcher::new(RecordingExecutor::new(data));
        let err = fetcher.fetch("1", Cursor::Latest, 10).await.unwrap_err();
        assert!(matches!(err, FetchError::Decode(_)));
    }
}
