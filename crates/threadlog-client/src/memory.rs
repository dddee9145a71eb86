//! In-memory [`PageFetcher`].
//!
//! Serves pages out of a fixed action list with the same paging rules as
//! the live endpoint. Backs `threadlog replay` and the engine's tests.

use async_trait::async_trait;
use parking_lot::Mutex;
use tracing::debug;

use threadlog_core::{Action, Cursor, FetchError};

use crate::traits::PageFetcher;

/// How the cursor bound is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Boundary {
    /// Actions at the bound are returned again (live endpoint behaviour)
    #[default]
    Inclusive,
    /// Only actions strictly older than the bound
    Exclusive,
}

/// Serves one thread's history from memory.
pub struct MemoryFetcher {
    thread_id: String,
    /// Newest first
    actions: Vec<Action>,
    boundary: Boundary,
    fail_on_call: Option<usize>,
    calls: Mutex<Vec<Cursor>>,
}

impl MemoryFetcher {
    /// Create a fetcher for `thread_id`. `actions` may be in any order.
    pub fn new(thread_id: impl Into<String>, mut actions: Vec<Action>) -> Self {
        // Stable: equal timestamps keep their given order.
        actions.sort_by_key(|a| std::cmp::Reverse(a.timestamp()));
        Self {
            thread_id: thread_id.into(),
            actions,
            boundary: Boundary::default(),
            fail_on_call: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn with_boundary(mut self, boundary: Boundary) -> Self {
        self.boundary = boundary;
        self
    }

    /// Fail the `n`th call (1-based) with a network error.
    pub fn fail_on_call(mut self, n: usize) -> Self {
        self.fail_on_call = Some(n);
        self
    }

    /// Number of fetches served so far, failed ones included.
    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }

    /// Cursors requested so far, in call order.
    pub fn requested_cursors(&self) -> Vec<Cursor> {
        self.calls.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    fn admits(&self, action: &Action, cursor: Cursor) -> bool {
        match cursor {
            Cursor::Latest => true,
            Cursor::Before(bound) => match self.boundary {
                Boundary::Inclusive => action.timestamp() <= bound,
                Boundary::Exclusive => action.timestamp() < bound,
            },
        }
    }
}

#[async_trait]
impl PageFetcher for MemoryFetcher {
    async fn fetch(
        &self,
        thread_id: &str,
        cursor: Cursor,
        limit: usize,
    ) -> Result<Vec<Action>, FetchError> {
        let call = {
            let mut calls = self.calls.lock();
            calls.push(cursor);
            calls.len()
        };

        if self.fail_on_call == Some(call) {
            return Err(FetchError::Network(format!("scripted failure on call {}", call)));
        }
        if limit == 0 {
            return Err(FetchError::InvalidRequest("limit must be greater than 0".to_string()));
        }
        if thread_id != self.thread_id {
            return Err(FetchError::ThreadNotFound(thread_id.to_string()));
        }

        let page: Vec<Action> = self
            .actions
            .iter()
            .filter(|a| self.admits(a, cursor))
            .take(limit)
            .cloned()
            .collect();

        debug!(call, cursor = %cursor, actions = page.len(), "Served page from memory");
        Ok(page)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use threadlog_core::action::timestamp_from_millis;
    use threadlog_core::ActionKind;

    fn action(ms: i64) -> Action {
        Action::new(ActionKind::Message, "1", timestamp_from_millis(ms).unwrap())
            .with_id(format!("m{}", ms))
    }

    fn millis(page: &[Action]) -> Vec<i64> {
        page.iter().map(Action::timestamp_ms).collect()
    }

    #[tokio::test]
    async fn test_pages_newest_first() {
        let fetcher = MemoryFetcher::new("t", vec![action(1), action(3), action(2)]);
        let page = fetcher.fetch("t", Cursor::Latest, 2).await.unwrap();
        assert_eq!(millis(&page), vec![3, 2]);
    }

    #[tokio::test]
    async fn test_boundary_modes() {
        let actions = vec![action(1), action(2), action(3)];

        let inclusive = MemoryFetcher::new("t", actions.clone());
        let page = inclusive.fetch("t", Cursor::from_millis(2), 10).await.unwrap();
        assert_eq!(millis(&page), vec![2, 1]);

        let exclusive = MemoryFetcher::new("t", actions).with_boundary(Boundary::Exclusive);
        let page = exclusive.fetch("t", Cursor::from_millis(2), 10).await.unwrap();
        assert_eq!(millis(&page), vec![1]);
    }

    #[tokio::test]
    async fn test_scripted_failure_and_call_log() {
        let fetcher = MemoryFetcher::new("t", vec![action(1)]).fail_on_call(2);
        assert!(fetcher.fetch("t", Cursor::Latest, 1).await.is_ok());
        assert!(matches!(
            fetcher.fetch("t", Cursor::from_millis(1), 1).await,
            Err(FetchError::Network(_))
        ));
        assert_eq!(fetcher.call_count(), 2);
        assert_eq!(fetcher.requested_cursors()[1], Cursor::from_millis(1));
    }

    #[tokio::test]
    async fn test_unknown_thread() {
        let fetcher = MemoryFetcher::new("t", vec![]);
        let err = fetcher.fetch("other", Cursor::Latest, 1).await.unwrap_err();
        assert!(matches!(err, FetchError::ThreadNotFound(_)));
    }
}
