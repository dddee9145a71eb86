//! Pagination cursor engine.
//!
//! Drives repeated [`PageFetcher`] calls from the newest action backwards.
//! Each page after the first normally starts with the action that ended the
//! previous page, because the server treats the `before` bound inclusively
//! when it equals an action's exact timestamp. That repeated action is
//! dropped before the page is handed on.
//!
//! Exhaustion is explicit:
//! - an empty page ends the walk;
//! - a short page ends it once its fresh actions are emitted;
//! - a full page made only of repeats means the cursor sits inside a run of
//!   actions sharing one millisecond. The cursor is stepped one millisecond
//!   older and the boundary counts are cleared, so the following fetch
//!   either makes progress or comes back empty.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, warn};

use threadlog_client::PageFetcher;
use threadlog_core::{Action, ActionKey, Cursor, FetchError};

/// What the engine does with one fetched page.
#[derive(Debug)]
enum Step {
    Emit(Vec<Action>),
    /// Fresh actions from a short page; nothing older remains.
    Final(Vec<Action>),
    Stalled,
    Exhausted,
}

/// Boundary bookkeeping between pages.
#[derive(Debug, Default)]
struct CursorState {
    cursor: Cursor,
    first_page: bool,
    /// How many emitted actions at the cursor bound carry each key.
    boundary: HashMap<ActionKey, usize>,
}

impl CursorState {
    fn new(start: Cursor) -> Self {
        Self {
            cursor: start,
            first_page: true,
            ..Default::default()
        }
    }

    /// Number of leading actions already emitted at the cursor bound.
    ///
    /// Each emitted action cancels at most one repeat, so actions without an
    /// id that share a composite key are not mistaken for each other.
    fn duplicate_prefix(&self, page: &[Action]) -> usize {
        let Cursor::Before(bound) = self.cursor else {
            return 0;
        };
        let mut remaining = self.boundary.clone();
        page.iter()
            .take_while(|a| {
                if a.timestamp() != bound {
                    return false;
                }
                match remaining.get_mut(&a.key()) {
                    Some(count) if *count > 0 => {
                        *count -= 1;
                        true
                    }
                    _ => false,
                }
            })
            .count()
    }

    fn absorb(&mut self, mut page: Vec<Action>, limit: usize) -> Step {
        if page.is_empty() {
            return Step::Exhausted;
        }

        let fetched = page.len();
        let repeats = if self.first_page {
            0
        } else {
            self.duplicate_prefix(&page)
        };
        self.first_page = false;
        let fresh = page.split_off(repeats);

        if fresh.is_empty() {
            if fetched < limit {
                return Step::Exhausted;
            }
            warn!(cursor = %self.cursor, "Full page of repeated actions, stepping cursor back");
            self.cursor = self.cursor.step_back();
            self.boundary.clear();
            return Step::Stalled;
        }

        // Non-empty by the check above.
        let oldest = fresh[fresh.len() - 1].timestamp();
        let next = Cursor::Before(oldest);
        if next != self.cursor {
            self.boundary.clear();
        }
        for action in fresh.iter().filter(|a| a.timestamp() == oldest) {
            *self.boundary.entry(action.key()).or_insert(0) += 1;
        }
        self.cursor = next;

        debug!(fetched, repeats, cursor = %self.cursor, "Absorbed page");
        if fetched < limit {
            Step::Final(fresh)
        } else {
            Step::Emit(fresh)
        }
    }
}

/// Walks a thread's full action log, one page at a time.
pub struct CursorEngine {
    fetcher: Arc<dyn PageFetcher>,
    thread_id: String,
    page_size: usize,
    state: CursorState,
    fetches: usize,
    done: bool,
}

impl CursorEngine {
    /// Create an engine starting from the most recent action.
    pub fn new(fetcher: Arc<dyn PageFetcher>, thread_id: impl Into<String>, page_size: usize) -> Self {
        Self {
            fetcher,
            thread_id: thread_id.into(),
            page_size: page_size.max(1),
            state: CursorState::new(Cursor::Latest),
            fetches: 0,
            done: false,
        }
    }

    /// Start below an earlier cursor instead of at the newest action.
    pub fn starting_at(mut self, cursor: Cursor) -> Self {
        self.state = CursorState::new(cursor);
        self
    }

    pub fn thread_id(&self) -> &str {
        &self.thread_id
    }

    /// Cursor the next fetch will use.
    pub fn cursor(&self) -> Cursor {
        self.state.cursor
    }

    /// Successful fetches so far.
    pub fn fetches(&self) -> usize {
        self.fetches
    }

    pub fn is_done(&self) -> bool {
        self.done
    }

    /// Fetch the next non-empty batch, newest first.
    ///
    /// Returns `Ok(None)` once history is exhausted. After an error or
    /// exhaustion the engine stays finished.
    pub async fn next_batch(&mut self) -> Result<Option<Vec<Action>>, FetchError> {
        while !self.done {
            let page = match self
                .fetcher
                .fetch(&self.thread_id, self.state.cursor, self.page_size)
                .await
            {
                Ok(page) => page,
                Err(e) => {
                    self.done = true;
                    return Err(e);
                }
            };
            self.fetches += 1;

            match self.state.absorb(page, self.page_size) {
                Step::Emit(batch) => return Ok(Some(batch)),
                Step::Final(batch) => {
                    debug!(fetches = self.fetches, "Short page, action log exhausted");
                    self.done = true;
                    return Ok(Some(batch));
                }
                Step::Stalled => continue,
                Step::Exhausted => {
                    debug!(fetches = self.fetches, "Action log exhausted");
                    self.done = true;
                }
            }
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use threadlog_client::{Boundary, MemoryFetcher};
    use threadlog_core::action::timestamp_from_millis;
    use threadlog_core::ActionKind;

    const BASE_MS: i64 = 1_500_000_000_000;

    /// Actions 1..=count, one second apart, id "m{i}".
    fn history(count: usize) -> Vec<Action> {
        (1..=count)
            .map(|i| {
                Action::new(
                    ActionKind::Message,
                    "100",
                    timestamp_from_millis(BASE_MS + i as i64 * 1000).unwrap(),
                )
                .with_id(format!("m{}", i))
            })
            .collect()
    }

    async fn drain(engine: &mut CursorEngine) -> Vec<Vec<Action>> {
        let mut batches = Vec::new();
        while let Some(batch) = engine.next_batch().await.unwrap() {
            batches.push(batch);
        }
        batches
    }

    #[tokio::test]
    async fn test_boundary_repeat_dropped_once_per_page() {
        let fetcher = Arc::new(MemoryFetcher::new("t", history(1250)));
        let mut engine = CursorEngine::new(fetcher.clone(), "t", 500);

        let batches = drain(&mut engine).await;
        let sizes: Vec<_> = batches.iter().map(Vec::len).collect();

        // Server pages: 500, 500, 252; every page after the first opens with
        // a repeat and the short third page ends the walk.
        assert_eq!(sizes, vec![500, 499, 251]);
        assert_eq!(sizes.iter().sum::<usize>(), 1250);
        assert_eq!(fetcher.call_count(), 3);
        assert_eq!(engine.fetches(), 3);
    }

    #[tokio::test]
    async fn test_exclusive_server_loses_nothing() {
        let fetcher = Arc::new(
            MemoryFetcher::new("t", history(1250)).with_boundary(Boundary::Exclusive),
        );
        let mut engine = CursorEngine::new(fetcher.clone(), "t", 500);

        let sizes: Vec<_> = drain(&mut engine).await.iter().map(Vec::len).collect();
        assert_eq!(sizes, vec![500, 500, 250]);
        assert_eq!(fetcher.call_count(), 3);
    }

    #[tokio::test]
    async fn test_batches_are_newest_first_and_continuous() {
        let fetcher = Arc::new(MemoryFetcher::new("t", history(23)));
        let mut engine = CursorEngine::new(fetcher, "t", 5);

        let ids: Vec<String> = drain(&mut engine)
            .await
            .into_iter()
            .flatten()
            .map(|a| a.id().unwrap().to_string())
            .collect();
        let expected: Vec<String> = (1..=23).rev().map(|i| format!("m{}", i)).collect();
        assert_eq!(ids, expected);
    }

    #[tokio::test]
    async fn test_empty_thread() {
        let fetcher = Arc::new(MemoryFetcher::new("t", Vec::new()));
        let mut engine = CursorEngine::new(fetcher.clone(), "t", 10);

        assert!(engine.next_batch().await.unwrap().is_none());
        assert!(engine.is_done());
        assert!(engine.next_batch().await.unwrap().is_none());
        assert_eq!(fetcher.call_count(), 1);
    }

    #[tokio::test]
    async fn test_fetch_counts_for_exact_multiple() {
        // Strict bound: two full pages and the trailing empty one.
        let exclusive = Arc::new(MemoryFetcher::new("t", history(1000)).with_boundary(Boundary::Exclusive));
        let mut engine = CursorEngine::new(exclusive.clone(), "t", 500);
        let total: usize = drain(&mut engine).await.iter().map(Vec::len).sum();
        assert_eq!(total, 1000);
        assert_eq!(exclusive.call_count(), 3);

        // Inclusive bound: each later page carries one repeat, so the last
        // action spills into a short third page, which ends the walk.
        let inclusive = Arc::new(MemoryFetcher::new("t", history(1000)));
        let mut engine = CursorEngine::new(inclusive.clone(), "t", 500);
        let sizes: Vec<_> = drain(&mut engine).await.iter().map(Vec::len).collect();
        assert_eq!(sizes, vec![500, 499, 1]);
        assert_eq!(inclusive.call_count(), 3);
    }

    #[tokio::test]
    async fn test_full_page_of_one_millisecond_does_not_livelock() {
        // Eight actions at the same instant, then three older ones.
        let same = timestamp_from_millis(BASE_MS + 50_000).unwrap();
        let mut actions: Vec<Action> = (0..8)
            .map(|i| Action::new(ActionKind::Message, "1", same).with_id(format!("s{}", i)))
            .collect();
        actions.extend(history(3));

        let fetcher = Arc::new(MemoryFetcher::new("t", actions));
        let mut engine = CursorEngine::new(fetcher.clone(), "t", 4);

        let ids: Vec<String> = drain(&mut engine)
            .await
            .into_iter()
            .flatten()
            .map(|a| a.id().unwrap().to_string())
            .collect();

        // s4..s7 cannot be reached through a millisecond cursor; the walk
        // skips past them instead of spinning.
        assert_eq!(ids, vec!["s0", "s1", "s2", "s3", "m3", "m2", "m1"]);
        assert_eq!(fetcher.call_count(), 3);
    }

    #[tokio::test]
    async fn test_single_timestamp_thread_ends_after_stall() {
        // Every action shares one timestamp and the cursor cannot move.
        let same = timestamp_from_millis(BASE_MS).unwrap();
        let actions: Vec<Action> = (0..6)
            .map(|i| Action::new(ActionKind::Message, "1", same).with_id(format!("s{}", i)))
            .collect();
        let fetcher = Arc::new(MemoryFetcher::new("t", actions));
        let mut engine = CursorEngine::new(fetcher.clone(), "t", 3);

        let total: usize = drain(&mut engine).await.iter().map(Vec::len).sum();
        assert_eq!(total, 3);
        assert!(engine.is_done());
        assert_eq!(fetcher.call_count(), 3);
    }

    #[tokio::test]
    async fn test_error_finishes_engine() {
        let fetcher = Arc::new(MemoryFetcher::new("t", history(30)).fail_on_call(2));
        let mut engine = CursorEngine::new(fetcher, "t", 10);

        assert_eq!(engine.next_batch().await.unwrap().unwrap().len(), 10);
        assert!(matches!(engine.next_batch().await, Err(FetchError::Network(_))));
        assert!(engine.is_done());
        assert!(engine.next_batch().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_resume_from_cursor() {
        let fetcher = Arc::new(MemoryFetcher::new("t", history(10)).with_boundary(Boundary::Exclusive));
        let start = Cursor::from_millis(BASE_MS + 6 * 1000);
        let mut engine = CursorEngine::new(fetcher, "t", 4).starting_at(start);

        let ids: Vec<String> = drain(&mut engine)
            .await
            .into_iter()
            .flatten()
            .map(|a| a.id().unwrap().to_string())
            .collect();
        assert_eq!(ids, vec!["m5", "m4", "m3", "m2", "m1"]);
    }

    #[test]
    fn test_composite_keys_dedup_without_ids() {
        let ts = timestamp_from_millis(BASE_MS).unwrap();
        let older = timestamp_from_millis(BASE_MS - 1).unwrap();
        let mut state = CursorState::new(Cursor::Latest);

        let first = vec![Action::new(ActionKind::Message, "1", ts)];
        assert!(matches!(state.absorb(first, 1), Step::Emit(ref b) if b.len() == 1));

        let second = vec![
            Action::new(ActionKind::Message, "1", ts),
            Action::new(ActionKind::Message, "2", older),
        ];
        match state.absorb(second, 2) {
            Step::Emit(batch) => {
                assert_eq!(batch.len(), 1);
                assert_eq!(batch[0].actor_id(), "2");
            }
            other => panic!("unexpected step: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_identical_keyless_actions_split_across_pages() {
        // The two reactions share timestamp, actor and kind, and have no id.
        let at = |ms: i64| timestamp_from_millis(BASE_MS + ms).unwrap();
        let actions = vec![
            Action::new(ActionKind::Message, "1", at(9000)),
            Action::new(ActionKind::Reaction, "1", at(5000)),
            Action::new(ActionKind::Reaction, "1", at(5000)),
            Action::new(ActionKind::Message, "1", at(1000)),
        ];
        let fetcher = Arc::new(MemoryFetcher::new("t", actions));
        let mut engine = CursorEngine::new(fetcher, "t", 2);

        let kinds: Vec<ActionKind> = drain(&mut engine)
            .await
            .into_iter()
            .flatten()
            .map(|a| a.kind().clone())
            .collect();
        assert_eq!(
            kinds,
            vec![
                ActionKind::Message,
                ActionKind::Reaction,
                ActionKind::Reaction,
                ActionKind::Message,
            ]
        );
    }

    #[test]
    fn test_short_page_is_final() {
        let mut state = CursorState::new(Cursor::Latest);
        let page = vec![Action::new(ActionKind::Message, "1", timestamp_from_millis(BASE_MS).unwrap())];
        assert!(matches!(state.absorb(page, 5), Step::Final(ref b) if b.len() == 1));
    }
}
