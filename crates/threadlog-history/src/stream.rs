//! Streaming session over the cursor engine.
//!
//! A background task runs the [`CursorEngine`] and pushes actions into a
//! bounded channel. The consumer reads them through an [`ActionStream`] and
//! learns how the session ended from an [`ErrorSlot`].
//!
//! ## Architecture
//!
//! ```text
//! fetch task (sole writer)
//!   ├─> mpsc::Sender<Action>      (bounded, back-pressure)
//!   └─> oneshot::Sender<FetchError> (at most one error)
//! consumer
//!   ├─> ActionStream  (closes when the task ends)
//!   └─> ErrorSlot     (resolves when the task ends)
//! ```
//!
//! Both senders are owned by the task and dropped when it returns, so each
//! output is finalized exactly once whether the walk was exhausted, failed
//! or was cancelled.

use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures::Stream;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio_util::sync::{CancellationToken, DropGuard};
use tracing::{debug, info, info_span, warn, Instrument};

use threadlog_client::PageFetcher;
use threadlog_core::config::HistoryConfig;
use threadlog_core::{Action, Cursor, FetchError};

use crate::cursor::CursorEngine;

/// Parameters of one streaming session.
#[derive(Debug, Clone, Copy)]
pub struct StreamOptions {
    /// Actions requested per page
    pub page_size: usize,
    /// Actions buffered ahead of the consumer
    pub buffer_capacity: usize,
    /// Where the walk begins
    pub start: Cursor,
}

impl Default for StreamOptions {
    fn default() -> Self {
        Self::from(&HistoryConfig::default())
    }
}

impl From<&HistoryConfig> for StreamOptions {
    fn from(config: &HistoryConfig) -> Self {
        Self {
            page_size: config.page_size,
            buffer_capacity: config.buffer_capacity,
            start: Cursor::Latest,
        }
    }
}

/// How a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    Exhausted,
    Cancelled,
    Failed,
}

/// Actions of a running session, newest first.
///
/// Dropping this handle cancels the session.
pub struct ActionStream {
    rx: mpsc::Receiver<Action>,
    _cancel_on_drop: DropGuard,
}

impl ActionStream {
    /// Receive the next action; `None` once the session has ended and the
    /// buffer is drained.
    pub async fn recv(&mut self) -> Option<Action> {
        self.rx.recv().await
    }
}

impl Stream for ActionStream {
    type Item = Action;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Action>> {
        self.rx.poll_recv(cx)
    }
}

/// Single-slot report of a session failure.
pub struct ErrorSlot {
    rx: oneshot::Receiver<FetchError>,
}

impl ErrorSlot {
    /// Wait for the session to end. Returns the fetch error that aborted
    /// it, or `None` after exhaustion or cancellation.
    pub async fn wait(self) -> Option<FetchError> {
        self.rx.await.ok()
    }

    /// Take the error if one has been reported already.
    pub fn try_take(&mut self) -> Option<FetchError> {
        self.rx.try_recv().ok()
    }
}

/// A running history session.
pub struct HistoryStream {
    actions: ActionStream,
    errors: ErrorSlot,
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl HistoryStream {
    /// Spawn the fetch task for `thread_id`.
    ///
    /// When `cancel` is given the session stops once it is cancelled; the
    /// session itself only ever cancels a child of it. Must be called from
    /// within a tokio runtime.
    pub fn start(
        fetcher: Arc<dyn PageFetcher>,
        thread_id: impl Into<String>,
        options: StreamOptions,
        cancel: Option<CancellationToken>,
    ) -> Self {
        let thread_id = thread_id.into();
        let cancel = match cancel {
            Some(parent) => parent.child_token(),
            None => CancellationToken::new(),
        };

        let (tx, rx) = mpsc::channel(options.buffer_capacity.max(1));
        let (error_tx, error_rx) = oneshot::channel();

        let engine = CursorEngine::new(fetcher, thread_id.clone(), options.page_size)
            .starting_at(options.start);
        let span = info_span!("history_stream", thread_id = %thread_id);
        let task = tokio::spawn(produce(engine, tx, error_tx, cancel.clone()).instrument(span));

        Self {
            actions: ActionStream {
                rx,
                _cancel_on_drop: cancel.clone().drop_guard(),
            },
            errors: ErrorSlot { rx: error_rx },
            cancel,
            task,
        }
    }

    /// Receive the next action.
    pub async fn recv(&mut self) -> Option<Action> {
        self.actions.recv().await
    }

    /// Ask the fetch task to stop.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Whether the fetch task has ended.
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Separate the action sequence from the error slot.
    pub fn split(self) -> (ActionStream, ErrorSlot) {
        (self.actions, self.errors)
    }

    /// Drain the remaining actions and report how the session ended.
    pub async fn collect(self) -> (Vec<Action>, Option<FetchError>) {
        let (mut actions, errors) = self.split();
        let mut collected = Vec::new();
        while let Some(action) = actions.recv().await {
            collected.push(action);
        }
        (collected, errors.wait().await)
    }
}

/// Body of the fetch task.
async fn produce(
    mut engine: CursorEngine,
    tx: mpsc::Sender<Action>,
    error_tx: oneshot::Sender<FetchError>,
    cancel: CancellationToken,
) {
    let mut delivered = 0usize;

    let outcome = 'session: loop {
        let next = tokio::select! {
            biased;
            _ = cancel.cancelled() => break Outcome::Cancelled,
            next = engine.next_batch() => next,
        };

        let batch = match next {
            Ok(Some(batch)) => batch,
            Ok(None) => break Outcome::Exhausted,
            Err(e) => {
                warn!(fetches = engine.fetches(), "Fetch failed: {}", e);
                // The receiver may be gone already; nobody is left to tell.
                let _ = error_tx.send(e);
                break Outcome::Failed;
            }
        };

        if cancel.is_cancelled() {
            break Outcome::Cancelled;
        }

        debug!(actions = batch.len(), cursor = %engine.cursor(), "Pushing batch");
        for action in batch {
            let sent = tokio::select! {
                biased;
                _ = cancel.cancelled() => false,
                sent = tx.send(action) => sent.is_ok(),
            };
            if !sent {
                break 'session Outcome::Cancelled;
            }
            delivered += 1;
        }
    };

    match outcome {
        Outcome::Exhausted => info!(delivered, fetches = engine.fetches(), "History complete"),
        Outcome::Cancelled => info!(delivered, fetches = engine.fetches(), "History stream cancelled"),
        Outcome::Failed => info!(delivered, fetches = engine.fetches(), "History stream aborted"),
    }
}
