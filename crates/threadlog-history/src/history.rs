//! Public entry point for reading a thread's history.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use threadlog_client::{ActionLogFetcher, GraphQlExecutor, HttpTransport, PageFetcher};
use threadlog_core::config::HistoryConfig;
use threadlog_core::{Action, Config, Cursor, Error, Result};

use crate::stream::{HistoryStream, StreamOptions};

/// Reads threads through one [`PageFetcher`].
#[derive(Clone)]
pub struct ThreadHistory {
    fetcher: Arc<dyn PageFetcher>,
    config: HistoryConfig,
}

impl ThreadHistory {
    /// Create a reader with default history settings.
    pub fn new(fetcher: Arc<dyn PageFetcher>) -> Self {
        Self {
            fetcher,
            config: HistoryConfig::default(),
        }
    }

    pub fn with_config(mut self, config: HistoryConfig) -> Self {
        self.config = config;
        self
    }

    /// Build the live reader: HTTP transport, batch query executor and the
    /// action log adapter.
    pub fn from_config(config: &Config) -> Result<Self> {
        let transport = HttpTransport::from_config(&config.client)?;
        let executor = GraphQlExecutor::new(transport, &config.client.base_url);
        let fetcher = ActionLogFetcher::new(executor).with_doc_id(config.client.action_log_doc_id.clone());

        debug!(base_url = %config.client.base_url, "Created action log fetcher");
        Ok(Self::new(Arc::new(fetcher)).with_config(config.history.clone()))
    }

    pub fn config(&self) -> &HistoryConfig {
        &self.config
    }

    /// Fetch a single page older than `before`, newest first.
    pub async fn fetch_page(&self, thread_id: &str, before: Cursor, limit: usize) -> Result<Vec<Action>> {
        if limit == 0 {
            return Err(Error::Validation("limit must be greater than 0".to_string()));
        }
        Ok(self.fetcher.fetch(thread_id, before, limit).await?)
    }

    /// Stream the whole history of `thread_id`, newest first.
    pub fn stream_full_history(&self, thread_id: &str, cancel: Option<CancellationToken>) -> HistoryStream {
        self.stream_from(thread_id, Cursor::Latest, cancel)
    }

    /// Stream everything below `start`.
    ///
    /// The first page is taken as the server returns it, so an action
    /// sitting exactly on `start` is delivered again when the server bounds
    /// inclusively.
    pub fn stream_from(&self, thread_id: &str, start: Cursor, cancel: Option<CancellationToken>) -> HistoryStream {
        let options = StreamOptions {
            start,
            ..StreamOptions::from(&self.config)
        };
        HistoryStream::start(self.fetcher.clone(), thread_id, options, cancel)
    }

    /// Read the whole history into memory.
    ///
    /// Fails with the fetch error that ended the walk, discarding what was
    /// read before it.
    pub async fn collect_all(&self, thread_id: &str) -> Result<Vec<Action>> {
        let (actions, error) = self.stream_full_history(thread_id, None).collect().await;
        if let Some(e) = error {
            return Err(e.into());
        }
        info!(thread_id, count = actions.len(), "Collected thread history");
        Ok(actions)
    }
}
