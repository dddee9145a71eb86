//! # threadlog-history
//!
//! Full action log retrieval for a thread.
//!
//! This crate provides:
//! - [`CursorEngine`], which walks the server's bounded pages from newest to
//!   oldest and removes the action repeated at each page boundary
//! - [`HistoryStream`], a cancellable, back-pressured stream of actions fed
//!   by a background fetch task
//! - [`ThreadHistory`], the entry point tying both to a [`PageFetcher`]
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use threadlog_core::Config;
//! use threadlog_history::ThreadHistory;
//!
//! let history = ThreadHistory::from_config(&Config::load_validated()?)?;
//! let (mut actions, errors) = history.stream_full_history("100004", None).split();
//! while let Some(action) = actions.recv().await {
//!     println!("{} {}", action.timestamp(), action.kind());
//! }
//! if let Some(err) = errors.wait().await {
//!     eprintln!("history incomplete: {}", err);
//! }
//! ```
//!
//! [`PageFetcher`]: threadlog_client::PageFetcher

pub mod cursor;
pub mod history;
pub mod stream;

pub use cursor::CursorEngine;
pub use history::ThreadHistory;
pub use stream::{ActionStream, ErrorSlot, HistoryStream, StreamOptions};
