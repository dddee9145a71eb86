//! # threadlog-core
//!
//! Core types and abstractions for Threadlog, a client-side reader for
//! messaging thread history.
//!
//! This crate provides:
//! - The normalized [`Action`] record and its [`ActionKind`]
//! - The pagination [`Cursor`]
//! - Configuration system
//! - Common error types

pub mod action;
pub mod config;
pub mod cursor;
pub mod error;

pub use action::{Action, ActionKey, ActionKind};
pub use config::Config;
pub use cursor::Cursor;
pub use error::{Error, FetchError, Result};
