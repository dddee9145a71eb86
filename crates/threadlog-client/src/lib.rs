//! # threadlog-client
//!
//! Remote access to a thread's action log.
//!
//! This crate provides:
//! - Collaborator traits: [`Transport`], [`QueryExecutor`] and [`PageFetcher`]
//! - A reqwest-backed HTTP transport
//! - The GraphQL batch executor and the action log page adapter
//! - Decoding of raw history nodes into [`threadlog_core::Action`]
//! - An in-memory fetcher for replaying exported history

pub mod action_log;
pub mod decode;
pub mod graphql;
pub mod http;
pub mod memory;
pub mod traits;

pub use action_log::ActionLogFetcher;
pub use decode::decode_action;
pub use graphql::GraphQlExecutor;
pub use http::HttpTransport;
pub use memory::{Boundary, MemoryFetcher};
pub use traits::{FormParams, PageFetcher, QueryExecutor, Transport};
