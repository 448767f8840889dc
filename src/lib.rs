//! Newsfeed Core Library
//!
//! Retrieval of news coverage records from GDELT under a hard per-request
//! result cap, and bulk merging of its published knowledge-graph archives.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//! - [`fetch`] - Remote fetch capability and the reqwest-backed client
//! - [`query`] - Live query path: filters, windowing, resilient decoding, searches
//! - [`archive`] - Bulk archive path: grid enumeration, parallel fetch, merge
//! - [`table`] - Record table shared by both paths

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod archive;
pub mod fetch;
pub mod query;
pub mod table;
pub mod user_agent;

#[cfg(test)]
pub(crate) mod test_support;

// Re-export commonly used types
pub use archive::{
    ArchiveDescriptor, ArchiveError, ArchiveFamily, BulkFetchConfig, BulkFetcher, enumerate,
};
pub use fetch::{FetchError, Fetcher, HttpClient, RequestOptions};
pub use query::{
    ArticleSearch, QueryClient, QueryError, QueryFilter, QueryMode, ResilientDecoder,
    TimelineSearch,
};
pub use table::{Cell, RecordTable, TableError};
pub use user_agent::random_identity;
