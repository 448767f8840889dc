//! Error types for the bulk archive path.
//!
//! [`ArchiveFileError`] describes why one archive was unusable; it never
//! aborts a batch. [`ArchiveError`] is what a whole batch can fail with.

use chrono::NaiveDateTime;
use thiserror::Error;

use crate::fetch::FetchError;
use crate::table::TableError;

/// Why a single archive produced no table.
#[derive(Debug, Error)]
pub enum ArchiveFileError {
    /// The download failed for a reason other than 404.
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// The body is not a readable zip archive.
    #[error("unreadable zip archive: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// The archive does not hold exactly one file.
    #[error("expected a single-file archive, found {count} entries")]
    EntryCount {
        /// Number of entries found.
        count: usize,
    },

    /// The compressed entry could not be read.
    #[error("failed to read archive entry: {0}")]
    Io(#[from] std::io::Error),

    /// A row has more fields than the family schema.
    #[error("line {line} has {actual} fields, schema has {expected}")]
    RowTooWide {
        /// One-based line number within the entry.
        line: usize,
        /// Fields found on the line.
        actual: usize,
        /// Schema width.
        expected: usize,
    },

    /// A parsed row could not be added to the table.
    #[error("malformed row: {0}")]
    Table(#[from] TableError),

    /// The parse task died before returning.
    #[error("parse task failed: {reason}")]
    Task {
        /// Join error description.
        reason: String,
    },
}

/// Errors that abort a bulk enumeration or fetch.
#[derive(Debug, Error)]
pub enum ArchiveError {
    /// The enumeration start lies after its end.
    #[error("invalid range: start {start} is after end {end}")]
    InvalidRange {
        /// Range start.
        start: NaiveDateTime,
        /// Range end.
        end: NaiveDateTime,
    },

    /// Worker pool size must be positive.
    #[error("invalid concurrency value {value}: must be at least 1")]
    InvalidConcurrency {
        /// The rejected value.
        value: usize,
    },

    /// Not a single archive produced a table.
    #[error(
        "all {attempted} archive fetches failed ({not_found} not found, {failed} unreadable or unreachable)"
    )]
    AllFetchesFailed {
        /// Number of descriptors dispatched.
        attempted: usize,
        /// Archives the server does not have.
        not_found: usize,
        /// Archives that failed to download or parse.
        failed: usize,
    },

    /// The HTTP client could not be built.
    #[error(transparent)]
    Client(#[from] FetchError),

    /// The merged table did not match the family schema.
    #[error("merged table does not match archive schema: {0}")]
    Schema(#[from] TableError),
}
