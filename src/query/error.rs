//! Error types for the live query path.
//!
//! Any of these aborts the enclosing search: a failing window usually means
//! the request itself is wrong and every later window would fail the same way.

use chrono::NaiveDateTime;
use thiserror::Error;

use super::decode::DecodeError;
use crate::fetch::FetchError;
use crate::table::TableError;

/// Errors that can occur while building or running a live query.
#[derive(Debug, Error)]
pub enum QueryError {
    /// The query string was empty.
    #[error("query string must be provided")]
    EmptyQueryString,

    /// The query mode was empty.
    #[error("query mode must be provided")]
    EmptyMode,

    /// The query mode is not one the service understands.
    #[error("unknown query mode: {mode}")]
    UnknownMode {
        /// The rejected mode label.
        mode: String,
    },

    /// A required filter field was not provided.
    #[error("filter must be provided: missing {field}")]
    MissingFilter {
        /// Name of the missing field.
        field: &'static str,
    },

    /// A template query string lacks the anchors needed for date rewriting.
    #[error("invalid filter: {reason}")]
    InvalidFilter {
        /// What is wrong with the template.
        reason: String,
    },

    /// The filter's start lies after its end.
    #[error("invalid range: start {start} is after end {end}")]
    InvalidRange {
        /// Range start.
        start: NaiveDateTime,
        /// Range end.
        end: NaiveDateTime,
    },

    /// Window length must be positive.
    #[error("window length must be at least one minute")]
    InvalidWindow,

    /// A timestamp could not be parsed.
    #[error("invalid timestamp {value:?}: expected {expected}")]
    InvalidTimestamp {
        /// The rejected input.
        value: String,
        /// Human-readable expected format.
        expected: &'static str,
    },

    /// The service reported the range too small to aggregate.
    #[error("timespan is too short")]
    TimespanTooShort,

    /// The response body could not be decoded.
    #[error(transparent)]
    Decode(#[from] DecodeError),

    /// The decoded response lacks the structure the mode requires.
    #[error("unexpected {mode} response: {detail}")]
    UnexpectedShape {
        /// The mode that was queried.
        mode: &'static str,
        /// What was missing or malformed.
        detail: String,
    },

    /// The response records could not be turned into a table.
    #[error("malformed records: {0}")]
    Table(#[from] TableError),

    /// The request could not be completed.
    #[error(transparent)]
    Transport(#[from] FetchError),
}

impl QueryError {
    /// Creates an invalid-filter error.
    pub fn invalid_filter(reason: impl Into<String>) -> Self {
        Self::InvalidFilter {
            reason: reason.into(),
        }
    }

    /// Creates an unexpected-shape error.
    pub fn unexpected_shape(mode: &'static str, detail: impl Into<String>) -> Self {
        Self::UnexpectedShape {
            mode,
            detail: detail.into(),
        }
    }
}
