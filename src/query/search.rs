//! Search orchestrators built on [`QueryClient`].
//!
//! Both run strictly sequentially and abort on the first error. A failing
//! window almost always means the request is wrong, so partial results would
//! only hide that.

use chrono::NaiveDateTime;
use tracing::{debug, info, instrument};

use super::client::QueryClient;
use super::error::QueryError;
use super::filter::QueryFilter;
use super::mode::QueryMode;
use super::window::{WindowConfig, split};
use crate::table::{Cell, RecordTable};

/// Timestamp format of the `date` column in timeline responses.
pub const TIMELINE_DATE_FORMAT: &str = "%Y%m%dT%H%M%SZ";

/// Name of the timeline timestamp column.
const DATE_COLUMN: &str = "date";

/// Collects article records across a range wider than one capped query.
#[derive(Debug, Clone)]
pub struct ArticleSearch {
    client: QueryClient,
    include_trailing_partial: bool,
}

impl ArticleSearch {
    /// Creates an orchestrator that drops a trailing partial window.
    #[must_use]
    pub fn new(client: QueryClient) -> Self {
        Self {
            client,
            include_trailing_partial: false,
        }
    }

    /// Also query the final window when it is shorter than the window length.
    #[must_use]
    pub fn include_trailing_partial(mut self, include: bool) -> Self {
        self.include_trailing_partial = include;
        self
    }

    /// Queries every window of `filter` in order and concatenates the results.
    ///
    /// Row labels are kept per window; the result is not re-sorted.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::InvalidWindow`] for a zero window length,
    /// [`QueryError::InvalidFilter`] for a template without date anchors, and
    /// the first error raised by any window's query.
    #[instrument(skip(self, filter), fields(start = %filter.start(), end = %filter.end()))]
    pub async fn search(
        &self,
        filter: &QueryFilter,
        max_attempts: u32,
        window_minutes: u32,
    ) -> Result<RecordTable, QueryError> {
        let config = WindowConfig {
            window_minutes,
            include_trailing_partial: self.include_trailing_partial,
        };

        let mut tables = Vec::new();
        for window in split(filter, config)? {
            let query_string = window.query_string()?;
            let table = self
                .client
                .query(&query_string, QueryMode::ArticleList, max_attempts)
                .await?;
            debug!(
                window_start = %window.start(),
                window_end = %window.end(),
                rows = table.len(),
                "window complete"
            );
            tables.push(table);
        }

        let windows = tables.len();
        let merged = RecordTable::concat(tables);
        info!(windows, rows = merged.len(), "article search complete");
        Ok(merged)
    }
}

/// Runs one aggregate query and normalizes its timestamps.
#[derive(Debug, Clone)]
pub struct TimelineSearch {
    client: QueryClient,
}

impl TimelineSearch {
    /// Creates a timeline orchestrator.
    #[must_use]
    pub fn new(client: QueryClient) -> Self {
        Self { client }
    }

    /// Queries `filter` once in `mode` and parses the `date` column.
    ///
    /// Aggregate modes return bucketed summaries, so no windowing is applied.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::InvalidTimestamp`] when a `date` cell does not
    /// match [`TIMELINE_DATE_FORMAT`], plus anything [`QueryClient::query`]
    /// returns.
    #[instrument(skip(self, filter), fields(start = %filter.start(), end = %filter.end()))]
    pub async fn search(
        &self,
        filter: &QueryFilter,
        max_attempts: u32,
        mode: QueryMode,
    ) -> Result<RecordTable, QueryError> {
        let query_string = filter.query_string()?;
        let mut table = self.client.query(&query_string, mode, max_attempts).await?;
        table.map_column(DATE_COLUMN, parse_timeline_date)?;
        info!(rows = table.len(), "timeline search complete");
        Ok(table)
    }

    /// [`TimelineSearch::search`] with the timeline volume mode.
    ///
    /// # Errors
    ///
    /// See [`TimelineSearch::search`].
    pub async fn search_volume(
        &self,
        filter: &QueryFilter,
        max_attempts: u32,
    ) -> Result<RecordTable, QueryError> {
        self.search(filter, max_attempts, QueryMode::TimelineVolume)
            .await
    }
}

fn parse_timeline_date(cell: &Cell) -> Result<Cell, QueryError> {
    match cell {
        Cell::Null => Ok(Cell::Null),
        Cell::Timestamp(ts) => Ok(Cell::Timestamp(*ts)),
        Cell::Text(text) => NaiveDateTime::parse_from_str(text, TIMELINE_DATE_FORMAT)
            .map(Cell::Timestamp)
            .map_err(|_| QueryError::InvalidTimestamp {
                value: text.clone(),
                expected: "YYYYMMDDTHHMMSSZ",
            }),
        other => Err(QueryError::InvalidTimestamp {
            value: format!("{other:?}"),
            expected: "YYYYMMDDTHHMMSSZ",
        }),
    }
}
