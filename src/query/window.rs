//! Splitting a query range into windows that stay under the result cap.
//!
//! Windows are contiguous and half-open. Walking starts at the filter's
//! start; a window is emitted while its end does not pass the filter's end.
//! A final stretch shorter than one window is dropped unless
//! [`WindowConfig::include_trailing_partial`] is set.

use chrono::{NaiveDateTime, TimeDelta};
use tracing::debug;

use super::error::QueryError;
use super::filter::QueryFilter;

/// Default window length in minutes.
pub const DEFAULT_WINDOW_MINUTES: u32 = 60;

/// How a range is cut into windows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowConfig {
    /// Window length in minutes; must be positive.
    pub window_minutes: u32,
    /// Emit the final window even when it is shorter than `window_minutes`.
    pub include_trailing_partial: bool,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            window_minutes: DEFAULT_WINDOW_MINUTES,
            include_trailing_partial: false,
        }
    }
}

impl WindowConfig {
    /// Default behavior with a custom window length.
    #[must_use]
    pub fn minutes(window_minutes: u32) -> Self {
        Self {
            window_minutes,
            ..Self::default()
        }
    }
}

/// Lazily yields one rewritten [`QueryFilter`] per window.
#[derive(Debug, Clone)]
pub struct WindowSplitter<'a> {
    filter: &'a QueryFilter,
    step: TimeDelta,
    cursor: NaiveDateTime,
    include_trailing_partial: bool,
    finished: bool,
}

/// Splits `filter` into windows.
///
/// # Errors
///
/// Returns [`QueryError::InvalidWindow`] for a zero window length and
/// [`QueryError::InvalidFilter`] when a template filter cannot be rewritten.
pub fn split(filter: &QueryFilter, config: WindowConfig) -> Result<WindowSplitter<'_>, QueryError> {
    if config.window_minutes == 0 {
        return Err(QueryError::InvalidWindow);
    }
    // Validates template anchors once, before any window is produced.
    filter.query_string()?;

    debug!(
        start = %filter.start(),
        end = %filter.end(),
        window_minutes = config.window_minutes,
        "splitting query range"
    );

    Ok(WindowSplitter {
        filter,
        step: TimeDelta::minutes(i64::from(config.window_minutes)),
        cursor: filter.start(),
        include_trailing_partial: config.include_trailing_partial,
        finished: false,
    })
}

impl Iterator for WindowSplitter<'_> {
    type Item = QueryFilter;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        let end = self.filter.end();
        match self.cursor.checked_add_signed(self.step) {
            Some(window_end) if window_end <= end => {
                let window = self.filter.with_range(self.cursor, window_end);
                self.cursor = window_end;
                Some(window)
            }
            _ => {
                self.finished = true;
                (self.include_trailing_partial && self.cursor < end)
                    .then(|| self.filter.with_range(self.cursor, end))
            }
        }
    }
}
