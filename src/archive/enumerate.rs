//! Turning a date range into the list of archives to download.

use chrono::NaiveDateTime;
use tracing::debug;

use super::error::ArchiveError;
use super::family::ArchiveFamily;

/// One archive to fetch: its URL and the grid point it covers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveDescriptor {
    /// Full download URL.
    pub url: String,
    /// Grid timestamp encoded in the file name.
    pub timestamp: NaiveDateTime,
}

/// Produces [`ArchiveDescriptor`]s for one family.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEnumerator {
    family: ArchiveFamily,
    base_url: String,
}

impl ArchiveEnumerator {
    /// Enumerator for the family's published location.
    #[must_use]
    pub fn new(family: ArchiveFamily) -> Self {
        Self {
            family,
            base_url: family.default_base_url().to_string(),
        }
    }

    /// Overrides the base URL (mirrors, tests). A trailing `/` is added
    /// when missing.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        if !base_url.ends_with('/') {
            base_url.push('/');
        }
        self.base_url = base_url;
        self
    }

    /// The family being enumerated.
    #[must_use]
    pub fn family(&self) -> ArchiveFamily {
        self.family
    }

    /// Every grid point in `[start, end]`, in time order.
    ///
    /// An off-grid `start` is rounded up to the next grid point; `end` is
    /// inclusive.
    ///
    /// # Errors
    ///
    /// Returns [`ArchiveError::InvalidRange`] when `start > end`.
    pub fn enumerate(
        &self,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Result<Vec<ArchiveDescriptor>, ArchiveError> {
        if start > end {
            return Err(ArchiveError::InvalidRange { start, end });
        }

        let grid = self.family.grid();
        let step = grid.step();
        let mut descriptors = Vec::new();
        let mut cursor = grid.ceil(start);
        while cursor <= end {
            descriptors.push(ArchiveDescriptor {
                url: format!("{}{}", self.base_url, self.family.file_name(cursor)),
                timestamp: cursor,
            });
            cursor += step;
        }

        debug!(
            family = %self.family,
            %start,
            %end,
            count = descriptors.len(),
            "enumerated archives"
        );
        Ok(descriptors)
    }
}

/// Enumerates `family` at its published location.
///
/// # Errors
///
/// See [`ArchiveEnumerator::enumerate`].
pub fn enumerate(
    start: NaiveDateTime,
    end: NaiveDateTime,
    family: ArchiveFamily,
) -> Result<Vec<ArchiveDescriptor>, ArchiveError> {
    ArchiveEnumerator::new(family).enumerate(start, end)
}
