//! Bulk archive families: where files live, how they are named and what
//! columns they carry.

use std::fmt;
use std::time::Duration;

use chrono::{NaiveDateTime, TimeDelta};

/// Base URL of GKG 1.0 daily archives.
pub const GKG_V1_BASE_URL: &str = "http://data.gdeltproject.org/gkg/";

/// Base URL of GKG 2.0 15-minute archives.
pub const GKG_V2_BASE_URL: &str = "http://data.gdeltproject.org/gdeltv2/";

const GKG_V1_COLUMNS: [&str; 11] = [
    "DATE",
    "NUMARTS",
    "COUNTS",
    "THEMES",
    "LOCATIONS",
    "PERSONS",
    "ORGANIZATIONS",
    "TONE",
    "CAMEOEVENTIDS",
    "SOURCES",
    "SOURCEURLS",
];

const GKG_V2_COLUMNS: [&str; 27] = [
    "GKGRECORDID",
    "V2.1DATE",
    "V2SOURCECOLLECTIONIDENTIFIER",
    "V2SOURCECOMMONNAME",
    "V2DOCUMENTIDENTIFIER",
    "V1COUNTS",
    "V2COUNTS",
    "V1THEMES",
    "V2ENHANCEDTHEMES",
    "V1LOCATIONS",
    "V2ENHANCEDLOCATIONS",
    "V1PERSONS",
    "V2ENHANCEDPERSONS",
    "V1ORGANIZATIONS",
    "V2ENHANCEDORGANIZATIONS",
    "V1TONE",
    "V2ENHANCEDDATES",
    "V2GCAM",
    "V2SHARINGIMAGE",
    "V2RELATEDIMAGES",
    "V2SOCIALIMAGEEMBEDS",
    "V2SOCIALVIDEOEMBEDS",
    "V2QUOTATIONS",
    "V2ALLNAMES",
    "V2AMOUNTS",
    "V2TRANSLATIONINFO",
    "V2EXTRASXML",
];

/// Publication grid of an archive family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Grid {
    /// One file per day at midnight.
    Daily,
    /// One file every 15 minutes.
    QuarterHour,
}

impl Grid {
    /// Distance between two grid points.
    #[must_use]
    pub fn step(self) -> TimeDelta {
        match self {
            Self::Daily => TimeDelta::days(1),
            Self::QuarterHour => TimeDelta::minutes(15),
        }
    }

    /// Rounds `ts` up to the nearest grid point (identity when on the grid).
    #[must_use]
    pub fn ceil(self, ts: NaiveDateTime) -> NaiveDateTime {
        let step = self.step().num_seconds();
        let midnight = ts.date().and_time(chrono::NaiveTime::MIN);
        let offset = (ts - midnight).num_seconds();
        let snapped = (offset + step - 1) / step * step;
        midnight + TimeDelta::seconds(snapped)
    }
}

/// One generation of bulk archives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveFamily {
    /// GKG 1.0: daily files, 11 columns.
    GkgV1,
    /// GKG 2.0: 15-minute files, 27 columns; `translation` selects the
    /// machine-translated feed instead of the English one.
    GkgV2 {
        /// Use the `.translation` file variant.
        translation: bool,
    },
}

impl ArchiveFamily {
    /// Fixed base URL the family is published under.
    #[must_use]
    pub fn default_base_url(self) -> &'static str {
        match self {
            Self::GkgV1 => GKG_V1_BASE_URL,
            Self::GkgV2 { .. } => GKG_V2_BASE_URL,
        }
    }

    /// Publication grid.
    #[must_use]
    pub fn grid(self) -> Grid {
        match self {
            Self::GkgV1 => Grid::Daily,
            Self::GkgV2 { .. } => Grid::QuarterHour,
        }
    }

    /// File name for the archive published at `ts`.
    #[must_use]
    pub fn file_name(self, ts: NaiveDateTime) -> String {
        match self {
            Self::GkgV1 => format!("{}.gkg.csv.zip", ts.format("%Y%m%d")),
            Self::GkgV2 { translation: false } => {
                format!("{}.gkg.csv.zip", ts.format("%Y%m%d%H%M%S"))
            }
            Self::GkgV2 { translation: true } => {
                format!("{}.translation.gkg.csv.zip", ts.format("%Y%m%d%H%M%S"))
            }
        }
    }

    /// Column names of every file in the family, in file order.
    #[must_use]
    pub fn columns(self) -> &'static [&'static str] {
        match self {
            Self::GkgV1 => &GKG_V1_COLUMNS,
            Self::GkgV2 { .. } => &GKG_V2_COLUMNS,
        }
    }

    /// Total timeout for one archive request.
    #[must_use]
    pub fn request_timeout(self) -> Duration {
        match self {
            Self::GkgV1 => Duration::from_secs(10),
            Self::GkgV2 { .. } => Duration::from_secs(15),
        }
    }
}

impl fmt::Display for ArchiveFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::GkgV1 => f.write_str("gkg-v1"),
            Self::GkgV2 { translation: false } => f.write_str("gkg-v2"),
            Self::GkgV2 { translation: true } => f.write_str("gkg-v2-translation"),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn ts(value: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S").unwrap()
    }

    #[test]
    fn test_file_names_follow_family_convention() {
        let at = ts("2021-01-01 06:15:00");
        assert_eq!(ArchiveFamily::GkgV1.file_name(at), "20210101.gkg.csv.zip");
        assert_eq!(
            ArchiveFamily::GkgV2 { translation: false }.file_name(at),
            "20210101061500.gkg.csv.zip"
        );
        assert_eq!(
            ArchiveFamily::GkgV2 { translation: true }.file_name(at),
            "20210101061500.translation.gkg.csv.zip"
        );
    }

    #[test]
    fn test_schema_widths() {
        assert_eq!(ArchiveFamily::GkgV1.columns().len(), 11);
        assert_eq!(ArchiveFamily::GkgV2 { translation: true }.columns().len(), 27);
        assert!(
            ArchiveFamily::GkgV2 { translation: false }
                .columns()
                .iter()
                .all(|c| c.trim() == *c)
        );
    }

    #[test]
    fn test_enhanced_organizations_column_has_no_padding() {
        let columns = ArchiveFamily::GkgV2 { translation: false }.columns();
        assert_eq!(columns[13], "V1ORGANIZATIONS");
        assert_eq!(columns[14], "V2ENHANCEDORGANIZATIONS");
    }

    #[test]
    fn test_grid_ceil_snaps_up() {
        assert_eq!(Grid::Daily.ceil(ts("2021-01-01 00:00:00")), ts("2021-01-01 00:00:00"));
        assert_eq!(Grid::Daily.ceil(ts("2021-01-01 00:00:01")), ts("2021-01-02 00:00:00"));
        assert_eq!(
            Grid::QuarterHour.ceil(ts("2021-01-01 10:07:30")),
            ts("2021-01-01 10:15:00")
        );
        assert_eq!(
            Grid::QuarterHour.ceil(ts("2021-01-01 23:50:00")),
            ts("2021-01-02 00:00:00")
        );
    }

    #[test]
    fn test_request_timeouts() {
        assert_eq!(ArchiveFamily::GkgV1.request_timeout(), Duration::from_secs(10));
        assert_eq!(
            ArchiveFamily::GkgV2 { translation: false }.request_timeout(),
            Duration::from_secs(15)
        );
    }
}
