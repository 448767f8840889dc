//! Output modes of the live query endpoint.

use std::fmt;
use std::str::FromStr;

use super::error::QueryError;

/// What the endpoint should return for a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryMode {
    /// Raw article records (subject to the result cap).
    ArticleList,
    /// Coverage volume as a share of all monitored articles.
    TimelineVolume,
    /// Coverage volume as raw article counts.
    TimelineVolumeRaw,
    /// Average tone of matching coverage.
    TimelineTone,
    /// Coverage volume broken down by source language.
    TimelineLanguage,
    /// Coverage volume broken down by source country.
    TimelineSourceCountry,
}

impl QueryMode {
    /// All modes, article list first.
    pub const ALL: [QueryMode; 6] = [
        Self::ArticleList,
        Self::TimelineVolume,
        Self::TimelineVolumeRaw,
        Self::TimelineTone,
        Self::TimelineLanguage,
        Self::TimelineSourceCountry,
    ];

    /// The `mode` parameter value sent to the service.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ArticleList => "artlist",
            Self::TimelineVolume => "timelinevol",
            Self::TimelineVolumeRaw => "timelinevolraw",
            Self::TimelineTone => "timelinetone",
            Self::TimelineLanguage => "timelinelang",
            Self::TimelineSourceCountry => "timelinesourcecountry",
        }
    }

    /// Returns true for every aggregate mode; they share one response shape.
    #[must_use]
    pub fn is_timeline(self) -> bool {
        !matches!(self, Self::ArticleList)
    }
}

impl fmt::Display for QueryMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QueryMode {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(QueryError::EmptyMode);
        }
        Self::ALL
            .into_iter()
            .find(|mode| mode.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| QueryError::UnknownMode {
                mode: s.to_string(),
            })
    }
}
