//! Query filters for the live query endpoint.
//!
//! A [`QueryFilter`] pairs search text with a `[start, end]` range. The text
//! is either built from structured [`SearchTerms`] or supplied as an opaque
//! template string that already carries the
//! `&startdatetime=..&enddatetime=..&maxrecords=..` fragment; templates have
//! their two date fields rewritten per window.

use std::sync::LazyLock;

use chrono::{NaiveDate, NaiveDateTime};
use regex::Regex;
use url::form_urlencoded::byte_serialize;

use super::error::QueryError;

/// Input format for filter bounds (`2021-05-09-00-00-00`).
pub const FILTER_DATE_FORMAT: &str = "%Y-%m-%d-%H-%M-%S";

/// Date-only input format for filter bounds (`2021-05-09`).
pub const FILTER_DAY_FORMAT: &str = "%Y-%m-%d";

/// Compact timestamp format the service expects in query strings.
pub const SERVICE_DATE_FORMAT: &str = "%Y%m%d%H%M%S";

/// Result cap of the live query endpoint.
pub const MAX_RECORDS_CAP: u32 = 250;

#[allow(clippy::expect_used)]
static START_ANCHOR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)&startdatetime=.*?&enddatetime=").expect("start anchor regex is valid") // Static pattern, safe to panic
});

#[allow(clippy::expect_used)]
static END_ANCHOR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)&enddatetime=.*?&maxrecords").expect("end anchor regex is valid") // Static pattern, safe to panic
});

/// Parses a filter bound in `YYYY-MM-DD-HH-MM-SS` or `YYYY-MM-DD` form.
///
/// # Errors
///
/// Returns [`QueryError::InvalidTimestamp`] if neither format matches.
pub fn parse_timestamp(value: &str) -> Result<NaiveDateTime, QueryError> {
    let trimmed = value.trim();
    NaiveDateTime::parse_from_str(trimmed, FILTER_DATE_FORMAT)
        .or_else(|_| {
            NaiveDate::parse_from_str(trimmed, FILTER_DAY_FORMAT)
                .map(|day| day.and_time(chrono::NaiveTime::MIN))
        })
        .map_err(|_| QueryError::InvalidTimestamp {
            value: value.to_string(),
            expected: "YYYY-MM-DD-HH-MM-SS or YYYY-MM-DD",
        })
}

/// Formats a timestamp the way the service expects it in query strings.
#[must_use]
pub fn service_timestamp(value: NaiveDateTime) -> String {
    value.format(SERVICE_DATE_FORMAT).to_string()
}

/// Structured search criteria.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchTerms {
    /// Keywords or phrases; multi-word entries are quoted.
    pub keywords: Vec<String>,
    /// Source domains (`domain:`).
    pub domains: Vec<String>,
    /// Source country codes (`sourcecountry:`).
    pub countries: Vec<String>,
    /// Source language codes (`sourcelang:`).
    pub languages: Vec<String>,
    /// Knowledge-graph themes (`theme:`).
    pub themes: Vec<String>,
    /// Records requested per query, at most [`MAX_RECORDS_CAP`].
    pub max_records: u32,
}

impl Default for SearchTerms {
    fn default() -> Self {
        Self {
            keywords: Vec::new(),
            domains: Vec::new(),
            countries: Vec::new(),
            languages: Vec::new(),
            themes: Vec::new(),
            max_records: MAX_RECORDS_CAP,
        }
    }
}

impl SearchTerms {
    /// Returns true when no criterion is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.keywords.is_empty()
            && self.domains.is_empty()
            && self.countries.is_empty()
            && self.languages.is_empty()
            && self.themes.is_empty()
    }

    /// Renders the criteria as service query text (without date fields).
    #[must_use]
    pub fn render(&self) -> String {
        let keywords: Vec<String> = self
            .keywords
            .iter()
            .map(|k| {
                if k.contains(char::is_whitespace) {
                    format!("\"{k}\"")
                } else {
                    k.clone()
                }
            })
            .collect();

        [
            group(&keywords, ""),
            group(&self.domains, "domain:"),
            group(&self.countries, "sourcecountry:"),
            group(&self.languages, "sourcelang:"),
            group(&self.themes, "theme:"),
        ]
        .into_iter()
        .flatten()
        .collect::<Vec<_>>()
        .join(" ")
    }
}

/// Renders one criterion: a single value bare, several as `(a OR b)`.
fn group(values: &[String], prefix: &str) -> Option<String> {
    match values {
        [] => None,
        [single] => Some(format!("{prefix}{single}")),
        many => Some(format!(
            "({})",
            many.iter()
                .map(|v| format!("{prefix}{v}"))
                .collect::<Vec<_>>()
                .join(" OR ")
        )),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum QueryText {
    Terms(SearchTerms),
    Template(String),
}

/// Search text plus a time range, at second resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryFilter {
    text: QueryText,
    start: NaiveDateTime,
    end: NaiveDateTime,
}

impl QueryFilter {
    /// Starts building a structured filter.
    #[must_use]
    pub fn builder() -> QueryFilterBuilder {
        QueryFilterBuilder::default()
    }

    /// Wraps an opaque template query string.
    ///
    /// The template is not inspected here; missing date anchors surface as
    /// [`QueryError::InvalidFilter`] when the string is rendered.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::EmptyQueryString`] for a blank template and
    /// [`QueryError::InvalidRange`] when `start > end`.
    pub fn from_template(
        template: impl Into<String>,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Result<Self, QueryError> {
        let template = template.into();
        if template.trim().is_empty() {
            return Err(QueryError::EmptyQueryString);
        }
        check_range(start, end)?;
        Ok(Self {
            text: QueryText::Template(template),
            start,
            end,
        })
    }

    /// Range start.
    #[must_use]
    pub fn start(&self) -> NaiveDateTime {
        self.start
    }

    /// Range end.
    #[must_use]
    pub fn end(&self) -> NaiveDateTime {
        self.end
    }

    /// Returns true if the filter wraps an opaque template.
    #[must_use]
    pub fn is_template(&self) -> bool {
        matches!(self.text, QueryText::Template(_))
    }

    /// Structured criteria, or `None` for a template filter.
    #[must_use]
    pub fn terms(&self) -> Option<&SearchTerms> {
        match &self.text {
            QueryText::Terms(terms) => Some(terms),
            QueryText::Template(_) => None,
        }
    }

    /// Returns a copy of this filter over a different range.
    #[must_use]
    pub fn with_range(&self, start: NaiveDateTime, end: NaiveDateTime) -> Self {
        Self {
            text: self.text.clone(),
            start,
            end,
        }
    }

    /// Renders the full `query` parameter value, date fields included.
    ///
    /// Structured terms are form-encoded so that `&`, `#` and `%` inside a
    /// term stay part of the query text. Templates are used verbatim.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::InvalidFilter`] if a template does not contain
    /// exactly one `&startdatetime=..&enddatetime=..&maxrecords` fragment.
    pub fn query_string(&self) -> Result<String, QueryError> {
        let start = service_timestamp(self.start);
        let end = service_timestamp(self.end);
        match &self.text {
            QueryText::Terms(terms) => Ok(format!(
                "{}&startdatetime={start}&enddatetime={end}&maxrecords={}",
                byte_serialize(terms.render().as_bytes()).collect::<String>(),
                terms.max_records
            )),
            QueryText::Template(template) => rewrite_template(template, &start, &end),
        }
    }
}

/// Rewrites the two date fields of a template between their fixed anchors.
fn rewrite_template(template: &str, start: &str, end: &str) -> Result<String, QueryError> {
    for (anchor, name) in [
        (&*START_ANCHOR, "&startdatetime=...&enddatetime="),
        (&*END_ANCHOR, "&enddatetime=...&maxrecords"),
    ] {
        match anchor.find_iter(template).count() {
            1 => {}
            0 => return Err(QueryError::invalid_filter(format!("query string lacks {name}"))),
            n => {
                return Err(QueryError::invalid_filter(format!(
                    "query string contains {n} {name} fragments"
                )));
            }
        }
    }

    let rewritten = END_ANCHOR.replace(template, format!("&enddatetime={end}&maxrecords"));
    let rewritten = START_ANCHOR.replace(&rewritten, format!("&startdatetime={start}&enddatetime="));
    Ok(rewritten.into_owned())
}

fn check_range(start: NaiveDateTime, end: NaiveDateTime) -> Result<(), QueryError> {
    if start > end {
        return Err(QueryError::InvalidRange { start, end });
    }
    Ok(())
}

/// Builder for structured [`QueryFilter`]s.
#[derive(Debug, Clone, Default)]
pub struct QueryFilterBuilder {
    terms: SearchTerms,
    start: Option<NaiveDateTime>,
    end: Option<NaiveDateTime>,
}

impl QueryFilterBuilder {
    /// Adds a keyword or phrase.
    #[must_use]
    pub fn keyword(mut self, keyword: impl Into<String>) -> Self {
        self.terms.keywords.push(keyword.into());
        self
    }

    /// Adds a source domain.
    #[must_use]
    pub fn domain(mut self, domain: impl Into<String>) -> Self {
        self.terms.domains.push(domain.into());
        self
    }

    /// Adds a source country code.
    #[must_use]
    pub fn country(mut self, country: impl Into<String>) -> Self {
        self.terms.countries.push(country.into());
        self
    }

    /// Adds a source language code.
    #[must_use]
    pub fn language(mut self, language: impl Into<String>) -> Self {
        self.terms.languages.push(language.into());
        self
    }

    /// Adds a theme.
    #[must_use]
    pub fn theme(mut self, theme: impl Into<String>) -> Self {
        self.terms.themes.push(theme.into());
        self
    }

    /// Sets the per-query record count, clamped to `1..=MAX_RECORDS_CAP`.
    #[must_use]
    pub fn max_records(mut self, max_records: u32) -> Self {
        self.terms.max_records = max_records.clamp(1, MAX_RECORDS_CAP);
        self
    }

    /// Sets the range start.
    #[must_use]
    pub fn start(mut self, start: NaiveDateTime) -> Self {
        self.start = Some(start);
        self
    }

    /// Sets the range end.
    #[must_use]
    pub fn end(mut self, end: NaiveDateTime) -> Self {
        self.end = Some(end);
        self
    }

    /// Finishes the filter.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::MissingFilter`] if a bound is missing,
    /// [`QueryError::EmptyQueryString`] if no criterion was added and
    /// [`QueryError::InvalidRange`] when `start > end`.
    pub fn build(self) -> Result<QueryFilter, QueryError> {
        let start = self.start.ok_or(QueryError::MissingFilter { field: "start" })?;
        let end = self.end.ok_or(QueryError::MissingFilter { field: "end" })?;
        if self.terms.is_empty() {
            return Err(QueryError::EmptyQueryString);
        }
        check_range(start, end)?;
        Ok(QueryFilter {
            text: QueryText::Terms(self.terms),
            start,
            end,
        })
    }
}
