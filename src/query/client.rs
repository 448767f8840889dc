//! Single bounded requests against the live query endpoint.

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tracing::{debug, instrument};
use url::Url;

use super::decode::{DEFAULT_MAX_REPAIR_ATTEMPTS, ResilientDecoder};
use super::error::QueryError;
use super::mode::QueryMode;
use crate::fetch::{FetchError, Fetcher, RequestOptions};
use crate::table::RecordTable;

/// Default live query endpoint.
pub const DEFAULT_DOC_ENDPOINT: &str = "https://api.gdeltproject.org/api/v2/doc/doc";

/// Plain-text body the service sends instead of JSON for too-small ranges.
const TIMESPAN_TOO_SHORT: &[u8] = b"Timespan is too short.";

/// Settings for [`QueryClient`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryClientConfig {
    /// Base URL of the query endpoint.
    pub endpoint: String,
    /// Repair budget used by the search orchestrators unless overridden.
    pub max_repair_attempts: u32,
    /// Per-request timeout; `None` keeps the fetcher's default.
    pub timeout: Option<Duration>,
}

impl Default for QueryClientConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_DOC_ENDPOINT.to_string(),
            max_repair_attempts: DEFAULT_MAX_REPAIR_ATTEMPTS,
            timeout: None,
        }
    }
}

/// Issues one query per call and converts the response into a table.
///
/// No retries: transport errors propagate unchanged.
#[derive(Clone)]
pub struct QueryClient {
    fetcher: Arc<dyn Fetcher>,
    config: QueryClientConfig,
}

impl std::fmt::Debug for QueryClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryClient")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl QueryClient {
    /// Creates a client for the default endpoint.
    #[must_use]
    pub fn new(fetcher: Arc<dyn Fetcher>) -> Self {
        Self::with_config(fetcher, QueryClientConfig::default())
    }

    /// Creates a client from explicit settings.
    #[must_use]
    pub fn with_config(fetcher: Arc<dyn Fetcher>, config: QueryClientConfig) -> Self {
        Self { fetcher, config }
    }

    /// Creates a client for a custom endpoint (for testing with wiremock).
    #[must_use]
    pub fn with_endpoint(fetcher: Arc<dyn Fetcher>, endpoint: impl Into<String>) -> Self {
        Self::with_config(
            fetcher,
            QueryClientConfig {
                endpoint: endpoint.into(),
                ..QueryClientConfig::default()
            },
        )
    }

    /// Returns the configured endpoint.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.config.endpoint
    }

    /// Returns the configured default repair budget.
    #[must_use]
    pub fn max_repair_attempts(&self) -> u32 {
        self.config.max_repair_attempts
    }

    /// Builds the request URL for one query.
    ///
    /// The query string is spliced in verbatim: its embedded
    /// `&startdatetime=`/`&enddatetime=`/`&maxrecords=` fields become
    /// top-level request parameters.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::EmptyQueryString`] for a blank query and
    /// [`QueryError::Transport`] if the result is not a valid URL.
    pub fn request_url(&self, query_string: &str, mode: QueryMode) -> Result<String, QueryError> {
        if query_string.trim().is_empty() {
            return Err(QueryError::EmptyQueryString);
        }
        let raw = format!(
            "{}?query={query_string}&mode={mode}&format=json",
            self.config.endpoint
        );
        let url = Url::parse(&raw).map_err(|_| FetchError::invalid_url(raw.clone()))?;
        Ok(url.to_string())
    }

    /// Runs one query and returns its records.
    ///
    /// Article-list responses yield the `articles` array; every timeline
    /// mode yields the `data` array of the first series.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::TimespanTooShort`] when the service says so,
    /// [`QueryError::Decode`] when the body cannot be repaired within
    /// `max_attempts`, [`QueryError::UnexpectedShape`] when the decoded
    /// document lacks the expected arrays, and [`QueryError::Transport`]
    /// for request failures.
    #[instrument(skip(self, query_string), fields(mode = %mode))]
    pub async fn query(
        &self,
        query_string: &str,
        mode: QueryMode,
        max_attempts: u32,
    ) -> Result<RecordTable, QueryError> {
        let url = self.request_url(query_string, mode)?;
        debug!(url = %url, "issuing query");

        let options = RequestOptions {
            timeout: self.config.timeout,
            ..RequestOptions::default()
        };
        let body = self.fetcher.fetch(&url, &options).await?;
        if body.trim_ascii() == TIMESPAN_TOO_SHORT {
            return Err(QueryError::TimespanTooShort);
        }

        let decoded = ResilientDecoder::new(max_attempts).decode(&body)?;
        let records = extract_records(decoded.value, mode)?;
        debug!(records = records.len(), repairs = decoded.repairs, "query decoded");
        Ok(RecordTable::from_json_records(records)?)
    }
}

/// Pulls the record array for `mode` out of a decoded response.
fn extract_records(value: Value, mode: QueryMode) -> Result<Vec<Value>, QueryError> {
    let Value::Object(mut document) = value else {
        return Err(QueryError::unexpected_shape(
            mode.as_str(),
            "response is not a JSON object",
        ));
    };

    if !mode.is_timeline() {
        // The service answers `{}` when nothing matched.
        return match document.remove("articles") {
            None => Ok(Vec::new()),
            Some(Value::Array(articles)) => Ok(articles),
            Some(_) => Err(QueryError::unexpected_shape(
                mode.as_str(),
                "`articles` is not an array",
            )),
        };
    }

    let series = match document.remove("timeline") {
        None => return Ok(Vec::new()),
        Some(Value::Array(series)) => series,
        Some(_) => {
            return Err(QueryError::unexpected_shape(
                mode.as_str(),
                "`timeline` is not an array",
            ));
        }
    };
    let Some(first) = series.into_iter().next() else {
        return Ok(Vec::new());
    };
    match first {
        Value::Object(mut first) => match first.remove("data") {
            Some(Value::Array(data)) => Ok(data),
            _ => Err(QueryError::unexpected_shape(
                mode.as_str(),
                "first timeline series has no `data` array",
            )),
        },
        _ => Err(QueryError::unexpected_shape(
            mode.as_str(),
            "timeline series is not an object",
        )),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::test_support::ScriptedFetcher;
    use crate::table::Cell;
    use serde_json::json;

    fn client(fetcher: &Arc<ScriptedFetcher>) -> QueryClient {
        QueryClient::with_endpoint(fetcher.clone(), "https://api.example.org/doc")
    }

    #[test]
    fn test_request_url_splices_query_parameters() {
        let fetcher = Arc::new(ScriptedFetcher::default());
        let url = client(&fetcher)
            .request_url(
                "climate&startdatetime=20210509000000&enddatetime=20210509010000&maxrecords=250",
                QueryMode::ArticleList,
            )
            .unwrap();

        let parsed = Url::parse(&url).unwrap();
        let params: Vec<(String, String)> = parsed.query_pairs().into_owned().collect();
        assert!(params.contains(&("query".into(), "climate".into())));
        assert!(params.contains(&("startdatetime".into(), "20210509000000".into())));
        assert!(params.contains(&("maxrecords".into(), "250".into())));
        assert!(params.contains(&("mode".into(), "artlist".into())));
        assert!(params.contains(&("format".into(), "json".into())));
    }

    #[test]
    fn test_request_url_keeps_special_characters_in_query() {
        let fetcher = Arc::new(ScriptedFetcher::default());
        let filter = crate::query::QueryFilter::builder()
            .keyword("C#")
            .keyword("AT&T")
            .start(crate::query::parse_timestamp("2021-05-09").unwrap())
            .end(crate::query::parse_timestamp("2021-05-10").unwrap())
            .build()
            .unwrap();

        let url = client(&fetcher)
            .request_url(&filter.query_string().unwrap(), QueryMode::ArticleList)
            .unwrap();

        let parsed = Url::parse(&url).unwrap();
        assert_eq!(parsed.fragment(), None);
        let params: Vec<(String, String)> = parsed.query_pairs().into_owned().collect();
        assert_eq!(
            params,
            [
                ("query".to_string(), "(C# OR AT&T)".to_string()),
                ("startdatetime".to_string(), "20210509000000".to_string()),
                ("enddatetime".to_string(), "20210510000000".to_string()),
                ("maxrecords".to_string(), "250".to_string()),
                ("mode".to_string(), "artlist".to_string()),
                ("format".to_string(), "json".to_string()),
            ]
        );
    }

    #[test]
    fn test_request_url_rejects_empty_query() {
        let fetcher = Arc::new(ScriptedFetcher::default());
        assert!(matches!(
            client(&fetcher).request_url("   ", QueryMode::TimelineTone),
            Err(QueryError::EmptyQueryString)
        ));
    }

    #[tokio::test]
    async fn test_article_list_uses_articles_array() {
        let fetcher = Arc::new(ScriptedFetcher::with_bodies([json!({
            "articles": [
                {"url": "https://a", "title": "A", "seendate": "20210509T001500Z"},
                {"url": "https://b", "title": "B", "seendate": "20210509T003000Z"}
            ]
        })
        .to_string()]));

        let table = client(&fetcher)
            .query("climate", QueryMode::ArticleList, 100)
            .await
            .unwrap();

        assert_eq!(table.len(), 2);
        assert_eq!(table.columns(), ["url", "title", "seendate"]);
    }

    #[tokio::test]
    async fn test_article_list_without_matches_is_empty() {
        let fetcher = Arc::new(ScriptedFetcher::with_bodies(["{}".to_string()]));
        let table = client(&fetcher)
            .query("climate", QueryMode::ArticleList, 100)
            .await
            .unwrap();
        assert!(table.is_empty());
    }

    #[tokio::test]
    async fn test_every_timeline_mode_reads_first_series() {
        for mode in QueryMode::ALL.into_iter().filter(|m| m.is_timeline()) {
            let fetcher = Arc::new(ScriptedFetcher::with_bodies([json!({
                "timeline": [
                    {"series": "first", "data": [{"date": "20210509T000000Z", "value": 1.5}]},
                    {"series": "second", "data": [{"date": "x", "value": 9}, {"date": "y", "value": 9}]}
                ]
            })
            .to_string()]));

            let table = client(&fetcher).query("climate", mode, 100).await.unwrap();
            assert_eq!(table.len(), 1, "mode {mode}");
            assert_eq!(table.column("value").unwrap()[0], &Cell::Float(1.5));
        }
    }

    #[tokio::test]
    async fn test_timespan_too_short_is_reported() {
        let fetcher = Arc::new(ScriptedFetcher::with_bodies([
            "Timespan is too short.\n".to_string()
        ]));
        let error = client(&fetcher)
            .query("climate", QueryMode::TimelineVolume, 100)
            .await
            .unwrap_err();
        assert!(matches!(error, QueryError::TimespanTooShort));
    }

    #[tokio::test]
    async fn test_malformed_body_is_repaired() {
        let fetcher = Arc::new(ScriptedFetcher::with_bodies([
            "{\"articles\": [{\"title\": \"line\u{b}feed\"}]}".to_string(),
        ]));
        let table = client(&fetcher)
            .query("climate", QueryMode::ArticleList, 5)
            .await
            .unwrap();
        assert_eq!(table.rows()[0][0], Cell::Text("line feed".into()));
    }

    #[tokio::test]
    async fn test_unrepairable_body_propagates_decode_error() {
        let fetcher = Arc::new(ScriptedFetcher::with_bodies([
            "{\"articles\": [{\"title\": \"a\u{1}b\u{1}c\"}]}".to_string(),
        ]));
        let error = client(&fetcher)
            .query("climate", QueryMode::ArticleList, 1)
            .await
            .unwrap_err();
        assert!(matches!(error, QueryError::Decode(_)), "got: {error:?}");
    }

    #[tokio::test]
    async fn test_transport_error_propagates() {
        let fetcher = Arc::new(ScriptedFetcher::default());
        let error = client(&fetcher)
            .query("climate", QueryMode::ArticleList, 100)
            .await
            .unwrap_err();
        assert!(matches!(error, QueryError::Transport(_)));
    }

    #[test]
    fn test_timeline_series_without_data_is_unexpected() {
        let error = extract_records(
            json!({"timeline": [{"series": "x"}]}),
            QueryMode::TimelineVolume,
        )
        .unwrap_err();
        assert!(matches!(error, QueryError::UnexpectedShape { .. }));
    }
}
