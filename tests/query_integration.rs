//! Integration tests for the live query path against a mock endpoint.

mod support;
use support::socket_guard::start_mock_server_or_skip;

use std::sync::Arc;

use newsfeed_core::query::{
    ArticleSearch, QueryClient, QueryError, QueryFilter, QueryMode, TimelineSearch,
    parse_timestamp,
};
use newsfeed_core::{Cell, HttpClient};
use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, ResponseTemplate};

fn client(uri: &str) -> QueryClient {
    QueryClient::with_endpoint(Arc::new(HttpClient::new()), format!("{uri}/api/v2/doc/doc"))
}

fn climate_filter(start: &str, end: &str) -> QueryFilter {
    QueryFilter::builder()
        .keyword("climate")
        .country("US")
        .country("UK")
        .start(parse_timestamp(start).unwrap())
        .end(parse_timestamp(end).unwrap())
        .build()
        .unwrap()
}

#[tokio::test]
async fn test_article_search_sends_one_request_per_window() {
    let Some(mock_server) = start_mock_server_or_skip().await else {
        return;
    };

    for (start, end, title) in [
        ("20210509000000", "20210509010000", "first"),
        ("20210509010000", "20210509020000", "second"),
    ] {
        Mock::given(method("GET"))
            .and(path("/api/v2/doc/doc"))
            .and(query_param("mode", "artlist"))
            .and(query_param("format", "json"))
            .and(query_param("startdatetime", start))
            .and(query_param("enddatetime", end))
            .and(query_param("maxrecords", "250"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "articles": [{"url": format!("https://news.example/{title}"), "title": title}]
            })))
            .expect(1)
            .mount(&mock_server)
            .await;
    }

    let table = ArticleSearch::new(client(&mock_server.uri()))
        .search(
            &climate_filter("2021-05-09-00-00-00", "2021-05-09-02-00-00"),
            100,
            60,
        )
        .await
        .unwrap();

    assert_eq!(table.len(), 2);
    assert_eq!(
        table.column("title").unwrap(),
        [&Cell::from("first"), &Cell::from("second")]
    );
}

#[tokio::test]
async fn test_query_text_reaches_service_intact() {
    let Some(mock_server) = start_mock_server_or_skip().await else {
        return;
    };

    Mock::given(method("GET"))
        .and(path("/api/v2/doc/doc"))
        .and(query_param("query", "climate (sourcecountry:US OR sourcecountry:UK)"))
        .respond_with(ResponseTemplate::new(200).set_body_string("{}"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let table = ArticleSearch::new(client(&mock_server.uri()))
        .search(
            &climate_filter("2021-05-09-00-00-00", "2021-05-09-01-00-00"),
            100,
            60,
        )
        .await
        .unwrap();
    assert!(table.is_empty());
}

#[tokio::test]
async fn test_malformed_body_is_repaired_end_to_end() {
    let Some(mock_server) = start_mock_server_or_skip().await else {
        return;
    };

    let body = b"{\"articles\": [{\"title\": \"broken\x01title\", \"url\": \"https://a\"}]}".to_vec();
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(body))
        .mount(&mock_server)
        .await;

    let table = client(&mock_server.uri())
        .query("climate", QueryMode::ArticleList, 10)
        .await
        .unwrap();
    assert_eq!(table.rows()[0][0], Cell::from("broken title"));
}

#[tokio::test]
async fn test_server_error_aborts_search() {
    let Some(mock_server) = start_mock_server_or_skip().await else {
        return;
    };

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(502))
        .expect(1)
        .mount(&mock_server)
        .await;

    let error = ArticleSearch::new(client(&mock_server.uri()))
        .search(
            &climate_filter("2021-05-09-00-00-00", "2021-05-09-03-00-00"),
            100,
            60,
        )
        .await
        .unwrap_err();
    assert!(matches!(error, QueryError::Transport(_)), "got: {error:?}");
}

#[tokio::test]
async fn test_timeline_search_normalizes_dates() {
    let Some(mock_server) = start_mock_server_or_skip().await else {
        return;
    };

    Mock::given(method("GET"))
        .and(query_param("mode", "timelinesourcecountry"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "query_details": {"title": "climate", "date_resolution": "15m"},
            "timeline": [{
                "series": "United States",
                "data": [
                    {"date": "20210509T000000Z", "value": 0.31},
                    {"date": "20210509T001500Z", "value": 0.27}
                ]
            }]
        })))
        .mount(&mock_server)
        .await;

    let table = TimelineSearch::new(client(&mock_server.uri()))
        .search(
            &climate_filter("2021-05-09", "2021-05-10"),
            100,
            QueryMode::TimelineSourceCountry,
        )
        .await
        .unwrap();

    assert_eq!(table.columns(), ["date", "value"]);
    assert!(
        table
            .column("date")
            .unwrap()
            .iter()
            .all(|cell| matches!(cell, Cell::Timestamp(_)))
    );
}

#[tokio::test]
async fn test_timespan_too_short_response() {
    let Some(mock_server) = start_mock_server_or_skip().await else {
        return;
    };

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("Timespan is too short.\n"))
        .mount(&mock_server)
        .await;

    let error = TimelineSearch::new(client(&mock_server.uri()))
        .search_volume(&climate_filter("2021-05-09", "2021-05-09"), 100)
        .await
        .unwrap_err();
    assert!(matches!(error, QueryError::TimespanTooShort));
}
