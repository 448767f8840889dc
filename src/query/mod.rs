//! Live query path: filters, windowing, resilient decoding and the two
//! search orchestrators.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use newsfeed_core::fetch::HttpClient;
//! use newsfeed_core::query::{ArticleSearch, QueryClient, QueryFilter, parse_timestamp};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let filter = QueryFilter::builder()
//!     .keyword("climate change")
//!     .country("US")
//!     .start(parse_timestamp("2021-05-09-00-00-00")?)
//!     .end(parse_timestamp("2021-05-10-00-00-00")?)
//!     .build()?;
//!
//! let client = QueryClient::new(Arc::new(HttpClient::new()));
//! let articles = ArticleSearch::new(client).search(&filter, 100, 60).await?;
//! println!("{} articles", articles.len());
//! # Ok(())
//! # }
//! ```

mod client;
mod decode;
mod error;
mod filter;
mod mode;
mod search;
mod window;

pub use client::{DEFAULT_DOC_ENDPOINT, QueryClient, QueryClientConfig};
pub use decode::{DEFAULT_MAX_REPAIR_ATTEMPTS, DecodeError, Decoded, ResilientDecoder};
pub use error::QueryError;
pub use filter::{
    FILTER_DATE_FORMAT, MAX_RECORDS_CAP, QueryFilter, QueryFilterBuilder, SearchTerms,
    parse_timestamp, service_timestamp,
};
pub use mode::QueryMode;
pub use search::{ArticleSearch, TIMELINE_DATE_FORMAT, TimelineSearch};
pub use window::{DEFAULT_WINDOW_MINUTES, WindowConfig, WindowSplitter, split};
