//! Remote fetch capability shared by the query and archive paths.
//!
//! # Example
//!
//! ```no_run
//! use newsfeed_core::fetch::{Fetcher, HttpClient, RequestOptions};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = HttpClient::new();
//! let body = client
//!     .fetch("http://data.gdeltproject.org/gkg/20210101.gkg.csv.zip", &RequestOptions::default())
//!     .await?;
//! println!("fetched {} bytes", body.len());
//! # Ok(())
//! # }
//! ```

mod client;
mod constants;
mod error;

pub use client::{Fetcher, HttpClient, HttpClientConfig, RequestOptions};
pub use constants::{CONNECT_TIMEOUT_SECS, READ_TIMEOUT_SECS};
pub use error::FetchError;
