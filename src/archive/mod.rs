//! Bulk archive path: enumerate a time grid of published archive files,
//! download them concurrently and merge the readable ones into one table.
//!
//! # Example
//!
//! ```no_run
//! use newsfeed_core::archive::{ArchiveFamily, BulkFetchConfig, BulkFetcher, enumerate};
//! use newsfeed_core::query::parse_timestamp;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let family = ArchiveFamily::GkgV1;
//! let descriptors = enumerate(
//!     parse_timestamp("2021-01-01")?,
//!     parse_timestamp("2021-01-02")?,
//!     family,
//! )?;
//! let table = BulkFetcher::from_config(BulkFetchConfig::default())?
//!     .fetch_all(family, descriptors)
//!     .await?;
//! println!("{} rows", table.len());
//! # Ok(())
//! # }
//! ```

mod enumerate;
mod error;
mod family;
mod fetcher;
mod parse;

pub use enumerate::{ArchiveDescriptor, ArchiveEnumerator, enumerate};
pub use error::{ArchiveError, ArchiveFileError};
pub use family::{ArchiveFamily, GKG_V1_BASE_URL, GKG_V2_BASE_URL, Grid};
pub use fetcher::{
    ArchiveOutcome, BulkFetchConfig, BulkFetcher, DEFAULT_THROTTLE, default_concurrency,
};
pub use parse::parse_archive;
