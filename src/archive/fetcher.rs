//! Parallel download and merge of enumerated archives.
//!
//! # Failure tolerance
//!
//! - 404 is an expected gap and becomes [`ArchiveOutcome::NotFound`]
//! - any other download or parse failure becomes [`ArchiveOutcome::Failed`]
//! - neither aborts the batch; only a batch with zero tables fails
//!
//! # Ordering
//!
//! Tables are merged in completion order, not descriptor order.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Semaphore, mpsc};
use tracing::{debug, info, instrument, warn};

use super::enumerate::ArchiveDescriptor;
use super::error::{ArchiveError, ArchiveFileError};
use super::family::ArchiveFamily;
use super::parse::parse_archive;
use crate::fetch::{Fetcher, HttpClient, HttpClientConfig, RequestOptions};
use crate::table::RecordTable;
use crate::user_agent::random_identity;

/// Pause before each archive request.
pub const DEFAULT_THROTTLE: Duration = Duration::from_millis(1);

/// Twice the available parallelism, or 2 when it cannot be determined.
#[must_use]
pub fn default_concurrency() -> usize {
    std::thread::available_parallelism().map_or(1, std::num::NonZeroUsize::get) * 2
}

/// Settings for [`BulkFetcher`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BulkFetchConfig {
    /// Archives downloaded at once.
    pub concurrency: usize,
    /// Pause before each request.
    pub throttle: Duration,
    /// Per-request timeout; `None` uses the family's timeout.
    pub request_timeout: Option<Duration>,
    /// Proxy applied to every archive request.
    pub proxy: Option<String>,
}

impl Default for BulkFetchConfig {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
            throttle: DEFAULT_THROTTLE,
            request_timeout: None,
            proxy: None,
        }
    }
}

/// Result of one archive task.
#[derive(Debug)]
pub enum ArchiveOutcome {
    /// The archive parsed into a table.
    Table(RecordTable),
    /// The server does not have this archive.
    NotFound,
    /// The archive could not be downloaded or parsed.
    Failed(ArchiveFileError),
}

/// Downloads archives concurrently and merges the usable ones.
#[derive(Clone)]
pub struct BulkFetcher {
    fetcher: Arc<dyn Fetcher>,
    config: BulkFetchConfig,
}

impl std::fmt::Debug for BulkFetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BulkFetcher")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl BulkFetcher {
    /// Creates a fetcher over an existing [`Fetcher`].
    ///
    /// The configured proxy is ignored here; it only applies in
    /// [`BulkFetcher::from_config`].
    ///
    /// # Errors
    ///
    /// Returns [`ArchiveError::InvalidConcurrency`] for a zero pool size.
    pub fn new(fetcher: Arc<dyn Fetcher>, config: BulkFetchConfig) -> Result<Self, ArchiveError> {
        if config.concurrency == 0 {
            return Err(ArchiveError::InvalidConcurrency {
                value: config.concurrency,
            });
        }
        Ok(Self { fetcher, config })
    }

    /// Creates a fetcher with its own HTTP client honoring `config.proxy`.
    ///
    /// # Errors
    ///
    /// Returns [`ArchiveError::Client`] if the client cannot be built and
    /// [`ArchiveError::InvalidConcurrency`] for a zero pool size.
    #[instrument(level = "debug", skip(config), fields(concurrency = config.concurrency))]
    pub fn from_config(config: BulkFetchConfig) -> Result<Self, ArchiveError> {
        let client = HttpClient::from_config(&HttpClientConfig {
            proxy: config.proxy.clone(),
            ..HttpClientConfig::default()
        })?;
        Self::new(Arc::new(client), config)
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &BulkFetchConfig {
        &self.config
    }

    /// Fetches every descriptor and merges the resulting tables.
    ///
    /// # Errors
    ///
    /// Returns [`ArchiveError::AllFetchesFailed`] when no archive produced a
    /// table, including when `descriptors` is empty.
    pub async fn fetch_all(
        &self,
        family: ArchiveFamily,
        descriptors: Vec<ArchiveDescriptor>,
    ) -> Result<RecordTable, ArchiveError> {
        self.fetch_all_with_progress(family, descriptors, |_, _| {})
            .await
    }

    /// [`BulkFetcher::fetch_all`] reporting `(completed, total)` after every
    /// finished archive.
    ///
    /// # Errors
    ///
    /// See [`BulkFetcher::fetch_all`].
    #[instrument(skip(self, family, descriptors, on_progress), fields(family = %family, total = descriptors.len()))]
    pub async fn fetch_all_with_progress<F>(
        &self,
        family: ArchiveFamily,
        descriptors: Vec<ArchiveDescriptor>,
        mut on_progress: F,
    ) -> Result<RecordTable, ArchiveError>
    where
        F: FnMut(usize, usize),
    {
        let total = descriptors.len();
        let semaphore = Arc::new(Semaphore::new(self.config.concurrency));
        let (sender, mut receiver) = mpsc::unbounded_channel();
        let options = RequestOptions {
            user_agent: None,
            timeout: Some(
                self.config
                    .request_timeout
                    .unwrap_or_else(|| family.request_timeout()),
            ),
        };
        let width = family.columns().len();

        info!(concurrency = self.config.concurrency, "starting archive downloads");

        let mut handles = Vec::with_capacity(total);
        for descriptor in descriptors {
            let semaphore = Arc::clone(&semaphore);
            let fetcher = Arc::clone(&self.fetcher);
            let sender = sender.clone();
            let options = options.clone();
            let throttle = self.config.throttle;

            handles.push(tokio::spawn(async move {
                let outcome = match semaphore.acquire_owned().await {
                    Ok(_permit) => {
                        fetch_one(fetcher.as_ref(), &descriptor, options, throttle, width).await
                    }
                    Err(_) => ArchiveOutcome::Failed(ArchiveFileError::Task {
                        reason: "semaphore closed".to_string(),
                    }),
                };
                // Receiver outlives every task.
                let _ = sender.send((descriptor, outcome));
            }));
        }
        drop(sender);

        let mut tables = Vec::new();
        let mut not_found = 0usize;
        let mut failed = 0usize;
        let mut completed = 0usize;
        while let Some((descriptor, outcome)) = receiver.recv().await {
            match outcome {
                ArchiveOutcome::Table(table) => {
                    debug!(url = %descriptor.url, rows = table.len(), "archive parsed");
                    tables.push(table);
                }
                ArchiveOutcome::NotFound => {
                    debug!(url = %descriptor.url, "archive not published");
                    not_found += 1;
                }
                ArchiveOutcome::Failed(error) => {
                    warn!(url = %descriptor.url, error = %error, "skipping archive");
                    failed += 1;
                }
            }
            completed += 1;
            on_progress(completed, total);
        }

        for handle in handles {
            // A panicked task never sent its outcome.
            if let Err(e) = handle.await {
                warn!(error = %e, "archive task panicked");
                failed += 1;
            }
        }

        info!(
            fetched = tables.len(),
            not_found, failed, "archive downloads complete"
        );

        if tables.is_empty() {
            return Err(ArchiveError::AllFetchesFailed {
                attempted: total,
                not_found,
                failed,
            });
        }

        let mut merged = RecordTable::concat(tables);
        merged.reset_index();
        merged.set_columns(family.columns().iter().copied())?;
        Ok(merged)
    }
}

/// Downloads and parses one archive. Never fails; failures are outcomes.
async fn fetch_one(
    fetcher: &dyn Fetcher,
    descriptor: &ArchiveDescriptor,
    mut options: RequestOptions,
    throttle: Duration,
    width: usize,
) -> ArchiveOutcome {
    if !throttle.is_zero() {
        tokio::time::sleep(throttle).await;
    }
    options.user_agent = Some(random_identity().to_string());

    let body = match fetcher.fetch(&descriptor.url, &options).await {
        Ok(body) => body,
        Err(error) if error.is_not_found() => return ArchiveOutcome::NotFound,
        Err(error) => return ArchiveOutcome::Failed(error.into()),
    };

    // Decompression and splitting are CPU-bound.
    match tokio::task::spawn_blocking(move || parse_archive(&body, width)).await {
        Ok(Ok(table)) => ArchiveOutcome::Table(table),
        Ok(Err(error)) => ArchiveOutcome::Failed(error),
        Err(join) => ArchiveOutcome::Failed(ArchiveFileError::Task {
            reason: join.to_string(),
        }),
    }
}
