//! Constants for the fetch module (timeouts).

/// Default HTTP connect timeout (10 seconds).
pub const CONNECT_TIMEOUT_SECS: u64 = 10;

/// Default HTTP read timeout for live queries (60 seconds).
pub const READ_TIMEOUT_SECS: u64 = 60;
