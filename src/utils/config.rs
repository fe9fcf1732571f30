//! Job tuning constants: retry attempts, waits, and pagination limits.
//! Thresholds in one place.

use std::time::Duration;

// ---- Retry ----

/// Fixed-wait retry attempt counts per call site.
pub struct RetryConsts;

impl RetryConsts {
    /// Attempts for `authorize` (delegation is the flakiest call).
    pub const AUTH_ATTEMPTS: u32 = 3;
    /// Attempts for a per-message `fetch` (one retry).
    pub const FETCH_ATTEMPTS: u32 = 2;
    /// Wait between attempts. Fixed, not exponential.
    pub const RETRY_WAIT: Duration = Duration::from_secs(2);
}

// ---- Pagination ----

/// Page sizes and the inter-page rate limit.
pub struct PagingConsts;

impl PagingConsts {
    /// Delay between consecutive list pages, to stay under remote throttling.
    pub const PAGE_DELAY: Duration = Duration::from_millis(250);
    /// Service maximum for results per page.
    pub const MAX_PAGE_SIZE: u32 = 500;
    /// Default results per page (the service maximum).
    pub const DEFAULT_PAGE_SIZE: u32 = 500;
    /// Page size used when enumerating the identity directory.
    pub const DIRECTORY_PAGE_SIZE: u32 = 500;
}

// ---- Worker threads ----

/// Default worker threads per shard group.
pub const DEFAULT_THREADS: usize = 10;
