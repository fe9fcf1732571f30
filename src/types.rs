//! Shared types for a bulk search job: configuration, records, and summaries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::engine::retry::RetryPolicy;
use crate::utils::config::{PagingConsts, RetryConsts};

/// The resource owner a session is authorized for (a complete address).
pub type Identity = String;

/// Opaque reference to a matching message, as returned by a search page.
pub type MessageRef = String;

/// Invalid job parameters. Fatal before any worker starts.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("process count must be at least 1")]
    NoProcesses,
    #[error("thread count must be at least 1")]
    NoThreads,
    #[error("page size must be between 1 and {}", PagingConsts::MAX_PAGE_SIZE)]
    BadPageSize,
    #[error("identity list is empty")]
    NoIdentities,
}

/// Retry and rate-limit knobs. Defaults are the production values; tests
/// construct zero-wait policies so they run without sleeping.
#[derive(Clone, Copy, Debug)]
pub struct Tuning {
    /// Policy wrapped around `authorize` calls.
    pub auth_retry: RetryPolicy,
    /// Policy wrapped around per-message `fetch` calls.
    pub fetch_retry: RetryPolicy,
    /// Fixed delay between consecutive list pages for one walk.
    pub page_delay: Duration,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            auth_retry: RetryPolicy::new(RetryConsts::AUTH_ATTEMPTS, RetryConsts::RETRY_WAIT),
            fetch_retry: RetryPolicy::new(RetryConsts::FETCH_ATTEMPTS, RetryConsts::RETRY_WAIT),
            page_delay: PagingConsts::PAGE_DELAY,
        }
    }
}

impl Tuning {
    /// Zero-wait variant: same attempt counts, no sleeping. For tests.
    pub fn immediate() -> Self {
        Self {
            auth_retry: RetryPolicy::new(RetryConsts::AUTH_ATTEMPTS, Duration::ZERO),
            fetch_retry: RetryPolicy::new(RetryConsts::FETCH_ATTEMPTS, Duration::ZERO),
            page_delay: Duration::ZERO,
        }
    }
}

/// Immutable configuration shared read-only by every worker. Built once before
/// any parallelism starts.
#[derive(Clone, Debug)]
pub struct JobConfig {
    /// Search query passed verbatim to the remote service. May be empty
    /// (matches everything; the CLI warns about this).
    pub query: String,
    /// Results requested per list page.
    pub page_size: u32,
    /// Number of shard groups (outer parallel tier).
    pub process_count: usize,
    /// Worker threads per shard group, clamped per shard to the shard size.
    pub thread_count: usize,
    /// Append-only destination for matched records.
    pub output_path: PathBuf,
    /// Append-only destination for identity/message-level failures.
    pub error_log_path: PathBuf,
    /// Retry and rate-limit knobs.
    pub tuning: Tuning,
}

impl JobConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.process_count == 0 {
            return Err(ConfigError::NoProcesses);
        }
        if self.thread_count == 0 {
            return Err(ConfigError::NoThreads);
        }
        if self.page_size == 0 || self.page_size > PagingConsts::MAX_PAGE_SIZE {
            return Err(ConfigError::BadPageSize);
        }
        Ok(())
    }
}

/// One fetched message. Header fields are optional (only whichever the source
/// message carried are serialized); the snippet is always present, best-effort.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageRecord {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    pub snippet: String,
}

impl MessageRecord {
    /// Best-effort snippet text: invalid UTF-8 sequences are replaced rather
    /// than rejected, so a malformed body never fails the message.
    pub fn snippet_from_bytes(bytes: &[u8]) -> String {
        String::from_utf8_lossy(bytes).into_owned()
    }
}

/// Which remote-facing operation an [`ErrorRecord`] belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorOp {
    Authorize,
    List,
    Fetch,
    Write,
}

/// One line in the error log: the failing operation, the identity it belonged
/// to, the message reference when the failure was message-level, and the
/// error detail.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ErrorRecord {
    pub operation: ErrorOp,
    pub identity: Identity,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference: Option<MessageRef>,
    pub detail: String,
    pub at: DateTime<Utc>,
}

impl ErrorRecord {
    fn new(operation: ErrorOp, identity: &str, reference: Option<&str>, detail: String) -> Self {
        Self {
            operation,
            identity: identity.to_string(),
            reference: reference.map(str::to_string),
            detail,
            at: Utc::now(),
        }
    }

    pub fn auth(identity: &str, err: &impl std::fmt::Display) -> Self {
        Self::new(ErrorOp::Authorize, identity, None, err.to_string())
    }

    pub fn list(identity: &str, err: &impl std::fmt::Display) -> Self {
        Self::new(ErrorOp::List, identity, None, err.to_string())
    }

    pub fn fetch(identity: &str, reference: &str, err: &impl std::fmt::Display) -> Self {
        Self::new(ErrorOp::Fetch, identity, Some(reference), err.to_string())
    }

    pub fn write(identity: &str, err: &impl std::fmt::Display) -> Self {
        Self::new(ErrorOp::Write, identity, None, err.to_string())
    }
}

/// Totals reported once every shard group has joined.
#[derive(Clone, Copy, Debug, Default)]
pub struct JobSummary {
    /// Identities whose processing ran to completion (including ones that
    /// matched nothing or were abandoned after a logged failure).
    pub identities: u64,
    /// Records appended to the output sink.
    pub records: u64,
    /// Entries appended to the error log.
    pub errors: u64,
}
