//! Remote service boundary: directory enumeration, per-identity authorization,
//! and scoped mail access, each with its own error type so failure policy can
//! differ per operation.

pub mod http;
pub mod paging;

use std::time::Duration;
use thiserror::Error;

use crate::types::{Identity, MessageRecord, MessageRef};

pub use http::HttpRemote;
pub use paging::Pages;

/// Authorization failure for one identity. Isolated: logged, the identity is
/// abandoned, the worker moves on.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("transport: {0}")]
    Transport(String),
    #[error("service returned status {status}: {detail}")]
    Status { status: u16, detail: String },
    #[error("authorization denied for {identity}")]
    Denied { identity: Identity },
}

/// Search-page failure. Identity-fatal: the identity's remaining work is
/// abandoned and logged, the worker continues with the next item.
#[derive(Debug, Error)]
pub enum ListError {
    #[error("transport: {0}")]
    Transport(String),
    #[error("service returned status {status}: {detail}")]
    Status { status: u16, detail: String },
    #[error("malformed page: {0}")]
    Malformed(String),
}

/// Per-message fetch failure. Message-fatal only: logged, the identity's other
/// messages are still processed.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("transport: {0}")]
    Transport(String),
    #[error("service returned status {status}: {detail}")]
    Status { status: u16, detail: String },
    #[error("malformed message: {0}")]
    Malformed(String),
}

/// One page of a list call: its items and the continuation cursor, absent on
/// the final page.
#[derive(Clone, Debug, Default)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub next_cursor: Option<String>,
}

/// A per-identity authorization handle. Owned exclusively by the worker that
/// created it; discarded once the identity's work completes or fails.
pub trait Session {
    /// One search page scoped to this session's identity.
    fn list_matching(
        &self,
        query: &str,
        page_size: u32,
        cursor: Option<&str>,
    ) -> Result<Page<MessageRef>, ListError>;

    /// Full detail for one matching message.
    fn fetch(&self, reference: &str) -> Result<MessageRecord, FetchError>;
}

/// The authorizer: turns an identity into a [`Session`] scoped to it.
pub trait Remote: Send + Sync {
    type Session: Session;

    fn authorize(&self, identity: &str) -> Result<Self::Session, AuthError>;
}

/// Paginated identity directory (the `--all` selector).
pub trait Directory {
    fn list_identities(
        &self,
        page_size: u32,
        cursor: Option<&str>,
    ) -> Result<Page<Identity>, ListError>;
}

/// Walk the whole directory and collect every identity, rate-limited like any
/// other paginated walk.
pub fn enumerate_identities<D: Directory>(
    directory: &D,
    page_size: u32,
    page_delay: Duration,
) -> Result<Vec<Identity>, ListError> {
    let mut identities = Vec::new();
    for page in Pages::new(page_delay, |cursor| {
        directory.list_identities(page_size, cursor)
    }) {
        identities.extend(page?);
    }
    Ok(identities)
}
