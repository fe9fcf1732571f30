//! Mailsweep: concurrent, rate-limited bulk mailbox search and export.
//!
//! Partitions an identity list round robin across shard groups; each group
//! feeds a bounded queue drained by a fixed pool of workers. A worker owns one
//! identity at a time: authorize, paginate the search, fetch each match, and
//! append it as one JSON line to a shared append-only sink. Failures are
//! isolated per identity and per message and routed to an error log.
//!
//! The remote service is abstracted behind [`remote::Remote`] /
//! [`remote::Session`]; [`remote::HttpRemote`] is the bearer-token REST
//! adapter the CLI uses, and tests drive the same pipeline with an in-memory
//! mock.

pub mod engine;
pub mod pipeline;
pub mod remote;
pub mod sink;
pub mod types;
pub mod utils;

pub use pipeline::run_job;
pub use types::*;

/// Result alias used by the public mailsweep API
pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, Error>;
