//! Shared job context: the immutable config plus the two append-only sinks,
//! handed to every worker behind one `Arc`.

use std::sync::atomic::AtomicU64;

use crate::sink::{ErrorLog, OutputSink};
use crate::types::JobConfig;

/// Everything a worker needs. The config is read-only; the sinks are the only
/// shared mutable state in the whole job and are internally synchronized.
pub struct JobContext {
    pub config: JobConfig,
    pub output: OutputSink,
    pub errors: ErrorLog,
    /// Identities whose processing finished, successfully or after a logged
    /// failure. Incremented exactly once per dequeued item.
    pub identities_done: AtomicU64,
}

impl JobContext {
    pub fn new(config: JobConfig, output: OutputSink, errors: ErrorLog) -> Self {
        Self {
            config,
            output,
            errors,
            identities_done: AtomicU64::new(0),
        }
    }
}
