//! Append-only sinks: one JSON record per line, safe under concurrent writers.

use serde::Serialize;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use thiserror::Error;

use crate::types::{ErrorRecord, MessageRecord};

/// Output sink failure. Worker-fatal, unlike a fetch failure: the sink is
/// shared infrastructure and a worker that keeps pulling items against a
/// failing output would silently drop every match it finds.
#[derive(Debug, Error)]
pub enum WriteError {
    #[error("serialize: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("append: {0}")]
    Io(#[from] std::io::Error),
}

/// File opened for append. Each record goes out as exactly one `write_all` of
/// `line + '\n'`: the mutex keeps sibling threads from interleaving, and
/// `O_APPEND` keeps appends whole across processes sharing the destination.
/// Never rewrites or reorders prior records.
struct Appender {
    file: Mutex<File>,
    count: AtomicU64,
}

impl Appender {
    fn open(path: &Path) -> std::io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            file: Mutex::new(file),
            count: AtomicU64::new(0),
        })
    }

    fn append_json<T: Serialize>(&self, record: &T) -> Result<(), WriteError> {
        // serde_json escapes control characters, so a record is always one line.
        let mut line = serde_json::to_string(record)?;
        line.push('\n');
        let mut file = self.file.lock().unwrap();
        file.write_all(line.as_bytes())?;
        self.count.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    fn count(&self) -> u64 {
        self.count.load(Ordering::Relaxed)
    }
}

/// Append-only destination for matched records. Order reflects write arrival,
/// not input order.
pub struct OutputSink {
    inner: Appender,
}

impl OutputSink {
    pub fn open(path: &Path) -> std::io::Result<Self> {
        Ok(Self {
            inner: Appender::open(path)?,
        })
    }

    pub fn append(&self, record: &MessageRecord) -> Result<(), WriteError> {
        self.inner.append_json(record)
    }

    /// Records appended so far by this process.
    pub fn written(&self) -> u64 {
        self.inner.count()
    }
}

/// Append-only destination for failures that were not retried to success.
/// Best-effort: a failure to append here is logged and swallowed, never fatal.
pub struct ErrorLog {
    inner: Appender,
}

impl ErrorLog {
    pub fn open(path: &Path) -> std::io::Result<Self> {
        Ok(Self {
            inner: Appender::open(path)?,
        })
    }

    pub fn record(&self, record: &ErrorRecord) {
        if let Err(err) = self.inner.append_json(record) {
            log::error!(
                "could not append to error log ({} for {}): {err}",
                record.detail,
                record.identity
            );
        }
    }

    /// Entries appended so far by this process.
    pub fn count(&self) -> u64 {
        self.inner.count()
    }
}
