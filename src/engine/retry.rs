//! Fixed-wait retry policy shared by every remote call site.

use std::fmt::Display;
use std::time::Duration;

/// Attempt limit plus a fixed (non-exponential) wait between attempts.
///
/// After the final failed attempt the last error is returned to the caller
/// rather than escalated here; what exhaustion means (identity-fatal,
/// message-fatal, worker-fatal) differs per call site.
#[derive(Clone, Copy, Debug)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub wait: Duration,
}

impl RetryPolicy {
    pub const fn new(attempts: u32, wait: Duration) -> Self {
        debug_assert!(attempts >= 1);
        Self { attempts, wait }
    }

    /// Run `op` up to `attempts` times, sleeping `wait` between attempts.
    /// Intermediate failures are logged as warnings under `what`.
    pub fn run<T, E, F>(&self, what: &str, mut op: F) -> Result<T, E>
    where
        E: Display,
        F: FnMut() -> Result<T, E>,
    {
        let mut attempt = 1;
        loop {
            match op() {
                Ok(value) => return Ok(value),
                Err(err) if attempt < self.attempts => {
                    log::warn!(
                        "{what} failed (attempt {attempt}/{}): {err}; retrying in {:?}",
                        self.attempts,
                        self.wait
                    );
                    std::thread::sleep(self.wait);
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }
}
