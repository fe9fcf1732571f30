//! Cursor-following pagination walker: a lazy, finite sequence of pages.

use std::time::Duration;

use super::{ListError, Page};

/// Repeatedly issues a list call with the last-seen continuation cursor and
/// yields each page's items until the service stops returning a cursor.
///
/// The walk sleeps `delay` before every call after the first, which is the
/// pagination rate limit. A failed call yields the error once and fuses the
/// iterator; a walk is never resumed mid-cursor — retrying an identity means
/// redoing its walk from the start.
pub struct Pages<T, F>
where
    F: FnMut(Option<&str>) -> Result<Page<T>, ListError>,
{
    fetch: F,
    cursor: Option<String>,
    started: bool,
    done: bool,
    delay: Duration,
}

impl<T, F> Pages<T, F>
where
    F: FnMut(Option<&str>) -> Result<Page<T>, ListError>,
{
    pub fn new(delay: Duration, fetch: F) -> Self {
        Self {
            fetch,
            cursor: None,
            started: false,
            done: false,
            delay,
        }
    }
}

impl<T, F> Iterator for Pages<T, F>
where
    F: FnMut(Option<&str>) -> Result<Page<T>, ListError>,
{
    type Item = Result<Vec<T>, ListError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        if self.started && !self.delay.is_zero() {
            std::thread::sleep(self.delay);
        }
        self.started = true;
        match (self.fetch)(self.cursor.as_deref()) {
            Ok(page) => {
                self.cursor = page.next_cursor;
                self.done = self.cursor.is_none();
                Some(Ok(page.items))
            }
            Err(err) => {
                self.done = true;
                Some(Err(err))
            }
        }
    }
}
