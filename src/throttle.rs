//! Leading-edge rate limiting keyed on the time of the last accepted event.
//!
//! DESIGN
//! ======
//! The first event is always accepted; later ones are accepted only once
//! `interval` has elapsed since the previous acceptance. Rejected events are
//! dropped, never deferred, so there is no timer and nothing to cancel.

use std::sync::Mutex;
use std::time::{Duration, Instant};

use crate::util::lock;

#[derive(Debug)]
pub struct Throttle {
    interval: Duration,
    last: Mutex<Option<Instant>>,
}

impl Throttle {
    #[must_use]
    pub fn new(interval: Duration) -> Self {
        Self { interval, last: Mutex::new(None) }
    }

    /// Accept an event happening at `now`, if the window allows it.
    pub(crate) fn try_acquire_at(&self, now: Instant) -> bool {
        let mut last = lock(&self.last);
        match *last {
            Some(prev) if now.saturating_duration_since(prev) < self.interval => false,
            _ => {
                *last = Some(now);
                true
            }
        }
    }

    /// Forget the last acceptance so the next event passes immediately.
    pub fn reset(&self) {
        *lock(&self.last) = None;
    }
}

#[cfg(test)]
#[path = "throttle_test.rs"]
mod tests;
