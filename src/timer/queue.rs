//! Fixed-capacity software timer queue
//!
//! Time only moves when the owner passes the current tick count to
//! [`TimerQueue::advance_to`] or [`TimerQueue::pop_expired`], so the queue is
//! fully deterministic under test.

use crate::config::timing::MAX_PENDING_TIMERS;
use crate::timer::traits::{Expired, Ticks, TimerCallback, TimerError, TimerHandle, TimerService};
use heapless::Vec;

#[derive(Debug, Clone, Copy)]
struct Entry {
    handle: TimerHandle,
    callback: TimerCallback,
    deadline: u64,
}

/// Pending single-shot timers ordered by deadline
pub struct TimerQueue {
    entries: Vec<Entry, MAX_PENDING_TIMERS>,
    now: u64,
    next_id: u16,
}

impl TimerQueue {
    /// Create an empty queue at tick 0
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            now: 0,
            next_id: 0,
        }
    }

    /// Current time as last observed by `advance_to` or `pop_expired`
    pub fn now(&self) -> u64 {
        self.now
    }

    /// Move the clock forward to `now` without expiring anything
    ///
    /// New timers are armed relative to this clock. It never moves backwards.
    pub fn advance_to(&mut self, now: u64) {
        self.now = self.now.max(now);
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if `handle` has not yet expired or been cancelled
    pub fn is_pending(&self, handle: TimerHandle) -> bool {
        self.entries.iter().any(|e| e.handle == handle)
    }

    /// Earliest pending deadline
    pub fn next_deadline(&self) -> Option<u64> {
        self.entries.iter().map(|e| e.deadline).min()
    }

    /// Remove and return the earliest timer due at or before `now`
    ///
    /// Advances the queue clock to `now` (it never moves backwards). Timers
    /// with equal deadlines expire in the order they were armed.
    pub fn pop_expired(&mut self, now: u64) -> Option<Expired> {
        self.advance_to(now);

        let index = self
            .entries
            .iter()
            .enumerate()
            .filter(|(_, e)| e.deadline <= self.now)
            .min_by_key(|(_, e)| e.deadline)
            .map(|(i, _)| i)?;

        // Vec::remove keeps arming order for equal deadlines
        let entry = self.entries.remove(index);
        Some(Expired {
            handle: entry.handle,
            callback: entry.callback,
        })
    }

    /// Remove the earliest pending timer with `callback`, ignoring deadlines
    ///
    /// The clock does not move.
    pub fn take(&mut self, callback: TimerCallback) -> Option<Expired> {
        let index = self
            .entries
            .iter()
            .enumerate()
            .filter(|(_, e)| e.callback == callback)
            .min_by_key(|(_, e)| e.deadline)
            .map(|(i, _)| i)?;

        let entry = self.entries.remove(index);
        Some(Expired {
            handle: entry.handle,
            callback: entry.callback,
        })
    }

    fn allocate_handle(&mut self) -> TimerHandle {
        loop {
            let handle = TimerHandle(self.next_id);
            self.next_id = self.next_id.wrapping_add(1);
            if !self.is_pending(handle) {
                return handle;
            }
        }
    }
}

impl Default for TimerQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl TimerService for TimerQueue {
    fn arm(&mut self, delay: Ticks, callback: TimerCallback) -> Result<TimerHandle, TimerError> {
        if self.entries.is_full() {
            return Err(TimerError::QueueFull);
        }

        let handle = self.allocate_handle();
        let entry = Entry {
            handle,
            callback,
            deadline: self.now + u64::from(delay),
        };
        self.entries
            .push(entry)
            .map_err(|_| TimerError::QueueFull)?;
        Ok(handle)
    }

    fn cancel(&mut self, handle: TimerHandle) {
        self.entries.retain(|e| e.handle != handle);
    }
}
