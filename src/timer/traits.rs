//! Single-shot software timer interface
//!
//! Owners arm a timer for a delay in ticks and get back a handle they alone
//! may cancel. Expired timers are delivered back to the dispatcher as the
//! [`TimerCallback`] they were armed with.

/// Timer delay or timestamp in ticks
pub type Ticks = u32;

/// Errors that can occur when arming a timer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerError {
    /// No free timer entry
    QueueFull,
}

/// Opaque identifier of one armed timer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerHandle(pub(crate) u16);

/// Entry point a timer runs when it expires
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerCallback {
    /// Sample a batch and notify (notification scheduler entry point)
    AdcNotify,
    /// Take and log a single sample (diagnostic monitor)
    AdcMonitor,
}

/// A timer that reached its deadline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Expired {
    pub handle: TimerHandle,
    pub callback: TimerCallback,
}

/// Timer ownership slot
///
/// `Unarmed` replaces the vendor "invalid timer" sentinel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimerSlot {
    #[default]
    Unarmed,
    Armed(TimerHandle),
}

impl TimerSlot {
    pub fn is_armed(&self) -> bool {
        matches!(self, TimerSlot::Armed(_))
    }

    pub fn handle(&self) -> Option<TimerHandle> {
        match self {
            TimerSlot::Armed(handle) => Some(*handle),
            TimerSlot::Unarmed => None,
        }
    }

    /// Returns true if this slot holds `handle`
    pub fn holds(&self, handle: TimerHandle) -> bool {
        self.handle() == Some(handle)
    }

    /// Cancel the held timer, if any, and leave the slot unarmed
    pub fn cancel<T: TimerService>(&mut self, timers: &mut T) {
        if let TimerSlot::Armed(handle) = core::mem::take(self) {
            timers.cancel(handle);
        }
    }

    /// Arm a fresh timer into this slot, cancelling the one it held
    ///
    /// On failure the slot is left unarmed.
    pub fn rearm<T: TimerService>(
        &mut self,
        timers: &mut T,
        delay: Ticks,
        callback: TimerCallback,
    ) -> Result<TimerHandle, TimerError> {
        self.cancel(timers);
        let handle = timers.arm(delay, callback)?;
        *self = TimerSlot::Armed(handle);
        Ok(handle)
    }
}

/// Abstract single-shot timer facility
pub trait TimerService {
    /// Arm a timer that expires `delay` ticks from now
    fn arm(&mut self, delay: Ticks, callback: TimerCallback) -> Result<TimerHandle, TimerError>;

    /// Cancel a pending timer
    ///
    /// Cancelling a handle that already expired or was cancelled does nothing.
    fn cancel(&mut self, handle: TimerHandle);
}
