//! Single-shot software timers
//!
//! The notification loop, the control state machine and the monitor each
//! own one [`TimerSlot`] and arm it against a [`TimerService`].

pub mod queue;
pub mod traits;

pub use queue::TimerQueue;
pub use traits::{Expired, Ticks, TimerCallback, TimerError, TimerHandle, TimerService, TimerSlot};
