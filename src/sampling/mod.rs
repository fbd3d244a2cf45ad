//! Timer-driven sampling
//!
//! The control state machine arms the delayed start of the notification
//! loop; the monitor is an independent diagnostic loop.

pub mod control;
pub mod monitor;
pub mod scheduler;

pub use control::{ControlState, ControlStateMachine};
pub use monitor::SampleMonitor;
pub use scheduler::{collect_batch, pack_batch, NotificationScheduler, SampleBatch, SchedulerState};
