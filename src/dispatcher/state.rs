//! Retained service state
//!
//! Everything that must survive between handler invocations, owned in one
//! place and passed by reference into the dispatcher.

use crate::config::timing;
use crate::sampling::{ControlStateMachine, NotificationScheduler, SampleMonitor};
use crate::store::ConnectionValueStore;
use crate::timer::Ticks;

/// Tunable timer parameters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceConfig {
    /// Delay between an enabling control write and the first batch
    pub control_enable_delay: Ticks,
    /// Re-arm interval of the notification loop
    pub notify_interval: Ticks,
    /// Period of the diagnostic monitor
    pub monitor_interval: Ticks,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            control_enable_delay: timing::CONTROL_ENABLE_DELAY_TICKS,
            notify_interval: timing::NOTIFY_INTERVAL_TICKS,
            monitor_interval: timing::MONITOR_INTERVAL_TICKS,
        }
    }
}

/// Process-wide indication counter, wrapping at 2^16
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IndicationCounter(u16);

impl IndicationCounter {
    pub const fn new() -> Self {
        Self(0)
    }

    pub fn value(&self) -> u16 {
        self.0
    }

    /// Return the current value and advance
    pub fn advance(&mut self) -> u16 {
        let current = self.0;
        self.0 = self.0.wrapping_add(1);
        current
    }
}

/// Retained state of the custom service
pub struct ServiceState {
    pub store: ConnectionValueStore,
    pub indications: IndicationCounter,
    pub control: ControlStateMachine,
    pub scheduler: NotificationScheduler,
    pub monitor: SampleMonitor,
}

impl ServiceState {
    pub fn new(config: &ServiceConfig) -> Self {
        Self {
            store: ConnectionValueStore::new(),
            indications: IndicationCounter::new(),
            control: ControlStateMachine::new(config.control_enable_delay),
            scheduler: NotificationScheduler::new(config.notify_interval),
            monitor: SampleMonitor::new(config.monitor_interval),
        }
    }
}

impl Default for ServiceState {
    fn default() -> Self {
        Self::new(&ServiceConfig::default())
    }
}
