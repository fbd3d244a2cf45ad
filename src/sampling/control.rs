//! Control point state machine
//!
//! A control write either arms the delayed start of the sampling loop or
//! cancels it. The enabled flag is kept apart from the timer slot, which is
//! released as soon as the start timer fires.

use crate::config::service::ADC_VAL1_DISABLE;
use crate::timer::{Ticks, TimerCallback, TimerError, TimerHandle, TimerService, TimerSlot};

/// State after handling a control write
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlState {
    Disabled,
    Enabled,
}

/// Starts and stops sampling on remote control writes
pub struct ControlStateMachine {
    timer: TimerSlot,
    enabled: bool,
    enable_delay: Ticks,
}

impl ControlStateMachine {
    /// Create a disabled state machine that starts sampling `enable_delay` ticks after enabling
    pub const fn new(enable_delay: Ticks) -> Self {
        Self {
            timer: TimerSlot::Unarmed,
            enabled: false,
            enable_delay,
        }
    }

    pub fn state(&self) -> ControlState {
        if self.enabled {
            ControlState::Enabled
        } else {
            ControlState::Disabled
        }
    }

    /// Pending start timer, unarmed once it fired
    pub fn timer(&self) -> TimerSlot {
        self.timer
    }

    /// Apply a decoded control value
    pub fn apply<T: TimerService>(&mut self, value: u8, timers: &mut T) -> ControlState {
        if value != ADC_VAL1_DISABLE {
            if let Err(e) = self.enable(timers) {
                log::error!("Control: failed to arm start timer ({:?})", e);
            }
        } else {
            self.disable(timers);
        }
        self.state()
    }

    /// Arm (or restart) the delayed start of the sampling loop
    ///
    /// Only the start timer is touched; a running sampling loop keeps going.
    pub fn enable<T: TimerService>(&mut self, timers: &mut T) -> Result<(), TimerError> {
        let restarted = self.timer.is_armed();
        if let Err(e) = self
            .timer
            .rearm(timers, self.enable_delay, TimerCallback::AdcNotify)
        {
            self.enabled = false;
            return Err(e);
        }
        self.enabled = true;
        log::debug!(
            "Control: sampling {} in {} ticks",
            if restarted { "restarts" } else { "starts" },
            self.enable_delay
        );
        Ok(())
    }

    /// Cancel the start timer
    pub fn disable<T: TimerService>(&mut self, timers: &mut T) {
        self.timer.cancel(timers);
        if self.enabled {
            log::debug!("Control: sampling disabled");
        }
        self.enabled = false;
    }

    /// Timer entry point
    ///
    /// Releases the slot if `fired` is the start timer, so the expired handle
    /// is never cancelled later. Returns true in that case.
    pub fn on_fire(&mut self, fired: TimerHandle) -> bool {
        if self.timer.holds(fired) {
            self.timer = TimerSlot::Unarmed;
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::timing::CONTROL_ENABLE_DELAY_TICKS;
    use crate::timer::TimerQueue;

    #[test]
    fn test_starts_disabled() {
        let control = ControlStateMachine::new(CONTROL_ENABLE_DELAY_TICKS);
        assert_eq!(control.state(), ControlState::Disabled);
        assert_eq!(control.timer(), TimerSlot::Unarmed);
    }

    #[test]
    fn test_enable_arms_delayed_start() {
        let mut timers = TimerQueue::new();
        let mut control = ControlStateMachine::new(100);

        assert_eq!(control.apply(1, &mut timers), ControlState::Enabled);
        assert_eq!(timers.next_deadline(), Some(100));

        let expired = timers.pop_expired(100).unwrap();
        assert_eq!(expired.callback, TimerCallback::AdcNotify);
        assert!(control.on_fire(expired.handle));

        // Still enabled, but no longer holding the expired handle
        assert_eq!(control.state(), ControlState::Enabled);
        assert_eq!(control.timer(), TimerSlot::Unarmed);
        assert!(!control.on_fire(expired.handle));
    }

    #[test]
    fn test_enable_after_fire_cancels_nothing() {
        let mut timers = TimerQueue::new();
        let mut control = ControlStateMachine::new(100);

        control.apply(1, &mut timers);
        let expired = timers.pop_expired(100).unwrap();
        control.on_fire(expired.handle);

        // Another owner's timer, pending under some handle
        let other = timers.arm(10, TimerCallback::AdcNotify).unwrap();
        control.apply(1, &mut timers);
        assert!(timers.is_pending(other));
        assert_eq!(timers.len(), 2);
    }

    #[test]
    fn test_disable_after_fire() {
        let mut timers = TimerQueue::new();
        let mut control = ControlStateMachine::new(100);

        control.apply(1, &mut timers);
        let expired = timers.pop_expired(100).unwrap();
        control.on_fire(expired.handle);

        assert_eq!(control.apply(ADC_VAL1_DISABLE, &mut timers), ControlState::Disabled);
    }

    #[test]
    fn test_any_nonzero_value_enables() {
        let mut timers = TimerQueue::new();
        let mut control = ControlStateMachine::new(100);
        assert_eq!(control.apply(0xFF, &mut timers), ControlState::Enabled);
    }

    #[test]
    fn test_disable_cancels() {
        let mut timers = TimerQueue::new();
        let mut control = ControlStateMachine::new(100);

        control.apply(1, &mut timers);
        assert_eq!(control.apply(ADC_VAL1_DISABLE, &mut timers), ControlState::Disabled);
        assert_eq!(control.timer(), TimerSlot::Unarmed);
        assert!(timers.is_empty());

        // Disabling twice is harmless
        assert_eq!(control.apply(ADC_VAL1_DISABLE, &mut timers), ControlState::Disabled);
    }

    #[test]
    fn test_reenable_restarts_delay() {
        let mut timers = TimerQueue::new();
        let mut control = ControlStateMachine::new(100);

        control.apply(1, &mut timers);
        assert!(timers.pop_expired(60).is_none());
        control.apply(1, &mut timers);

        // One timer, restarted from tick 60
        assert_eq!(timers.len(), 1);
        assert_eq!(timers.next_deadline(), Some(160));
        assert!(timers.pop_expired(159).is_none());
        assert!(timers.pop_expired(160).is_some());
    }

    #[test]
    fn test_enable_failure_leaves_disabled() {
        let mut timers = TimerQueue::new();
        while timers.arm(1_000, TimerCallback::AdcMonitor).is_ok() {}

        let mut control = ControlStateMachine::new(100);
        assert_eq!(control.apply(1, &mut timers), ControlState::Disabled);
    }
}
