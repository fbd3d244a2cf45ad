//! Diagnostic single-sample monitor
//!
//! Logs one millivolt reading per period, independent of any connection.

use crate::adc::{AdcFrontEnd, GpAdcSampler};
use crate::timer::{Ticks, TimerCallback, TimerError, TimerHandle, TimerService, TimerSlot};

pub struct SampleMonitor {
    timer: TimerSlot,
    interval: Ticks,
}

impl SampleMonitor {
    pub const fn new(interval: Ticks) -> Self {
        Self {
            timer: TimerSlot::Unarmed,
            interval,
        }
    }

    pub fn is_running(&self) -> bool {
        self.timer.is_armed()
    }

    pub fn start<T: TimerService>(&mut self, timers: &mut T) -> Result<(), TimerError> {
        self.timer
            .rearm(timers, self.interval, TimerCallback::AdcMonitor)
            .map(|_| ())
    }

    pub fn stop<T: TimerService>(&mut self, timers: &mut T) {
        self.timer.cancel(timers);
    }

    /// Timer entry point: log one reading and restart the period
    ///
    /// Returns the reading in millivolts, if the conversion completed.
    pub fn on_fire<A: AdcFrontEnd, T: TimerService>(
        &mut self,
        fired: TimerHandle,
        sampler: &mut GpAdcSampler<A>,
        timers: &mut T,
    ) -> Option<u16> {
        if !self.timer.holds(fired) {
            // Stale firing from a cancelled monitor
            return None;
        }
        self.timer = TimerSlot::Unarmed;

        let reading = match sampler.take_millivolts() {
            Ok(mv) => {
                log::info!("adc result: {}mv", mv);
                Some(mv)
            }
            Err(e) => {
                log::warn!("adc result: unavailable ({:?})", e);
                None
            }
        };

        if let Err(e) = self.start(timers) {
            log::error!("Monitor: failed to re-arm ({:?})", e);
        }
        reading
    }
}
