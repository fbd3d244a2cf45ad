//! Sample batch notification loop
//!
//! Every firing takes a full batch of samples, pushes it to the subscribed
//! peer in one notification and re-arms itself while the link is up.

use crate::adc::{AdcError, AdcFrontEnd, GpAdcSampler};
use crate::config::service::{ADC_VAL_1_CHAR_LEN, SAMPLE_BATCH_LEN};
use crate::events::{Attribute, Outbound};
use crate::timer::{Ticks, TimerCallback, TimerHandle, TimerService, TimerSlot};

/// Millivolt readings of one firing, in sampling order
pub type SampleBatch = [u16; SAMPLE_BATCH_LEN];

/// Take a full batch, stopping at the first failed conversion
pub fn collect_batch<A: AdcFrontEnd>(
    sampler: &mut GpAdcSampler<A>,
) -> Result<SampleBatch, AdcError> {
    let mut batch = [0u16; SAMPLE_BATCH_LEN];
    for sample in batch.iter_mut() {
        *sample = sampler.take_millivolts()?;
    }
    Ok(batch)
}

/// Pack a batch into the ADC value characteristic payload (u16 LE per sample)
pub fn pack_batch(batch: &SampleBatch) -> [u8; ADC_VAL_1_CHAR_LEN] {
    let mut payload = [0u8; ADC_VAL_1_CHAR_LEN];
    for (chunk, sample) in payload.chunks_exact_mut(2).zip(batch.iter()) {
        chunk.copy_from_slice(&sample.to_le_bytes());
    }
    payload
}

/// Scheduler state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    /// No firing pending
    Idle,
    /// Next firing armed
    Running,
}

/// Notification loop owning the sampling timer
pub struct NotificationScheduler {
    timer: TimerSlot,
    interval: Ticks,
}

impl NotificationScheduler {
    /// Create an idle scheduler that re-arms every `interval` ticks
    pub const fn new(interval: Ticks) -> Self {
        Self {
            timer: TimerSlot::Unarmed,
            interval,
        }
    }

    pub fn state(&self) -> SchedulerState {
        if self.timer.is_armed() {
            SchedulerState::Running
        } else {
            SchedulerState::Idle
        }
    }

    pub fn timer(&self) -> TimerSlot {
        self.timer
    }

    /// Timer entry point
    ///
    /// `fired` is the handle that expired. Any other pending firing of this
    /// scheduler is cancelled so at most one loop runs. Returns the batch
    /// notification, or `None` if a conversion failed.
    pub fn on_fire<A: AdcFrontEnd, T: TimerService>(
        &mut self,
        fired: TimerHandle,
        sampler: &mut GpAdcSampler<A>,
        timers: &mut T,
        connected: bool,
    ) -> Option<Outbound> {
        if self.timer.holds(fired) {
            self.timer = TimerSlot::Unarmed;
        } else {
            self.timer.cancel(timers);
        }

        let notification = match collect_batch(sampler) {
            Ok(batch) => Some(Outbound::Notify {
                attribute: Attribute::AdcValue1,
                payload: pack_batch(&batch),
            }),
            Err(e) => {
                log::warn!("Sampling: batch dropped ({:?})", e);
                None
            }
        };

        if connected {
            if let Err(e) = self
                .timer
                .rearm(timers, self.interval, TimerCallback::AdcNotify)
            {
                log::error!("Sampling: failed to re-arm ({:?}), loop stopped", e);
            }
        } else {
            log::debug!("Sampling: link down, loop stopped");
        }

        notification
    }

    /// Cancel the pending firing, if any
    pub fn stop<T: TimerService>(&mut self, timers: &mut T) {
        self.timer.cancel(timers);
    }
}
