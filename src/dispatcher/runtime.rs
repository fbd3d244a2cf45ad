//! Service runtime
//!
//! Owns the retained state, the timer queue and the hardware, and pushes
//! everything the dispatcher produces into a [`GattSink`].

use core::future::Future;

use crate::adc::{AdcFrontEnd, GpAdcSampler};
use crate::dispatcher::handler::EventDispatcher;
use crate::dispatcher::state::{ServiceConfig, ServiceState};
use crate::events::{Event, Outbound};
use crate::timer::{TimerCallback, TimerError, TimerQueue};
use embedded_hal::digital::OutputPin;

/// Errors that can occur delivering an outbound event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SinkError {
    /// Link stack refused or failed the send
    Transport,
}

/// Destination for outbound events
///
/// Implemented over the GATT server on target and by a recording mock in
/// tests.
pub trait GattSink {
    /// Deliver one outbound event
    fn send(&mut self, outbound: &Outbound) -> impl Future<Output = Result<(), SinkError>>;
}

pub struct ServiceRuntime<A: AdcFrontEnd, L: OutputPin> {
    dispatcher: EventDispatcher,
    state: ServiceState,
    timers: TimerQueue,
    sampler: GpAdcSampler<A>,
    led: L,
}

impl<A: AdcFrontEnd, L: OutputPin> ServiceRuntime<A, L> {
    pub fn new(sampler: GpAdcSampler<A>, led: L, config: &ServiceConfig) -> Self {
        Self {
            dispatcher: EventDispatcher::new(),
            state: ServiceState::new(config),
            timers: TimerQueue::new(),
            sampler,
            led,
        }
    }

    pub fn state(&self) -> &ServiceState {
        &self.state
    }

    pub fn timers(&self) -> &TimerQueue {
        &self.timers
    }

    pub fn led(&self) -> &L {
        &self.led
    }

    /// Start the diagnostic monitor loop
    pub fn start_monitor(&mut self) -> Result<(), TimerError> {
        self.state.monitor.start(&mut self.timers)
    }

    /// Earliest tick at which [`Self::run_due`] has work
    pub fn next_deadline(&self) -> Option<u64> {
        self.timers.next_deadline()
    }

    /// Dispatch one inbound event received at tick `now`
    pub async fn handle<S: GattSink>(&mut self, event: Event, now: u64, sink: &mut S) {
        self.timers.advance_to(now);
        let outbound = self.dispatcher.dispatch(
            &mut self.state,
            &mut self.timers,
            &mut self.led,
            event,
        );
        if let Some(outbound) = outbound {
            deliver(sink, &outbound).await;
        }
    }

    /// Run every timer due at `now`
    ///
    /// Returns the number of timers that fired.
    pub async fn run_due<S: GattSink>(&mut self, now: u64, connected: bool, sink: &mut S) -> usize {
        let mut fired = 0;
        while let Some(expired) = self.timers.pop_expired(now) {
            fired += 1;
            let outbound = self.dispatcher.on_timer(
                &mut self.state,
                &mut self.sampler,
                &mut self.timers,
                expired,
                connected,
            );
            if let Some(outbound) = outbound {
                deliver(sink, &outbound).await;
            }
        }
        fired
    }

    /// Finish the notification chain after the link went down
    ///
    /// Pending notification timers fire immediately with the link reported
    /// down, so none re-arms. Their batches have nowhere to go and are
    /// dropped. The monitor is left running.
    pub fn wind_down(&mut self) -> usize {
        let mut fired = 0;
        while let Some(expired) = self.timers.take(TimerCallback::AdcNotify) {
            fired += 1;
            let outbound = self.dispatcher.on_timer(
                &mut self.state,
                &mut self.sampler,
                &mut self.timers,
                expired,
                false,
            );
            // No link to deliver on
            if let Some(outbound) = outbound {
                log::debug!("Runtime: dropped {:?}", outbound);
            }
        }
        if fired > 0 {
            log::debug!("Runtime: wound down {} pending firing(s)", fired);
        }
        fired
    }
}

async fn deliver<S: GattSink>(sink: &mut S, outbound: &Outbound) {
    if let Err(e) = sink.send(outbound).await {
        log::warn!("Runtime: outbound event dropped ({:?})", e);
    }
}


#[cfg(test)]
mod tests {
    use super::mock::MockSink;
    use super::*;
    use crate::adc::traits::mock::MockAdcFrontEnd;
    use crate::events::{AttStatus, Attribute, ConnectionId, Value};
    use crate::led::mock::MockLed;
    use crate::sampling::{ControlState, SchedulerState};

    fn runtime() -> ServiceRuntime<MockAdcFrontEnd, MockLed> {
        ServiceRuntime::new(
            GpAdcSampler::new(MockAdcFrontEnd::new(100)),
            MockLed::new(),
            &ServiceConfig::default(),
        )
    }

    fn control(value: u8) -> Event {
        Event::ControlWrite {
            conn: ConnectionId(0),
            value: Value::from_slice(&[value]).unwrap(),
        }
    }

    #[test]
    fn test_read_response_reaches_sink() {
        let mut rt = runtime();
        let mut sink = MockSink::new();

        futures::executor::block_on(async {
            rt.handle(Event::ExternalValueReadRequest { conn: ConnectionId(1) }, 0, &mut sink)
                .await;
        });

        assert_eq!(
            sink.sent(),
            &[Outbound::ReadResponse {
                conn: ConnectionId(1),
                attribute: Attribute::ExternalRead,
                status: AttStatus::Ok,
                payload: [1, 0],
            }]
        );
    }

    #[test]
    fn test_writes_produce_nothing() {
        let mut rt = runtime();
        let mut sink = MockSink::new();

        futures::executor::block_on(async {
            rt.handle(
                Event::LedWrite {
                    conn: ConnectionId(0),
                    value: Value::from_slice(&[1]).unwrap(),
                },
                0,
                &mut sink,
            )
            .await;
            rt.handle(control(1), 0, &mut sink).await;
        });

        assert!(sink.sent().is_empty());
        assert!(rt.led().is_high());
        assert_eq!(rt.next_deadline(), Some(100));
    }

    #[test]
    fn test_run_due_delivers_notifications() {
        let mut rt = runtime();
        let mut sink = MockSink::new();

        let fired = futures::executor::block_on(async {
            rt.handle(control(1), 0, &mut sink).await;
            let early = rt.run_due(50, true, &mut sink).await;
            assert_eq!(early, 0);
            let first = rt.run_due(100, true, &mut sink).await;
            let second = rt.run_due(110, true, &mut sink).await;
            first + second
        });

        assert_eq!(fired, 2);
        assert_eq!(sink.sent().len(), 2);
        assert!(sink
            .sent()
            .iter()
            .all(|o| matches!(o, Outbound::Notify { attribute: Attribute::AdcValue1, .. })));
        assert_eq!(rt.next_deadline(), Some(120));
    }

    #[test]
    fn test_enable_delay_counts_from_event_time() {
        let mut rt = runtime();
        let mut sink = MockSink::new();

        futures::executor::block_on(rt.handle(control(1), 500, &mut sink));
        assert_eq!(rt.next_deadline(), Some(600));

        let fired = futures::executor::block_on(rt.run_due(599, true, &mut sink));
        assert_eq!(fired, 0);
    }

    #[test]
    fn test_sink_failure_does_not_stop_loop() {
        let mut rt = runtime();
        let mut sink = MockSink::new();
        sink.set_fail(true);

        futures::executor::block_on(async {
            rt.handle(control(1), 0, &mut sink).await;
            rt.run_due(100, true, &mut sink).await;
        });

        assert!(sink.sent().is_empty());
        assert_eq!(rt.state().scheduler.state(), SchedulerState::Running);
    }

    #[test]
    fn test_wind_down_ends_chain() {
        let mut rt = runtime();
        let mut sink = MockSink::new();

        futures::executor::block_on(async {
            rt.handle(control(1), 0, &mut sink).await;
            rt.run_due(100, true, &mut sink).await;
        });
        assert_eq!(rt.state().scheduler.state(), SchedulerState::Running);

        assert_eq!(rt.wind_down(), 1);
        assert_eq!(rt.state().scheduler.state(), SchedulerState::Idle);
        assert!(rt.timers().is_empty());
        assert_eq!(sink.sent().len(), 1);
    }

    #[test]
    fn test_wind_down_before_first_batch() {
        let mut rt = runtime();
        let mut sink = MockSink::new();

        futures::executor::block_on(rt.handle(control(1), 0, &mut sink));

        // Control delay fires once, loop does not continue
        assert_eq!(rt.wind_down(), 1);
        assert!(rt.timers().is_empty());
        assert_eq!(rt.state().control.state(), ControlState::Enabled);
        assert_eq!(rt.state().scheduler.state(), SchedulerState::Idle);
    }

    #[test]
    fn test_reconnect_enable_after_wind_down() {
        let mut rt = runtime();
        let mut sink = MockSink::new();

        futures::executor::block_on(async {
            rt.handle(control(1), 0, &mut sink).await;
            rt.run_due(100, true, &mut sink).await;
        });
        rt.wind_down();
        assert!(rt.timers().is_empty());

        // Next link enables again and gets a fresh start delay
        let sent = futures::executor::block_on(async {
            rt.handle(control(1), 1000, &mut sink).await;
            assert_eq!(rt.next_deadline(), Some(1100));
            rt.run_due(1100, true, &mut sink).await
        });
        assert_eq!(sent, 1);
        assert_eq!(sink.sent().len(), 2);
    }

    #[test]
    fn test_wind_down_keeps_monitor() {
        let mut rt = runtime();
        rt.start_monitor().unwrap();

        assert_eq!(rt.wind_down(), 0);
        assert!(rt.state().monitor.is_running());
        assert_eq!(rt.next_deadline(), Some(200));
    }
}
