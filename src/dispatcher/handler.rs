//! Event dispatcher for the custom service
//!
//! One handler per inbound event kind. Each handler mutates the retained
//! state and returns at most one outbound event. Timer expiry is routed
//! through [`EventDispatcher::on_timer`].

use crate::adc::{AdcFrontEnd, GpAdcSampler};
use crate::dispatcher::state::ServiceState;
use crate::events::{first_byte, AttRegion, AttStatus, Attribute, ConnectionId, Event, Outbound};
use crate::led;
use crate::sampling::ControlState;
use crate::store::ConnectionSlot;
use crate::timer::{Expired, TimerCallback, TimerService};
use embedded_hal::digital::OutputPin;

/// Event dispatcher
///
/// Stateless: all retained state lives in [`ServiceState`].
pub struct EventDispatcher;

impl EventDispatcher {
    /// Create a new event dispatcher
    pub fn new() -> Self {
        Self
    }

    /// Dispatch an inbound event and return the response, if any
    pub fn dispatch<T: TimerService, L: OutputPin>(
        &self,
        state: &mut ServiceState,
        timers: &mut T,
        led: &mut L,
        event: Event,
    ) -> Option<Outbound> {
        match event {
            Event::ControlWrite { value, .. } => {
                self.handle_control_write(state, timers, &value);
                None
            }
            Event::LedWrite { value, .. } => {
                led::apply(led, first_byte(&value));
                None
            }
            Event::IndicateableSubscribeChange { conn, value } => {
                self.handle_indicateable_subscribe(state, conn, &value)
            }
            Event::ExternalValueWrite { conn, value } => {
                if let Some(slot) = self.slot(conn) {
                    state.store.write(slot, &value);
                }
                None
            }
            Event::ExternalValueReadRequest { conn } => self.handle_read_counter_request(state, conn),
            Event::WrittenValueReadRequest { conn } => self.handle_written_value_request(state, conn),
            Event::AttributeInfoRequest {
                conn,
                attribute,
                region,
            } => Some(self.handle_att_info(conn, attribute, region)),

            // Defined extension points with no behaviour
            Event::LongValueWrite { .. }
            | Event::LongValueNotifyConfirm { .. }
            | Event::AdcConfigWrite { .. }
            | Event::AdcNotifyConfirm { .. }
            | Event::ButtonNotifyConfirm { .. }
            | Event::IndicateableConfigWrite { .. }
            | Event::IndicateableIndicateConfirm { .. } => None,
        }
    }

    /// Run the entry point of an expired timer
    pub fn on_timer<A: AdcFrontEnd, T: TimerService>(
        &self,
        state: &mut ServiceState,
        sampler: &mut GpAdcSampler<A>,
        timers: &mut T,
        expired: Expired,
        connected: bool,
    ) -> Option<Outbound> {
        match expired.callback {
            TimerCallback::AdcNotify => {
                if state.control.on_fire(expired.handle) {
                    log::debug!("Control: start delay elapsed");
                }
                state
                    .scheduler
                    .on_fire(expired.handle, sampler, timers, connected)
            }
            TimerCallback::AdcMonitor => {
                state.monitor.on_fire(expired.handle, sampler, timers);
                None
            }
        }
    }

    /// Handle a control point write
    ///
    /// Disabling also stops a running notification loop, so no firing
    /// happens after the write.
    fn handle_control_write<T: TimerService>(
        &self,
        state: &mut ServiceState,
        timers: &mut T,
        value: &[u8],
    ) {
        if state.control.apply(first_byte(value), timers) == ControlState::Disabled {
            state.scheduler.stop(timers);
        }
    }

    /// Indicate the counter when a client subscribes
    fn handle_indicateable_subscribe(
        &self,
        state: &mut ServiceState,
        conn: ConnectionId,
        value: &[u8],
    ) -> Option<Outbound> {
        if first_byte(value) == 0 {
            return None;
        }

        let counter = state.indications.advance();
        log::debug!("Indicating counter {} to conn {}", counter, conn.0);
        Some(Outbound::Indicate {
            conn,
            attribute: Attribute::Indicateable,
            payload: counter.to_be_bytes(),
        })
    }

    /// Handle a read of the per-connection read counter
    fn handle_read_counter_request(
        &self,
        state: &mut ServiceState,
        conn: ConnectionId,
    ) -> Option<Outbound> {
        let slot = self.slot(conn)?;
        let outcome = state.store.read_and_increment(slot);
        Some(Outbound::ReadResponse {
            conn,
            attribute: Attribute::ExternalRead,
            status: AttStatus::Ok,
            payload: outcome.read_counter.to_le_bytes(),
        })
    }

    /// Handle a read of the per-connection written value
    fn handle_written_value_request(
        &self,
        state: &mut ServiceState,
        conn: ConnectionId,
    ) -> Option<Outbound> {
        let slot = self.slot(conn)?;
        Some(Outbound::ReadResponse {
            conn,
            attribute: Attribute::ExternalWrite,
            status: AttStatus::Ok,
            payload: state.store.written(slot).to_le_bytes(),
        })
    }

    /// Answer an attribute info query
    ///
    /// Only the writable region accepts prepared writes.
    fn handle_att_info(&self, conn: ConnectionId, attribute: Attribute, region: AttRegion) -> Outbound {
        let status = match region {
            AttRegion::Writable => AttStatus::Ok,
            AttRegion::ReadOnly => AttStatus::WriteNotPermitted,
        };
        Outbound::AttributeInfoResponse {
            conn,
            attribute,
            status,
            length: 0,
        }
    }

    /// Translate a connection id, dropping events from unknown connections
    fn slot(&self, conn: ConnectionId) -> Option<ConnectionSlot> {
        match ConnectionSlot::try_from(conn) {
            Ok(slot) => Some(slot),
            Err(e) => {
                log::warn!("Dropping event from conn {} ({:?})", conn.0, e);
                None
            }
        }
    }
}

impl Default for EventDispatcher {
    fn default() -> Self {
        Self::new()
    }
}
