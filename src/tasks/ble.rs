//! BLE task for the custom service
//!
//! Implements the BLE host task that advertises, accepts one link at a time
//! and feeds GATT events and timer expiries through the service runtime.

use embassy_futures::select::{select, Either};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_time::{Instant, Timer};
use esp_hal::gpio::Output;
use esp_hal::peripherals::GPIO6;
use trouble_host::prelude::*;

use crate::adc::EspAdcFrontEnd;
use crate::ble::service::{ControlService, ExternalReadService, ExternalWriteService};
use crate::config;
use crate::config::timing::TICK_MS;
use crate::dispatcher::{GattSink, ServiceRuntime, SinkError};
use crate::events::{Attribute, ConnectionId, Event, Outbound, Value};

/// Runtime type on target
pub type Runtime = ServiceRuntime<EspAdcFrontEnd<'static, GPIO6<'static>>, Output<'static>>;

/// The host accepts a single link, always stored in slot 0
const LINK_CONN: ConnectionId = ConnectionId(0);

/// Format device ID bytes as uppercase hex into a buffer
/// Returns the formatted string slice
fn format_device_name<'a>(buf: &'a mut [u8; 20], device_id: &[u8; 3]) -> &'a str {
    const HEX_CHARS: &[u8; 16] = b"0123456789ABCDEF";
    let prefix = config::ble::DEVICE_NAME_PREFIX.as_bytes();

    buf[..prefix.len()].copy_from_slice(prefix);

    let mut pos = prefix.len();
    for &byte in device_id {
        buf[pos] = HEX_CHARS[(byte >> 4) as usize];
        buf[pos + 1] = HEX_CHARS[(byte & 0x0F) as usize];
        pos += 2;
    }

    core::str::from_utf8(&buf[..pos]).unwrap_or(config::ble::DEVICE_NAME_PREFIX)
}

/// GATT server with the three custom services
#[gatt_server(mutex_type = CriticalSectionRawMutex)]
struct Server {
    control: ControlService,
    external_write: ExternalWriteService,
    external_read: ExternalReadService,
}

/// Current time in timer ticks
fn now_ticks() -> u64 {
    Instant::now().as_millis() / TICK_MS
}

/// Sleep until `deadline` ticks, or forever if nothing is pending
async fn wait_for_deadline(deadline: Option<u64>) {
    match deadline {
        Some(ticks) => Timer::at(Instant::from_millis(ticks * TICK_MS)).await,
        None => core::future::pending().await,
    }
}

/// Delivers outbound events over the current link
struct ConnectionSink<'a, 'v, 's, 'c, P: PacketPool> {
    server: &'a Server<'v>,
    conn: &'a GattConnection<'s, 'c, P>,
}

impl<P: PacketPool> GattSink for ConnectionSink<'_, '_, '_, '_, P> {
    async fn send(&mut self, outbound: &Outbound) -> Result<(), SinkError> {
        let result = match outbound {
            Outbound::Notify {
                attribute: Attribute::AdcValue1,
                payload,
            } => self.server.control.adc_val_1.notify(self.conn, payload).await,
            Outbound::Indicate {
                attribute: Attribute::Indicateable,
                payload,
                ..
            } => self.server.control.indicateable.indicate(self.conn, payload).await,
            // Stored now, served when the pending read is accepted
            Outbound::ReadResponse {
                attribute: Attribute::ExternalRead,
                payload,
                ..
            } => self.server.external_read.read_val_1.set(self.server, payload),
            Outbound::ReadResponse {
                attribute: Attribute::ExternalWrite,
                payload,
                ..
            } => self.server.external_write.write_val_1.set(self.server, payload),
            other => {
                log::debug!("BLE: no route for {:?}", other);
                Ok(())
            }
        };
        result.map_err(|_| SinkError::Transport)
    }
}

/// Sink used while no link is up
struct DetachedSink;

impl GattSink for DetachedSink {
    async fn send(&mut self, _outbound: &Outbound) -> Result<(), SinkError> {
        Err(SinkError::Transport)
    }
}

/// Main BLE task that manages the Bluetooth stack and the service runtime
///
/// This task:
/// 1. Advertises as "ADC-Notify-XXXXXX" (unique per device)
/// 2. Accepts one connection at a time
/// 3. Translates GATT reads and writes into service events
/// 4. Runs expired timers between GATT events
/// 5. Winds the sampling loop down when the link drops
pub async fn ble_task<C: Controller>(controller: C, device_id: [u8; 3], mut runtime: Runtime) {
    let mut device_name_buf = [0u8; 20];
    let device_name = format_device_name(&mut device_name_buf, &device_id);

    log::info!("BLE: Starting as '{}'", device_name);

    let mut resources: HostResources<
        DefaultPacketPool,
        { config::ble::CONNECTIONS_MAX },
        { config::ble::L2CAP_CHANNELS_MAX },
    > = HostResources::new();

    let stack = trouble_host::new(controller, &mut resources).set_random_address(Address::random([
        device_id[0],
        device_id[1],
        device_id[2],
        0x1E,
        0x83,
        0xE7,
    ]));

    let Host {
        mut peripheral,
        mut runner,
        ..
    } = stack.build();

    let gap = GapConfig::Peripheral(PeripheralConfig {
        name: device_name,
        appearance: &appearance::UNKNOWN,
    });
    let server: Server = match Server::new_with_config(gap) {
        Ok(s) => s,
        Err(e) => {
            log::error!("BLE: failed to build GATT server ({:?})", e);
            return;
        }
    };

    let runner_task = runner.run();

    let peripheral_task = async {
        let mut adv_data = [0u8; 31];
        let len = match AdStructure::encode_slice(
            &[
                AdStructure::Flags(LE_GENERAL_DISCOVERABLE | BR_EDR_NOT_SUPPORTED),
                AdStructure::CompleteLocalName(device_name.as_bytes()),
            ],
            &mut adv_data,
        ) {
            Ok(l) => l,
            Err(_) => return,
        };

        loop {
            log::debug!("BLE: Advertising...");
            let advertiser = match peripheral
                .advertise(
                    &Default::default(),
                    Advertisement::ConnectableScannableUndirected {
                        adv_data: &adv_data[..len],
                        scan_data: &[],
                    },
                )
                .await
            {
                Ok(a) => a,
                Err(_) => continue,
            };

            // Keep the monitor running while nobody is connected
            let acceptor = match select(
                advertiser.accept(),
                wait_for_deadline(runtime.next_deadline()),
            )
            .await
            {
                Either::First(Ok(a)) => a,
                Either::First(Err(_)) => continue,
                Either::Second(()) => {
                    runtime.run_due(now_ticks(), false, &mut DetachedSink).await;
                    continue;
                }
            };

            let conn = match acceptor.with_attribute_server(&*server) {
                Ok(c) => c,
                Err(_) => continue,
            };
            log::info!("BLE: Connected");

            let mut sink = ConnectionSink {
                server: &server,
                conn: &conn,
            };

            loop {
                match select(conn.next(), wait_for_deadline(runtime.next_deadline())).await {
                    Either::First(GattConnectionEvent::Disconnected { reason }) => {
                        log::info!("BLE: Disconnected ({:?})", reason);
                        break;
                    }
                    Either::First(GattConnectionEvent::Gatt { event }) => {
                        let inbound = to_service_event(&server, &event);
                        if matches!(event, GattEvent::Read(_)) {
                            // The reply value must be stored before the read is accepted
                            if let Some(inbound) = inbound {
                                runtime.handle(inbound, now_ticks(), &mut sink).await;
                            }
                            accept(event).await;
                        } else {
                            // Writes (including CCCD state) land in the table first
                            accept(event).await;
                            if let Some(inbound) = inbound {
                                runtime.handle(inbound, now_ticks(), &mut sink).await;
                            }
                        }
                    }
                    Either::First(_) => {}
                    Either::Second(()) => {
                        runtime.run_due(now_ticks(), true, &mut sink).await;
                    }
                }
            }

            runtime.wind_down();
        }
    };

    select(runner_task, peripheral_task).await;
}

/// Accept a GATT request and send the reply
async fn accept<P: PacketPool>(event: GattEvent<'_, '_, P>) {
    match event.accept() {
        Ok(reply) => reply.send().await,
        Err(e) => log::warn!("BLE: error sending response ({:?})", e),
    }
}

/// Map a GATT event onto a service event
///
/// Returns `None` for attributes the service leaves to the attribute table.
fn to_service_event<P: PacketPool>(server: &Server<'_>, event: &GattEvent<'_, '_, P>) -> Option<Event> {
    let control = &server.control;
    let conn = LINK_CONN;

    match event {
        GattEvent::Write(write) => {
            let handle = write.handle();
            let value = Value::from_slice(write.data()).ok()?;

            if handle == control.control_point.handle {
                Some(Event::ControlWrite { conn, value })
            } else if handle == control.led_state.handle {
                Some(Event::LedWrite { conn, value })
            } else if handle == control.long_value.handle {
                Some(Event::LongValueWrite { conn, value })
            } else if Some(handle) == control.indicateable.cccd_handle {
                Some(Event::IndicateableSubscribeChange { conn, value })
            } else if Some(handle) == control.adc_val_1.cccd_handle {
                Some(Event::AdcConfigWrite { conn, value })
            } else if handle == server.external_write.write_val_1.handle {
                Some(Event::ExternalValueWrite { conn, value })
            } else {
                None
            }
        }
        GattEvent::Read(read) => {
            let handle = read.handle();
            if handle == server.external_read.read_val_1.handle {
                Some(Event::ExternalValueReadRequest { conn })
            } else if handle == server.external_write.write_val_1.handle {
                Some(Event::WrittenValueReadRequest { conn })
            } else {
                None
            }
        }
        GattEvent::Other(_) => None,
    }
}
