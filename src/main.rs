#![no_std]
#![no_main]

extern crate alloc;

// Required for ESP-IDF bootloader compatibility
// Use explicit parameters to ensure correct efuse block revision values
esp_bootloader_esp_idf::esp_app_desc!(
    env!("CARGO_PKG_VERSION"),  // version
    env!("CARGO_PKG_NAME"),     // project_name
    "00:00:00",                 // build_time
    "2025-01-01",               // build_date
    "0.0.0",                    // idf_ver (not using IDF)
    0x10000,                    // mmu_page_size (64KB)
    0,                          // min_efuse_blk_rev_full (accept all)
    u16::MAX                    // max_efuse_blk_rev_full (accept all)
);

use embassy_executor::Spawner;
use esp_backtrace as _;
use esp_hal::analog::adc::{Adc, AdcConfig as HalAdcConfig};
use esp_hal::gpio::{Level, Output, OutputConfig};
use esp_hal::timer::timg::TimerGroup;
use static_cell::StaticCell;

use adc_notify_firmware::adc::{hal_attenuation, AdcConfig, EspAdcFrontEnd, GpAdcSampler};
use adc_notify_firmware::config;
use adc_notify_firmware::debug;
use adc_notify_firmware::dispatcher::ServiceConfig;
use adc_notify_firmware::tasks::{ble_task, Runtime};

/// Static executor for embassy
static EXECUTOR: StaticCell<esp_rtos::embassy::Executor> = StaticCell::new();

/// Static cell for esp-radio controller (needed for 'static lifetime)
static RADIO_CONTROLLER: StaticCell<esp_radio::Controller<'static>> = StaticCell::new();

/// Type alias for the BLE controller
type BleController = trouble_host::prelude::ExternalController<
    esp_radio::ble::controller::BleConnector<'static>,
    10,
>;

#[esp_hal::main]
fn main() -> ! {
    // Initialise heap allocator for BLE support (64KB - BLE requires significant heap)
    esp_alloc::heap_allocator!(size: 64 * 1024);

    debug::init(config::logging::LEVEL);

    let peripherals = esp_hal::init(esp_hal::Config::default());

    // LED starts off until the client writes the LED characteristic
    let led = Output::new(peripherals.GPIO48, Level::Low, OutputConfig::default());

    // Initialise the RTOS scheduler with timer - MUST be done before any async operations
    let timg0 = TimerGroup::new(peripherals.TIMG0);
    esp_rtos::start(timg0.timer0);

    // One-shot ADC1 on the analog input pin
    let adc_config = AdcConfig::default();
    let mut hal_adc_config = HalAdcConfig::new();
    let adc_pin = hal_adc_config.enable_pin(peripherals.GPIO6, hal_attenuation(adc_config.attenuation));
    let adc = Adc::new(peripherals.ADC1, hal_adc_config);
    let sampler = GpAdcSampler::with_config(EspAdcFrontEnd::new(adc, adc_pin), adc_config);

    let mut runtime = Runtime::new(sampler, led, &ServiceConfig::default());
    if config::service::MONITOR_ENABLED {
        if let Err(e) = runtime.start_monitor() {
            log::error!("Monitor: failed to start ({:?})", e);
        }
    }

    // Read unique device ID from eFuse MAC address (last 3 bytes)
    let mac = esp_hal::efuse::Efuse::read_base_mac_address();
    let device_id: [u8; 3] = [mac[3], mac[4], mac[5]];

    // Initialise esp-radio for BLE support (must be after esp_rtos::start)
    let radio_controller = RADIO_CONTROLLER.init(
        esp_radio::init().expect("Failed to initialize esp-radio")
    );

    // Create BLE connector (ownership is passed to ExternalController)
    let ble_connector = esp_radio::ble::controller::BleConnector::new(
        radio_controller,
        peripherals.BT,
        esp_radio::ble::Config::default(),
    ).expect("Failed to initialize BLE connector");

    // Wrap in ExternalController for trouble-host compatibility
    let controller: BleController = trouble_host::prelude::ExternalController::new(ble_connector);

    // Create and run the embassy executor
    let executor = EXECUTOR.init(esp_rtos::embassy::Executor::new());
    executor.run(|spawner| {
        spawner.must_spawn(async_main(spawner, controller, device_id, runtime));
    })
}

#[embassy_executor::task]
async fn async_main(
    spawner: Spawner,
    ble_controller: BleController,
    device_id: [u8; 3],
    runtime: Runtime,
) {
    spawner.must_spawn(ble_host_task(ble_controller, device_id, runtime));
}

/// Task that runs the BLE host and the custom service
///
/// Owns the service runtime, so GATT handlers and timer callbacks never
/// interleave.
#[embassy_executor::task]
async fn ble_host_task(controller: BleController, device_id: [u8; 3], runtime: Runtime) {
    ble_task(controller, device_id, runtime).await;
}
