//! Log output over the USB serial/JTAG console
//!
//! Core modules only ever use the `log` macros; the backend is esp-println's.

use log::LevelFilter;

/// Initialise log output. Must be called once during startup.
pub fn init(level: LevelFilter) {
    esp_println::logger::init_logger(level);
}
