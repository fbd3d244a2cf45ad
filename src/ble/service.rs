//! Custom GATT services
//!
//! Three vendor services built on one 128-bit base UUID:
//! - Control service (`a3c875xx`): sampling control, ADC batch, LED, long
//!   value, indicateable counter and button state
//! - External write service (`a3c876xx`): per-connection written value
//! - External read service (`a3c877xx`): per-connection read counter
//!
//! The two external values are not served from the attribute table. Reads
//! are answered by the dispatcher, which stores the reply into the
//! characteristic before the read is accepted.

use trouble_host::prelude::*;

use crate::config::service::{
    ADC_VAL_1_CHAR_LEN, EXTERNAL_VAL_CHAR_LEN, INDICATEABLE_CHAR_LEN, LONG_VALUE_CHAR_LEN,
};

/// Sampling control and status
#[gatt_service(uuid = "a3c87500-8ed3-4bdf-8a39-a01bebede295")]
pub struct ControlService {
    /// Nonzero starts sampling after the enable delay, zero stops it
    #[characteristic(uuid = "a3c87501-8ed3-4bdf-8a39-a01bebede295", write)]
    pub control_point: u8,

    /// One batch of millivolt samples, u16 little-endian each
    #[characteristic(uuid = "a3c87502-8ed3-4bdf-8a39-a01bebede295", read, notify, value = [0u8; 200])]
    pub adc_val_1: [u8; ADC_VAL_1_CHAR_LEN],

    #[characteristic(uuid = "a3c87503-8ed3-4bdf-8a39-a01bebede295", write)]
    pub led_state: u8,

    #[characteristic(uuid = "a3c87504-8ed3-4bdf-8a39-a01bebede295", read, write, notify, value = [0u8; 50])]
    pub long_value: [u8; LONG_VALUE_CHAR_LEN],

    /// Subscribing for indications sends the counter, big-endian
    #[characteristic(uuid = "a3c87505-8ed3-4bdf-8a39-a01bebede295", read, indicate)]
    pub indicateable: [u8; INDICATEABLE_CHAR_LEN],

    #[characteristic(uuid = "a3c87506-8ed3-4bdf-8a39-a01bebede295", read, notify)]
    pub button_state: u8,
}

/// Per-connection value written by the client
#[gatt_service(uuid = "a3c87600-8ed3-4bdf-8a39-a01bebede295")]
pub struct ExternalWriteService {
    #[characteristic(uuid = "a3c87601-8ed3-4bdf-8a39-a01bebede295", read, write)]
    pub write_val_1: [u8; EXTERNAL_VAL_CHAR_LEN],
}

/// Per-connection counter of reads
#[gatt_service(uuid = "a3c87700-8ed3-4bdf-8a39-a01bebede295")]
pub struct ExternalReadService {
    #[characteristic(uuid = "a3c87701-8ed3-4bdf-8a39-a01bebede295", read)]
    pub read_val_1: [u8; EXTERNAL_VAL_CHAR_LEN],
}
