//! Embassy tasks module
//!
//! Contains the async tasks of the firmware.

pub mod ble;

pub use ble::{ble_task, Runtime};
