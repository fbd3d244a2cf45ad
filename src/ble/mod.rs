//! Bluetooth Low Energy module
//!
//! GATT definitions of the custom services. Connection handling lives in
//! the BLE task.

pub mod service;

pub use service::{ControlService, ExternalReadService, ExternalWriteService};
