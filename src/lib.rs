#![cfg_attr(not(test), no_std)]

pub mod adc;
pub mod config;
pub mod dispatcher;
pub mod events;
pub mod led;
pub mod sampling;
pub mod store;
pub mod timer;

// These modules depend on esp-hal/embassy, only available with the embedded feature
#[cfg(feature = "embedded")]
pub mod ble;
#[cfg(feature = "embedded")]
pub mod debug;
#[cfg(feature = "embedded")]
pub mod tasks;
