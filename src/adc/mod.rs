//! Analog sampling primitive
//!
//! Provides the single-conversion sampler used by the notification loop and
//! the diagnostic monitor.

#[cfg(feature = "embedded")]
pub mod driver;
pub mod sampler;
pub mod traits;

#[cfg(feature = "embedded")]
pub use driver::{hal_attenuation, EspAdcFrontEnd};
pub use sampler::{raw_to_millivolts, GpAdcSampler};
pub use traits::{AdcConfig, AdcError, AdcFrontEnd, Attenuation, InputMode};
