//! Analog front end trait for abstraction and testability
//!
//! This trait defines the register-level steps of one conversion, allowing
//! the actual ADC peripheral to be swapped with a mock for testing.

use crate::config;

/// Errors that can occur during a conversion
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdcError {
    /// The conversion did not complete within the polling bound
    ConversionTimeout,
}

/// Input mode of the analog front end
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    SingleEnded,
    Differential,
}

/// Input attenuator setting
///
/// The discriminant is the register select value used by the millivolt scale.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Attenuation {
    X1 = 0,
    X2 = 1,
    X3 = 2,
    X4 = 3,
}

impl Attenuation {
    /// Register select value
    pub fn select(self) -> u8 {
        self as u8
    }
}

/// Configuration applied before every conversion
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdcConfig {
    pub input_mode: InputMode,
    /// Input channel (GPIO number)
    pub input: u8,
    pub sample_time_mult: u8,
    pub continuous: bool,
    pub interval_mult: u8,
    pub attenuation: Attenuation,
    pub chopping: bool,
    pub oversampling: u8,
}

impl Default for AdcConfig {
    fn default() -> Self {
        Self {
            input_mode: InputMode::SingleEnded,
            input: config::adc::INPUT_PIN,
            sample_time_mult: config::adc::SAMPLE_TIME_MULT,
            continuous: false,
            interval_mult: 0,
            attenuation: Attenuation::X4,
            chopping: false,
            oversampling: config::adc::OVERSAMPLING,
        }
    }
}

/// Abstract analog front end for testability
///
/// The sampler drives these steps strictly in order for every conversion:
/// `configure`, `calibrate_offset`, `start`, `poll_sample` until it yields,
/// `correct`, `disable`.
pub trait AdcFrontEnd {
    /// Power up and apply the configuration
    fn configure(&mut self, config: &AdcConfig);

    /// Run an offset calibration pass for the given input mode
    fn calibrate_offset(&mut self, mode: InputMode);

    /// Trigger one conversion
    fn start(&mut self);

    /// Returns the raw code once the conversion has completed, `None` while busy
    fn poll_sample(&mut self) -> Option<u16>;

    /// Apply the trim correction to a raw code
    fn correct(&self, raw: u16) -> u16;

    /// Power the front end down
    fn disable(&mut self);
}
