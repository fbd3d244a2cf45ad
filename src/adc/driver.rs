//! ESP32-S3 ADC1 front end
//!
//! Implements the AdcFrontEnd trait on top of the esp-hal one-shot ADC driver.
//! The SAR ADC returns 12-bit codes; `correct` narrows them to the 10-bit
//! scale the millivolt conversion expects.

use crate::adc::traits::{AdcConfig, AdcFrontEnd, Attenuation, InputMode};
use esp_hal::analog::adc::{self, Adc, AdcChannel, AdcPin};
use esp_hal::peripherals::ADC1;
use esp_hal::Blocking;

/// Bits dropped to go from the 12-bit SAR code to a 10-bit code
const SAR_EXTRA_BITS: u32 = 2;

/// Attenuator setting to enable the pin with
pub fn hal_attenuation(attenuation: Attenuation) -> adc::Attenuation {
    match attenuation {
        Attenuation::X1 => adc::Attenuation::_0dB,
        Attenuation::X2 => adc::Attenuation::_2p5dB,
        Attenuation::X3 => adc::Attenuation::_6dB,
        Attenuation::X4 => adc::Attenuation::_11dB,
    }
}

/// One-shot ADC1 front end on a single analog pin
///
/// Attenuation is fixed when the pin is enabled in `main`; `configure` only
/// records the requested settings for logging. Offset calibration comes from
/// the eFuse trim applied when esp-hal brings ADC1 up, so `calibrate_offset`
/// runs no conversion of its own.
pub struct EspAdcFrontEnd<'d, PIN> {
    adc: Adc<'d, ADC1<'d>, Blocking>,
    pin: AdcPin<PIN, ADC1<'d>>,
    powered: bool,
    calibrated: bool,
}

impl<'d, PIN> EspAdcFrontEnd<'d, PIN>
where
    PIN: AdcChannel,
{
    /// Create the front end from an initialised ADC1 and an enabled pin
    pub fn new(adc: Adc<'d, ADC1<'d>, Blocking>, pin: AdcPin<PIN, ADC1<'d>>) -> Self {
        Self {
            adc,
            pin,
            powered: false,
            calibrated: false,
        }
    }
}

impl<'d, PIN> AdcFrontEnd for EspAdcFrontEnd<'d, PIN>
where
    PIN: AdcChannel,
{
    fn configure(&mut self, config: &AdcConfig) {
        if !self.powered {
            log::trace!("ADC: enable GPIO{} ({:?})", config.input, config.attenuation);
        }
        self.powered = true;
    }

    fn calibrate_offset(&mut self, mode: InputMode) {
        // The SAR offset is trimmed from eFuse at driver init; single-ended only.
        if !self.calibrated && mode != InputMode::SingleEnded {
            log::warn!("ADC: {:?} input not supported, sampling single-ended", mode);
        }
        self.calibrated = true;
    }

    fn start(&mut self) {
        // The first read_oneshot call starts the conversion.
    }

    fn poll_sample(&mut self) -> Option<u16> {
        self.adc.read_oneshot(&mut self.pin).ok()
    }

    fn correct(&self, raw: u16) -> u16 {
        raw >> SAR_EXTRA_BITS
    }

    fn disable(&mut self) {
        self.powered = false;
    }
}
