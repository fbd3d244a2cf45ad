//! Single-conversion sampling primitive
//!
//! Wraps an [`AdcFrontEnd`] and performs one complete, bounded conversion per
//! call, plus the raw code to millivolt scale step.

use crate::adc::traits::{AdcConfig, AdcError, AdcFrontEnd, Attenuation};
use crate::config::adc::{
    BASE_RESOLUTION_BITS, MAX_CONVERSION_POLLS, MAX_EXTRA_RESOLUTION_BITS, REFERENCE_MV,
};

/// Convert a raw code to millivolts for the given front end settings
///
/// `(raw * 900 * (attenuation + 1)) >> (10 + min(6, oversampling))`
///
/// Codes wider than the configured resolution saturate at `u16::MAX`.
pub fn raw_to_millivolts(raw: u16, attenuation: Attenuation, oversampling: u8) -> u16 {
    let resolution = BASE_RESOLUTION_BITS + u32::from(oversampling.min(MAX_EXTRA_RESOLUTION_BITS));
    let ref_mv = REFERENCE_MV * (u32::from(attenuation.select()) + 1);

    let mv = (u32::from(raw) * ref_mv) >> resolution;
    u16::try_from(mv).unwrap_or(u16::MAX)
}

/// Sampling primitive over an analog front end
///
/// Not reentrant: it owns the front end and takes `&mut self` per conversion.
pub struct GpAdcSampler<A: AdcFrontEnd> {
    front_end: A,
    config: AdcConfig,
}

impl<A: AdcFrontEnd> GpAdcSampler<A> {
    /// Create a sampler using the default front end configuration
    pub fn new(front_end: A) -> Self {
        Self::with_config(front_end, AdcConfig::default())
    }

    pub fn with_config(front_end: A, config: AdcConfig) -> Self {
        Self { front_end, config }
    }

    pub fn config(&self) -> &AdcConfig {
        &self.config
    }

    pub fn front_end(&self) -> &A {
        &self.front_end
    }

    pub fn front_end_mut(&mut self) -> &mut A {
        &mut self.front_end
    }

    /// Take one corrected raw sample
    ///
    /// The front end is powered down again whether or not the conversion completed.
    pub fn take_sample(&mut self) -> Result<u16, AdcError> {
        self.front_end.configure(&self.config);
        self.front_end.calibrate_offset(self.config.input_mode);
        self.front_end.start();

        let result = self.wait_for_conversion();

        self.front_end.disable();
        result
    }

    /// Take one sample and scale it to millivolts
    pub fn take_millivolts(&mut self) -> Result<u16, AdcError> {
        let raw = self.take_sample()?;
        Ok(self.to_millivolts(raw))
    }

    /// Scale a raw code using this sampler's attenuation and oversampling
    pub fn to_millivolts(&self, raw: u16) -> u16 {
        raw_to_millivolts(raw, self.config.attenuation, self.config.oversampling)
    }

    fn wait_for_conversion(&mut self) -> Result<u16, AdcError> {
        for _ in 0..MAX_CONVERSION_POLLS {
            if let Some(raw) = self.front_end.poll_sample() {
                return Ok(self.front_end.correct(raw));
            }
        }
        Err(AdcError::ConversionTimeout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adc::traits::mock::{MockAdcFrontEnd, Step};
    use crate::adc::traits::InputMode;

    #[test]
    fn test_zero_is_zero_millivolts() {
        assert_eq!(raw_to_millivolts(0, Attenuation::X4, 0), 0);
        assert_eq!(raw_to_millivolts(0, Attenuation::X1, 6), 0);
    }

    #[test]
    fn test_full_scale_with_4x_attenuation() {
        // 1023 * 3600 >> 10
        assert_eq!(raw_to_millivolts(1023, Attenuation::X4, 0), 3596);
        assert_eq!(raw_to_millivolts(512, Attenuation::X4, 0), 1800);
    }

    #[test]
    fn test_attenuation_scales_reference() {
        assert_eq!(raw_to_millivolts(1024, Attenuation::X1, 0), 900);
        assert_eq!(raw_to_millivolts(1024, Attenuation::X2, 0), 1800);
        assert_eq!(raw_to_millivolts(1024, Attenuation::X3, 0), 2700);
    }

    #[test]
    fn test_oversampling_resolution_is_capped() {
        // 16-bit result at the cap, further oversampling adds nothing
        assert_eq!(raw_to_millivolts(0x8000, Attenuation::X1, 6), 450);
        assert_eq!(raw_to_millivolts(0x8000, Attenuation::X1, 9), 450);
        assert_eq!(raw_to_millivolts(2048, Attenuation::X1, 1), 900);
    }

    #[test]
    fn test_out_of_range_code_saturates() {
        assert_eq!(raw_to_millivolts(u16::MAX, Attenuation::X4, 0), u16::MAX);
    }

    #[test]
    fn test_millivolts_monotonic() {
        let mut last = 0;
        for raw in (0..=u16::MAX).step_by(7) {
            let mv = raw_to_millivolts(raw, Attenuation::X4, 0);
            assert!(mv >= last, "raw {} gave {} after {}", raw, mv, last);
            last = mv;
        }
    }

    #[test]
    fn test_take_sample_step_order() {
        let mut sampler = GpAdcSampler::new(MockAdcFrontEnd::new(300));
        sampler.front_end_mut().set_busy_polls(2);

        assert_eq!(sampler.take_sample(), Ok(300));
        assert_eq!(
            sampler.front_end().steps(),
            &[
                Step::Configure,
                Step::Calibrate,
                Step::Start,
                Step::Poll,
                Step::Poll,
                Step::Poll,
                Step::Disable,
            ]
        );
        assert!(!sampler.front_end().is_powered());
    }

    #[test]
    fn test_default_front_end_config() {
        let mut sampler = GpAdcSampler::new(MockAdcFrontEnd::new(0));
        sampler.take_sample().unwrap();

        let config = sampler.front_end().last_config().unwrap();
        assert_eq!(config.input_mode, InputMode::SingleEnded);
        assert_eq!(config.attenuation, Attenuation::X4);
        assert_eq!(config.sample_time_mult, 2);
        assert!(!config.continuous);
        assert!(!config.chopping);
    }

    #[test]
    fn test_correction_applied() {
        let mut sampler = GpAdcSampler::new(MockAdcFrontEnd::new(100));
        sampler.front_end_mut().set_offset(4);
        assert_eq!(sampler.take_sample(), Ok(104));
    }

    #[test]
    fn test_stuck_conversion_times_out_and_powers_down() {
        let mut sampler = GpAdcSampler::new(MockAdcFrontEnd::new(0));
        sampler.front_end_mut().set_stuck(true);

        assert_eq!(sampler.take_sample(), Err(AdcError::ConversionTimeout));
        assert!(!sampler.front_end().is_powered());
        assert_eq!(sampler.front_end().conversions(), 0);
    }

    #[test]
    fn test_take_millivolts() {
        let mut sampler = GpAdcSampler::new(MockAdcFrontEnd::new(512));
        assert_eq!(sampler.take_millivolts(), Ok(1800));
    }
}
