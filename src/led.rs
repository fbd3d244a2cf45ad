//! LED state characteristic
//!
//! Maps the written LED value directly onto an output pin. No state is kept.

use crate::config::led::{OFF, ON};
use embedded_hal::digital::OutputPin;

/// Decoded LED write
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedCommand {
    On,
    Off,
}

impl LedCommand {
    /// Decode a written value; anything other than on/off is ignored
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            ON => Some(Self::On),
            OFF => Some(Self::Off),
            _ => None,
        }
    }
}

/// Drive the LED for a written value
///
/// Returns the command applied, `None` if the value was ignored.
pub fn apply<P: OutputPin>(pin: &mut P, value: u8) -> Option<LedCommand> {
    let command = LedCommand::from_byte(value)?;
    let result = match command {
        LedCommand::On => pin.set_high(),
        LedCommand::Off => pin.set_low(),
    };
    if result.is_err() {
        log::warn!("LED: failed to drive pin");
    }
    Some(command)
}

#[cfg(test)]
pub mod mock {
    //! Mock output pin for testing

    use core::convert::Infallible;
    use embedded_hal::digital::{ErrorType, OutputPin};

    /// Output pin that remembers its level and counts writes
    #[derive(Default)]
    pub struct MockLed {
        high: bool,
        writes: usize,
    }

    impl MockLed {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn is_high(&self) -> bool {
            self.high
        }

        pub fn writes(&self) -> usize {
            self.writes
        }
    }

    impl ErrorType for MockLed {
        type Error = Infallible;
    }

    impl OutputPin for MockLed {
        fn set_low(&mut self) -> Result<(), Self::Error> {
            self.high = false;
            self.writes += 1;
            Ok(())
        }

        fn set_high(&mut self) -> Result<(), Self::Error> {
            self.high = true;
            self.writes += 1;
            Ok(())
        }
    }
}
