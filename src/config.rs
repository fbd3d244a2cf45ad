//! Hardware and service configuration constants for the ESP32-S3 ADC peripheral

/// LED characteristic values (the LED itself is on GPIO48)
pub mod led {
    /// LED state value written by the client to switch the LED on
    pub const ON: u8 = 1;
    /// LED state value written by the client to switch the LED off
    pub const OFF: u8 = 0;
}

/// Analog front end configuration
pub mod adc {
    /// GPIO used as the single-ended analog input
    pub const INPUT_PIN: u8 = 6;

    /// Sample time multiplier
    pub const SAMPLE_TIME_MULT: u8 = 2;

    /// Oversampling setting (0 = no oversampling, 10-bit result)
    pub const OVERSAMPLING: u8 = 0;

    /// Reference voltage before attenuation scaling
    pub const REFERENCE_MV: u32 = 900;

    /// Resolution without oversampling
    pub const BASE_RESOLUTION_BITS: u32 = 10;

    /// Oversampling adds at most this many bits of resolution
    pub const MAX_EXTRA_RESOLUTION_BITS: u8 = 6;

    /// Upper bound on completion polls before a conversion is declared stuck
    pub const MAX_CONVERSION_POLLS: u32 = 1_000;
}

/// Timer configuration
///
/// All delays are in ticks of [`timing::TICK_MS`] milliseconds.
pub mod timing {
    /// Length of one timer tick in milliseconds
    pub const TICK_MS: u64 = 10;

    /// Delay between an enabling control write and the first sample batch
    pub const CONTROL_ENABLE_DELAY_TICKS: u32 = 100;

    /// Re-arm interval of the sample notification loop while connected
    pub const NOTIFY_INTERVAL_TICKS: u32 = 10;

    /// Period of the diagnostic single-sample monitor
    pub const MONITOR_INTERVAL_TICKS: u32 = 200;

    /// Number of software timers that can be pending at once
    pub const MAX_PENDING_TIMERS: usize = 4;
}

/// Connection limits
pub mod connections {
    /// Maximum simultaneous peers, and size of every per-connection array
    pub const MAX_CONNECTIONS: usize = 3;
}

/// Custom service constants
pub mod service {
    /// Samples collected per notification
    pub const SAMPLE_BATCH_LEN: usize = 100;

    /// Declared length of the ADC value characteristic
    pub const ADC_VAL_1_CHAR_LEN: usize = 200;

    /// Declared length of the long value characteristic (longest inbound write)
    pub const LONG_VALUE_CHAR_LEN: usize = 50;

    /// Declared length of the indicateable characteristic
    pub const INDICATEABLE_CHAR_LEN: usize = 2;

    /// Declared length of the external ("non-database") values
    pub const EXTERNAL_VAL_CHAR_LEN: usize = 2;

    /// Control point value that stops sampling
    pub const ADC_VAL1_DISABLE: u8 = 0;

    /// Start the diagnostic monitor at boot
    pub const MONITOR_ENABLED: bool = false;

    // Every sample is packed as a little-endian u16.
    const _: () = assert!(SAMPLE_BATCH_LEN * core::mem::size_of::<u16>() == ADC_VAL_1_CHAR_LEN);
}

/// BLE host configuration
pub mod ble {
    /// Advertised name prefix, followed by the last three MAC bytes in hex
    pub const DEVICE_NAME_PREFIX: &str = "ADC-Notify-";

    /// Links the host accepts at once
    pub const CONNECTIONS_MAX: usize = 1;

    /// Number of L2CAP channels
    pub const L2CAP_CHANNELS_MAX: usize = 3;
}

/// Log output
pub mod logging {
    pub const LEVEL: log::LevelFilter = log::LevelFilter::Info;
}
