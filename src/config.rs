//! Device configuration constants for the ESP32-S3 sensor peripheral

/// Transfer buffer sizing
pub mod transfer {
    /// Largest slice of the sensor log published in one read/notify
    pub const MAX_CHUNK: usize = 420;

    /// Memory budget the utilisation percentage is computed against (1 MiB)
    pub const TOTAL_MEMORY: u64 = 0x10_0000;

    /// Bytes of the diagnostic log exposed through the device log characteristic
    pub const DEVICE_LOG_CAPACITY: usize = 256;
}

/// Identity reported over GAP/GATT
pub mod device {
    pub const NAME: &str = "TinyGo Sensor";
    /// Firmware revision string as stored in its characteristic
    pub const FW_REVISION: [u8; 5] = *b"0.1.0";
}

/// Power-on values of the writable settings
pub mod defaults {
    /// Sensor output data rate in Hz
    pub const SAMPLE_RATE_HZ: u16 = 2500;
    /// Transmit power in dBm
    pub const TX_POWER_DBM: u8 = 0;
    /// Seconds between advertising sessions
    pub const ADV_INTERVAL_GLOBAL_S: u16 = 5;
    /// Length of one advertising session in ms
    pub const ADV_DURATION_MS: u16 = 999;
    /// Advertising interval of the BLE core, in multiples of 0.625 ms
    pub const ADV_INTERVAL_LOCAL: u16 = 1000;
    /// Time to wait for a connect response after advertising, in ms
    pub const RESPONSE_TIMEOUT_MS: u8 = 10;
    pub const DATA_CLEAR_BIT: u8 = 1;
    pub const AUTO_DISCONNECT_BIT: u8 = 0;
    pub const BATTERY_PERCENT: u8 = 100;
}

/// Sensor simulator timing
pub mod sampler {
    /// Samples per burst, inclusive range
    pub const MIN_SAMPLES: u32 = 3;
    pub const MAX_SAMPLES: u32 = 10;

    /// Pause between bursts, inclusive range in seconds
    pub const MIN_PAUSE_S: u64 = 10;
    pub const MAX_PAUSE_S: u64 = 20;

    /// Simulated ADC resolution
    pub const SAMPLE_MASK: u16 = 0x03FF;
}
