//! Writable device settings
//!
//! The reader can tune sampling and advertising through read/write
//! characteristics. All of those values live in one [`PeripheralConfig`]
//! held by the adapter; the transfer engine never looks at them.

use crate::config::defaults;
use crate::peripheral::write::InboundWrite;

/// A setting exposed as a read/write characteristic
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigField {
    TransmitPower,
    AutoDisconnect,
    ResponseTimeout,
    SampleRate,
    DataClearBit,
    AdvIntervalGlobal,
    AdvDuration,
    AdvIntervalLocal,
}

impl ConfigField {
    /// Whether the characteristic holds a u16 rather than a single byte
    pub fn is_wide(&self) -> bool {
        matches!(
            self,
            ConfigField::SampleRate
                | ConfigField::AdvIntervalGlobal
                | ConfigField::AdvDuration
                | ConfigField::AdvIntervalLocal
        )
    }
}

/// An accepted setting value in its characteristic width
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigValue {
    Byte(u8),
    Short(u16),
}

impl ConfigValue {
    /// Little-endian bytes as stored in the characteristic
    pub fn to_le_bytes(&self) -> heapless::Vec<u8, 2> {
        let mut out = heapless::Vec::new();
        match self {
            ConfigValue::Byte(v) => {
                let _ = out.push(*v);
            }
            ConfigValue::Short(v) => {
                let _ = out.extend_from_slice(&v.to_le_bytes());
            }
        }
        out
    }
}

/// Runtime device settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PeripheralConfig {
    /// Sensor output data rate in Hz
    pub sample_rate_hz: u16,
    /// Transmit power in dBm
    pub tx_power_dbm: u8,
    /// Seconds between advertising sessions
    pub adv_interval_global_s: u16,
    /// Length of one advertising session in ms
    pub adv_duration_ms: u16,
    /// Advertising interval in units of 0.625 ms
    pub adv_interval_local: u16,
    /// Connect response timeout in ms
    pub response_timeout_ms: u8,
    pub data_clear_bit: u8,
    pub auto_disconnect_bit: u8,
}

impl PeripheralConfig {
    pub const fn new() -> Self {
        Self {
            sample_rate_hz: defaults::SAMPLE_RATE_HZ,
            tx_power_dbm: defaults::TX_POWER_DBM,
            adv_interval_global_s: defaults::ADV_INTERVAL_GLOBAL_S,
            adv_duration_ms: defaults::ADV_DURATION_MS,
            adv_interval_local: defaults::ADV_INTERVAL_LOCAL,
            response_timeout_ms: defaults::RESPONSE_TIMEOUT_MS,
            data_clear_bit: defaults::DATA_CLEAR_BIT,
            auto_disconnect_bit: defaults::AUTO_DISCONNECT_BIT,
        }
    }

    /// Current value of a setting
    pub fn get(&self, field: ConfigField) -> ConfigValue {
        match field {
            ConfigField::TransmitPower => ConfigValue::Byte(self.tx_power_dbm),
            ConfigField::AutoDisconnect => ConfigValue::Byte(self.auto_disconnect_bit),
            ConfigField::ResponseTimeout => ConfigValue::Byte(self.response_timeout_ms),
            ConfigField::DataClearBit => ConfigValue::Byte(self.data_clear_bit),
            ConfigField::SampleRate => ConfigValue::Short(self.sample_rate_hz),
            ConfigField::AdvIntervalGlobal => ConfigValue::Short(self.adv_interval_global_s),
            ConfigField::AdvDuration => ConfigValue::Short(self.adv_duration_ms),
            ConfigField::AdvIntervalLocal => ConfigValue::Short(self.adv_interval_local),
        }
    }

    /// Apply a characteristic write to a setting.
    ///
    /// Returns the accepted value so the caller can echo it back into the
    /// characteristic, or `None` if the write was ignored. Writes the device
    /// issued itself are always ignored.
    pub fn apply(&mut self, field: ConfigField, write: &InboundWrite<'_>) -> Option<ConfigValue> {
        if write.is_local() {
            return None;
        }

        let value = if field.is_wide() {
            write.short_le().map(ConfigValue::Short)
        } else {
            write.single_byte().map(ConfigValue::Byte)
        };

        let Some(value) = value else {
            log::warn!("Bad {:?} write: offset {} data {:?}", field, write.offset, write.data);
            return None;
        };

        match (field, value) {
            (ConfigField::TransmitPower, ConfigValue::Byte(v)) => self.tx_power_dbm = v,
            (ConfigField::AutoDisconnect, ConfigValue::Byte(v)) => self.auto_disconnect_bit = v,
            (ConfigField::ResponseTimeout, ConfigValue::Byte(v)) => self.response_timeout_ms = v,
            (ConfigField::DataClearBit, ConfigValue::Byte(v)) => self.data_clear_bit = v,
            (ConfigField::SampleRate, ConfigValue::Short(v)) => self.sample_rate_hz = v,
            (ConfigField::AdvIntervalGlobal, ConfigValue::Short(v)) => self.adv_interval_global_s = v,
            (ConfigField::AdvDuration, ConfigValue::Short(v)) => self.adv_duration_ms = v,
            (ConfigField::AdvIntervalLocal, ConfigValue::Short(v)) => self.adv_interval_local = v,
            _ => return None,
        }

        log::info!("{:?} set to {:?}", field, value);
        Some(value)
    }
}

impl Default for PeripheralConfig {
    fn default() -> Self {
        Self::new()
    }
}
