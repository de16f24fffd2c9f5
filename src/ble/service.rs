//! GATT service definitions
//!
//! Five services make up the peripheral's attribute table:
//! - Battery (0x180F): simulated battery level
//! - Tx Power (0x1804): radio transmit power setting
//! - Device (0x1111): firmware revision, diagnostic log, memory counters,
//!   session settings
//! - Transfer (0x1999): the confirm characteristic driving the read session
//! - Measurement (0x185A): sensor data chunk, sample rate, advertising
//!   settings

use trouble_host::prelude::*;

use crate::config::{defaults, device};
use crate::peripheral::signals::{ChunkValue, DeviceLogValue};

#[gatt_service(uuid = service::BATTERY)]
pub struct BatteryService {
    #[characteristic(uuid = "c0dec0fe-0bad-41c7-992f-a5d063dbfeee", read, notify, value = defaults::BATTERY_PERCENT)]
    pub level: u8,
}

#[gatt_service(uuid = service::TX_POWER)]
pub struct TxPowerService {
    #[characteristic(uuid = "b1eec10a-0007-4d3c-a1ca-ae3e7e098a2b", read, write, value = defaults::TX_POWER_DBM)]
    pub tx_power: u8,
}

#[gatt_service(uuid = "00001111-0000-1000-8000-00805f9b34fb")]
pub struct DeviceService {
    #[characteristic(uuid = "cabacafe-f00d-4b1b-9b1b-1b1b1b1b1b1b", read, value = device::FW_REVISION)]
    pub fw_revision: [u8; 5],

    /// Serialised diagnostic log entries
    #[characteristic(uuid = "beefc0de-f00d-4d3c-a1ca-ae3e7e098a2b", read)]
    pub device_log: DeviceLogValue,

    #[characteristic(uuid = "deadc0de-beef-4b1b-9b1b-1b1b1b1b1b1b", read, notify, value = 0)]
    pub memory_percent: u8,

    /// Bytes currently held in the sensor log
    #[characteristic(uuid = "0badf00d-cafe-4b1b-9b1b-2c931b1b1b1b", read, notify, value = 0)]
    pub data_total: u32,

    #[characteristic(uuid = "fadebabe-0bad-41c7-992f-a5d063dbfeee", read, write, value = defaults::AUTO_DISCONNECT_BIT)]
    pub auto_disconnect: u8,

    #[characteristic(uuid = "f007face-babe-47f5-b542-bbfd9b436872", read, write, value = defaults::RESPONSE_TIMEOUT_MS)]
    pub response_timeout: u8,
}

#[gatt_service(uuid = "00001999-0000-1000-8000-00805f9b34fb")]
pub struct TransferService {
    /// 0x00 = next chunk, 0x01 = done
    #[characteristic(uuid = "aaaaaaaa-face-4f89-b07d-f9d9b20a76c8", write, value = 0)]
    pub confirm: u8,
}

#[gatt_service(uuid = "0000185a-0000-1000-8000-00805f9b34fb")]
pub struct MeasurementService {
    #[characteristic(uuid = "4242c0de-f007-4d3c-a1ca-ae3e7e098a2b", read, write, value = defaults::SAMPLE_RATE_HZ)]
    pub sample_rate: u16,

    /// Current chunk of the sensor log
    #[characteristic(uuid = "c0debabe-face-4f89-b07d-f9d9b20a76c8", read, notify)]
    pub sensor_data: ChunkValue,

    #[characteristic(uuid = "cabba6ee-c0de-4414-a6f6-46a397e18422", read, write, value = defaults::DATA_CLEAR_BIT)]
    pub data_clear_bit: u8,

    #[characteristic(uuid = "eeafbeef-cafe-4d3c-a1ca-ae3e7e098a2b", read, write, value = defaults::ADV_INTERVAL_GLOBAL_S)]
    pub adv_interval_global: u16,

    #[characteristic(uuid = "babebeef-cafe-4d3c-a1ca-ae3e7e098a2b", read, write, value = defaults::ADV_DURATION_MS)]
    pub adv_duration: u16,

    #[characteristic(uuid = "c0ffee00-babe-4d3c-a1ca-ae3e7e098a2b", read, write, value = defaults::ADV_INTERVAL_LOCAL)]
    pub adv_interval_local: u16,
}
