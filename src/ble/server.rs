//! GATT server and value plumbing
//!
//! Maps characteristic handles to settings and writes engine publications
//! into the attribute table. Values written here are device-originated, so
//! they never pass through the write handlers.

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use trouble_host::prelude::*;

use crate::ble::service::{
    BatteryService, DeviceService, MeasurementService, TransferService, TxPowerService,
};
use crate::peripheral::settings::{ConfigField, ConfigValue, PeripheralConfig};
use crate::peripheral::signals::PendingValues;

/// Every writable setting, in attribute table order
const SETTINGS: [ConfigField; 8] = [
    ConfigField::TransmitPower,
    ConfigField::AutoDisconnect,
    ConfigField::ResponseTimeout,
    ConfigField::SampleRate,
    ConfigField::DataClearBit,
    ConfigField::AdvIntervalGlobal,
    ConfigField::AdvDuration,
    ConfigField::AdvIntervalLocal,
];

/// BLE GATT Server for the sensor peripheral
#[gatt_server(mutex_type = CriticalSectionRawMutex, attribute_table_size = 64)]
pub struct Server {
    pub battery: BatteryService,
    pub tx_power: TxPowerService,
    pub device: DeviceService,
    pub transfer: TransferService,
    pub measurement: MeasurementService,
}

impl Server<'_> {
    /// Which setting, if any, a characteristic handle belongs to
    pub fn setting_for_handle(&self, handle: u16) -> Option<ConfigField> {
        SETTINGS
            .into_iter()
            .find(|field| self.setting_handle(*field) == handle)
    }

    fn setting_handle(&self, field: ConfigField) -> u16 {
        match field {
            ConfigField::TransmitPower => self.tx_power.tx_power.handle,
            ConfigField::AutoDisconnect => self.device.auto_disconnect.handle,
            ConfigField::ResponseTimeout => self.device.response_timeout.handle,
            ConfigField::SampleRate => self.measurement.sample_rate.handle,
            ConfigField::DataClearBit => self.measurement.data_clear_bit.handle,
            ConfigField::AdvIntervalGlobal => self.measurement.adv_interval_global.handle,
            ConfigField::AdvDuration => self.measurement.adv_duration.handle,
            ConfigField::AdvIntervalLocal => self.measurement.adv_interval_local.handle,
        }
    }

    /// Write a setting's value into its characteristic
    pub fn store_setting(&self, field: ConfigField, value: ConfigValue) -> Result<(), Error> {
        match (field, value) {
            (ConfigField::TransmitPower, ConfigValue::Byte(v)) => self.set(&self.tx_power.tx_power, &v),
            (ConfigField::AutoDisconnect, ConfigValue::Byte(v)) => {
                self.set(&self.device.auto_disconnect, &v)
            }
            (ConfigField::ResponseTimeout, ConfigValue::Byte(v)) => {
                self.set(&self.device.response_timeout, &v)
            }
            (ConfigField::DataClearBit, ConfigValue::Byte(v)) => {
                self.set(&self.measurement.data_clear_bit, &v)
            }
            (ConfigField::SampleRate, ConfigValue::Short(v)) => {
                self.set(&self.measurement.sample_rate, &v)
            }
            (ConfigField::AdvIntervalGlobal, ConfigValue::Short(v)) => {
                self.set(&self.measurement.adv_interval_global, &v)
            }
            (ConfigField::AdvDuration, ConfigValue::Short(v)) => {
                self.set(&self.measurement.adv_duration, &v)
            }
            (ConfigField::AdvIntervalLocal, ConfigValue::Short(v)) => {
                self.set(&self.measurement.adv_interval_local, &v)
            }
            _ => Ok(()),
        }
    }

    /// Restore a characteristic to the setting's current value
    pub fn echo_setting(&self, field: ConfigField, config: &PeripheralConfig) -> Result<(), Error> {
        self.store_setting(field, config.get(field))
    }

    /// Copy engine publications into the attribute table
    pub fn store_pending(&self, pending: &PendingValues) -> Result<(), Error> {
        if let Some(chunk) = &pending.chunk {
            self.set(&self.measurement.sensor_data, chunk)?;
        }
        if let Some(metrics) = &pending.counters {
            self.set(&self.device.memory_percent, &metrics.memory_percent)?;
            self.set(&self.device.data_total, &metrics.total_size)?;
        }
        if let Some(log) = &pending.device_log {
            self.set(&self.device.device_log, log)?;
        }
        Ok(())
    }

    /// Notify a subscribed reader of engine publications.
    ///
    /// Values must already be stored with [`Server::store_pending`].
    pub async fn notify_pending(
        &self,
        conn: &GattConnection<'_, '_, DefaultPacketPool>,
        pending: &PendingValues,
    ) {
        if let Some(chunk) = &pending.chunk {
            if self.measurement.sensor_data.notify(conn, chunk).await.is_err() {
                log::warn!("Sensor data notify failed");
            }
        }
        if let Some(metrics) = &pending.counters {
            let _ = self.device.memory_percent.notify(conn, &metrics.memory_percent).await;
            let _ = self.device.data_total.notify(conn, &metrics.total_size).await;
        }
    }

    /// Store and notify a new battery level
    pub async fn publish_battery(&self, conn: Option<&GattConnection<'_, '_, DefaultPacketPool>>, level: u8) {
        let _ = self.set(&self.battery.level, &level);
        if let Some(conn) = conn {
            let _ = self.battery.level.notify(conn, &level).await;
        }
    }
}
