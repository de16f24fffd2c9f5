//! BLE client for draining the sensor peripheral's transfer buffer.

use std::time::Duration;

use anyhow::{anyhow, Result};
use btleplug::api::{Central, Characteristic, Manager as _, Peripheral as _, ScanFilter, WriteType};
use btleplug::platform::{Adapter, Manager, Peripheral};
use uuid::Uuid;

use crate::protocol::{
    decode_log, LogEntry, CONFIRM_CONTINUE, CONFIRM_DONE, CONFIRM_UUID, DATA_TOTAL_UUID,
    DEVICE_LOG_UUID, FW_REVISION_UUID, MEMORY_PERCENT_UUID, SENSOR_DATA_UUID,
};

/// Buffer counters as published by the device
#[derive(Debug, Clone, Copy)]
pub struct Counters {
    pub total_size: u32,
    pub memory_percent: u8,
}

/// Connected sensor peripheral.
pub struct SensorClient {
    peripheral: Peripheral,
    sensor_data: Characteristic,
    confirm: Characteristic,
    data_total: Characteristic,
    memory_percent: Characteristic,
    device_log: Characteristic,
    fw_revision: Characteristic,
}

impl SensorClient {
    /// Scan for a device by name and connect.
    pub async fn connect_by_name(name: &str, scan_timeout: Duration) -> Result<Self> {
        let manager = Manager::new().await?;
        let adapters = manager.adapters().await?;
        let adapter = adapters
            .into_iter()
            .next()
            .ok_or_else(|| anyhow!("No Bluetooth adapters found"))?;

        adapter.start_scan(ScanFilter::default()).await?;
        let peripheral = Self::find_device_by_name(&adapter, name, scan_timeout).await?;
        adapter.stop_scan().await?;

        peripheral.connect().await?;
        peripheral.discover_services().await?;

        let characteristics = peripheral.characteristics();
        let find = |uuid: Uuid, label: &str| {
            characteristics
                .iter()
                .find(|c| c.uuid == uuid)
                .cloned()
                .ok_or_else(|| anyhow!("{} characteristic not found", label))
        };

        Ok(Self {
            sensor_data: find(SENSOR_DATA_UUID, "Sensor data")?,
            confirm: find(CONFIRM_UUID, "Confirm")?,
            data_total: find(DATA_TOTAL_UUID, "Data total")?,
            memory_percent: find(MEMORY_PERCENT_UUID, "Memory percent")?,
            device_log: find(DEVICE_LOG_UUID, "Device log")?,
            fw_revision: find(FW_REVISION_UUID, "Firmware revision")?,
            peripheral,
        })
    }

    /// Find a device by name within the scan timeout.
    async fn find_device_by_name(
        adapter: &Adapter,
        name: &str,
        scan_timeout: Duration,
    ) -> Result<Peripheral> {
        let start = std::time::Instant::now();

        while start.elapsed() < scan_timeout {
            for peripheral in adapter.peripherals().await? {
                if let Some(props) = peripheral.properties().await? {
                    if props.local_name.as_deref() == Some(name) {
                        return Ok(peripheral);
                    }
                }
            }

            tokio::time::sleep(Duration::from_millis(100)).await;
        }

        Err(anyhow!("Device '{}' not found within timeout", name))
    }

    pub async fn firmware_revision(&self) -> Result<String> {
        let raw = self.peripheral.read(&self.fw_revision).await?;
        Ok(String::from_utf8_lossy(&raw).into_owned())
    }

    pub async fn counters(&self) -> Result<Counters> {
        let total = self.peripheral.read(&self.data_total).await?;
        let percent = self.peripheral.read(&self.memory_percent).await?;

        let total: [u8; 4] = total
            .as_slice()
            .try_into()
            .map_err(|_| anyhow!("Data total is {} bytes, expected 4", total.len()))?;
        let memory_percent = *percent
            .first()
            .ok_or_else(|| anyhow!("Memory percent is empty"))?;

        Ok(Counters {
            total_size: u32::from_le_bytes(total),
            memory_percent,
        })
    }

    pub async fn device_log(&self) -> Result<Vec<LogEntry>> {
        let raw = self.peripheral.read(&self.device_log).await?;
        Ok(decode_log(&raw))
    }

    /// Read the currently published chunk.
    pub async fn read_chunk(&self) -> Result<Vec<u8>> {
        Ok(self.peripheral.read(&self.sensor_data).await?)
    }

    /// Acknowledge the current chunk; the next one is readable afterwards.
    pub async fn confirm_continue(&self) -> Result<()> {
        self.write_confirm(CONFIRM_CONTINUE).await
    }

    /// Acknowledge the current chunk and end the session.
    pub async fn confirm_done(&self) -> Result<()> {
        self.write_confirm(CONFIRM_DONE).await
    }

    async fn write_confirm(&self, value: u8) -> Result<()> {
        self.peripheral
            .write(&self.confirm, &[value], WriteType::WithResponse)
            .await?;
        Ok(())
    }

    /// Disconnect from the device.
    pub async fn disconnect(&self) -> Result<()> {
        if self.peripheral.is_connected().await? {
            self.peripheral.disconnect().await?;
        }
        Ok(())
    }
}
