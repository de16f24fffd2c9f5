//! Bluetooth Low Energy module
//!
//! GATT layout of the sensor peripheral and the glue that moves engine
//! publications into characteristic values.

pub mod server;
pub mod service;

pub use server::Server;
pub use service::{BatteryService, DeviceService, MeasurementService, TransferService, TxPowerService};
