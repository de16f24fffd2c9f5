//! Embassy tasks module
//!
//! Contains the async tasks for the firmware and the shared state they meet
//! at: the transfer engine, its publisher and the device settings.

use core::cell::Cell;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;

use crate::peripheral::settings::PeripheralConfig;
use crate::peripheral::signals::SignalPublisher;
use crate::transfer::engine::{TransferConfig, TransferEngine};

pub mod battery;
pub mod ble;
pub mod sampler;

pub use battery::{battery_task, BATTERY_LEVEL};
pub use ble::ble_task;
pub use sampler::sampler_task;

/// Engine publications waiting for the BLE task
pub static PUBLISHER: SignalPublisher = SignalPublisher::new();

/// The sensor log and its transfer state machine
pub static ENGINE: TransferEngine<&'static SignalPublisher> =
    TransferEngine::new(&PUBLISHER, TransferConfig::new());

/// Device settings written by the reader
static SETTINGS: Mutex<CriticalSectionRawMutex, Cell<PeripheralConfig>> =
    Mutex::new(Cell::new(PeripheralConfig::new()));

/// Current device settings
pub fn settings() -> PeripheralConfig {
    SETTINGS.lock(|cell| cell.get())
}

/// Modify the device settings in place
pub fn update_settings<R>(f: impl FnOnce(&mut PeripheralConfig) -> R) -> R {
    SETTINGS.lock(|cell| {
        let mut settings = cell.get();
        let result = f(&mut settings);
        cell.set(settings);
        result
    })
}

/// Microseconds since boot, the timestamp base for records and log entries
pub fn now_us() -> i64 {
    embassy_time::Instant::now().as_micros() as i64
}
