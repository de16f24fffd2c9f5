//! Adapter-side pieces shared with the BLE layer
//!
//! Write tagging, the writable device settings and the signal-backed
//! publisher. All of it is plain data or embassy-sync primitives, so it is
//! exercised on the host; the GATT plumbing that feeds it lives in `ble` and
//! `tasks`.

pub mod settings;
pub mod signals;
pub mod write;

pub use settings::{ConfigField, ConfigValue, PeripheralConfig};
pub use signals::{PendingValues, SignalPublisher};
pub use write::{InboundWrite, WriteOrigin};
