#![cfg_attr(not(test), no_std)]

extern crate alloc;

pub mod config;
pub mod peripheral;
pub mod record;
pub mod transfer;

// These modules depend on the radio stack only available with embedded feature
#[cfg(feature = "embedded")]
pub mod ble;
#[cfg(feature = "embedded")]
pub mod tasks;
