//! Simulated battery drain

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;
use embassy_time::Timer;
use esp_hal::rng::Rng;

use crate::config::defaults::BATTERY_PERCENT;

/// Latest battery level, picked up by the BLE task
pub static BATTERY_LEVEL: Signal<CriticalSectionRawMutex, u8> = Signal::new();

/// Task that drops the battery level by 1 % every 15-25 seconds
pub async fn battery_task(mut rng: Rng) {
    let mut level = BATTERY_PERCENT;
    loop {
        let delay_ms = 15_000 + (rng.random() % 10_000) as u64;
        Timer::after_millis(delay_ms).await;

        level = level.saturating_sub(1);
        BATTERY_LEVEL.signal(level);
    }
}
