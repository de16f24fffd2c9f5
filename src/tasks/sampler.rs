//! Simulated sensor producer
//!
//! Captures a short burst of 10-bit readings at the configured sample rate,
//! hands it to the engine as one record, then sleeps.

use embassy_time::{Instant, Timer};
use esp_hal::rng::Rng;
use heapless::Vec;

use crate::config::sampler::{MAX_PAUSE_S, MAX_SAMPLES, MIN_PAUSE_S, MIN_SAMPLES, SAMPLE_MASK};
use crate::record::types::SensorRecord;

/// Two bytes per reading
const MAX_BURST_BYTES: usize = 2 * MAX_SAMPLES as usize;

/// Task that produces one sensor burst every 10-20 seconds
pub async fn sampler_task(mut rng: Rng) {
    loop {
        let start = Instant::now();
        let count = MIN_SAMPLES + rng.random() % (MAX_SAMPLES - MIN_SAMPLES + 1);

        let mut payload: Vec<u8, MAX_BURST_BYTES> = Vec::new();
        for _ in 0..count {
            let rate = super::settings().sample_rate_hz.max(1) as u64;
            Timer::after_micros(1_000_000 / rate).await;

            let reading = (rng.random() as u16) & SAMPLE_MASK;
            let _ = payload.extend_from_slice(&reading.to_le_bytes());
        }

        let duration_us = u32::try_from(start.elapsed().as_micros()).unwrap_or(u32::MAX);
        let record = SensorRecord {
            timestamp: start.as_micros() as i64,
            duration_us,
            sample_rate: super::settings().sample_rate_hz,
            payload: &payload,
        };

        match super::ENGINE.on_record_produced(&record) {
            Ok(total) => log::info!("Burst of {} readings over {} us, {} bytes buffered", count, duration_us, total),
            Err(e) => log::warn!("Burst dropped: {:?}", e),
        }

        let pause = MIN_PAUSE_S + rng.random() as u64 % (MAX_PAUSE_S - MIN_PAUSE_S + 1);
        Timer::after_secs(pause).await;
    }
}
