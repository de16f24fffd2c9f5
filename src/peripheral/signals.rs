//! Latest-value hand-off from the engine to the GATT server
//!
//! The engine publishes from whichever task holds its lock; the BLE task
//! owns the attribute server. Each published value replaces the pending one
//! in a [`Signal`], so the BLE task always applies the newest state and a
//! slow connection never backs up the engine.

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;
use heapless::Vec;

use crate::config::transfer::{DEVICE_LOG_CAPACITY, MAX_CHUNK};
use crate::transfer::metrics::Metrics;
use crate::transfer::publisher::Publisher;

/// Sensor data characteristic value
pub type ChunkValue = Vec<u8, MAX_CHUNK>;

/// Device log characteristic value
pub type DeviceLogValue = Vec<u8, DEVICE_LOG_CAPACITY>;

/// Values published since the last [`SignalPublisher::take_pending`]
#[derive(Debug, Default)]
pub struct PendingValues {
    pub chunk: Option<ChunkValue>,
    pub counters: Option<Metrics>,
    pub device_log: Option<DeviceLogValue>,
    pub terminate: bool,
}

/// [`Publisher`] backed by one signal per characteristic
pub struct SignalPublisher {
    chunk: Signal<CriticalSectionRawMutex, ChunkValue>,
    counters: Signal<CriticalSectionRawMutex, Metrics>,
    device_log: Signal<CriticalSectionRawMutex, DeviceLogValue>,
    terminate: Signal<CriticalSectionRawMutex, ()>,
    changed: Signal<CriticalSectionRawMutex, ()>,
}

impl SignalPublisher {
    pub const fn new() -> Self {
        Self {
            chunk: Signal::new(),
            counters: Signal::new(),
            device_log: Signal::new(),
            terminate: Signal::new(),
            changed: Signal::new(),
        }
    }

    /// Wait until something has been published
    pub async fn wait_changed(&self) {
        self.changed.wait().await
    }

    /// Collect everything published so far
    pub fn take_pending(&self) -> PendingValues {
        self.changed.reset();
        PendingValues {
            chunk: self.chunk.try_take(),
            counters: self.counters.try_take(),
            device_log: self.device_log.try_take(),
            terminate: self.terminate.try_take().is_some(),
        }
    }
}

impl Default for SignalPublisher {
    fn default() -> Self {
        Self::new()
    }
}

/// Copy up to the value's capacity; longer input keeps its front
fn bounded<const N: usize>(data: &[u8]) -> Vec<u8, N> {
    let len = data.len().min(N);
    let mut out = Vec::new();
    let _ = out.extend_from_slice(&data[..len]);
    out
}

impl Publisher for SignalPublisher {
    fn publish_chunk(&self, chunk: &[u8]) {
        self.chunk.signal(bounded(chunk));
        self.changed.signal(());
    }

    fn publish_counters(&self, metrics: Metrics) {
        self.counters.signal(metrics);
        self.changed.signal(());
    }

    fn publish_log_buffer(&self, log: &[u8]) {
        self.device_log.signal(bounded(log));
        self.changed.signal(());
    }

    fn request_session_termination(&self) {
        self.terminate.signal(());
        self.changed.signal(());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::types::SensorRecord;
    use crate::transfer::engine::{Confirm, TransferConfig, TransferEngine};

    #[test]
    fn test_latest_value_wins() {
        let publisher = SignalPublisher::new();

        publisher.publish_chunk(&[1, 2, 3]);
        publisher.publish_chunk(&[4, 5]);

        let pending = publisher.take_pending();
        assert_eq!(pending.chunk.unwrap().as_slice(), &[4, 5]);
        assert!(pending.counters.is_none());
        assert!(!pending.terminate);

        // Taken values are gone
        let again = publisher.take_pending();
        assert!(again.chunk.is_none());
        assert!(again.counters.is_none());
        assert!(again.device_log.is_none());
        assert!(!again.terminate);
    }

    #[test]
    fn test_device_log_truncated_to_capacity() {
        let publisher = SignalPublisher::new();
        let log = [0x42u8; DEVICE_LOG_CAPACITY + 10];

        publisher.publish_log_buffer(&log);

        let pending = publisher.take_pending();
        assert_eq!(pending.device_log.unwrap().len(), DEVICE_LOG_CAPACITY);
    }

    #[test]
    fn test_changed_wakes_after_publish() {
        let publisher = SignalPublisher::new();
        publisher.publish_counters(Metrics::derive(10, 100));

        futures::executor::block_on(publisher.wait_changed());
        let pending = publisher.take_pending();
        assert_eq!(pending.counters.unwrap().total_size, 10);
    }

    #[test]
    fn test_engine_through_signals() {
        static PUBLISHER: SignalPublisher = SignalPublisher::new();
        let engine = TransferEngine::new(&PUBLISHER, TransferConfig::new());

        let record = SensorRecord {
            timestamp: 0,
            duration_us: 0,
            sample_rate: 1,
            payload: &[0xAA; 4],
        };
        engine.on_record_produced(&record).unwrap();
        engine.on_confirm(Confirm::Done);

        let pending = PUBLISHER.take_pending();
        assert!(pending.terminate);
        assert_eq!(pending.chunk.unwrap().len(), 0);
        assert_eq!(pending.counters.unwrap().total_size, 0);
        assert_eq!(pending.device_log.unwrap().len(), 0);
    }
}
