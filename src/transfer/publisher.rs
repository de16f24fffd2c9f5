//! Publisher trait for abstraction and testability
//!
//! The engine pushes every reader-visible value through this trait. The BLE
//! layer implements it by updating GATT characteristics; tests record the
//! calls.

use crate::transfer::metrics::Metrics;

/// Sink for values the engine exposes to the reader.
///
/// Every method is called while the engine lock is held, so "window
/// advanced" and "chunk published" are observed together. Implementations
/// must return promptly and must not call back into the engine.
pub trait Publisher {
    /// New value of the sensor data characteristic
    fn publish_chunk(&self, chunk: &[u8]);

    /// New size counters
    fn publish_counters(&self, metrics: Metrics);

    /// Full contents of the diagnostic log
    fn publish_log_buffer(&self, log: &[u8]);

    /// End the current reader session (disconnect and power-cycle)
    fn request_session_termination(&self);
}

impl<T: Publisher + ?Sized> Publisher for &T {
    fn publish_chunk(&self, chunk: &[u8]) {
        (**self).publish_chunk(chunk)
    }

    fn publish_counters(&self, metrics: Metrics) {
        (**self).publish_counters(metrics)
    }

    fn publish_log_buffer(&self, log: &[u8]) {
        (**self).publish_log_buffer(log)
    }

    fn request_session_termination(&self) {
        (**self).request_session_termination()
    }
}

#[cfg(test)]
pub mod mock {
    //! Recording publisher for testing

    use super::*;
    use std::sync::Mutex;
    use std::vec::Vec;

    /// One call made on the publisher
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum Published {
        Chunk(Vec<u8>),
        Counters(Metrics),
        LogBuffer(Vec<u8>),
        Terminate,
    }

    /// Publisher that keeps every call for later inspection
    #[derive(Default)]
    pub struct RecordingPublisher {
        events: Mutex<Vec<Published>>,
    }

    impl RecordingPublisher {
        pub fn new() -> Self {
            Self::default()
        }

        /// All calls so far, oldest first
        pub fn events(&self) -> Vec<Published> {
            self.events.lock().unwrap().clone()
        }

        /// Drop recorded calls
        pub fn clear(&self) {
            self.events.lock().unwrap().clear();
        }

        /// Most recently published chunk
        pub fn last_chunk(&self) -> Option<Vec<u8>> {
            self.events().into_iter().rev().find_map(|e| match e {
                Published::Chunk(c) => Some(c),
                _ => None,
            })
        }

        /// Most recently published counters
        pub fn last_counters(&self) -> Option<Metrics> {
            self.events().into_iter().rev().find_map(|e| match e {
                Published::Counters(m) => Some(m),
                _ => None,
            })
        }

        pub fn termination_count(&self) -> usize {
            self.events()
                .iter()
                .filter(|e| matches!(e, Published::Terminate))
                .count()
        }

        fn push(&self, event: Published) {
            self.events.lock().unwrap().push(event);
        }
    }

    impl Publisher for RecordingPublisher {
        fn publish_chunk(&self, chunk: &[u8]) {
            self.push(Published::Chunk(chunk.to_vec()));
        }

        fn publish_counters(&self, metrics: Metrics) {
            self.push(Published::Counters(metrics));
        }

        fn publish_log_buffer(&self, log: &[u8]) {
            self.push(Published::LogBuffer(log.to_vec()));
        }

        fn request_session_termination(&self) {
            self.push(Published::Terminate);
        }
    }
}
