//! Sensor log transfer
//!
//! The byte log, the chunk window over it and the confirm handshake that
//! drains it, plus the counters derived from its size.

pub mod data_log;
pub mod engine;
pub mod metrics;
pub mod publisher;

pub use data_log::DataLog;
pub use engine::{
    Confirm, ConfirmOutcome, EngineSnapshot, SessionState, TransferConfig, TransferEngine,
    TransferWindow,
};
pub use metrics::Metrics;
pub use publisher::Publisher;
