//! Sensor record and log message types
//!
//! # Wire Format
//!
//! Both entries are little-endian with a fixed header followed by a
//! variable-length body. Entries are concatenated back to back in their log
//! buffers with no delimiter:
//!
//! ```text
//! SensorRecord: [timestamp: i64][duration: u32][sample_rate: u16][payload_len: u16][payload]
//! LogMessage:   [timestamp: i64][message_len: u16][message (UTF-8)]
//! ```
//!
//! - `timestamp`: microseconds since the producer's epoch
//! - `duration`: microseconds spanned by the burst
//! - `sample_rate`: reading rate in Hz when the burst was captured

/// Size of the fixed sensor record header in bytes
pub const RECORD_HEADER_LEN: usize = 16;

/// Size of the fixed log message header in bytes
pub const LOG_HEADER_LEN: usize = 10;

/// Largest body either entry can describe with its u16 length field
pub const MAX_BODY_LEN: usize = u16::MAX as usize;

/// One sampled burst, borrowing its raw sensor bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SensorRecord<'a> {
    pub timestamp: i64,
    pub duration_us: u32,
    pub sample_rate: u16,
    pub payload: &'a [u8],
}

impl SensorRecord<'_> {
    /// Number of bytes this record occupies once serialised
    pub fn encoded_len(&self) -> usize {
        RECORD_HEADER_LEN + self.payload.len()
    }
}

/// Diagnostic entry for the device log
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogMessage<'a> {
    pub timestamp: i64,
    pub message: &'a str,
}

impl LogMessage<'_> {
    /// Number of bytes this message occupies once serialised
    pub fn encoded_len(&self) -> usize {
        LOG_HEADER_LEN + self.message.len()
    }
}

/// Errors raised while encoding or decoding log entries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodecError {
    /// Sensor payload longer than the u16 length field can describe
    PayloadTooLarge { len: usize },
    /// Log message longer than the u16 length field can describe
    MessageTooLong { len: usize },
    /// Input ends before the entry does
    Truncated { needed: usize, available: usize },
    /// Log message body is not valid UTF-8
    InvalidUtf8,
}
