//! Append-only byte log of serialised entries
//!
//! Holds whole serialised records back to back. Only the front is ever
//! removed, and only by the engine. The log has no size limit: sustained
//! production without a reader grows it until the heap runs out.
//!
//! Discarding the front only moves a read offset. The buffer is compacted
//! once the dead space outgrows the live bytes, which keeps the copying
//! proportional to the bytes discarded.

use alloc::vec::Vec;

use crate::record::serialiser::{serialise_log_message, serialise_record};
use crate::record::types::{CodecError, LogMessage, SensorRecord};

/// Growable byte buffer with prefix discard
#[derive(Debug, Default)]
pub struct DataLog {
    bytes: Vec<u8>,
    /// Start of the live bytes within `bytes`
    head: usize,
}

impl DataLog {
    pub const fn new() -> Self {
        Self {
            bytes: Vec::new(),
            head: 0,
        }
    }

    /// Serialise a sensor record at the tail and return the new length.
    ///
    /// A rejected record leaves the log untouched.
    pub fn append_record(&mut self, record: &SensorRecord<'_>) -> Result<usize, CodecError> {
        serialise_record(record, &mut self.bytes)?;
        Ok(self.len())
    }

    /// Serialise a diagnostic message at the tail and return the new length.
    pub fn append_message(&mut self, message: &LogMessage<'_>) -> Result<usize, CodecError> {
        serialise_log_message(message, &mut self.bytes)?;
        Ok(self.len())
    }

    /// Remove the first `n` bytes.
    ///
    /// `n` is the end of a window previously published from this log. The
    /// cut is not checked against record boundaries.
    pub fn discard_prefix(&mut self, n: usize) {
        self.head += n.min(self.len());

        if self.head == self.bytes.len() {
            self.clear();
        } else if self.head > self.bytes.len() / 2 {
            self.bytes.drain(..self.head);
            self.head = 0;
        }
    }

    pub fn clear(&mut self) {
        self.bytes.clear();
        self.head = 0;
    }

    /// The first `n` bytes, clamped to the log length
    pub fn prefix(&self, n: usize) -> &[u8] {
        let live = self.as_slice();
        &live[..n.min(live.len())]
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.bytes[self.head..]
    }

    pub fn len(&self) -> usize {
        self.bytes.len() - self.head
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
