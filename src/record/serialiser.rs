//! Record serialiser
//!
//! Appends serialised entries to the tail of a log buffer.

use alloc::vec::Vec;

use crate::record::types::{CodecError, LogMessage, SensorRecord, MAX_BODY_LEN};

/// Serialise a sensor record onto the end of `out`.
///
/// Returns the number of bytes appended. Payloads that do not fit the u16
/// length field are rejected before anything is written, so `out` never
/// gains a partial record.
pub fn serialise_record(record: &SensorRecord<'_>, out: &mut Vec<u8>) -> Result<usize, CodecError> {
    let len = record.payload.len();
    if len > MAX_BODY_LEN {
        return Err(CodecError::PayloadTooLarge { len });
    }

    out.reserve(record.encoded_len());
    out.extend_from_slice(&record.timestamp.to_le_bytes());
    out.extend_from_slice(&record.duration_us.to_le_bytes());
    out.extend_from_slice(&record.sample_rate.to_le_bytes());
    out.extend_from_slice(&(len as u16).to_le_bytes());
    out.extend_from_slice(record.payload);

    Ok(record.encoded_len())
}

/// Serialise a diagnostic message onto the end of `out`.
pub fn serialise_log_message(message: &LogMessage<'_>, out: &mut Vec<u8>) -> Result<usize, CodecError> {
    let len = message.message.len();
    if len > MAX_BODY_LEN {
        return Err(CodecError::MessageTooLong { len });
    }

    out.reserve(message.encoded_len());
    out.extend_from_slice(&message.timestamp.to_le_bytes());
    out.extend_from_slice(&(len as u16).to_le_bytes());
    out.extend_from_slice(message.message.as_bytes());

    Ok(message.encoded_len())
}
