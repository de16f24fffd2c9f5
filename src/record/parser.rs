//! Record parser
//!
//! Decodes serialised entries back out of a log buffer. The device itself
//! never needs to read its own log, so this is used by tests and by tools
//! that reassemble the chunk stream.

use crate::record::types::{
    CodecError, LogMessage, SensorRecord, LOG_HEADER_LEN, RECORD_HEADER_LEN,
};

/// Parse one sensor record from the start of `data`.
///
/// Returns the record and the number of bytes it occupied.
pub fn parse_record(data: &[u8]) -> Result<(SensorRecord<'_>, usize), CodecError> {
    check_len(data, RECORD_HEADER_LEN)?;

    let timestamp = i64::from_le_bytes(read_array(&data[0..8]));
    let duration_us = u32::from_le_bytes(read_array(&data[8..12]));
    let sample_rate = u16::from_le_bytes(read_array(&data[12..14]));
    let payload_len = u16::from_le_bytes(read_array(&data[14..16])) as usize;

    let total = RECORD_HEADER_LEN + payload_len;
    check_len(data, total)?;

    let record = SensorRecord {
        timestamp,
        duration_us,
        sample_rate,
        payload: &data[RECORD_HEADER_LEN..total],
    };
    Ok((record, total))
}

/// Parse one diagnostic message from the start of `data`.
pub fn parse_log_message(data: &[u8]) -> Result<(LogMessage<'_>, usize), CodecError> {
    check_len(data, LOG_HEADER_LEN)?;

    let timestamp = i64::from_le_bytes(read_array(&data[0..8]));
    let message_len = u16::from_le_bytes(read_array(&data[8..10])) as usize;

    let total = LOG_HEADER_LEN + message_len;
    check_len(data, total)?;

    let message = core::str::from_utf8(&data[LOG_HEADER_LEN..total])
        .map_err(|_| CodecError::InvalidUtf8)?;

    Ok((LogMessage { timestamp, message }, total))
}

fn check_len(data: &[u8], needed: usize) -> Result<(), CodecError> {
    if data.len() < needed {
        return Err(CodecError::Truncated {
            needed,
            available: data.len(),
        });
    }
    Ok(())
}

/// Copy a slice whose length was already checked into a fixed array
fn read_array<const N: usize>(bytes: &[u8]) -> [u8; N] {
    let mut out = [0u8; N];
    out.copy_from_slice(bytes);
    out
}

/// Iterator over the whole records at the front of a byte slice.
///
/// Stops at the first entry that is cut short; [`RecordIter::remainder`]
/// then holds the unconsumed tail.
pub struct RecordIter<'a> {
    data: &'a [u8],
}

impl<'a> RecordIter<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data }
    }

    /// Bytes not yet consumed by the iterator
    pub fn remainder(&self) -> &'a [u8] {
        self.data
    }
}

impl<'a> Iterator for RecordIter<'a> {
    type Item = SensorRecord<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let data: &'a [u8] = self.data;
        match parse_record(data) {
            Ok((record, used)) => {
                self.data = &data[used..];
                Some(record)
            }
            Err(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::serialiser::{serialise_log_message, serialise_record};
    use alloc::vec::Vec;

    fn sample_record(payload: &[u8]) -> SensorRecord<'_> {
        SensorRecord {
            timestamp: 1_700_000_000_000_000,
            duration_us: 3_600,
            sample_rate: 2500,
            payload,
        }
    }

    #[test]
    fn test_parse_serialised_record() {
        let payload = [0x01, 0x02, 0x03, 0x04, 0x05, 0x06];
        let record = sample_record(&payload);

        let mut buf = Vec::new();
        serialise_record(&record, &mut buf).unwrap();

        let (parsed, used) = parse_record(&buf).expect("Should parse");
        assert_eq!(parsed, record);
        assert_eq!(used, buf.len());
    }

    #[test]
    fn test_parse_truncated_header() {
        let result = parse_record(&[0u8; 10]);
        assert_eq!(
            result,
            Err(CodecError::Truncated {
                needed: RECORD_HEADER_LEN,
                available: 10
            })
        );
    }

    #[test]
    fn test_parse_truncated_payload() {
        let payload = [0xEE; 8];
        let mut buf = Vec::new();
        serialise_record(&sample_record(&payload), &mut buf).unwrap();
        buf.truncate(buf.len() - 1);

        let result = parse_record(&buf);
        assert_eq!(
            result,
            Err(CodecError::Truncated {
                needed: RECORD_HEADER_LEN + 8,
                available: RECORD_HEADER_LEN + 7
            })
        );
    }

    #[test]
    fn test_parse_log_message() {
        let mut buf = Vec::new();
        let message = LogMessage {
            timestamp: -5,
            message: "New sensor data received",
        };
        serialise_log_message(&message, &mut buf).unwrap();

        let (parsed, used) = parse_log_message(&buf).expect("Should parse");
        assert_eq!(parsed, message);
        assert_eq!(used, buf.len());
    }

    #[test]
    fn test_parse_log_message_invalid_utf8() {
        let mut buf = Vec::new();
        buf.extend_from_slice(&0i64.to_le_bytes());
        buf.extend_from_slice(&2u16.to_le_bytes());
        buf.extend_from_slice(&[0xC3, 0x28]);

        assert_eq!(parse_log_message(&buf), Err(CodecError::InvalidUtf8));
    }

    #[test]
    fn test_record_iter_stops_at_partial_tail() {
        let mut buf = Vec::new();
        serialise_record(&sample_record(&[1, 2]), &mut buf).unwrap();
        serialise_record(&sample_record(&[3, 4, 5, 6]), &mut buf).unwrap();
        let whole = buf.len();
        serialise_record(&sample_record(&[7, 8, 9]), &mut buf).unwrap();
        buf.truncate(whole + 5);

        let mut iter = RecordIter::new(&buf);
        assert_eq!(iter.next().map(|r| r.payload), Some(&[1u8, 2][..]));
        assert_eq!(iter.next().map(|r| r.payload), Some(&[3u8, 4, 5, 6][..]));
        assert!(iter.next().is_none());
        assert_eq!(iter.remainder().len(), 5);
    }
}
