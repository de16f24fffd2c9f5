//! Protocol definitions matching the firmware.

use uuid::Uuid;

/// Confirm byte: chunk consumed, publish the next one
pub const CONFIRM_CONTINUE: u8 = 0x00;
/// Confirm byte: chunk consumed, end the session
pub const CONFIRM_DONE: u8 = 0x01;

/// Sensor data characteristic (chunk reads and notifications)
pub const SENSOR_DATA_UUID: Uuid = Uuid::from_u128(0xc0debabe_face_4f89_b07d_f9d9b20a76c8);
/// Transfer confirm characteristic
pub const CONFIRM_UUID: Uuid = Uuid::from_u128(0xaaaaaaaa_face_4f89_b07d_f9d9b20a76c8);
/// Buffered byte count, u32 LE
pub const DATA_TOTAL_UUID: Uuid = Uuid::from_u128(0x0badf00d_cafe_4b1b_9b1b_2c931b1b1b1b);
/// Buffer fill level
pub const MEMORY_PERCENT_UUID: Uuid = Uuid::from_u128(0xdeadc0de_beef_4b1b_9b1b_1b1b1b1b1b1b);
/// Diagnostic message log
pub const DEVICE_LOG_UUID: Uuid = Uuid::from_u128(0xbeefc0de_f00d_4d3c_a1ca_ae3e7e098a2b);
/// Firmware revision string
pub const FW_REVISION_UUID: Uuid = Uuid::from_u128(0xcabacafe_f00d_4b1b_9b1b_1b1b1b1b1b1b);

/// Fixed part of a sensor record
pub const RECORD_HEADER_LEN: usize = 16;
/// Fixed part of a diagnostic message
pub const LOG_HEADER_LEN: usize = 10;

/// One decoded sensor burst.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub timestamp: i64,
    pub duration_us: u32,
    pub sample_rate: u16,
    pub payload: Vec<u8>,
}

impl Record {
    /// Payload as 16-bit LE readings
    pub fn samples(&self) -> impl Iterator<Item = u16> + '_ {
        self.payload
            .chunks_exact(2)
            .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
    }
}

/// One decoded diagnostic message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    pub timestamp: i64,
    pub message: String,
}

/// Decode a record from the front of `data`.
///
/// Returns `None` when `data` does not yet hold the whole record.
pub fn decode_record(data: &[u8]) -> Option<(Record, usize)> {
    if data.len() < RECORD_HEADER_LEN {
        return None;
    }
    let payload_len = u16::from_le_bytes([data[14], data[15]]) as usize;
    let total = RECORD_HEADER_LEN + payload_len;
    if data.len() < total {
        return None;
    }

    let record = Record {
        timestamp: i64::from_le_bytes(data[0..8].try_into().ok()?),
        duration_us: u32::from_le_bytes(data[8..12].try_into().ok()?),
        sample_rate: u16::from_le_bytes([data[12], data[13]]),
        payload: data[RECORD_HEADER_LEN..total].to_vec(),
    };
    Some((record, total))
}

/// Decode every whole diagnostic message in `data`.
pub fn decode_log(mut data: &[u8]) -> Vec<LogEntry> {
    let mut entries = Vec::new();
    while data.len() >= LOG_HEADER_LEN {
        let len = u16::from_le_bytes([data[8], data[9]]) as usize;
        let total = LOG_HEADER_LEN + len;
        if data.len() < total {
            break;
        }
        let mut stamp = [0u8; 8];
        stamp.copy_from_slice(&data[0..8]);
        entries.push(LogEntry {
            timestamp: i64::from_le_bytes(stamp),
            message: String::from_utf8_lossy(&data[LOG_HEADER_LEN..total]).into_owned(),
        });
        data = &data[total..];
    }
    entries
}

/// Encode a record the way the firmware does
#[cfg(test)]
pub fn encode_record(record: &Record) -> Vec<u8> {
    let mut out = Vec::with_capacity(RECORD_HEADER_LEN + record.payload.len());
    out.extend_from_slice(&record.timestamp.to_le_bytes());
    out.extend_from_slice(&record.duration_us.to_le_bytes());
    out.extend_from_slice(&record.sample_rate.to_le_bytes());
    out.extend_from_slice(&(record.payload.len() as u16).to_le_bytes());
    out.extend_from_slice(&record.payload);
    out
}
