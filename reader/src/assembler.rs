//! Chunk stream reassembly.
//!
//! The peripheral cuts its log at a fixed chunk size, so a record can start
//! in one chunk and finish in the next. The assembler keeps the unfinished
//! tail until the rest arrives.

use crate::protocol::{decode_record, Record};

#[derive(Debug, Default)]
pub struct StreamAssembler {
    pending: Vec<u8>,
    received: usize,
}

impl StreamAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one chunk and return every record it completes.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<Record> {
        self.pending.extend_from_slice(chunk);
        self.received += chunk.len();

        let mut records = Vec::new();
        let mut consumed = 0;
        while let Some((record, used)) = decode_record(&self.pending[consumed..]) {
            records.push(record);
            consumed += used;
        }
        self.pending.drain(..consumed);
        records
    }

    /// Bytes held back waiting for the rest of a record
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Total bytes pushed so far
    pub fn received(&self) -> usize {
        self.received
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::encode_record;

    fn record(seed: u8, len: usize) -> Record {
        Record {
            timestamp: seed as i64 * 1_000_000,
            duration_us: 4_000,
            sample_rate: 2500,
            payload: vec![seed; len],
        }
    }

    #[test]
    fn test_whole_records_in_one_chunk() {
        let mut stream = encode_record(&record(1, 6));
        stream.extend(encode_record(&record(2, 20)));
        let mut assembler = StreamAssembler::new();

        let records = assembler.push(&stream);

        assert_eq!(records, vec![record(1, 6), record(2, 20)]);
        assert_eq!(assembler.pending_len(), 0);
    }

    #[test]
    fn test_record_split_across_chunks() {
        let stream = encode_record(&record(3, 40));
        let mut assembler = StreamAssembler::new();

        assert!(assembler.push(&stream[..10]).is_empty());
        assert!(assembler.push(&stream[10..30]).is_empty());
        assert_eq!(assembler.pending_len(), 30);

        let records = assembler.push(&stream[30..]);

        assert_eq!(records, vec![record(3, 40)]);
        assert_eq!(assembler.pending_len(), 0);
        assert_eq!(assembler.received(), stream.len());
    }

    #[test]
    fn test_fixed_size_chunking_recovers_every_record() {
        let expected: Vec<Record> = (0..30u8).map(|i| record(i, (i as usize * 5) % 33)).collect();
        let stream: Vec<u8> = expected.iter().flat_map(encode_record).collect();
        let mut assembler = StreamAssembler::new();

        let mut decoded = Vec::new();
        for chunk in stream.chunks(47) {
            decoded.extend(assembler.push(chunk));
        }

        assert_eq!(decoded, expected);
        assert_eq!(assembler.pending_len(), 0);
    }

    #[test]
    fn test_empty_chunk_is_noop() {
        let mut assembler = StreamAssembler::new();
        assert!(assembler.push(&[]).is_empty());
        assert_eq!(assembler.received(), 0);
    }
}
