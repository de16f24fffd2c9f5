//! Transfer engine
//!
//! Owns the sensor log and the diagnostic log, exposes a bounded prefix of
//! the sensor log as the current chunk, and runs the confirm handshake that
//! advances or ends a read session.
//!
//! # Confirm Protocol
//!
//! The reader reads the chunk, then writes one byte to the confirm
//! characteristic:
//!
//! | Byte | Meaning  | Effect                                                      |
//! |------|----------|-------------------------------------------------------------|
//! | 0x00 | CONTINUE | drop the published chunk, publish the next one              |
//! | 0x01 | DONE     | drop the published chunk, publish the rest, clear the diagnostic log, end the session |
//!
//! Anything else (other values, other lengths, non-zero offset) is ignored.
//!
//! While a session is in progress, new records still land in the log but the
//! published chunk only moves on confirm. Chunks are cut at `max_chunk`
//! bytes regardless of record boundaries, so a reader must reassemble the
//! byte stream before decoding records.

use core::cell::RefCell;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;

use crate::config::transfer::{MAX_CHUNK, TOTAL_MEMORY};
use crate::peripheral::write::InboundWrite;
use crate::record::types::{CodecError, LogMessage, SensorRecord};
use crate::transfer::data_log::DataLog;
use crate::transfer::metrics::Metrics;
use crate::transfer::publisher::Publisher;

/// Confirm byte values
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Confirm {
    /// Chunk received, send the next one (0x00)
    Continue = 0x00,
    /// Chunk received, end the session (0x01)
    Done = 0x01,
}

impl Confirm {
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0x00 => Some(Self::Continue),
            0x01 => Some(Self::Done),
            _ => None,
        }
    }

    /// Interpret a confirm characteristic write.
    ///
    /// Only a single byte at offset 0 from the reader is a confirm.
    pub fn parse(write: &InboundWrite<'_>) -> Option<Self> {
        if write.is_local() {
            return None;
        }
        write.single_byte().and_then(Self::from_byte)
    }
}

/// Engine sizing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferConfig {
    /// Largest chunk published at once
    max_chunk: usize,
    /// Memory budget for the utilisation percentage
    memory_budget: u64,
}

impl TransferConfig {
    pub const fn new() -> Self {
        Self {
            max_chunk: MAX_CHUNK,
            memory_budget: TOTAL_MEMORY,
        }
    }

    /// Chunk size cap, clamped to what the sensor data characteristic holds
    pub const fn with_max_chunk(mut self, max_chunk: usize) -> Self {
        self.max_chunk = if max_chunk > MAX_CHUNK { MAX_CHUNK } else { max_chunk };
        self
    }

    pub const fn with_memory_budget(mut self, memory_budget: u64) -> Self {
        self.memory_budget = memory_budget;
        self
    }
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// The published slice of the sensor log.
///
/// Always a prefix: `start` is 0 and `end` never exceeds the log length or
/// the chunk limit at the time it was computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TransferWindow {
    pub start: usize,
    pub end: usize,
}

impl TransferWindow {
    /// Window over the first `min(log_len, max_chunk)` bytes
    pub fn prefix(log_len: usize, max_chunk: usize) -> Self {
        Self {
            start: 0,
            end: log_len.min(max_chunk),
        }
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Whether a read session is in progress
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    /// No session; the chunk follows every append
    #[default]
    Idle,
    /// Between the first confirm and DONE; the chunk only moves on confirm
    InTransfer,
}

/// Result of handling a confirm
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmOutcome {
    /// CONTINUE handled
    Advanced { discarded: usize, chunk_len: usize },
    /// DONE handled and termination requested
    Terminated { discarded: usize, chunk_len: usize },
    /// Write rejected, nothing changed
    Ignored,
}

/// Point-in-time view of the engine state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineSnapshot {
    pub log_len: usize,
    pub device_log_len: usize,
    pub window: TransferWindow,
    pub session: SessionState,
    pub metrics: Metrics,
    /// Log size recorded at the last CONTINUE
    pub total_at_last_advance: u32,
}

struct EngineState {
    log: DataLog,
    device_log: DataLog,
    window: TransferWindow,
    session: SessionState,
    total_at_last_advance: u32,
}

impl EngineState {
    const fn new() -> Self {
        Self {
            log: DataLog::new(),
            device_log: DataLog::new(),
            window: TransferWindow { start: 0, end: 0 },
            session: SessionState::Idle,
            total_at_last_advance: 0,
        }
    }
}

/// Sensor log transfer state machine.
///
/// Producer and consumer paths both call in through `&self`; one lock covers
/// the logs, the window and the publishes that follow each change.
pub struct TransferEngine<P> {
    publisher: P,
    config: TransferConfig,
    state: Mutex<CriticalSectionRawMutex, RefCell<EngineState>>,
}

impl<P: Publisher> TransferEngine<P> {
    pub const fn new(publisher: P, config: TransferConfig) -> Self {
        Self {
            publisher,
            config,
            state: Mutex::new(RefCell::new(EngineState::new())),
        }
    }

    pub fn publisher(&self) -> &P {
        &self.publisher
    }

    /// Serialise a new record onto the sensor log.
    ///
    /// Returns the new log length. Outside a session the chunk is
    /// recomputed and republished; during a session only the counters move.
    pub fn on_record_produced(&self, record: &SensorRecord<'_>) -> Result<usize, CodecError> {
        let (len, deferred) = self.state.lock(|cell| -> Result<(usize, bool), CodecError> {
            let mut state = cell.borrow_mut();
            let state = &mut *state;

            let len = state.log.append_record(record)?;
            self.publish_counters(state);

            match state.session {
                SessionState::Idle => {
                    state.window = TransferWindow::prefix(len, self.config.max_chunk);
                    self.publisher.publish_chunk(state.log.prefix(state.window.end));
                    Ok((len, false))
                }
                SessionState::InTransfer => Ok((len, true)),
            }
        })?;

        if deferred {
            log::debug!("Record stored ({} bytes in log), chunk held for ongoing transfer", len);
        } else {
            log::debug!("Record stored ({} bytes in log), chunk republished", len);
        }
        Ok(len)
    }

    /// Append a diagnostic message and republish the whole diagnostic log.
    pub fn on_log_message(&self, timestamp: i64, message: &str) -> Result<usize, CodecError> {
        let entry = LogMessage { timestamp, message };
        self.state.lock(|cell| -> Result<usize, CodecError> {
            let mut state = cell.borrow_mut();
            let len = state.device_log.append_message(&entry)?;
            self.publisher.publish_log_buffer(state.device_log.as_slice());
            Ok(len)
        })
    }

    /// Handle a write to the confirm characteristic.
    pub fn on_confirm_write(&self, write: &InboundWrite<'_>) -> ConfirmOutcome {
        if write.is_local() {
            return ConfirmOutcome::Ignored;
        }

        match Confirm::parse(write) {
            Some(confirm) => self.on_confirm(confirm),
            None => {
                log::warn!("Bad confirm write: offset {} data {:?}", write.offset, write.data);
                ConfirmOutcome::Ignored
            }
        }
    }

    /// Apply a confirm to the log and window.
    pub fn on_confirm(&self, confirm: Confirm) -> ConfirmOutcome {
        let outcome = self.state.lock(|cell| {
            let mut state = cell.borrow_mut();
            let state = &mut *state;

            let discarded = state.window.end;
            match confirm {
                Confirm::Continue => {
                    state.session = SessionState::InTransfer;
                    state.total_at_last_advance =
                        Metrics::derive(state.log.len(), self.config.memory_budget).total_size;

                    let chunk_len = self.advance_window(state);
                    self.publish_counters(state);

                    ConfirmOutcome::Advanced { discarded, chunk_len }
                }
                Confirm::Done => {
                    let chunk_len = self.advance_window(state);

                    state.device_log.clear();
                    self.publisher.publish_log_buffer(state.device_log.as_slice());
                    self.publish_counters(state);

                    self.publisher.request_session_termination();
                    state.session = SessionState::Idle;

                    ConfirmOutcome::Terminated { discarded, chunk_len }
                }
            }
        });

        match outcome {
            ConfirmOutcome::Advanced { discarded, chunk_len } => {
                log::debug!("Chunk confirmed: dropped {} bytes, next chunk {} bytes", discarded, chunk_len);
            }
            ConfirmOutcome::Terminated { discarded, chunk_len } => {
                log::info!(
                    "Transfer done: dropped {} bytes, {} bytes left in chunk, ending session",
                    discarded,
                    chunk_len
                );
            }
            ConfirmOutcome::Ignored => {}
        }
        outcome
    }

    /// Current state, for diagnostics and tests
    pub fn snapshot(&self) -> EngineSnapshot {
        self.state.lock(|cell| {
            let state = cell.borrow();
            EngineSnapshot {
                log_len: state.log.len(),
                device_log_len: state.device_log.len(),
                window: state.window,
                session: state.session,
                metrics: Metrics::derive(state.log.len(), self.config.memory_budget),
                total_at_last_advance: state.total_at_last_advance,
            }
        })
    }

    /// Run `f` over the current sensor log contents
    pub fn with_log<R>(&self, f: impl FnOnce(&[u8]) -> R) -> R {
        self.state.lock(|cell| f(cell.borrow().log.as_slice()))
    }

    /// Drop the published window from the log, then publish the next prefix
    fn advance_window(&self, state: &mut EngineState) -> usize {
        state.log.discard_prefix(state.window.end);
        state.window = TransferWindow::prefix(state.log.len(), self.config.max_chunk);
        self.publisher.publish_chunk(state.log.prefix(state.window.end));
        state.window.end
    }

    fn publish_counters(&self, state: &EngineState) {
        self.publisher
            .publish_counters(Metrics::derive(state.log.len(), self.config.memory_budget));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::types::RECORD_HEADER_LEN;
    use crate::transfer::publisher::mock::{Published, RecordingPublisher};
    use std::vec::Vec;

    fn engine(max_chunk: usize) -> TransferEngine<RecordingPublisher> {
        TransferEngine::new(
            RecordingPublisher::new(),
            TransferConfig::new().with_max_chunk(max_chunk),
        )
    }

    fn record(payload: &[u8]) -> SensorRecord<'_> {
        SensorRecord {
            timestamp: 1_000,
            duration_us: 40,
            sample_rate: 2500,
            payload,
        }
    }

    /// Append records until the log holds exactly `len` bytes (`len` >= 16)
    fn fill(engine: &TransferEngine<RecordingPublisher>, len: usize) {
        let mut remaining = len;
        while remaining > 0 {
            let body = if remaining > 2 * RECORD_HEADER_LEN + 100 {
                100
            } else {
                remaining - RECORD_HEADER_LEN
            };
            let payload = std::vec![0x5A; body];
            engine.on_record_produced(&record(&payload)).unwrap();
            remaining -= RECORD_HEADER_LEN + body;
        }
        assert_eq!(engine.snapshot().log_len, len);
    }

    #[test]
    fn test_confirm_parse() {
        assert_eq!(Confirm::parse(&InboundWrite::remote(&[0x00])), Some(Confirm::Continue));
        assert_eq!(Confirm::parse(&InboundWrite::remote(&[0x01])), Some(Confirm::Done));
        assert_eq!(Confirm::parse(&InboundWrite::remote(&[0x02])), None);
        assert_eq!(Confirm::parse(&InboundWrite::remote(&[0x00, 0x00])), None);
        assert_eq!(Confirm::parse(&InboundWrite::remote(&[])), None);
        assert_eq!(Confirm::parse(&InboundWrite::remote(&[0x00]).with_offset(1)), None);
        assert_eq!(Confirm::parse(&InboundWrite::local(&[0x00])), None);
    }

    #[test]
    fn test_initial_state() {
        let engine = engine(420);
        let snapshot = engine.snapshot();

        assert_eq!(snapshot.log_len, 0);
        assert_eq!(snapshot.window, TransferWindow::default());
        assert_eq!(snapshot.session, SessionState::Idle);
        assert!(engine.publisher().events().is_empty());
    }

    #[test]
    fn test_append_while_idle_publishes_chunk() {
        let engine = engine(420);
        let payload = [0x11; 14];

        let len = engine.on_record_produced(&record(&payload)).unwrap();

        assert_eq!(len, 30);
        assert_eq!(engine.snapshot().window.end, 30);
        let chunk = engine.publisher().last_chunk().expect("Should publish chunk");
        assert_eq!(chunk.len(), 30);
        assert_eq!(&chunk[RECORD_HEADER_LEN..], &payload);
    }

    #[test]
    fn test_append_publishes_counters_before_chunk() {
        let engine = engine(420);
        engine.on_record_produced(&record(&[1, 2])).unwrap();

        let events = engine.publisher().events();
        assert_eq!(events.len(), 2);
        assert!(matches!(events[0], Published::Counters(m) if m.total_size == 18));
        assert!(matches!(events[1], Published::Chunk(ref c) if c.len() == 18));
    }

    #[test]
    fn test_append_chunk_capped() {
        let engine = engine(420);
        fill(&engine, 1000);

        assert_eq!(engine.snapshot().window.end, 420);
        assert_eq!(engine.publisher().last_chunk().unwrap().len(), 420);
    }

    #[test]
    fn test_max_chunk_clamped_to_characteristic() {
        let engine = engine(MAX_CHUNK + 100);
        fill(&engine, MAX_CHUNK + 200);

        assert_eq!(engine.snapshot().window.end, MAX_CHUNK);
        assert_eq!(engine.publisher().last_chunk().unwrap().len(), MAX_CHUNK);

        engine.on_confirm(Confirm::Continue);
        assert_eq!(engine.snapshot().log_len, 200);
        assert_eq!(engine.snapshot().window.end, 200);
    }

    #[test]
    fn test_small_max_chunk_kept() {
        let engine = engine(97);
        fill(&engine, 300);

        assert_eq!(engine.snapshot().window.end, 97);
    }

    #[test]
    fn test_append_during_transfer_holds_chunk() {
        let engine = engine(420);
        fill(&engine, 600);
        engine.on_confirm(Confirm::Continue);
        let window = engine.snapshot().window;
        engine.publisher().clear();

        engine.on_record_produced(&record(&[9; 20])).unwrap();

        let snapshot = engine.snapshot();
        assert_eq!(snapshot.window, window);
        assert_eq!(snapshot.log_len, 180 + 36);
        let events = engine.publisher().events();
        assert_eq!(events.len(), 1);
        assert!(matches!(events[0], Published::Counters(m) if m.total_size == 216));
    }

    #[test]
    fn test_continue_discards_window() {
        let engine = engine(420);
        fill(&engine, 1000);
        let before = engine.with_log(|log| log.to_vec());

        let outcome = engine.on_confirm(Confirm::Continue);

        assert_eq!(outcome, ConfirmOutcome::Advanced { discarded: 420, chunk_len: 420 });
        let after = engine.with_log(|log| log.to_vec());
        assert_eq!(after.as_slice(), &before[420..]);
        let snapshot = engine.snapshot();
        assert_eq!(snapshot.session, SessionState::InTransfer);
        assert_eq!(snapshot.total_at_last_advance, 1000);
        assert_eq!(engine.publisher().last_chunk().unwrap().as_slice(), &before[420..840]);
        assert_eq!(engine.publisher().last_counters().unwrap().total_size, 580);
    }

    #[test]
    fn test_continue_drains_small_log() {
        let engine = engine(420);
        fill(&engine, 300);

        let outcome = engine.on_confirm(Confirm::Continue);

        assert_eq!(outcome, ConfirmOutcome::Advanced { discarded: 300, chunk_len: 0 });
        assert_eq!(engine.snapshot().log_len, 0);
        assert_eq!(engine.publisher().last_chunk(), Some(Vec::new()));
    }

    #[test]
    fn test_continue_on_empty_log() {
        let engine = engine(420);

        let outcome = engine.on_confirm(Confirm::Continue);

        assert_eq!(outcome, ConfirmOutcome::Advanced { discarded: 0, chunk_len: 0 });
        assert_eq!(engine.snapshot().session, SessionState::InTransfer);
    }

    #[test]
    fn test_done_terminates_once() {
        let engine = engine(420);
        fill(&engine, 50);
        engine.on_log_message(7, "hello").unwrap();

        let outcome = engine.on_confirm(Confirm::Done);

        assert_eq!(outcome, ConfirmOutcome::Terminated { discarded: 50, chunk_len: 0 });
        let snapshot = engine.snapshot();
        assert_eq!(snapshot.log_len, 0);
        assert_eq!(snapshot.device_log_len, 0);
        assert_eq!(snapshot.session, SessionState::Idle);
        assert_eq!(engine.publisher().termination_count(), 1);
        assert!(engine
            .publisher()
            .events()
            .contains(&Published::LogBuffer(Vec::new())));
    }

    #[test]
    fn test_done_publishes_records_appended_mid_transfer() {
        let engine = engine(420);
        fill(&engine, 100);
        engine.on_confirm(Confirm::Continue);
        // Window drained to zero; new data arrives during the session
        engine.on_record_produced(&record(&[3; 4])).unwrap();
        assert_eq!(engine.snapshot().window.end, 0);

        let outcome = engine.on_confirm(Confirm::Done);

        assert_eq!(outcome, ConfirmOutcome::Terminated { discarded: 0, chunk_len: 20 });
        let snapshot = engine.snapshot();
        assert_eq!(snapshot.log_len, 20);
        assert_eq!(snapshot.window.end, 20);
        assert_eq!(snapshot.session, SessionState::Idle);
        assert_eq!(engine.publisher().last_chunk().unwrap().len(), 20);
    }

    #[test]
    fn test_idle_after_done_follows_appends() {
        let engine = engine(420);
        engine.on_confirm(Confirm::Continue);
        engine.on_confirm(Confirm::Done);

        engine.on_record_produced(&record(&[1])).unwrap();

        assert_eq!(engine.snapshot().window.end, 17);
        assert_eq!(engine.publisher().last_chunk().unwrap().len(), 17);
    }

    #[test]
    fn test_invalid_confirm_ignored() {
        let engine = engine(420);
        fill(&engine, 100);
        let before = engine.snapshot();
        engine.publisher().clear();

        for data in [&[0x02u8][..], &[][..], &[0x00, 0x01][..]] {
            let outcome = engine.on_confirm_write(&InboundWrite::remote(data));
            assert_eq!(outcome, ConfirmOutcome::Ignored);
        }
        let outcome = engine.on_confirm_write(&InboundWrite::remote(&[0x00]).with_offset(3));
        assert_eq!(outcome, ConfirmOutcome::Ignored);

        assert_eq!(engine.snapshot(), before);
        assert!(engine.publisher().events().is_empty());
    }

    #[test]
    fn test_local_confirm_write_ignored() {
        let engine = engine(420);
        fill(&engine, 100);

        let outcome = engine.on_confirm_write(&InboundWrite::local(&[0x01]));

        assert_eq!(outcome, ConfirmOutcome::Ignored);
        assert_eq!(engine.snapshot().log_len, 100);
        assert_eq!(engine.publisher().termination_count(), 0);
    }

    #[test]
    fn test_log_message_publishes_whole_buffer() {
        let engine = engine(420);

        let first = engine.on_log_message(1, "a").unwrap();
        let second = engine.on_log_message(2, "bc").unwrap();

        assert_eq!(first, 11);
        assert_eq!(second, 23);
        let last = engine.publisher().events().pop().unwrap();
        match last {
            Published::LogBuffer(buf) => assert_eq!(buf.len(), 23),
            other => panic!("Expected LogBuffer, got {:?}", other),
        }
        // Sensor log untouched
        assert_eq!(engine.snapshot().log_len, 0);
    }

    #[test]
    fn test_payload_too_large_leaves_log_unchanged() {
        let engine = engine(420);
        let payload = std::vec![0u8; 70_000];

        let result = engine.on_record_produced(&record(&payload));

        assert_eq!(result, Err(CodecError::PayloadTooLarge { len: 70_000 }));
        assert_eq!(engine.snapshot().log_len, 0);
        assert!(engine.publisher().events().is_empty());
    }

    #[test]
    fn test_chunk_may_split_record() {
        let engine = engine(20);
        engine.on_record_produced(&record(&[0xAB; 10])).unwrap();

        // 26-byte record, 20-byte chunk
        assert_eq!(engine.snapshot().window.end, 20);
        engine.on_confirm(Confirm::Continue);
        assert_eq!(engine.publisher().last_chunk().unwrap(), std::vec![0xAB; 6]);
    }
}
