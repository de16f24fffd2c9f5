//! Counters derived from the sensor log length

/// Published view of the sensor log size
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Metrics {
    /// Bytes currently held in the log
    pub total_size: u32,
    /// Share of the memory budget in use, halved, saturating at 255
    pub memory_percent: u8,
}

impl Metrics {
    /// Derive the counters for a log of `log_len` bytes.
    ///
    /// `memory_percent = floor(log_len / memory_budget * 100 / 2)`. A zero
    /// budget reports full utilisation for any non-empty log.
    pub fn derive(log_len: usize, memory_budget: u64) -> Self {
        let len = log_len as u64;
        let percent = match memory_budget {
            0 if len == 0 => 0,
            0 => u8::MAX as u64,
            budget => len.saturating_mul(50) / budget,
        };

        Self {
            total_size: u32::try_from(len).unwrap_or(u32::MAX),
            memory_percent: percent.min(u8::MAX as u64) as u8,
        }
    }
}
