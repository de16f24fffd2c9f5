//! Inbound characteristic writes
//!
//! Every write a handler sees carries its origin. Values the device pushes
//! into its own characteristics are tagged [`WriteOrigin::Local`] so the
//! handlers that react to remote writes can skip them.

/// Who issued a characteristic write
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOrigin {
    /// Written by the connected reader
    Remote,
    /// Written by the device itself (published values, echoed settings)
    Local,
}

/// A write delivered to a characteristic handler
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InboundWrite<'a> {
    pub origin: WriteOrigin,
    /// Offset of `data` within the characteristic value
    pub offset: usize,
    pub data: &'a [u8],
}

impl<'a> InboundWrite<'a> {
    /// A plain write from the reader at offset 0
    pub fn remote(data: &'a [u8]) -> Self {
        Self {
            origin: WriteOrigin::Remote,
            offset: 0,
            data,
        }
    }

    /// A write issued by the device itself
    pub fn local(data: &'a [u8]) -> Self {
        Self {
            origin: WriteOrigin::Local,
            offset: 0,
            data,
        }
    }

    pub fn with_offset(mut self, offset: usize) -> Self {
        self.offset = offset;
        self
    }

    pub fn is_local(&self) -> bool {
        self.origin == WriteOrigin::Local
    }

    /// The single byte of a one-byte write at offset 0
    pub fn single_byte(&self) -> Option<u8> {
        match (self.offset, self.data) {
            (0, [byte]) => Some(*byte),
            _ => None,
        }
    }

    /// A one- or two-byte little-endian value at offset 0, zero-extended
    pub fn short_le(&self) -> Option<u16> {
        match (self.offset, self.data) {
            (0, [lo]) => Some(*lo as u16),
            (0, [lo, hi]) => Some(u16::from_le_bytes([*lo, *hi])),
            _ => None,
        }
    }
}
