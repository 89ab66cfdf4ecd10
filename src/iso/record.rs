// bootiso/src/iso/record.rs

use crate::endian::ByteOrder;

/// Growable byte buffer for building fixed-layout records.
///
/// Fields are appended in order; the current length doubles as the next
/// field's offset, which removes the manual offset bookkeeping the binary
/// layouts otherwise require. Length bytes that describe the finished
/// record are backpatched through [`RecordBuf::set`].
#[derive(Default)]
pub struct RecordBuf {
    bytes: Vec<u8>,
}

impl RecordBuf {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_vec(self) -> Vec<u8> {
        self.bytes
    }

    pub fn put_u8(&mut self, value: u8) {
        self.bytes.push(value);
    }

    pub fn put_u16(&mut self, value: u16, order: ByteOrder) {
        self.bytes.extend_from_slice(&order.encode_u16(value));
    }

    pub fn put_u32(&mut self, value: u32, order: ByteOrder) {
        self.bytes.extend_from_slice(&order.encode_u32(value));
    }

    pub fn put_bytes(&mut self, bytes: &[u8]) {
        self.bytes.extend_from_slice(bytes);
    }

    /// Appends `count` zero bytes (reserved/unused fields).
    pub fn skip(&mut self, count: usize) {
        self.bytes.resize(self.bytes.len() + count, 0);
    }

    /// Appends a single zero byte if the current length is odd, so the
    /// record ends on an even offset.
    pub fn pad_to_even(&mut self) {
        if self.bytes.len() % 2 != 0 {
            self.bytes.push(0);
        }
    }

    /// Backpatches one byte at `offset`. Panics if `offset` was never
    /// written, so it is only usable for fields reserved earlier.
    pub fn set(&mut self, offset: usize, value: u8) {
        self.bytes[offset] = value;
    }
}

/// The 7-byte recording date stamped into directory records.
///
/// The year is stored as an offset from 1900, the GMT offset in 15-minute
/// intervals from -48 (the original writer emits a constant here too).
/// One timestamp is captured per build, so rebuilding from an identical
/// tree produces a byte-identical image.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RecordTimestamp {
    pub years_since_1900: u8,
    pub month: u8,
    pub day: u8,
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
    pub gmt_offset: u8,
}

impl RecordTimestamp {
    pub const fn new(
        years_since_1900: u8,
        month: u8,
        day: u8,
        hour: u8,
        minute: u8,
        second: u8,
        gmt_offset: u8,
    ) -> Self {
        Self {
            years_since_1900,
            month,
            day,
            hour,
            minute,
            second,
            gmt_offset,
        }
    }

    pub fn to_bytes(self) -> [u8; 7] {
        [
            self.years_since_1900,
            self.month,
            self.day,
            self.hour,
            self.minute,
            self.second,
            self.gmt_offset,
        ]
    }
}

impl Default for RecordTimestamp {
    /// 2020-01-01 00:00:00 GMT.
    fn default() -> Self {
        Self::new(120, 1, 1, 0, 0, 0, 0)
    }
}
