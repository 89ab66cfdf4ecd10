// bootiso/src/endian.rs

/// Byte orderings used by ISO9660 numeric fields.
///
/// `Mixed` is the ISO9660 "both byte orders" convention: the value encoded
/// little-endian immediately followed by the same value encoded big-endian,
/// doubling the field width so readers of either endianness can pick their
/// half.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ByteOrder {
    /// Most significant byte first (big-endian).
    Most,
    /// Least significant byte first (little-endian).
    Least,
    /// Little-endian bytes followed by big-endian bytes.
    Mixed,
}

impl ByteOrder {
    /// Encodes a 16-bit value in this ordering. 2 bytes, or 4 for `Mixed`.
    pub fn encode_u16(self, value: u16) -> Vec<u8> {
        match self {
            ByteOrder::Most => value.to_be_bytes().to_vec(),
            ByteOrder::Least => value.to_le_bytes().to_vec(),
            ByteOrder::Mixed => {
                let mut bytes = value.to_le_bytes().to_vec();
                bytes.extend_from_slice(&value.to_be_bytes());
                bytes
            }
        }
    }

    /// Encodes a 32-bit value in this ordering. 4 bytes, or 8 for `Mixed`.
    pub fn encode_u32(self, value: u32) -> Vec<u8> {
        match self {
            ByteOrder::Most => value.to_be_bytes().to_vec(),
            ByteOrder::Least => value.to_le_bytes().to_vec(),
            ByteOrder::Mixed => {
                let mut bytes = value.to_le_bytes().to_vec();
                bytes.extend_from_slice(&value.to_be_bytes());
                bytes
            }
        }
    }
}
