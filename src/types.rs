use serde::{Deserialize, Serialize};
use std::fmt;

/// BGZF virtual file offset.
///
/// The upper 48 bits hold the offset of a compressed block in the BAM file,
/// the lower 16 bits the offset within that block once decompressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct VirtualOffset(u64);

impl VirtualOffset {
    pub fn new(block_offset: u64, in_block_offset: u16) -> Self {
        Self((block_offset << 16) | u64::from(in_block_offset))
    }

    /// Start of the compressed block holding the record.
    pub fn block_offset(self) -> u64 {
        self.0 >> 16
    }

    pub fn in_block_offset(self) -> u16 {
        (self.0 & 0xffff) as u16
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl From<u64> for VirtualOffset {
    fn from(v: u64) -> Self {
        Self(v)
    }
}

impl From<VirtualOffset> for u64 {
    fn from(v: VirtualOffset) -> Self {
        v.0
    }
}

impl fmt::Display for VirtualOffset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.block_offset(), self.in_block_offset())
    }
}

/// One read as seen by the PacBio index
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexRecord {
    /// ZMW hole number
    pub group_id: i32,
    pub virtual_offset: VirtualOffset,
}

/// First record of a compressed block that starts a new ZMW
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Boundary {
    pub record_index: usize,
    pub group_id: i32,
    pub block_offset: u64,
}

/// Byte range within a BAM file, both ends as written to the range table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ByteRange {
    pub start: u64,
    pub end: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_virtual_offset_components() {
        let v = VirtualOffset::new(123_456, 789);
        assert_eq!(v.block_offset(), 123_456);
        assert_eq!(v.in_block_offset(), 789);
        assert_eq!(u64::from(v) >> 16, 123_456);
    }

    #[test]
    fn test_virtual_offset_display() {
        let v = VirtualOffset::from((100u64 << 16) | 5);
        assert_eq!(v.to_string(), "100:5");
    }
}
