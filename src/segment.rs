#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub start_address: u32,
    pub data: Vec<u8>,
}

impl Segment {
    pub fn new(start_address: u32, data: Vec<u8>) -> Self {
        debug_assert!(
            start_address as u64 + data.len() as u64 <= u32::MAX as u64 + 1,
            "segment runs past the 32-bit address space"
        );
        Self {
            start_address,
            data,
        }
    }

    /// Address of the last byte (inclusive). Equals `start_address` when empty.
    pub fn end_address(&self) -> u32 {
        if self.data.is_empty() {
            self.start_address
        } else {
            self.start_address + (self.data.len() - 1) as u32
        }
    }

    /// One past the last byte. `u64` so a segment ending at `0xFFFF_FFFF` is representable.
    pub fn end_exclusive(&self) -> u64 {
        self.start_address as u64 + self.data.len() as u64
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn is_contiguous_with(&self, other: &Segment) -> bool {
        self.end_exclusive() == other.start_address as u64
    }

    pub fn overlaps(&self, other: &Segment) -> bool {
        (self.start_address as u64) < other.end_exclusive()
            && (other.start_address as u64) < self.end_exclusive()
    }

    /// Byte at an absolute address, if covered.
    pub fn get(&self, address: u32) -> Option<u8> {
        let offset = address.checked_sub(self.start_address)? as usize;
        self.data.get(offset).copied()
    }
}
