use thiserror::Error;

use crate::Segment;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum BufferError {
    #[error("write of {len} bytes at {address:#X} runs past the 32-bit address space")]
    AddressOverflow { address: u32, len: usize },
}

/// How `AddressBuffer::put` folds a write into the stored segments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MergePolicy {
    /// Interval merge. Segments stay sorted by start address, never overlap
    /// and are never adjacent. Later writes overwrite earlier bytes.
    #[default]
    Coalesce,
    /// First-match scan over segments in insertion order: patch a segment
    /// that strictly contains the write, else append to a segment ending
    /// exactly at the write, else push a new segment. Writes at or before a
    /// segment's start are never merged, so stored segments may overlap.
    Legacy,
}

/// Accumulates byte writes at arbitrary addresses into contiguous segments.
///
/// One buffer backs one decoding session. It is never cleared implicitly;
/// call [`AddressBuffer::reset`] between sessions if the image should start
/// over.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AddressBuffer {
    segments: Vec<Segment>,
    policy: MergePolicy,
}

impl AddressBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_policy(policy: MergePolicy) -> Self {
        Self {
            segments: Vec::new(),
            policy,
        }
    }

    pub fn policy(&self) -> MergePolicy {
        self.policy
    }

    /// Segments in render order: ascending start address under
    /// `Coalesce`, insertion order under `Legacy`.
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn into_segments(self) -> Vec<Segment> {
        self.segments
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Number of stored segments.
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn total_bytes(&self) -> usize {
        self.segments.iter().map(|s| s.len()).sum()
    }

    pub fn min_address(&self) -> Option<u32> {
        self.segments.iter().map(|s| s.start_address).min()
    }

    pub fn max_address(&self) -> Option<u32> {
        self.segments.iter().map(|s| s.end_address()).max()
    }

    /// Drop all stored data. The merge policy is kept.
    pub fn reset(&mut self) {
        self.segments.clear();
    }

    /// Byte at `address`. When legacy segments overlap, the latest one wins,
    /// matching what a renderer that plays segments in order leaves behind.
    pub fn read_byte(&self, address: u32) -> Option<u8> {
        self.segments.iter().rev().find_map(|s| s.get(address))
    }

    /// Write `data` starting at `base_address`.
    ///
    /// Empty writes are ignored. Writes whose last byte would land past
    /// `0xFFFF_FFFF` are rejected and leave the buffer untouched.
    pub fn put(&mut self, base_address: u32, data: &[u8]) -> Result<(), BufferError> {
        if data.is_empty() {
            return Ok(());
        }
        if base_address as u64 + data.len() as u64 > u32::MAX as u64 + 1 {
            return Err(BufferError::AddressOverflow {
                address: base_address,
                len: data.len(),
            });
        }

        match self.policy {
            MergePolicy::Coalesce => self.put_coalesce(base_address, data),
            MergePolicy::Legacy => self.put_legacy(base_address, data),
        }
        Ok(())
    }

    /// Copy of this buffer with overlaps resolved and neighbours merged.
    /// Segments are replayed in order, so later segments win on overlap.
    pub fn normalized(&self) -> AddressBuffer {
        let mut out = AddressBuffer::with_policy(MergePolicy::Coalesce);
        for seg in &self.segments {
            out.put_coalesce(seg.start_address, &seg.data);
        }
        out
    }

    fn put_legacy(&mut self, base_address: u32, data: &[u8]) {
        let start = base_address as u64;
        let end = start + data.len() as u64;

        for seg in &mut self.segments {
            if seg.start_address as u64 >= start {
                continue;
            }
            let seg_end = seg.end_exclusive();
            if seg_end > end {
                let offset = (base_address - seg.start_address) as usize;
                seg.data[offset..offset + data.len()].copy_from_slice(data);
                return;
            }
            if seg_end == start {
                seg.data.extend_from_slice(data);
                return;
            }
        }

        self.segments.push(Segment::new(base_address, data.to_vec()));
    }

    fn put_coalesce(&mut self, base_address: u32, data: &[u8]) {
        let start = base_address as u64;
        let end = start + data.len() as u64;

        // Segments are sorted and disjoint, so both ends are monotonic.
        let first = self.segments.partition_point(|s| s.end_exclusive() < start);
        let last = self.segments.partition_point(|s| (s.start_address as u64) <= end);

        if first == last {
            let segment = Segment::new(base_address, data.to_vec());
            self.segments.insert(first, segment);
            return;
        }

        let merged_end = self.segments[last - 1].end_exclusive().max(end);
        let mut absorbed = self.segments.drain(first..last).collect::<Vec<_>>().into_iter();
        let Some(head) = absorbed.next() else {
            return;
        };

        let merged_start = head.start_address.min(base_address);
        let merged_len = (merged_end - merged_start as u64) as usize;

        let mut merged = if head.start_address == merged_start {
            let mut bytes = head.data;
            bytes.resize(merged_len, 0);
            bytes
        } else {
            let mut bytes = vec![0u8; merged_len];
            let offset = (head.start_address - merged_start) as usize;
            bytes[offset..offset + head.data.len()].copy_from_slice(&head.data);
            bytes
        };

        for seg in absorbed {
            let offset = (seg.start_address - merged_start) as usize;
            merged[offset..offset + seg.data.len()].copy_from_slice(&seg.data);
        }

        let offset = (base_address - merged_start) as usize;
        merged[offset..offset + data.len()].copy_from_slice(data);

        self.segments.insert(first, Segment::new(merged_start, merged));
    }
}
