//! AddressBuffer against a byte-map model.

use std::collections::BTreeMap;

use eep2hex::{AddressBuffer, MergePolicy, Segment};
use proptest::collection::vec;
use proptest::prelude::*;

fn model_of(writes: &[(u32, Vec<u8>)]) -> BTreeMap<u32, u8> {
    let mut model = BTreeMap::new();
    for (addr, data) in writes {
        for (i, &b) in data.iter().enumerate() {
            model.insert(addr + i as u32, b);
        }
    }
    model
}

fn flatten(segments: &[Segment]) -> BTreeMap<u32, u8> {
    let mut image = BTreeMap::new();
    for seg in segments {
        for (i, &b) in seg.data.iter().enumerate() {
            image.insert(seg.start_address + i as u32, b);
        }
    }
    image
}

fn writes() -> impl Strategy<Value = Vec<(u32, Vec<u8>)>> {
    vec((0u32..0x200, vec(any::<u8>(), 1..40)), 1..40)
}

#[test]
fn test_sequential_byte_writes_form_one_segment() {
    for policy in [MergePolicy::Coalesce, MergePolicy::Legacy] {
        let mut buffer = AddressBuffer::with_policy(policy);
        buffer.put(0x40, &[0]).unwrap();
        for i in 1..0x100u32 {
            buffer.put(0x40 + i, &[i as u8]).unwrap();
        }
        assert_eq!(buffer.len(), 1, "{policy:?}");
        assert_eq!(buffer.segments()[0].len(), 0x100);
        assert_eq!(buffer.read_byte(0x13F), Some(0xFF));
    }
}

#[test]
fn test_legacy_and_coalesce_diverge_on_backward_writes() {
    let ops: [(u32, &[u8]); 3] = [(0x10, &b"BBBB"[..]), (0x0C, &b"AAAA"[..]), (0x12, &b"XX"[..])];

    let mut coalesce = AddressBuffer::new();
    let mut legacy = AddressBuffer::with_policy(MergePolicy::Legacy);
    for (addr, data) in ops {
        coalesce.put(addr, data).unwrap();
        legacy.put(addr, data).unwrap();
    }

    assert_eq!(coalesce.segments(), &[Segment::new(0x0C, b"AAAABBXX".to_vec())]);
    // 0x0C is left of the first segment, and 0x12..0x14 has no room past it.
    assert_eq!(
        legacy.segments(),
        &[
            Segment::new(0x10, b"BBBB".to_vec()),
            Segment::new(0x0C, b"AAAA".to_vec()),
            Segment::new(0x12, b"XX".to_vec()),
        ]
    );
    assert_eq!(legacy.normalized(), coalesce);
}

proptest! {
    #[test]
    fn coalesce_matches_last_write_wins(writes in writes()) {
        let mut buffer = AddressBuffer::new();
        for (addr, data) in &writes {
            buffer.put(*addr, data).unwrap();
        }
        prop_assert_eq!(flatten(buffer.segments()), model_of(&writes));
    }

    #[test]
    fn coalesce_segments_sorted_disjoint_non_adjacent(writes in writes()) {
        let mut buffer = AddressBuffer::new();
        for (addr, data) in &writes {
            buffer.put(*addr, data).unwrap();
        }
        for pair in buffer.segments().windows(2) {
            prop_assert!(pair[0].end_exclusive() < pair[1].start_address as u64);
        }
        prop_assert!(buffer.segments().iter().all(|s| !s.is_empty()));
    }

    #[test]
    fn legacy_matches_coalesce_for_sequential_dumps(
        start in 0u32..0x1_0000,
        chunks in vec(vec(any::<u8>(), 1..40), 1..40),
    ) {
        let mut legacy = AddressBuffer::with_policy(MergePolicy::Legacy);
        let mut coalesce = AddressBuffer::new();
        let mut addr = start;
        for chunk in &chunks {
            legacy.put(addr, chunk).unwrap();
            coalesce.put(addr, chunk).unwrap();
            addr += chunk.len() as u32;
        }
        prop_assert_eq!(legacy.len(), 1);
        prop_assert_eq!(legacy.segments(), coalesce.segments());
    }
}
