#![allow(dead_code)]

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};

static COUNTER: AtomicUsize = AtomicUsize::new(0);

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn temp_dir(prefix: &str) -> PathBuf {
    let id = COUNTER.fetch_add(1, Ordering::SeqCst);
    let mut dir = std::env::temp_dir();
    dir.push(format!("eep2hex_{prefix}_{}_{}", std::process::id(), id));
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

/// A record read back from rendered text. `raw` holds every framed byte,
/// checksum included.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    pub record_type: u8,
    pub address: u16,
    pub payload: Vec<u8>,
    pub raw: Vec<u8>,
}

pub fn read_lines(text: &str) -> Vec<Line> {
    text.lines()
        .map(|line| {
            assert!(!line.ends_with('\r'), "unexpected CR in {line:?}");
            let hex = line.strip_prefix(':').expect("missing start code");
            assert_eq!(hex, hex.to_ascii_uppercase(), "lowercase hex in {line:?}");
            let raw: Vec<u8> = (0..hex.len())
                .step_by(2)
                .map(|i| u8::from_str_radix(&hex[i..i + 2], 16).unwrap())
                .collect();
            let count = raw[0] as usize;
            assert_eq!(raw.len(), count + 5, "byte count mismatch in {line:?}");
            Line {
                record_type: raw[3],
                address: u16::from_be_bytes([raw[1], raw[2]]),
                payload: raw[4..4 + count].to_vec(),
                raw,
            }
        })
        .collect()
}

/// Replay records with linear addressing into an address -> byte map.
pub fn image_of(lines: &[Line]) -> BTreeMap<u32, u8> {
    let mut image = BTreeMap::new();
    let mut upper: u32 = 0;
    for line in lines {
        match line.record_type {
            0x00 => {
                let base = upper + line.address as u32;
                for (i, &b) in line.payload.iter().enumerate() {
                    image.insert(base + i as u32, b);
                }
            }
            0x04 => {
                upper = (u16::from_be_bytes([line.payload[0], line.payload[1]]) as u32) << 16;
            }
            0x01 => break,
            other => panic!("unexpected record type {other:02X}"),
        }
    }
    image
}
