use std::fmt;

use super::push_hex_byte;
use crate::Segment;

pub const DEFAULT_BYTES_PER_LINE: u8 = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum RecordType {
    Data = 0x00,
    EndOfFile = 0x01,
    ExtendedLinearAddress = 0x04,
}

impl RecordType {
    pub fn code(self) -> u8 {
        self as u8
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineEnding {
    #[default]
    Lf,
    CrLf,
}

impl LineEnding {
    pub fn as_str(self) -> &'static str {
        match self {
            LineEnding::Lf => "\n",
            LineEnding::CrLf => "\r\n",
        }
    }
}

#[derive(Debug, Clone)]
pub struct IntelHexWriteOptions {
    /// Maximum payload per data record. `0` falls back to the default.
    pub bytes_per_line: u8,
    pub line_ending: LineEnding,
}

impl Default for IntelHexWriteOptions {
    fn default() -> Self {
        Self {
            bytes_per_line: DEFAULT_BYTES_PER_LINE,
            line_ending: LineEnding::Lf,
        }
    }
}

/// One Intel-HEX record. Byte count and checksum are derived from the
/// other fields when the record is framed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HexRecord {
    pub record_type: RecordType,
    pub load_address: u16,
    pub payload: Vec<u8>,
}

impl HexRecord {
    pub fn data(load_address: u16, payload: &[u8]) -> Self {
        debug_assert!(payload.len() <= u8::MAX as usize);
        Self {
            record_type: RecordType::Data,
            load_address,
            payload: payload.to_vec(),
        }
    }

    /// Type 04 record selecting the upper 16 bits for the data that follows.
    pub fn extended_linear_address(upper: u16) -> Self {
        Self {
            record_type: RecordType::ExtendedLinearAddress,
            load_address: 0,
            payload: upper.to_be_bytes().to_vec(),
        }
    }

    pub fn end_of_file() -> Self {
        Self {
            record_type: RecordType::EndOfFile,
            load_address: 0,
            payload: Vec::new(),
        }
    }

    pub fn byte_count(&self) -> u8 {
        self.payload.len() as u8
    }

    /// Two's complement of the byte sum, so the whole framed line sums to zero.
    pub fn checksum(&self) -> u8 {
        let [hi, lo] = self.load_address.to_be_bytes();
        let sum = [self.byte_count(), hi, lo, self.record_type.code()]
            .iter()
            .chain(&self.payload)
            .fold(0u8, |acc, &b| acc.wrapping_add(b));
        (!sum).wrapping_add(1)
    }

    /// Raw framed bytes: count, address (big-endian), type, payload, checksum.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.payload.len() + 5);
        bytes.push(self.byte_count());
        bytes.extend_from_slice(&self.load_address.to_be_bytes());
        bytes.push(self.record_type.code());
        bytes.extend_from_slice(&self.payload);
        bytes.push(self.checksum());
        bytes
    }

    fn write_line(&self, output: &mut String) {
        output.push(':');
        for b in self.to_bytes() {
            push_hex_byte(output, b);
        }
    }
}

impl fmt::Display for HexRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut line = String::with_capacity(self.payload.len() * 2 + 11);
        self.write_line(&mut line);
        f.write_str(&line)
    }
}

/// Build the record sequence for `segments`, in the order given.
///
/// Each segment starts with its own extended linear address record, then
/// emits another whenever a line starts in a new 64KiB block. A line that
/// straddles a block boundary is kept whole under the block of its first
/// byte. The sequence always ends with a single EOF record.
pub fn encode_records(segments: &[Segment], options: &IntelHexWriteOptions) -> Vec<HexRecord> {
    let bytes_per_line = if options.bytes_per_line == 0 {
        DEFAULT_BYTES_PER_LINE
    } else {
        options.bytes_per_line
    } as usize;

    let mut records = Vec::new();

    for segment in segments {
        let mut current_upper: Option<u32> = None;

        for (idx, chunk) in segment.data.chunks(bytes_per_line).enumerate() {
            let addr = segment.start_address + (idx * bytes_per_line) as u32;
            let upper = addr & 0xFFFF_0000;

            if current_upper != Some(upper) {
                current_upper = Some(upper);
                records.push(HexRecord::extended_linear_address((upper >> 16) as u16));
            }

            records.push(HexRecord::data((addr & 0xFFFF) as u16, chunk));
        }
    }

    records.push(HexRecord::end_of_file());
    records
}

/// Render `segments` as Intel-HEX text. Lines are joined with the configured
/// line ending; there is no terminator after the EOF record.
pub fn write_intel_hex(segments: &[Segment], options: &IntelHexWriteOptions) -> String {
    let records = encode_records(segments, options);
    let newline = options.line_ending.as_str();

    let mut output = String::new();
    for (idx, record) in records.iter().enumerate() {
        if idx > 0 {
            output.push_str(newline);
        }
        record.write_line(&mut output);
    }
    output
}
