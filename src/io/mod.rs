mod intel_hex;

pub use intel_hex::{
    DEFAULT_BYTES_PER_LINE, HexRecord, IntelHexWriteOptions, LineEnding, RecordType,
    encode_records, write_intel_hex,
};

pub(crate) fn push_hex_byte(output: &mut String, byte: u8) {
    const HEX_CHARS: &[u8; 16] = b"0123456789ABCDEF";
    output.push(HEX_CHARS[(byte >> 4) as usize] as char);
    output.push(HEX_CHARS[(byte & 0x0F) as usize] as char);
}
