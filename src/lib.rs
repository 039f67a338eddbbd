//! Rebuilds the contents of an I2C EEPROM from sniffed bus traffic and
//! renders the image as Intel-HEX.
//!
//! ```
//! use eep2hex::{AddressBuffer, IntelHexWriteOptions, write_intel_hex};
//!
//! let mut buffer = AddressBuffer::new();
//! buffer.put(0x0000, b"AAAA").unwrap();
//! buffer.put(0x0004, b"BBBB").unwrap();
//! let hex = write_intel_hex(buffer.segments(), &IntelHexWriteOptions::default());
//! assert!(hex.ends_with(":00000001FF"));
//! ```

pub mod buffer;
pub mod config;
pub mod decoder;
pub mod error;
pub mod io;
pub mod segment;

pub use buffer::{AddressBuffer, BufferError, MergePolicy};
pub use config::{ConfigError, DecoderConfig, TARGET_ADDRESS_RANGE};
pub use decoder::{EepromDecoder, Frame, HexDump, SharedDecoder, log_sink};
pub use error::Error;
pub use io::{
    DEFAULT_BYTES_PER_LINE, HexRecord, IntelHexWriteOptions, LineEnding, RecordType,
    encode_records, write_intel_hex,
};
pub use segment::Segment;
