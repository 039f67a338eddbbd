//! I2C EEPROM transaction tracking.
//!
//! Frames from a bus sniffer are folded into an [`AddressBuffer`]:
//!
//! - a write transaction's first data byte sets the EEPROM's internal
//!   register, the following bytes are stored from that register on;
//! - a read transaction stores its bytes from the current register on;
//! - a read that stops while the register equals the trigger address
//!   renders the whole buffer as a [`HexDump`].

use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use log::{debug, info, trace, warn};

use crate::io::{IntelHexWriteOptions, write_intel_hex};
use crate::{AddressBuffer, DecoderConfig};

/// One event delivered by the bus sniffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Frame {
    Start,
    /// 7-bit device address and the direction bit.
    Address { address: u8, read: bool },
    Data(u8),
    Stop,
    /// A frame the sniffer flagged as erroneous.
    Malformed,
}

/// Rendered image of one EEPROM.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HexDump {
    pub i2c_address: u8,
    pub hex: String,
}

impl fmt::Display for HexDump {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "---------- EEPROM @0x{:02X} iHex ----------", self.i2c_address)?;
        writeln!(f, "{}", self.hex)?;
        write!(f, "---------------------------------------")
    }
}

/// Default sink: a blank line followed by the dump, at `info` level.
pub fn log_sink(dump: HexDump) {
    info!("\n{dump}");
}

#[derive(Debug, Clone)]
pub struct EepromDecoder {
    config: DecoderConfig,
    buffer: AddressBuffer,
    addressed: bool,
    read: bool,
    register: u8,
    byte_pos: u32,
}

impl EepromDecoder {
    pub fn new(config: DecoderConfig) -> Self {
        let buffer = AddressBuffer::with_policy(config.merge_policy);
        Self {
            config,
            buffer,
            addressed: false,
            read: false,
            register: 0,
            byte_pos: 0,
        }
    }

    pub fn config(&self) -> &DecoderConfig {
        &self.config
    }

    pub fn buffer(&self) -> &AddressBuffer {
        &self.buffer
    }

    /// Current internal register of the tracked EEPROM.
    pub fn register(&self) -> u8 {
        self.register
    }

    /// Forget the image and any transaction in progress.
    pub fn reset(&mut self) {
        self.buffer.reset();
        self.addressed = false;
        self.read = false;
        self.register = 0;
        self.byte_pos = 0;
    }

    /// Render the current image regardless of the trigger.
    pub fn render(&self) -> HexDump {
        let options = IntelHexWriteOptions {
            bytes_per_line: self.config.bytes_per_line,
            ..Default::default()
        };
        HexDump {
            i2c_address: self.config.target_i2c_address,
            hex: write_intel_hex(self.buffer.segments(), &options),
        }
    }

    /// Feed one frame. Returns a dump when the frame completes a read of
    /// the trigger register.
    pub fn decode(&mut self, frame: &Frame) -> Option<HexDump> {
        match *frame {
            Frame::Malformed => {
                debug!("skipping malformed frame");
            }
            Frame::Start => {
                self.byte_pos = 0;
            }
            Frame::Address { address, read } => {
                if address == self.config.target_i2c_address {
                    self.addressed = true;
                    self.read = read;
                } else {
                    trace!("ignoring transaction for device {address:#04X}");
                    self.addressed = false;
                }
            }
            Frame::Data(byte) => {
                if !self.addressed {
                    return None;
                }
                if self.read {
                    self.store(self.register as u64 + self.byte_pos as u64, byte);
                } else if self.byte_pos == 0 {
                    self.register = byte;
                } else {
                    self.store(self.register as u64 + self.byte_pos as u64 - 1, byte);
                }
                self.byte_pos = self.byte_pos.saturating_add(1);
            }
            Frame::Stop => {
                if self.addressed && self.read && self.register == self.config.trigger_address {
                    debug!(
                        "trigger register {:#04X} read, rendering {} bytes",
                        self.register,
                        self.buffer.total_bytes()
                    );
                    return Some(self.render());
                }
            }
        }
        None
    }

    /// Feed every frame, handing each dump to `sink`.
    pub fn decode_all<'a, I, F>(&mut self, frames: I, mut sink: F)
    where
        I: IntoIterator<Item = &'a Frame>,
        F: FnMut(HexDump),
    {
        for frame in frames {
            if let Some(dump) = self.decode(frame) {
                sink(dump);
            }
        }
    }

    fn store(&mut self, address: u64, byte: u8) {
        let Ok(address) = u32::try_from(address) else {
            warn!("dropping byte {byte:#04X}: address {address:#X} past 32-bit space");
            return;
        };
        trace!("{address:#06X} <- {byte:#04X}");
        if let Err(e) = self.buffer.put(address, &[byte]) {
            warn!("dropping byte {byte:#04X}: {e}");
        }
    }
}

/// Decoder shared between threads. The lock is held for the whole of each
/// `decode`, including rendering.
#[derive(Debug, Clone)]
pub struct SharedDecoder {
    inner: Arc<Mutex<EepromDecoder>>,
}

impl SharedDecoder {
    pub fn new(config: DecoderConfig) -> Self {
        Self {
            inner: Arc::new(Mutex::new(EepromDecoder::new(config))),
        }
    }

    pub fn decode(&self, frame: &Frame) -> Option<HexDump> {
        self.with(|decoder| decoder.decode(frame))
    }

    pub fn render(&self) -> HexDump {
        self.with(|decoder| decoder.render())
    }

    pub fn reset(&self) {
        self.with(EepromDecoder::reset)
    }

    /// Run `f` with the decoder locked. A poisoned lock is recovered: every
    /// decoder mutation completes before it can panic.
    pub fn with<R>(&self, f: impl FnOnce(&mut EepromDecoder) -> R) -> R {
        let mut guard = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut *guard)
    }
}

impl From<EepromDecoder> for SharedDecoder {
    fn from(decoder: EepromDecoder) -> Self {
        Self {
            inner: Arc::new(Mutex::new(decoder)),
        }
    }
}
