//! Decoder settings.
//!
//! Settings can be built in code or loaded from INI-style text:
//!
//! ```text
//! [eeprom]
//! target_i2c_address = 0x50
//! trigger_address = 0xFF
//! bytes_per_line = 32
//! merge_policy = coalesce
//! ```

use std::ops::RangeInclusive;
use std::path::Path;

use thiserror::Error;

use crate::MergePolicy;
use crate::io::DEFAULT_BYTES_PER_LINE;

/// 7-bit addresses an EEPROM can answer on.
pub const TARGET_ADDRESS_RANGE: RangeInclusive<u8> = 0x50..=0x7F;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("target I2C address {0:#04X} outside 0x50..=0x7F")]
    TargetAddressOutOfRange(u32),

    #[error("trigger address {0:#X} does not fit in one byte")]
    TriggerAddressOutOfRange(u32),

    #[error("bytes per line must be between 1 and 255, got {0}")]
    InvalidBytesPerLine(u32),

    #[error("invalid number on line {line}: {value}")]
    InvalidNumber { line: usize, value: String },

    #[error("unknown merge policy on line {line}: {value}")]
    InvalidPolicy { line: usize, value: String },

    #[error("unknown key on line {line}: {key}")]
    UnknownKey { line: usize, key: String },

    #[error("missing value for {key} on line {line}")]
    MissingValue { line: usize, key: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecoderConfig {
    /// Device to track.
    pub target_i2c_address: u8,
    /// Register whose read-stop triggers a dump.
    pub trigger_address: u8,
    pub bytes_per_line: u8,
    pub merge_policy: MergePolicy,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            target_i2c_address: 0x50,
            trigger_address: 0xFF,
            bytes_per_line: DEFAULT_BYTES_PER_LINE,
            merge_policy: MergePolicy::Coalesce,
        }
    }
}

impl DecoderConfig {
    pub fn new(target_i2c_address: u8, trigger_address: u8) -> Result<Self, ConfigError> {
        let config = Self {
            target_i2c_address,
            trigger_address,
            ..Self::default()
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !TARGET_ADDRESS_RANGE.contains(&self.target_i2c_address) {
            return Err(ConfigError::TargetAddressOutOfRange(
                self.target_i2c_address as u32,
            ));
        }
        if self.bytes_per_line == 0 {
            return Err(ConfigError::InvalidBytesPerLine(0));
        }
        Ok(())
    }

    /// Read and parse an INI-style settings file.
    pub fn load(path: &Path) -> Result<Self, crate::Error> {
        let content = std::fs::read_to_string(path)?;
        Ok(Self::from_ini_str(&content)?)
    }

    /// Load settings from `key = value` lines on top of the defaults.
    ///
    /// Blank lines, `;`/`#` comments and `[section]` headers are skipped.
    /// Keys are case-insensitive. Lines without `=` are ignored.
    pub fn from_ini_str(content: &str) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        for (index, raw_line) in content.lines().enumerate() {
            let line_no = index + 1;
            let line = raw_line.trim();
            if line.is_empty() || line.starts_with(';') || line.starts_with('#') {
                continue;
            }
            if line.starts_with('[') && line.ends_with(']') {
                continue;
            }
            let Some((key, value)) = line.split_once('=') else {
                continue;
            };
            let key = key.trim().to_ascii_lowercase();
            let value = value.trim().trim_matches('"');
            if value.is_empty() {
                return Err(ConfigError::MissingValue { line: line_no, key });
            }

            match key.as_str() {
                "target_i2c_address" => {
                    let n = parse_number(value, line_no)?;
                    config.target_i2c_address = u8::try_from(n)
                        .map_err(|_| ConfigError::TargetAddressOutOfRange(n))?;
                }
                "trigger_address" => {
                    let n = parse_number(value, line_no)?;
                    config.trigger_address =
                        u8::try_from(n).map_err(|_| ConfigError::TriggerAddressOutOfRange(n))?;
                }
                "bytes_per_line" => {
                    let n = parse_number(value, line_no)?;
                    config.bytes_per_line =
                        u8::try_from(n).map_err(|_| ConfigError::InvalidBytesPerLine(n))?;
                }
                "merge_policy" => {
                    config.merge_policy = match value.to_ascii_lowercase().as_str() {
                        "coalesce" => MergePolicy::Coalesce,
                        "legacy" => MergePolicy::Legacy,
                        _ => {
                            return Err(ConfigError::InvalidPolicy {
                                line: line_no,
                                value: value.to_string(),
                            });
                        }
                    };
                }
                _ => return Err(ConfigError::UnknownKey { line: line_no, key }),
            }
        }

        config.validate()?;
        Ok(config)
    }
}

/// Decimal, `0x` hex or `h`-suffixed hex.
fn parse_number(s: &str, line: usize) -> Result<u32, ConfigError> {
    let invalid = || ConfigError::InvalidNumber {
        line,
        value: s.to_string(),
    };

    let (radix, digits) = if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        (16, hex)
    } else if let Some(hex) = s.strip_suffix('h').or_else(|| s.strip_suffix('H')) {
        (16, hex)
    } else {
        (10, s)
    };

    let cleaned: String = digits.chars().filter(|c| *c != '_').collect();
    if cleaned.is_empty() {
        return Err(invalid());
    }
    u32::from_str_radix(&cleaned, radix).map_err(|_| invalid())
}
