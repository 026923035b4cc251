//! Error types for open-tablet-core.
//!
//! Report decoding never fails; these errors come from attaching a device,
//! loading configuration, and parsing captures.

use thiserror::Error;

/// Core library error type.
#[derive(Debug, Error)]
pub enum Error {
    /// HID device communication failure.
    #[error("HID error: {0}")]
    Hid(String),

    /// Device not found during enumeration.
    #[error("device not found: {0}")]
    DeviceNotFound(String),

    /// No profile in the table for this vendor/product pair.
    #[error("unsupported device: VID 0x{vendor:04X}, PID 0x{product:04X}")]
    UnsupportedDevice { vendor: u16, product: u16 },

    /// Value out of safe range.
    #[error("value out of range: {field} = {value} (allowed {min}..={max})")]
    OutOfRange {
        field: &'static str,
        value: i64,
        min: i64,
        max: i64,
    },

    /// Geometry override file could not be read or parsed.
    #[error("config error: {0}")]
    Config(String),

    /// A line of a report capture could not be parsed.
    #[error("capture line {line}: {reason}")]
    Capture { line: usize, reason: String },
}

/// Convenience Result alias.
pub type Result<T> = std::result::Result<T, Error>;
