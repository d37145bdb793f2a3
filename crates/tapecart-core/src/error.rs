//! Error types for Tapecart operations

use crate::protocol::Command;
use std::fmt;
use thiserror::Error;

/// Reason a TCRT image was rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageError {
    /// The 16-byte file signature does not match
    BadSignature,
    /// The signature matched but the format version is not supported
    UnsupportedVersion(u16),
}

impl fmt::Display for ImageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BadSignature => write!(f, "bad file signature"),
            Self::UnsupportedVersion(v) => write!(f, "unsupported version {}", v),
        }
    }
}

/// Which part of a device snapshot differed during validation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mismatch {
    /// Load info record differs
    Loadinfo,
    /// Initial loader blob differs
    Loader,
    /// CRC32 of the flash block starting at `address` differs
    Flash {
        /// Start address of the block
        address: u32,
        /// CRC32 computed over the file contents
        expected: u32,
        /// CRC32 reported by the device
        actual: u32,
    },
}

impl fmt::Display for Mismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Loadinfo => write!(f, "loadinfo does not match"),
            Self::Loader => write!(f, "initial loader does not match"),
            Self::Flash {
                address,
                expected,
                actual,
            } => write!(
                f,
                "CRC32 check failed for flash block at address {:06x} (file {:08x}, flash {:08x})",
                address, expected, actual
            ),
        }
    }
}

/// Errors that can occur while talking to the bridge or processing images
#[derive(Debug, Error)]
pub enum Error {
    /// A byte other than the frame or debug marker started a response
    #[error("Invalid frame prefix 0x{prefix:02X}")]
    Framing { prefix: u8 },

    /// Response payload does not fit the caller's buffer
    #[error("Invalid command length received {length}, expected max {max} bytes")]
    PayloadTooLarge { length: usize, max: usize },

    /// Bridge sent something other than ENQ while a bulk send was waiting
    #[error("Flow control handshake failed: received 0x{byte:02X} instead of ENQ")]
    Handshake { byte: u8 },

    /// Checksum of a received frame did not match
    #[error("Invalid checksum {actual:02x} for received command, expected {expected:02x}")]
    Checksum { expected: u8, actual: u8 },

    /// Response echoed a different group or command than requested
    #[error(
        "Response mismatch: got group {group} command {command}, expected group {expected_group} command {expected_command}"
    )]
    ResponseMismatch {
        expected_group: u8,
        expected_command: u8,
        group: u8,
        command: u8,
    },

    /// Device reported a plain failure without diagnostics
    #[error("{command} failed")]
    SoftFailure { command: Command },

    /// Device reported a failure with a result code
    #[error("{command} failed with result 0x{code:02X}")]
    HardFailure { command: Command, code: u8 },

    /// Response payload has the wrong size for its fixed layout
    #[error("{command} returned {actual} bytes, expected {expected}")]
    ShortResponse {
        command: Command,
        expected: usize,
        actual: usize,
    },

    /// Serial link read/write failed or timed out
    #[error("Channel I/O error: {0}")]
    Channel(#[from] std::io::Error),

    /// Local file read/write failed
    #[error("File I/O error: {0}")]
    File(#[source] std::io::Error),

    /// TCRT image rejected before any device access
    #[error("Invalid TCRT file: {0}")]
    InvalidImage(ImageError),

    /// Validation found a difference between file and device
    #[error("Validation failed: {0}")]
    Mismatch(Mismatch),

    /// Flash address does not fit in 24 bits
    #[error("Address 0x{address:X} is outside the 24-bit flash address space")]
    AddressOutOfRange { address: u32 },

    /// Transfer length exceeds what the command supports
    #[error("Length {length} exceeds maximum of {max} bytes")]
    LengthOutOfRange { length: usize, max: usize },

    /// Operation is not available on this transport
    #[error("Unsupported operation: {0}")]
    Unsupported(&'static str),
}

/// Result type for Tapecart operations
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Wrap an I/O error that came from the local image file
    pub fn file(e: std::io::Error) -> Self {
        Error::File(e)
    }
}
