//! Bridge wire protocol constants and types
//!
//! Every message is a frame:
//!
//! ```text
//! request:  [SOH][group][command][length:u16 LE][payload...][checksum]
//! response: [SOH][group][command][result][length:u16 LE][payload...][checksum]
//! ```
//!
//! The checksum is the XOR of all header bytes after the prefix followed by
//! all payload bytes. Outside of a frame the bridge may emit debug text
//! lines starting with `'*'` and ending with `'\n'`.

pub mod frame;
pub mod types;

use std::fmt;

/// Bridge API version this host implementation speaks
pub const SUPPORTED_API_VERSION: u8 = 2;

/// Frame start marker
pub const SOH: u8 = 0x01;
/// Flow control "continue" marker for bulk sends
pub const ENQ: u8 = 0x05;
/// Start of an asynchronous debug text line
pub const DEBUG_MARKER: u8 = b'*';
/// End of a debug text line
pub const DEBUG_END: u8 = b'\n';

/// Payload bytes sent before the bridge must acknowledge with ENQ
pub const CHUNK_SIZE: usize = 32;

/// Size of a request header on the wire, prefix included
pub const REQUEST_HEADER_LEN: usize = 5;
/// Size of a response header on the wire, prefix included
pub const RESPONSE_HEADER_LEN: usize = 6;

/// Largest flash address the 24-bit address fields can carry
pub const MAX_ADDRESS: u32 = 0x00FF_FFFF;
/// Maximum bytes per flash read or write request
pub const MAX_TRANSFER: usize = 0x100;

/// Subsystem addressed by a frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Group {
    /// The bridge microcontroller firmware itself
    Bridge = 0x01,
    /// The Tapecart behind the bridge
    Tapecart = 0x02,
}

/// Commands handled by the bridge firmware
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum BridgeCommand {
    Version = 0x01,
    StartCommandMode = 0x02,
}

/// Commands forwarded to the Tapecart
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum TapecartCommand {
    Exit = 0x00,
    ReadDeviceInfo = 0x01,
    ReadDeviceSizes = 0x02,
    ReadCapabilities = 0x03,

    ReadFlash = 0x10,
    ReadFlashFast = 0x11,
    WriteFlash = 0x12,
    WriteFlashFast = 0x13,
    EraseFlash64K = 0x14,
    EraseFlashBlock = 0x15,
    Crc32Flash = 0x16,

    ReadLoader = 0x20,
    ReadLoadinfo = 0x21,
    WriteLoader = 0x22,
    WriteLoadinfo = 0x23,

    LedOff = 0x30,
    LedOn = 0x31,
    ReadDebugFlags = 0x32,
    WriteDebugFlags = 0x33,

    DirSetParams = 0x40,
    DirLookup = 0x41,
}

impl TapecartCommand {
    /// Decode a command identifier
    pub fn from_u8(id: u8) -> Option<Self> {
        use TapecartCommand::*;
        Some(match id {
            0x00 => Exit,
            0x01 => ReadDeviceInfo,
            0x02 => ReadDeviceSizes,
            0x03 => ReadCapabilities,
            0x10 => ReadFlash,
            0x11 => ReadFlashFast,
            0x12 => WriteFlash,
            0x13 => WriteFlashFast,
            0x14 => EraseFlash64K,
            0x15 => EraseFlashBlock,
            0x16 => Crc32Flash,
            0x20 => ReadLoader,
            0x21 => ReadLoadinfo,
            0x22 => WriteLoader,
            0x23 => WriteLoadinfo,
            0x30 => LedOff,
            0x31 => LedOn,
            0x32 => ReadDebugFlags,
            0x33 => WriteDebugFlags,
            0x40 => DirSetParams,
            0x41 => DirLookup,
            _ => return None,
        })
    }
}

impl BridgeCommand {
    /// Decode a command identifier
    pub fn from_u8(id: u8) -> Option<Self> {
        match id {
            0x01 => Some(BridgeCommand::Version),
            0x02 => Some(BridgeCommand::StartCommandMode),
            _ => None,
        }
    }
}

/// A command together with the group it belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Bridge(BridgeCommand),
    Tapecart(TapecartCommand),
}

impl Command {
    pub fn group(self) -> Group {
        match self {
            Command::Bridge(_) => Group::Bridge,
            Command::Tapecart(_) => Group::Tapecart,
        }
    }

    pub fn id(self) -> u8 {
        match self {
            Command::Bridge(c) => c as u8,
            Command::Tapecart(c) => c as u8,
        }
    }

    /// Decode a group/command pair as seen on the wire
    pub fn from_wire(group: u8, id: u8) -> Option<Self> {
        match group {
            g if g == Group::Bridge as u8 => BridgeCommand::from_u8(id).map(Command::Bridge),
            g if g == Group::Tapecart as u8 => TapecartCommand::from_u8(id).map(Command::Tapecart),
            _ => None,
        }
    }
}

impl From<BridgeCommand> for Command {
    fn from(c: BridgeCommand) -> Self {
        Command::Bridge(c)
    }
}

impl From<TapecartCommand> for Command {
    fn from(c: TapecartCommand) -> Self {
        Command::Tapecart(c)
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::Bridge(c) => write!(f, "{:?}", c),
            Command::Tapecart(c) => write!(f, "{:?}", c),
        }
    }
}

/// Result field of a response header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandResult {
    Ok,
    Error,
    NotImplemented,
    ChecksumError,
    Unknown(u8),
}

impl CommandResult {
    pub fn from_u8(code: u8) -> Self {
        match code {
            0x00 => CommandResult::Ok,
            0x01 => CommandResult::Error,
            0x02 => CommandResult::NotImplemented,
            0x03 => CommandResult::ChecksumError,
            other => CommandResult::Unknown(other),
        }
    }

    pub fn code(self) -> u8 {
        match self {
            CommandResult::Ok => 0x00,
            CommandResult::Error => 0x01,
            CommandResult::NotImplemented => 0x02,
            CommandResult::ChecksumError => 0x03,
            CommandResult::Unknown(code) => code,
        }
    }
}

/// Header of a host-to-bridge frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestHeader {
    pub group: u8,
    pub command: u8,
    pub length: u16,
}

impl RequestHeader {
    pub fn new(command: Command, length: u16) -> Self {
        Self {
            group: command.group() as u8,
            command: command.id(),
            length,
        }
    }

    pub fn to_bytes(&self) -> [u8; REQUEST_HEADER_LEN] {
        let len = self.length.to_le_bytes();
        [SOH, self.group, self.command, len[0], len[1]]
    }
}

/// Header of a bridge-to-host frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResponseHeader {
    pub group: u8,
    pub command: u8,
    pub result: u8,
    pub length: u16,
}

impl ResponseHeader {
    /// Parse the five header bytes that follow the SOH prefix
    pub fn from_tail(tail: &[u8; RESPONSE_HEADER_LEN - 1]) -> Self {
        Self {
            group: tail[0],
            command: tail[1],
            result: tail[2],
            length: u16::from_le_bytes([tail[3], tail[4]]),
        }
    }

    pub fn to_bytes(&self) -> [u8; RESPONSE_HEADER_LEN] {
        let len = self.length.to_le_bytes();
        [
            SOH,
            self.group,
            self.command,
            self.result,
            len[0],
            len[1],
        ]
    }
}

/// XOR checksum over the header bytes after the prefix and the payload
pub fn checksum(header_tail: &[u8], payload: &[u8]) -> u8 {
    header_tail
        .iter()
        .chain(payload.iter())
        .fold(0u8, |acc, &b| acc ^ b)
}

/// Check a received checksum
pub fn verify_checksum(expected: u8, header_tail: &[u8], payload: &[u8]) -> bool {
    checksum(header_tail, payload) == expected
}

/// Encode a 24-bit little-endian value
pub fn u24_to_bytes(value: u32) -> [u8; 3] {
    let b = value.to_le_bytes();
    [b[0], b[1], b[2]]
}

/// Convert a 24-bit little-endian value to u32
pub fn u24_to_u32(buf: &[u8]) -> u32 {
    (buf[0] as u32) | ((buf[1] as u32) << 8) | ((buf[2] as u32) << 16)
}
