//! Fixed payload layouts of the bridge and Tapecart commands
//!
//! All multi-byte fields are little-endian. 24-bit address and length
//! fields occupy exactly three bytes; there is no padding anywhere.

use super::{u24_to_bytes, u24_to_u32, MAX_TRANSFER};

/// Board the bridge firmware runs on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoardType {
    None,
    Uno,
    Nano,
    Mega2560,
    Unknown(u8),
}

impl BoardType {
    pub fn from_u8(v: u8) -> Self {
        match v {
            0x00 => BoardType::None,
            0x01 => BoardType::Uno,
            0x02 => BoardType::Nano,
            0x03 => BoardType::Mega2560,
            other => BoardType::Unknown(other),
        }
    }

    pub fn as_u8(self) -> u8 {
        match self {
            BoardType::None => 0x00,
            BoardType::Uno => 0x01,
            BoardType::Nano => 0x02,
            BoardType::Mega2560 => 0x03,
            BoardType::Unknown(v) => v,
        }
    }
}

/// Bridge firmware version reply
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BridgeVersion {
    pub minor: u8,
    pub major: u8,
    pub api: u8,
    pub board: BoardType,
}

impl BridgeVersion {
    pub const SIZE: usize = 4;

    pub fn from_bytes(buf: &[u8; Self::SIZE]) -> Self {
        Self {
            minor: buf[0],
            major: buf[1],
            api: buf[2],
            board: BoardType::from_u8(buf[3]),
        }
    }

    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        [self.minor, self.major, self.api, self.board.as_u8()]
    }
}

/// Device identity text (at most 32 characters)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceInfo {
    pub name: String,
}

impl DeviceInfo {
    pub const MAX_LEN: usize = 32;

    pub fn from_bytes(buf: &[u8]) -> Self {
        let len = buf.iter().position(|&c| c == 0).unwrap_or(buf.len());
        Self {
            name: String::from_utf8_lossy(&buf[..len]).into_owned(),
        }
    }
}

/// Flash geometry of the device
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceSizes {
    /// Total flash size in bytes (24 bits on the wire)
    pub total_size: u32,
    pub page_size: u16,
    /// Number of pages erased together
    pub erase_pages: u16,
}

impl DeviceSizes {
    pub const SIZE: usize = 7;

    pub fn from_bytes(buf: &[u8; Self::SIZE]) -> Self {
        Self {
            total_size: u24_to_u32(&buf[0..3]),
            page_size: u16::from_le_bytes([buf[3], buf[4]]),
            erase_pages: u16::from_le_bytes([buf[5], buf[6]]),
        }
    }

    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut buf = [0u8; Self::SIZE];
        buf[0..3].copy_from_slice(&u24_to_bytes(self.total_size));
        buf[3..5].copy_from_slice(&self.page_size.to_le_bytes());
        buf[5..7].copy_from_slice(&self.erase_pages.to_le_bytes());
        buf
    }

    /// Erase granularity in bytes, 0 when unknown or not erasable
    pub fn erase_block_size(&self) -> u32 {
        self.page_size as u32 * self.erase_pages as u32
    }
}

/// How the C64 loads and starts the content of the cart
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LoadInfo {
    pub data_address: u16,
    pub data_length: u16,
    pub call_address: u16,
    pub filename: [u8; 16],
}

impl LoadInfo {
    pub const SIZE: usize = 22;

    pub fn from_bytes(buf: &[u8; Self::SIZE]) -> Self {
        let mut filename = [0u8; 16];
        filename.copy_from_slice(&buf[6..22]);
        Self {
            data_address: u16::from_le_bytes([buf[0], buf[1]]),
            data_length: u16::from_le_bytes([buf[2], buf[3]]),
            call_address: u16::from_le_bytes([buf[4], buf[5]]),
            filename,
        }
    }

    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut buf = [0u8; Self::SIZE];
        buf[0..2].copy_from_slice(&self.data_address.to_le_bytes());
        buf[2..4].copy_from_slice(&self.data_length.to_le_bytes());
        buf[4..6].copy_from_slice(&self.call_address.to_le_bytes());
        buf[6..22].copy_from_slice(&self.filename);
        buf
    }

    /// Filename as text, trailing NULs removed
    pub fn filename_str(&self) -> String {
        let len = self
            .filename
            .iter()
            .rposition(|&c| c != 0)
            .map_or(0, |p| p + 1);
        String::from_utf8_lossy(&self.filename[..len]).into_owned()
    }
}

/// Opaque initial loader blob
#[derive(Clone, PartialEq, Eq)]
pub struct InitialLoader(pub [u8; InitialLoader::SIZE]);

impl InitialLoader {
    pub const SIZE: usize = 171;

    pub fn as_bytes(&self) -> &[u8; Self::SIZE] {
        &self.0
    }
}

impl Default for InitialLoader {
    fn default() -> Self {
        InitialLoader([0; Self::SIZE])
    }
}

impl core::fmt::Debug for InitialLoader {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "InitialLoader({} bytes)", Self::SIZE)
    }
}

/// ReadFlash request: address:u24, length:u16
pub fn encode_read_flash(address: u32, length: u16) -> [u8; 5] {
    let mut buf = [0u8; 5];
    buf[0..3].copy_from_slice(&u24_to_bytes(address));
    buf[3..5].copy_from_slice(&length.to_le_bytes());
    buf
}

/// Size of a WriteFlash request
pub const WRITE_FLASH_SIZE: usize = 5 + MAX_TRANSFER;

/// WriteFlash request: address:u24, length:u16, data[256] (zero padded)
pub fn encode_write_flash(address: u32, data: &[u8]) -> [u8; WRITE_FLASH_SIZE] {
    let mut buf = [0u8; WRITE_FLASH_SIZE];
    buf[0..3].copy_from_slice(&u24_to_bytes(address));
    buf[3..5].copy_from_slice(&(data.len() as u16).to_le_bytes());
    buf[5..5 + data.len()].copy_from_slice(data);
    buf
}

/// EraseFlashBlock request: address:u24
pub fn encode_erase_block(address: u32) -> [u8; 3] {
    u24_to_bytes(address)
}

/// Crc32Flash request: address:u24, length:u24
pub fn encode_crc32(address: u32, length: u32) -> [u8; 6] {
    let mut buf = [0u8; 6];
    buf[0..3].copy_from_slice(&u24_to_bytes(address));
    buf[3..6].copy_from_slice(&u24_to_bytes(length));
    buf
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_device_sizes_layout() {
        let sizes = DeviceSizes::from_bytes(&[0x00, 0x00, 0x20, 0x00, 0x01, 0x10, 0x00]);
        assert_eq!(sizes.total_size, 0x200000);
        assert_eq!(sizes.page_size, 256);
        assert_eq!(sizes.erase_pages, 16);
        assert_eq!(sizes.erase_block_size(), 4096);
        assert_eq!(
            sizes.to_bytes(),
            [0x00, 0x00, 0x20, 0x00, 0x01, 0x10, 0x00]
        );
    }

    #[test]
    fn test_unknown_erase_block() {
        let sizes = DeviceSizes {
            total_size: 0x10000,
            page_size: 256,
            erase_pages: 0,
        };
        assert_eq!(sizes.erase_block_size(), 0);
    }

    #[test]
    fn test_loadinfo_layout() {
        let mut filename = [0u8; 16];
        filename[..5].copy_from_slice(b"HELLO");
        let info = LoadInfo {
            data_address: 0x0801,
            data_length: 0x1234,
            call_address: 0x080d,
            filename,
        };
        let bytes = info.to_bytes();
        assert_eq!(&bytes[..6], &[0x01, 0x08, 0x34, 0x12, 0x0d, 0x08]);
        assert_eq!(&bytes[6..11], b"HELLO");
        assert_eq!(LoadInfo::from_bytes(&bytes), info);
        assert_eq!(info.filename_str(), "HELLO");
    }

    #[test]
    fn test_device_info_stops_at_nul() {
        let info = DeviceInfo::from_bytes(b"Tapecart 1.0\0garbage");
        assert_eq!(info.name, "Tapecart 1.0");
    }

    #[test]
    fn test_request_layouts() {
        assert_eq!(encode_read_flash(0x012345, 0x100), [0x45, 0x23, 0x01, 0x00, 0x01]);
        assert_eq!(encode_erase_block(0x001000), [0x00, 0x10, 0x00]);
        assert_eq!(
            encode_crc32(0x000400, 0x001000),
            [0x00, 0x04, 0x00, 0x00, 0x10, 0x00]
        );

        let req = encode_write_flash(0x000100, &[0xAA, 0xBB]);
        assert_eq!(req.len(), 261);
        assert_eq!(&req[..7], &[0x00, 0x01, 0x00, 0x02, 0x00, 0xAA, 0xBB]);
        assert!(req[7..].iter().all(|&b| b == 0));
    }

    #[test]
    fn test_bridge_version() {
        let v = BridgeVersion::from_bytes(&[3, 1, 2, 2]);
        assert_eq!(v.major, 1);
        assert_eq!(v.minor, 3);
        assert_eq!(v.api, 2);
        assert_eq!(v.board, BoardType::Nano);
    }
}
