//! TCRT image container
//!
//! A TCRT file is a fixed 216 byte little-endian header followed by
//! `flash_content_length` bytes of raw flash content:
//!
//! | Offset | Size | Field                  |
//! |--------|------|------------------------|
//! | 0      | 16   | signature              |
//! | 16     | 2    | version                |
//! | 18     | 22   | loadinfo               |
//! | 40     | 1    | misc flags             |
//! | 41     | 171  | initial loader         |
//! | 212    | 4    | flash content length   |

use std::io::{Read, Write};

use bitflags::bitflags;

use crate::error::{Error, ImageError, Result};
use crate::protocol::types::{InitialLoader, LoadInfo};
use crate::session::Session;
use crate::transport::Transport;

/// File signature, `"tapecartImage\r\n\x1a"`
pub const SIGNATURE: [u8; 16] = *b"tapecartImage\r\n\x1a";
/// Supported container version
pub const VERSION: u16 = 1;
/// Size of the serialized header
pub const HEADER_SIZE: usize = 16 + 2 + LoadInfo::SIZE + 1 + InitialLoader::SIZE + 4;

bitflags! {
    /// Miscellaneous header flags
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct MiscFlags: u8 {
        /// The initial loader field holds a real loader
        const LOADER_VALID = 1 << 0;
        /// Flash content carries data block offsets
        const DATA_BLOCK_OFFSETS = 1 << 1;
    }
}

/// Header of a TCRT image
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TcrtHeader {
    pub signature: [u8; 16],
    pub version: u16,
    pub loadinfo: LoadInfo,
    pub flags: MiscFlags,
    pub loader: InitialLoader,
    pub flash_content_length: u32,
}

impl TcrtHeader {
    /// Create a header with the current signature and version
    pub fn new(
        loadinfo: LoadInfo,
        loader: Option<InitialLoader>,
        flash_content_length: u32,
    ) -> Self {
        let (flags, loader) = match loader {
            Some(loader) => (MiscFlags::LOADER_VALID, loader),
            None => (MiscFlags::empty(), InitialLoader::default()),
        };
        Self {
            signature: SIGNATURE,
            version: VERSION,
            loadinfo,
            flags,
            loader,
            flash_content_length,
        }
    }

    /// Whether the loader field is meaningful
    pub fn loader_valid(&self) -> bool {
        self.flags.contains(MiscFlags::LOADER_VALID)
    }

    pub fn has_valid_signature(&self) -> bool {
        self.validate().is_ok()
    }

    /// Check signature and version; nothing else in the header can be
    /// trusted before this succeeds
    pub fn validate(&self) -> Result<()> {
        if self.signature != SIGNATURE {
            return Err(Error::InvalidImage(ImageError::BadSignature));
        }
        if self.version != VERSION {
            return Err(Error::InvalidImage(ImageError::UnsupportedVersion(
                self.version,
            )));
        }
        Ok(())
    }

    pub fn from_bytes(buf: &[u8; HEADER_SIZE]) -> Self {
        let mut signature = [0u8; 16];
        signature.copy_from_slice(&buf[0..16]);

        let mut loadinfo = [0u8; LoadInfo::SIZE];
        loadinfo.copy_from_slice(&buf[18..40]);

        let mut loader = [0u8; InitialLoader::SIZE];
        loader.copy_from_slice(&buf[41..212]);

        Self {
            signature,
            version: u16::from_le_bytes([buf[16], buf[17]]),
            loadinfo: LoadInfo::from_bytes(&loadinfo),
            flags: MiscFlags::from_bits_retain(buf[40]),
            loader: InitialLoader(loader),
            flash_content_length: u32::from_le_bytes([buf[212], buf[213], buf[214], buf[215]]),
        }
    }

    pub fn to_bytes(&self) -> [u8; HEADER_SIZE] {
        let mut buf = [0u8; HEADER_SIZE];
        buf[0..16].copy_from_slice(&self.signature);
        buf[16..18].copy_from_slice(&self.version.to_le_bytes());
        buf[18..40].copy_from_slice(&self.loadinfo.to_bytes());
        buf[40] = self.flags.bits();
        buf[41..212].copy_from_slice(self.loader.as_bytes());
        buf[212..216].copy_from_slice(&self.flash_content_length.to_le_bytes());
        buf
    }

    /// Read a header from a file without validating it
    pub fn read_from<R: Read>(reader: &mut R) -> Result<Self> {
        let mut buf = [0u8; HEADER_SIZE];
        reader.read_exact(&mut buf).map_err(Error::file)?;
        Ok(Self::from_bytes(&buf))
    }

    pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_all(&self.to_bytes()).map_err(Error::file)
    }
}

/// Snapshot the device's loadinfo, loader and flash size
///
/// The loader is always marked valid; the device has no way to say
/// otherwise.
pub fn read_header_from_device<T: Transport>(session: &mut Session<T>) -> Result<TcrtHeader> {
    let loadinfo = session.read_loadinfo().inspect_err(|e| {
        log::error!("Failed to read loadinfo from Tapecart: {}", e);
    })?;
    let loader = session.read_loader().inspect_err(|e| {
        log::error!("Failed to read loader from Tapecart: {}", e);
    })?;
    let sizes = session.device_sizes().inspect_err(|e| {
        log::error!("Failed to read device sizes from Tapecart: {}", e);
    })?;

    Ok(TcrtHeader::new(loadinfo, Some(loader), sizes.total_size))
}

/// Write loadinfo and, if the header carries one, the initial loader
pub fn write_header_to_device<T: Transport>(
    session: &mut Session<T>,
    header: &TcrtHeader,
) -> Result<()> {
    log::info!("Writing loadinfo");
    session.write_loadinfo(&header.loadinfo)?;

    if header.loader_valid() {
        log::info!("Writing initial loader");
        session.write_loader(&header.loader)?;
    } else {
        log::info!("No initial loader in file");
    }
    Ok(())
}
