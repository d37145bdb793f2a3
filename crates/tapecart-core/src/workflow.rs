//! Dump, flash and validate workflows
//!
//! Each workflow walks the flash content strictly in increasing address
//! order, one chunk at a time. The first failing step aborts the workflow;
//! whatever was written to the file or the device up to that point stays.

use std::io::{Read, Write};

use crate::crc::calculate_crc32;
use crate::error::{Error, Mismatch, Result};
use crate::protocol::MAX_TRANSFER;
use crate::session::Session;
use crate::tcrt::{read_header_from_device, write_header_to_device, TcrtHeader};
use crate::transport::Transport;

/// Bytes moved per flash read or write request
pub const STRIDE: usize = MAX_TRANSFER;
/// Validation chunk size when the device does not report an erase block size
pub const DEFAULT_VALIDATE_CHUNK: u32 = 4 * 1024;

/// Which workflow is reporting progress
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Reading,
    Writing,
    Validating,
}

/// Progress observer for the workflows
///
/// All methods have empty defaults.
pub trait Progress {
    /// A phase over `total_bytes` of flash content begins
    fn start(&mut self, _phase: Phase, _total_bytes: u64) {}

    /// `done_bytes` of the current phase are complete
    fn update(&mut self, _done_bytes: u64) {}

    /// The current phase ended successfully
    fn finish(&mut self) {}
}

/// Progress observer that discards everything
pub struct NoProgress;

impl Progress for NoProgress {}

/// Percentage of `done` in `total`, 100 for empty content
pub fn percent(done: u64, total: u64) -> f64 {
    if total == 0 {
        100.0
    } else {
        (100.0 / total as f64) * done as f64
    }
}

fn chunks(total: u32, size: u32) -> impl Iterator<Item = (u32, usize)> {
    (0..total)
        .step_by(size as usize)
        .map(move |addr| (addr, (total - addr).min(size) as usize))
}

/// Dump the device into a TCRT image
///
/// Returns the header that was written.
pub fn dump<T: Transport, W: Write>(
    session: &mut Session<T>,
    file: &mut W,
    progress: &mut dyn Progress,
) -> Result<TcrtHeader> {
    let header = read_header_from_device(session)?;
    header.write_to(file)?;

    let total = header.flash_content_length;
    log::info!("Reading {} bytes from flash", total);
    progress.start(Phase::Reading, total as u64);

    for (addr, len) in chunks(total, STRIDE as u32) {
        let data = session.read_flash(addr, len).inspect_err(|e| {
            log::error!("Failed to read from flash address {:06x}: {}", addr, e);
        })?;
        file.write_all(&data).map_err(Error::file)?;
        progress.update(addr as u64 + len as u64);
    }

    file.flush().map_err(Error::file)?;
    progress.finish();
    Ok(header)
}

/// Program a TCRT image into the device
///
/// Each erase block is erased right before its first chunk is written.
/// Nothing is rolled back on failure.
pub fn flash<T: Transport, R: Read>(
    session: &mut Session<T>,
    file: &mut R,
    progress: &mut dyn Progress,
) -> Result<TcrtHeader> {
    let header = TcrtHeader::read_from(file)?;
    header.validate()?;

    write_header_to_device(session, &header)?;

    let sizes = session.device_sizes()?;
    let block_size = sizes.erase_block_size();
    log::debug!(
        "Erase block size {} ({} pages of {} bytes)",
        block_size,
        sizes.erase_pages,
        sizes.page_size
    );

    let total = header.flash_content_length;
    log::info!("Writing {} bytes to flash", total);
    progress.start(Phase::Writing, total as u64);

    let mut buf = [0u8; STRIDE];
    for (addr, len) in chunks(total, STRIDE as u32) {
        let data = &mut buf[..len];
        file.read_exact(data).map_err(Error::file)?;

        if block_size != 0 && addr % block_size == 0 {
            session.erase_flash_block(addr).inspect_err(|e| {
                log::error!("Failed to erase flash block at address {:06x}: {}", addr, e);
            })?;
        }

        session.write_flash(addr, data).inspect_err(|e| {
            log::error!("Failed to write to flash address {:06x}: {}", addr, e);
        })?;
        progress.update(addr as u64 + len as u64);
    }

    progress.finish();
    Ok(header)
}

/// Compare a TCRT image against the device
///
/// Loadinfo is always compared, the loader only when the image marks it
/// valid. Flash content is compared block-wise by CRC32.
pub fn validate<T: Transport, R: Read>(
    session: &mut Session<T>,
    file: &mut R,
    progress: &mut dyn Progress,
) -> Result<TcrtHeader> {
    let header = TcrtHeader::read_from(file)?;
    header.validate()?;

    let device = read_header_from_device(session)?;
    if header.loadinfo != device.loadinfo {
        return Err(Error::Mismatch(Mismatch::Loadinfo));
    }
    if header.loader_valid() && header.loader != device.loader {
        return Err(Error::Mismatch(Mismatch::Loader));
    }

    let block_size = session.device_sizes()?.erase_block_size();
    let chunk_size = if block_size != 0 {
        block_size
    } else {
        DEFAULT_VALIDATE_CHUNK
    };

    let total = header.flash_content_length;
    log::info!("Validating {} bytes", total);
    progress.start(Phase::Validating, total as u64);

    let mut buf = vec![0u8; chunk_size as usize];
    for (addr, len) in chunks(total, chunk_size) {
        let data = &mut buf[..len];
        file.read_exact(data).map_err(Error::file)?;
        let expected = calculate_crc32(data);

        let actual = session.crc32_flash(addr, len as u32).inspect_err(|e| {
            log::error!("Failed to get CRC32 for flash block at address {:06x}: {}", addr, e);
        })?;
        if actual != expected {
            return Err(Error::Mismatch(Mismatch::Flash {
                address: addr,
                expected,
                actual,
            }));
        }
        progress.update(addr as u64 + len as u64);
    }

    progress.finish();
    log::debug!("All {} bytes match", total);
    Ok(header)
}
