//! Byte channel abstraction for the bridge link
//!
//! Implementations exist for a real serial port (`tapecart-serial`) and an
//! in-memory emulator (`tapecart-dummy`).

use crate::error::{Error, Result};

/// Duplex byte channel to the bridge
///
/// Reads and writes transfer exactly the requested number of bytes or fail.
/// A read that runs into the channel's timeout is an error.
pub trait Transport {
    /// Write all bytes
    fn write(&mut self, data: &[u8]) -> Result<()>;

    /// Read exactly `buf.len()` bytes
    fn read(&mut self, buf: &mut [u8]) -> Result<()>;

    /// Drop any bytes received but not yet read
    fn discard_input(&mut self) -> Result<()>;

    /// Set the DTR control line (used to reset the bridge)
    fn set_dtr(&mut self, _level: bool) -> Result<()> {
        Err(Error::Unsupported("DTR control"))
    }
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn write(&mut self, data: &[u8]) -> Result<()> {
        (**self).write(data)
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<()> {
        (**self).read(buf)
    }

    fn discard_input(&mut self) -> Result<()> {
        (**self).discard_input()
    }

    fn set_dtr(&mut self, level: bool) -> Result<()> {
        (**self).set_dtr(level)
    }
}

impl<T: Transport + ?Sized> Transport for &mut T {
    fn write(&mut self, data: &[u8]) -> Result<()> {
        (**self).write(data)
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<()> {
        (**self).read(buf)
    }

    fn discard_input(&mut self) -> Result<()> {
        (**self).discard_input()
    }

    fn set_dtr(&mut self, level: bool) -> Result<()> {
        (**self).set_dtr(level)
    }
}
