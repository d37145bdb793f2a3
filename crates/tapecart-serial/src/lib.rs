//! tapecart-serial - Serial port transport for the Tapecart bridge
//!
//! The bridge runs at 115200 baud, 8 data bits, two stop bits, no parity
//! and no flow control. Reads time out after three seconds by default.
//!
//! # Example
//!
//! ```no_run
//! use tapecart_serial::{SerialConfig, SerialTransport};
//! use tapecart_core::Session;
//!
//! let transport = SerialTransport::open("/dev/ttyACM0", &SerialConfig::default())?;
//! let mut session = Session::new(transport);
//! let version = session.init()?;
//! println!("Bridge API v{}", version.api);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use std::io::{self, Read, Write};
use std::thread;
use std::time::Duration;

use serialport::{ClearBuffer, DataBits, FlowControl, Parity, SerialPort, StopBits};
use tapecart_core::{Error, Result, Transport};

/// Default baud rate of the bridge firmware
pub const DEFAULT_BAUD: u32 = 115_200;
/// Default read timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(3);

/// Some USB serial drivers lose the flush unless the line settles first
const FLUSH_SETTLE: Duration = Duration::from_millis(10);

/// Serial line settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerialConfig {
    pub baud: u32,
    pub timeout: Duration,
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            baud: DEFAULT_BAUD,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

/// Serial port transport
pub struct SerialTransport {
    port: Box<dyn SerialPort>,
}

impl SerialTransport {
    /// Open and configure a serial port
    pub fn open(device: &str, config: &SerialConfig) -> Result<Self> {
        let port = serialport::new(device, config.baud)
            .data_bits(DataBits::Eight)
            .parity(Parity::None)
            .stop_bits(StopBits::Two)
            .flow_control(FlowControl::None)
            .timeout(config.timeout)
            .open()
            .map_err(|e| Error::Channel(io::Error::from(e)))?;

        log::info!("Opened serial port {} at {} baud", device, config.baud);

        Ok(Self { port })
    }

    /// Set the read timeout
    pub fn set_timeout(&mut self, timeout: Duration) -> Result<()> {
        self.port
            .set_timeout(timeout)
            .map_err(|e| Error::Channel(io::Error::from(e)))
    }
}

impl Transport for SerialTransport {
    fn write(&mut self, data: &[u8]) -> Result<()> {
        self.port.write_all(data)?;
        self.port.flush()?;
        Ok(())
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<()> {
        self.port.read_exact(buf)?;
        Ok(())
    }

    fn discard_input(&mut self) -> Result<()> {
        thread::sleep(FLUSH_SETTLE);
        self.port
            .clear(ClearBuffer::All)
            .map_err(|e| Error::Channel(io::Error::from(e)))
    }

    fn set_dtr(&mut self, level: bool) -> Result<()> {
        self.port
            .write_data_terminal_ready(level)
            .map_err(|e| Error::Channel(io::Error::from(e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SerialConfig::default();
        assert_eq!(config.baud, 115_200);
        assert_eq!(config.timeout, Duration::from_secs(3));
    }

    #[test]
    fn test_open_missing_port() {
        let result = SerialTransport::open("/dev/does-not-exist-tapecart", &SerialConfig::default());
        assert!(matches!(result, Err(Error::Channel(_))));
    }
}
