//! Typed wrappers for every bridge and Tapecart operation

use std::thread;
use std::time::Duration;

use crate::error::{Error, Result};
use crate::protocol::types::{
    encode_crc32, encode_erase_block, encode_read_flash, encode_write_flash, BridgeVersion,
    DeviceInfo, DeviceSizes, InitialLoader, LoadInfo,
};
use crate::protocol::{BridgeCommand, TapecartCommand, MAX_ADDRESS, MAX_TRANSFER, SUPPORTED_API_VERSION};
use crate::session::Session;
use crate::transport::Transport;

/// Largest range a single Crc32Flash request can cover
pub const MAX_CRC32_LENGTH: u32 = 0x00FF_FFFF;

/// How long DTR is held low to reset the bridge
const RESET_PULSE: Duration = Duration::from_millis(10);

fn check_address(address: u32) -> Result<()> {
    if address > MAX_ADDRESS {
        return Err(Error::AddressOutOfRange { address });
    }
    Ok(())
}

fn check_transfer(length: usize) -> Result<()> {
    if length > MAX_TRANSFER {
        return Err(Error::LengthOutOfRange {
            length,
            max: MAX_TRANSFER,
        });
    }
    Ok(())
}

impl<T: Transport> Session<T> {
    /// Query the bridge firmware version
    pub fn version(&mut self) -> Result<BridgeVersion> {
        let buf = self.call_fixed::<{ BridgeVersion::SIZE }>(BridgeCommand::Version.into(), &[])?;
        Ok(BridgeVersion::from_bytes(&buf))
    }

    /// Switch the Tapecart into command mode
    pub fn start_command_mode(&mut self) -> Result<()> {
        self.read_command(BridgeCommand::StartCommandMode.into(), 0)?;
        Ok(())
    }

    /// Bring up the connection
    ///
    /// 1. Query the bridge version, warning on an API mismatch
    /// 2. Put the Tapecart into command mode
    pub fn init(&mut self) -> Result<BridgeVersion> {
        let version = self.version()?;
        if version.api < SUPPORTED_API_VERSION {
            log::warn!(
                "Bridge uses old API v{}, newest supported is v{}",
                version.api,
                SUPPORTED_API_VERSION
            );
        } else if version.api > SUPPORTED_API_VERSION {
            log::warn!(
                "Bridge uses unknown API v{}, newest supported is v{}",
                version.api,
                SUPPORTED_API_VERSION
            );
        }
        log::debug!(
            "Bridge firmware v{}.{}/{} on {:?}",
            version.major,
            version.minor,
            version.api,
            version.board
        );

        self.start_command_mode()?;
        Ok(version)
    }

    /// Read the device identity string
    pub fn device_info(&mut self) -> Result<DeviceInfo> {
        let buf = self.read_command(TapecartCommand::ReadDeviceInfo.into(), DeviceInfo::MAX_LEN)?;
        Ok(DeviceInfo::from_bytes(&buf))
    }

    /// Read flash geometry
    pub fn device_sizes(&mut self) -> Result<DeviceSizes> {
        let buf = self.call_fixed::<{ DeviceSizes::SIZE }>(TapecartCommand::ReadDeviceSizes.into(), &[])?;
        Ok(DeviceSizes::from_bytes(&buf))
    }

    pub fn read_loader(&mut self) -> Result<InitialLoader> {
        let buf = self.call_fixed::<{ InitialLoader::SIZE }>(TapecartCommand::ReadLoader.into(), &[])?;
        Ok(InitialLoader(buf))
    }

    pub fn write_loader(&mut self, loader: &InitialLoader) -> Result<()> {
        self.write_command(TapecartCommand::WriteLoader.into(), loader.as_bytes())
    }

    pub fn read_loadinfo(&mut self) -> Result<LoadInfo> {
        let buf = self.call_fixed::<{ LoadInfo::SIZE }>(TapecartCommand::ReadLoadinfo.into(), &[])?;
        Ok(LoadInfo::from_bytes(&buf))
    }

    pub fn write_loadinfo(&mut self, info: &LoadInfo) -> Result<()> {
        self.write_command(TapecartCommand::WriteLoadinfo.into(), &info.to_bytes())
    }

    /// Read up to 256 bytes of flash
    pub fn read_flash(&mut self, address: u32, length: usize) -> Result<Vec<u8>> {
        check_address(address)?;
        check_transfer(length)?;

        let command = TapecartCommand::ReadFlash.into();
        let data = self.call(command, &encode_read_flash(address, length as u16), length)?;
        if data.len() != length {
            return Err(Error::ShortResponse {
                command,
                expected: length,
                actual: data.len(),
            });
        }
        Ok(data)
    }

    /// Program up to 256 bytes of flash
    ///
    /// The target range must have been erased before.
    pub fn write_flash(&mut self, address: u32, data: &[u8]) -> Result<()> {
        check_address(address)?;
        check_transfer(data.len())?;

        self.write_command(
            TapecartCommand::WriteFlash.into(),
            &encode_write_flash(address, data),
        )
    }

    /// Erase one erase block
    ///
    /// `address` has to be aligned to the erase block size, which is not
    /// checked here.
    pub fn erase_flash_block(&mut self, address: u32) -> Result<()> {
        check_address(address)?;
        self.write_command(
            TapecartCommand::EraseFlashBlock.into(),
            &encode_erase_block(address),
        )
    }

    /// Let the device compute the CRC32 of a flash range
    pub fn crc32_flash(&mut self, address: u32, length: u32) -> Result<u32> {
        check_address(address)?;
        if length > MAX_CRC32_LENGTH {
            return Err(Error::LengthOutOfRange {
                length: length as usize,
                max: MAX_CRC32_LENGTH as usize,
            });
        }

        let buf = self.call_fixed::<4>(TapecartCommand::Crc32Flash.into(), &encode_crc32(address, length))?;
        Ok(u32::from_le_bytes(buf))
    }

    pub fn set_led(&mut self, on: bool) -> Result<()> {
        let command = if on {
            TapecartCommand::LedOn
        } else {
            TapecartCommand::LedOff
        };
        self.read_command(command.into(), 0)?;
        Ok(())
    }

    /// Reset the bridge by pulsing DTR and log its boot messages
    ///
    /// Returns the number of debug lines printed by the bridge.
    pub fn reset_bridge(&mut self) -> Result<usize> {
        let link = self.link_mut();
        link.transport_mut().set_dtr(false)?;
        thread::sleep(RESET_PULSE);
        link.transport_mut().set_dtr(true)?;
        Ok(link.drain_debug_output())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::frame::tests::{response, Event, ScriptedTransport};
    use crate::protocol::Command;

    fn session_with(input: Vec<u8>) -> Session<ScriptedTransport> {
        Session::new(ScriptedTransport::with_input(&input))
    }

    fn assert_no_traffic(session: Session<ScriptedTransport>) {
        assert!(session.into_inner().events.is_empty());
    }

    #[test]
    fn test_read_flash_rejects_bad_address() {
        let mut session = session_with(vec![]);
        assert!(matches!(
            session.read_flash(0x0100_0000, 16),
            Err(Error::AddressOutOfRange {
                address: 0x0100_0000
            })
        ));
        assert_no_traffic(session);
    }

    #[test]
    fn test_read_flash_rejects_long_read() {
        let mut session = session_with(vec![]);
        assert!(matches!(
            session.read_flash(0, 257),
            Err(Error::LengthOutOfRange { length: 257, .. })
        ));
        assert_no_traffic(session);
    }

    #[test]
    fn test_crc32_and_erase_reject_bad_address() {
        let mut session = session_with(vec![]);
        assert!(session.crc32_flash(0x0100_0000, 4096).is_err());
        assert!(session.erase_flash_block(0x0100_0000).is_err());
        assert!(session.crc32_flash(0, 0x0100_0000).is_err());
        assert!(session.write_flash(0x0100_0000, &[0]).is_err());
        assert_no_traffic(session);
    }

    #[test]
    fn test_read_flash_wire_format() {
        let cmd = Command::Tapecart(TapecartCommand::ReadFlash);
        let mut session = session_with(response(cmd, 0, &[0xAB; 4]));
        assert_eq!(session.read_flash(0x010203, 4).unwrap(), vec![0xAB; 4]);

        let written = session.into_inner().written();
        assert_eq!(
            &written[..10],
            &[0x01, 0x02, 0x10, 0x05, 0x00, 0x03, 0x02, 0x01, 0x04, 0x00]
        );
    }

    #[test]
    fn test_read_flash_short_data() {
        let cmd = Command::Tapecart(TapecartCommand::ReadFlash);
        let mut session = session_with(response(cmd, 0, &[0xAB; 4]));
        assert!(matches!(
            session.read_flash(0, 8),
            Err(Error::ShortResponse {
                expected: 8,
                actual: 4,
                ..
            })
        ));
    }

    #[test]
    fn test_write_flash_sends_fixed_size_request() {
        let cmd = Command::Tapecart(TapecartCommand::WriteFlash);
        let mut input = vec![crate::protocol::ENQ; 9];
        input.extend_from_slice(&response(cmd, 0, &[]));
        let mut session = session_with(input);
        session.write_flash(0x000200, &[1, 2, 3]).unwrap();

        let written = session.into_inner().written();
        // header + 261 byte request + checksum
        assert_eq!(written.len(), 5 + 261 + 1);
        assert_eq!(&written[3..5], &261u16.to_le_bytes());
        assert_eq!(&written[5..13], &[0x00, 0x02, 0x00, 0x03, 0x00, 1, 2, 3]);
    }

    #[test]
    fn test_device_sizes() {
        let cmd = Command::Tapecart(TapecartCommand::ReadDeviceSizes);
        let mut session = session_with(response(cmd, 0, &[0, 0, 0x20, 0, 1, 0x10, 0]));
        let sizes = session.device_sizes().unwrap();
        assert_eq!(sizes.total_size, 0x200000);
        assert_eq!(sizes.erase_block_size(), 0x1000);
    }

    #[test]
    fn test_crc32_flash() {
        let cmd = Command::Tapecart(TapecartCommand::Crc32Flash);
        let mut session = session_with(response(cmd, 0, &0xCBF43926u32.to_le_bytes()));
        assert_eq!(session.crc32_flash(0x1000, 0x1000).unwrap(), 0xCBF43926);
    }

    #[test]
    fn test_init_sends_version_then_command_mode() {
        let mut input = response(BridgeCommand::Version.into(), 0, &[0, 1, 1, 1]);
        input.extend_from_slice(&response(BridgeCommand::StartCommandMode.into(), 0, &[]));
        let mut session = session_with(input);
        let version = session.init().unwrap();
        assert_eq!(version.api, 1);

        let writes: Vec<_> = session
            .into_inner()
            .events
            .into_iter()
            .filter_map(|e| match e {
                Event::Write(d) if d.len() == 5 => Some(d[2]),
                _ => None,
            })
            .collect();
        assert_eq!(writes, vec![0x01, 0x02]);
    }

    #[test]
    fn test_device_info() {
        let cmd = Command::Tapecart(TapecartCommand::ReadDeviceInfo);
        let mut session = session_with(response(cmd, 0, b"Tapecart v1"));
        assert_eq!(session.device_info().unwrap().name, "Tapecart v1");
    }

    #[test]
    fn test_reset_unsupported_without_dtr() {
        let mut session = session_with(vec![]);
        assert!(matches!(session.reset_bridge(), Err(Error::Unsupported(_))));
    }
}
