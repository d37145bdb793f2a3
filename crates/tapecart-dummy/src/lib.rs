//! tapecart-dummy - In-memory Tapecart bridge emulator for testing
//!
//! [`DummyTapecart`] implements [`Transport`] and behaves like a bridge
//! with a Tapecart attached: it parses request frames byte by byte,
//! acknowledges bulk chunks with ENQ, checks checksums and answers with
//! response frames. Flash programming can only clear bits, so writes
//! need a prior erase just like on real hardware.

use std::collections::VecDeque;
use std::io;
use std::ops::Range;

use tapecart_core::protocol::types::{
    BoardType, BridgeVersion, DeviceInfo, DeviceSizes, InitialLoader, LoadInfo, WRITE_FLASH_SIZE,
};
use tapecart_core::protocol::{
    checksum, u24_to_u32, BridgeCommand, Command, CommandResult, RequestHeader,
    ResponseHeader, TapecartCommand, CHUNK_SIZE, DEBUG_END, DEBUG_MARKER, ENQ, MAX_TRANSFER,
    REQUEST_HEADER_LEN, SOH,
};
use tapecart_core::{calculate_crc32, Result, Transport};

/// Configuration for the emulated device
#[derive(Debug, Clone)]
pub struct DummyConfig {
    /// Identity string reported by ReadDeviceInfo
    pub info: String,
    /// Flash size in bytes
    pub total_size: u32,
    pub page_size: u16,
    pub erase_pages: u16,
    /// Version reported by the bridge
    pub version: BridgeVersion,
}

impl Default for DummyConfig {
    fn default() -> Self {
        Self {
            info: "Tapecart dummy".to_string(),
            total_size: 2 * 1024 * 1024,
            page_size: 256,
            erase_pages: 16,
            version: BridgeVersion {
                minor: 2,
                major: 0,
                api: 2,
                board: BoardType::Nano,
            },
        }
    }
}

impl DummyConfig {
    fn sizes(&self) -> DeviceSizes {
        DeviceSizes {
            total_size: self.total_size,
            page_size: self.page_size,
            erase_pages: self.erase_pages,
        }
    }
}

/// Receive state of the frame parser
enum Rx {
    Header(Vec<u8>),
    Payload(RequestHeader, Vec<u8>),
    Checksum(RequestHeader, Vec<u8>),
}

/// Emulated bridge plus Tapecart
pub struct DummyTapecart {
    config: DummyConfig,
    flash: Vec<u8>,
    loader: InitialLoader,
    loadinfo: LoadInfo,
    led: bool,
    command_mode: bool,
    dtr: bool,
    rx: Rx,
    tx: VecDeque<u8>,
    pending_debug: Vec<u8>,
    commands: Vec<Command>,
    erases: Vec<u32>,
    fail: Option<(TapecartCommand, u8)>,
}

impl DummyTapecart {
    /// Create an emulator with erased flash
    pub fn new(config: DummyConfig) -> Self {
        let flash = vec![0xFF; config.total_size as usize];
        Self {
            config,
            flash,
            loader: InitialLoader::default(),
            loadinfo: LoadInfo::default(),
            led: false,
            command_mode: false,
            dtr: true,
            rx: Rx::Header(Vec::new()),
            tx: VecDeque::new(),
            pending_debug: Vec::new(),
            commands: Vec::new(),
            erases: Vec::new(),
            fail: None,
        }
    }

    pub fn new_default() -> Self {
        Self::new(DummyConfig::default())
    }

    /// Create an emulator with pre-filled flash
    pub fn with_data(config: DummyConfig, initial_data: &[u8]) -> Self {
        let mut dev = Self::new(config);
        let len = initial_data.len().min(dev.flash.len());
        dev.flash[..len].copy_from_slice(&initial_data[..len]);
        dev
    }

    pub fn config(&self) -> &DummyConfig {
        &self.config
    }

    pub fn flash(&self) -> &[u8] {
        &self.flash
    }

    pub fn flash_mut(&mut self) -> &mut [u8] {
        &mut self.flash
    }

    pub fn loader(&self) -> &InitialLoader {
        &self.loader
    }

    pub fn set_loader(&mut self, loader: InitialLoader) {
        self.loader = loader;
    }

    pub fn loadinfo(&self) -> &LoadInfo {
        &self.loadinfo
    }

    pub fn set_loadinfo(&mut self, loadinfo: LoadInfo) {
        self.loadinfo = loadinfo;
    }

    pub fn led(&self) -> bool {
        self.led
    }

    /// Every command answered so far, in order
    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    /// Addresses of all successful EraseFlashBlock commands
    pub fn erases(&self) -> &[u32] {
        &self.erases
    }

    /// Emit a debug text line in front of the next response
    pub fn inject_debug(&mut self, text: &str) {
        self.pending_debug.push(DEBUG_MARKER);
        self.pending_debug.extend_from_slice(text.as_bytes());
        self.pending_debug.push(DEBUG_END);
    }

    /// Answer the next `command` with result `code`
    pub fn fail_next(&mut self, command: TapecartCommand, code: u8) {
        self.fail = Some((command, code));
    }

    fn feed(&mut self, byte: u8) {
        let rx = std::mem::replace(&mut self.rx, Rx::Header(Vec::new()));
        self.rx = match rx {
            Rx::Header(buf) if buf.is_empty() && byte != SOH => {
                log::warn!("dummy: ignoring byte 0x{:02X} outside of a frame", byte);
                Rx::Header(buf)
            }
            Rx::Header(mut buf) => {
                buf.push(byte);
                if buf.len() < REQUEST_HEADER_LEN {
                    Rx::Header(buf)
                } else {
                    let header = RequestHeader {
                        group: buf[1],
                        command: buf[2],
                        length: u16::from_le_bytes([buf[3], buf[4]]),
                    };
                    if header.length == 0 {
                        Rx::Checksum(header, Vec::new())
                    } else {
                        Rx::Payload(header, Vec::with_capacity(header.length as usize))
                    }
                }
            }
            Rx::Payload(header, mut payload) => {
                payload.push(byte);
                let length = header.length as usize;
                if length > CHUNK_SIZE && (payload.len() % CHUNK_SIZE == 0 || payload.len() == length)
                {
                    self.tx.push_back(ENQ);
                }
                if payload.len() == length {
                    Rx::Checksum(header, payload)
                } else {
                    Rx::Payload(header, payload)
                }
            }
            Rx::Checksum(header, payload) => {
                let header_bytes = header.to_bytes();
                if checksum(&header_bytes[1..], &payload) == byte {
                    self.dispatch(header, &payload);
                } else {
                    log::warn!("dummy: checksum error");
                    self.respond(
                        header.group,
                        header.command,
                        CommandResult::ChecksumError,
                        &[],
                    );
                }
                Rx::Header(Vec::new())
            }
        };
    }

    fn respond(&mut self, group: u8, command: u8, result: CommandResult, payload: &[u8]) {
        self.tx.extend(self.pending_debug.drain(..));

        let header = ResponseHeader {
            group,
            command,
            result: result.code(),
            length: payload.len() as u16,
        }
        .to_bytes();
        self.tx.extend(header);
        self.tx.extend(payload.iter().copied());
        self.tx.push_back(checksum(&header[1..], payload));
    }

    fn dispatch(&mut self, header: RequestHeader, payload: &[u8]) {
        let Some(command) = Command::from_wire(header.group, header.command) else {
            self.respond(
                header.group,
                header.command,
                CommandResult::NotImplemented,
                &[],
            );
            return;
        };
        self.commands.push(command);

        let reply = match command {
            Command::Bridge(c) => self.bridge_command(c),
            Command::Tapecart(_) if !self.command_mode => Err(CommandResult::Error),
            Command::Tapecart(c) => match self.fail.take() {
                Some((failing, code)) if failing == c => Err(CommandResult::from_u8(code)),
                other => {
                    self.fail = other;
                    self.tapecart_command(c, payload)
                }
            },
        };

        match reply {
            Ok(data) => self.respond(header.group, header.command, CommandResult::Ok, &data),
            Err(result) => self.respond(header.group, header.command, result, &[]),
        }
    }

    fn bridge_command(
        &mut self,
        command: BridgeCommand,
    ) -> std::result::Result<Vec<u8>, CommandResult> {
        match command {
            BridgeCommand::Version => Ok(self.config.version.to_bytes().to_vec()),
            BridgeCommand::StartCommandMode => {
                self.command_mode = true;
                Ok(Vec::new())
            }
        }
    }

    fn flash_range(
        &self,
        address: u32,
        length: usize,
    ) -> std::result::Result<Range<usize>, CommandResult> {
        let start = address as usize;
        let end = start + length;
        if end > self.flash.len() {
            return Err(CommandResult::Error);
        }
        Ok(start..end)
    }

    fn tapecart_command(
        &mut self,
        command: TapecartCommand,
        payload: &[u8],
    ) -> std::result::Result<Vec<u8>, CommandResult> {
        let expect_len = |len: usize| {
            if payload.len() == len {
                Ok(())
            } else {
                Err(CommandResult::Error)
            }
        };

        match command {
            TapecartCommand::ReadDeviceInfo => {
                let mut info = self.config.info.as_bytes().to_vec();
                info.truncate(DeviceInfo::MAX_LEN);
                Ok(info)
            }
            TapecartCommand::ReadDeviceSizes => Ok(self.config.sizes().to_bytes().to_vec()),
            TapecartCommand::ReadLoader => Ok(self.loader.as_bytes().to_vec()),
            TapecartCommand::WriteLoader => {
                expect_len(InitialLoader::SIZE)?;
                self.loader.0.copy_from_slice(payload);
                Ok(Vec::new())
            }
            TapecartCommand::ReadLoadinfo => Ok(self.loadinfo.to_bytes().to_vec()),
            TapecartCommand::WriteLoadinfo => {
                expect_len(LoadInfo::SIZE)?;
                let mut buf = [0u8; LoadInfo::SIZE];
                buf.copy_from_slice(payload);
                self.loadinfo = LoadInfo::from_bytes(&buf);
                Ok(Vec::new())
            }
            TapecartCommand::ReadFlash => {
                expect_len(5)?;
                let length = u16::from_le_bytes([payload[3], payload[4]]) as usize;
                if length > MAX_TRANSFER {
                    return Err(CommandResult::Error);
                }
                let range = self.flash_range(u24_to_u32(payload), length)?;
                Ok(self.flash[range].to_vec())
            }
            TapecartCommand::WriteFlash => {
                expect_len(WRITE_FLASH_SIZE)?;
                let length = u16::from_le_bytes([payload[3], payload[4]]) as usize;
                if length > MAX_TRANSFER {
                    return Err(CommandResult::Error);
                }
                let range = self.flash_range(u24_to_u32(payload), length)?;
                for (cell, &byte) in self.flash[range].iter_mut().zip(&payload[5..5 + length]) {
                    *cell &= byte;
                }
                Ok(Vec::new())
            }
            TapecartCommand::EraseFlashBlock => {
                expect_len(3)?;
                let block = self.config.sizes().erase_block_size();
                let address = u24_to_u32(payload);
                if block == 0 || address % block != 0 {
                    return Err(CommandResult::Error);
                }
                let range = self.flash_range(address, block as usize)?;
                self.flash[range].fill(0xFF);
                self.erases.push(address);
                Ok(Vec::new())
            }
            TapecartCommand::Crc32Flash => {
                expect_len(6)?;
                let length = u24_to_u32(&payload[3..6]) as usize;
                let range = self.flash_range(u24_to_u32(payload), length)?;
                Ok(calculate_crc32(&self.flash[range]).to_le_bytes().to_vec())
            }
            TapecartCommand::LedOn => {
                self.led = true;
                Ok(Vec::new())
            }
            TapecartCommand::LedOff => {
                self.led = false;
                Ok(Vec::new())
            }
            _ => Err(CommandResult::NotImplemented),
        }
    }

    fn reset(&mut self) {
        self.command_mode = false;
        self.led = false;
        self.rx = Rx::Header(Vec::new());
        self.tx.clear();
        self.pending_debug.clear();
    }
}

impl Transport for DummyTapecart {
    fn write(&mut self, data: &[u8]) -> Result<()> {
        for &byte in data {
            self.feed(byte);
        }
        Ok(())
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<()> {
        for b in buf.iter_mut() {
            *b = self
                .tx
                .pop_front()
                .ok_or_else(|| io::Error::new(io::ErrorKind::TimedOut, "dummy: no data"))?;
        }
        Ok(())
    }

    fn discard_input(&mut self) -> Result<()> {
        self.tx.clear();
        Ok(())
    }

    fn set_dtr(&mut self, level: bool) -> Result<()> {
        if !level {
            self.reset();
        } else if !self.dtr {
            let banner = format!(
                "{}Tapecart bridge v{}.{}{}{}API v{}{}",
                DEBUG_MARKER as char,
                self.config.version.major,
                self.config.version.minor,
                DEBUG_END as char,
                DEBUG_MARKER as char,
                self.config.version.api,
                DEBUG_END as char
            );
            self.tx.extend(banner.bytes());
        }
        self.dtr = level;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use tapecart_core::protocol::frame::Link;
    use tapecart_core::protocol::Group;
    use tapecart_core::tcrt::{TcrtHeader, HEADER_SIZE};
    use tapecart_core::workflow::{self, NoProgress, Phase, Progress};
    use tapecart_core::{Error, Mismatch, Session};

    fn small_config(total_size: u32, page_size: u16, erase_pages: u16) -> DummyConfig {
        DummyConfig {
            total_size,
            page_size,
            erase_pages,
            ..DummyConfig::default()
        }
    }

    fn pattern(len: usize) -> Vec<u8> {
        (0..len).map(|i| (i * 7 + i / 256) as u8).collect()
    }

    fn sample_loadinfo() -> LoadInfo {
        let mut filename = [0u8; 16];
        filename[..4].copy_from_slice(b"DEMO");
        LoadInfo {
            data_address: 0x0801,
            data_length: 0x0400,
            call_address: 0x080d,
            filename,
        }
    }

    fn sample_loader() -> InitialLoader {
        let mut loader = [0u8; InitialLoader::SIZE];
        for (i, b) in loader.iter_mut().enumerate() {
            *b = i as u8;
        }
        InitialLoader(loader)
    }

    fn init(dev: &mut DummyTapecart) -> Session<&mut DummyTapecart> {
        let mut session = Session::new(dev);
        session.init().unwrap();
        session
    }

    fn dump_device(dev: &mut DummyTapecart) -> Vec<u8> {
        let mut image = Vec::new();
        let mut session = init(dev);
        workflow::dump(&mut session, &mut image, &mut NoProgress).unwrap();
        image
    }

    #[derive(Default)]
    struct Recorder {
        phases: Vec<(Phase, u64)>,
        updates: Vec<u64>,
        finished: usize,
    }

    impl Progress for Recorder {
        fn start(&mut self, phase: Phase, total_bytes: u64) {
            self.phases.push((phase, total_bytes));
        }

        fn update(&mut self, done_bytes: u64) {
            self.updates.push(done_bytes);
        }

        fn finish(&mut self) {
            self.finished += 1;
        }
    }

    #[test]
    fn test_dump_flash_validate_roundtrip() {
        let mut source = DummyTapecart::with_data(small_config(512, 256, 1), &pattern(512));
        source.set_loadinfo(sample_loadinfo());
        source.set_loader(sample_loader());

        let image = dump_device(&mut source);
        assert_eq!(image.len(), HEADER_SIZE + 512);

        let mut target = DummyTapecart::new(small_config(512, 256, 1));
        {
            let mut session = init(&mut target);
            workflow::flash(&mut session, &mut Cursor::new(&image), &mut NoProgress).unwrap();
        }
        assert_eq!(target.flash(), source.flash());
        assert_eq!(target.loadinfo(), source.loadinfo());
        assert_eq!(target.loader(), source.loader());

        let mut progress = Recorder::default();
        let mut session = init(&mut target);
        let header =
            workflow::validate(&mut session, &mut Cursor::new(&image), &mut progress).unwrap();
        assert_eq!(header.flash_content_length, 512);
        assert_eq!(progress.phases, vec![(Phase::Validating, 512)]);
        assert_eq!(progress.updates, vec![256, 512]);
        assert_eq!(progress.finished, 1);
    }

    #[test]
    fn test_dump_header_marks_loader_valid() {
        let mut dev = DummyTapecart::new(small_config(256, 256, 1));
        let image = dump_device(&mut dev);
        let header = TcrtHeader::read_from(&mut Cursor::new(&image)).unwrap();
        assert!(header.loader_valid());
        assert!(header.has_valid_signature());
        assert_eq!(header.flash_content_length, 256);
    }

    #[test]
    fn test_dump_reports_progress() {
        let mut dev = DummyTapecart::new(small_config(600, 256, 1));
        let mut session = init(&mut dev);
        let mut progress = Recorder::default();
        let mut image = Vec::new();
        workflow::dump(&mut session, &mut image, &mut progress).unwrap();
        assert_eq!(progress.phases, vec![(Phase::Reading, 600)]);
        assert_eq!(progress.updates, vec![256, 512, 600]);
        assert_eq!(image.len(), HEADER_SIZE + 600);
    }

    #[test]
    fn test_flash_erases_each_block_once() {
        let data = pattern(4096);
        let header = TcrtHeader::new(sample_loadinfo(), Some(sample_loader()), 4096);
        let mut image = header.to_bytes().to_vec();
        image.extend_from_slice(&data);

        let mut dev = DummyTapecart::new(small_config(8192, 256, 4));
        dev.flash_mut()[..4096].fill(0x00);
        let mut session = init(&mut dev);
        workflow::flash(&mut session, &mut Cursor::new(&image), &mut NoProgress).unwrap();
        drop(session);

        assert_eq!(dev.erases(), &[0, 1024, 2048, 3072]);
        assert_eq!(&dev.flash()[..4096], &data[..]);
    }

    #[test]
    fn test_flash_without_erase_block_size() {
        let header = TcrtHeader::new(sample_loadinfo(), Some(sample_loader()), 512);
        let mut image = header.to_bytes().to_vec();
        image.extend_from_slice(&pattern(512));

        let mut dev = DummyTapecart::new(small_config(512, 256, 0));
        let mut session = init(&mut dev);
        workflow::flash(&mut session, &mut Cursor::new(&image), &mut NoProgress).unwrap();
        drop(session);

        assert!(dev.erases().is_empty());
        assert!(!dev
            .commands()
            .contains(&Command::Tapecart(TapecartCommand::EraseFlashBlock)));
    }

    #[test]
    fn test_loader_skipped_when_not_valid() {
        let header = TcrtHeader::new(sample_loadinfo(), None, 256);
        let mut image = header.to_bytes().to_vec();
        image.extend_from_slice(&pattern(256));

        let mut dev = DummyTapecart::new(small_config(256, 256, 1));
        dev.set_loader(sample_loader());
        {
            let mut session = init(&mut dev);
            workflow::flash(&mut session, &mut Cursor::new(&image), &mut NoProgress).unwrap();
        }
        assert!(!dev
            .commands()
            .contains(&Command::Tapecart(TapecartCommand::WriteLoader)));
        assert_eq!(dev.loader(), &sample_loader());

        // Device loader differs from the (zeroed) file loader
        let mut session = init(&mut dev);
        workflow::validate(&mut session, &mut Cursor::new(&image), &mut NoProgress).unwrap();
    }

    #[test]
    fn test_validate_detects_loader_difference() {
        let mut dev = DummyTapecart::with_data(small_config(256, 256, 1), &pattern(256));
        dev.set_loadinfo(sample_loadinfo());
        dev.set_loader(sample_loader());
        let image = dump_device(&mut dev);

        dev.set_loader(InitialLoader::default());
        let mut session = init(&mut dev);
        let err = workflow::validate(&mut session, &mut Cursor::new(&image), &mut NoProgress);
        assert!(matches!(err, Err(Error::Mismatch(Mismatch::Loader))));
    }

    #[test]
    fn test_validate_detects_loadinfo_difference() {
        let mut dev = DummyTapecart::new(small_config(256, 256, 1));
        let image = dump_device(&mut dev);

        dev.set_loadinfo(sample_loadinfo());
        let mut session = init(&mut dev);
        let err = workflow::validate(&mut session, &mut Cursor::new(&image), &mut NoProgress);
        assert!(matches!(err, Err(Error::Mismatch(Mismatch::Loadinfo))));
    }

    #[test]
    fn test_validate_detects_flash_difference() {
        let mut dev = DummyTapecart::with_data(small_config(8192, 256, 16), &pattern(8192));
        let image = dump_device(&mut dev);

        dev.flash_mut()[5000] ^= 0x01;
        let mut session = init(&mut dev);
        let err = workflow::validate(&mut session, &mut Cursor::new(&image), &mut NoProgress);
        assert!(matches!(
            err,
            Err(Error::Mismatch(Mismatch::Flash { address: 4096, .. }))
        ));
    }

    #[test]
    fn test_validate_default_chunk_without_erase_size() {
        let mut dev = DummyTapecart::with_data(small_config(8192, 256, 0), &pattern(8192));
        let image = dump_device(&mut dev);

        let mut session = init(&mut dev);
        workflow::validate(&mut session, &mut Cursor::new(&image), &mut NoProgress).unwrap();
        drop(session);

        let crc_calls = dev
            .commands()
            .iter()
            .filter(|c| **c == Command::Tapecart(TapecartCommand::Crc32Flash))
            .count();
        assert_eq!(crc_calls, 2);
    }

    #[test]
    fn test_flash_aborts_on_write_failure() {
        let header = TcrtHeader::new(sample_loadinfo(), None, 1024);
        let mut image = header.to_bytes().to_vec();
        image.extend_from_slice(&pattern(1024));

        let mut dev = DummyTapecart::new(small_config(1024, 256, 1));
        let mut session = init(&mut dev);
        session.link_mut().transport_mut().fail_next(TapecartCommand::WriteFlash, 1);
        let err = workflow::flash(&mut session, &mut Cursor::new(&image), &mut NoProgress);
        assert!(matches!(err, Err(Error::SoftFailure { .. })));
        drop(session);

        // Only the first block was erased before the failing write
        assert_eq!(dev.erases(), &[0]);
    }

    #[test]
    fn test_flash_truncated_image_is_file_error() {
        let header = TcrtHeader::new(sample_loadinfo(), None, 1024);
        let mut image = header.to_bytes().to_vec();
        image.extend_from_slice(&pattern(300));

        let mut dev = DummyTapecart::new(small_config(1024, 256, 1));
        let mut session = init(&mut dev);
        let err = workflow::flash(&mut session, &mut Cursor::new(&image), &mut NoProgress);
        assert!(matches!(err, Err(Error::File(_))));
    }

    #[test]
    fn test_hard_failure_keeps_code() {
        let mut dev = DummyTapecart::new_default();
        let mut session = init(&mut dev);
        session.link_mut().transport_mut().fail_next(TapecartCommand::ReadLoadinfo, 0x02);
        assert!(matches!(
            session.read_loadinfo(),
            Err(Error::HardFailure { code: 0x02, .. })
        ));
    }

    #[test]
    fn test_commands_need_command_mode() {
        let mut dev = DummyTapecart::new_default();
        let mut session = Session::new(&mut dev);
        assert!(matches!(
            session.device_sizes(),
            Err(Error::SoftFailure { .. })
        ));
    }

    #[test]
    fn test_debug_text_between_frames() {
        let mut dev = DummyTapecart::with_data(small_config(1024, 256, 4), &pattern(1024));
        let mut session = init(&mut dev);
        session.link_mut().transport_mut().inject_debug("flash busy \x01\x05*");
        let data = session.read_flash(256, 16).unwrap();
        assert_eq!(data, pattern(1024)[256..272].to_vec());
        assert_eq!(session.link_mut().debug_lines(), 1);
    }

    #[test]
    fn test_info_and_led() {
        let mut dev = DummyTapecart::new_default();
        {
            let mut session = init(&mut dev);
            assert_eq!(session.device_info().unwrap().name, "Tapecart dummy");
            let sizes = session.device_sizes().unwrap();
            assert_eq!(sizes.total_size, 2 * 1024 * 1024);
            assert_eq!(sizes.erase_block_size(), 4096);
            session.set_led(true).unwrap();
        }
        assert!(dev.led());
    }

    #[test]
    fn test_emulator_rejects_bad_checksum() {
        let mut dev = DummyTapecart::new_default();
        let cmd = Command::Bridge(BridgeCommand::Version);
        dev.write(&[SOH, Group::Bridge as u8, 0x01, 0x00, 0x00, 0xEE]).unwrap();

        let mut link = Link::new(&mut dev);
        assert!(matches!(
            link.receive_frame(cmd, 4),
            Err(Error::HardFailure { code: 0x03, .. })
        ));
    }

    #[test]
    fn test_bulk_write_acknowledged_per_chunk() {
        let mut dev = DummyTapecart::new_default();
        let header = RequestHeader::new(TapecartCommand::WriteLoader.into(), 171).to_bytes();
        dev.write(&header).unwrap();
        dev.write(&[0u8; 32]).unwrap();
        assert_eq!(dev.tx.iter().copied().collect::<Vec<_>>(), vec![ENQ]);
        dev.write(&[0u8; 32 * 4]).unwrap();
        assert_eq!(dev.tx.len(), 5);
        dev.write(&[0u8; 11]).unwrap();
        assert_eq!(dev.tx.len(), 6);
    }

    #[test]
    fn test_reset_drains_boot_banner() {
        let mut dev = DummyTapecart::new_default();
        let mut session = init(&mut dev);
        assert_eq!(session.reset_bridge().unwrap(), 2);
        // Command mode is gone after a reset
        assert!(session.device_sizes().is_err());
    }
}
