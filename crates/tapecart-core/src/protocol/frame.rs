//! Frame level transport
//!
//! [`Link`] builds and parses frames on top of a [`Transport`]. Bytes that
//! arrive outside of a frame go through a [`DebugDemux`] first, which
//! strips the bridge's asynchronous debug text lines and logs them.

use super::{
    checksum, Command, CommandResult, ResponseHeader, RequestHeader, CHUNK_SIZE, DEBUG_END,
    DEBUG_MARKER, ENQ, RESPONSE_HEADER_LEN, SOH,
};
use crate::error::{Error, Result};
use crate::transport::Transport;

/// Log target used for text printed by the bridge firmware
pub const BRIDGE_LOG_TARGET: &str = "tapecart::bridge";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DemuxState {
    /// Waiting for a frame; `'*'` starts a debug line
    Normal,
    /// Inside a debug line until `'\n'`
    DebugLine,
}

/// Splits debug text lines out of the byte stream between frames
#[derive(Debug)]
pub struct DebugDemux {
    state: DemuxState,
    line: Vec<u8>,
    lines: usize,
}

impl DebugDemux {
    pub fn new() -> Self {
        Self {
            state: DemuxState::Normal,
            line: Vec::new(),
            lines: 0,
        }
    }

    /// Feed one byte. Returns the byte if it belongs to the protocol stream,
    /// `None` if it was part of a debug line.
    pub fn push(&mut self, byte: u8) -> Option<u8> {
        match self.state {
            DemuxState::Normal if byte == DEBUG_MARKER => {
                self.state = DemuxState::DebugLine;
                None
            }
            DemuxState::Normal => Some(byte),
            DemuxState::DebugLine if byte == DEBUG_END => {
                self.flush();
                None
            }
            DemuxState::DebugLine => {
                self.line.push(byte);
                None
            }
        }
    }

    /// End the current debug line, if any, and log it
    pub fn flush(&mut self) {
        if self.state == DemuxState::DebugLine {
            let text = String::from_utf8_lossy(&self.line);
            log::info!(target: BRIDGE_LOG_TARGET, "{}", text.trim_end_matches('\r'));
            self.lines += 1;
            self.line.clear();
            self.state = DemuxState::Normal;
        }
    }

    /// Whether a debug line is currently being collected
    pub fn in_debug_line(&self) -> bool {
        self.state == DemuxState::DebugLine
    }

    /// Number of complete debug lines seen so far
    pub fn lines_seen(&self) -> usize {
        self.lines
    }
}

impl Default for DebugDemux {
    fn default() -> Self {
        Self::new()
    }
}

/// Frame level connection to the bridge
pub struct Link<T: Transport> {
    transport: T,
    demux: DebugDemux,
}

impl<T: Transport> Link<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            demux: DebugDemux::new(),
        }
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    pub fn into_inner(self) -> T {
        self.transport
    }

    /// Number of debug lines received from the bridge so far
    pub fn debug_lines(&self) -> usize {
        self.demux.lines_seen()
    }

    /// Read the next byte that is not part of a debug line
    fn next_byte(&mut self) -> Result<u8> {
        loop {
            let mut b = [0u8];
            if let Err(e) = self.transport.read(&mut b) {
                self.demux.flush();
                return Err(e);
            }
            if let Some(byte) = self.demux.push(b[0]) {
                return Ok(byte);
            }
        }
    }

    /// Send one frame
    ///
    /// Payloads longer than [`CHUNK_SIZE`] are sent in chunks and the bridge
    /// must answer every chunk with ENQ before the next one goes out.
    pub fn send_frame(&mut self, command: Command, payload: &[u8]) -> Result<()> {
        let length = u16::try_from(payload.len()).map_err(|_| Error::LengthOutOfRange {
            length: payload.len(),
            max: u16::MAX as usize,
        })?;

        let header = RequestHeader::new(command, length).to_bytes();
        let sum = checksum(&header[1..], payload);

        self.discard_input()?;

        log::trace!("send {} ({} bytes)", command, payload.len());
        self.transport.write(&header)?;

        let handshake = payload.len() > CHUNK_SIZE;
        for chunk in payload.chunks(CHUNK_SIZE) {
            self.transport.write(chunk)?;
            if handshake {
                self.wait_for_enq()?;
            }
        }

        self.transport.write(&[sum])
    }

    fn wait_for_enq(&mut self) -> Result<()> {
        match self.next_byte()? {
            ENQ => Ok(()),
            byte => Err(Error::Handshake { byte }),
        }
    }

    /// Receive the response to `command`
    ///
    /// The response must echo the same group and command. Nothing is
    /// resynchronized on error; the frame is dropped and the call fails.
    pub fn receive_frame(&mut self, command: Command, max_payload: usize) -> Result<Vec<u8>> {
        let prefix = self.next_byte()?;
        if prefix != SOH {
            return Err(Error::Framing { prefix });
        }

        let mut tail = [0u8; RESPONSE_HEADER_LEN - 1];
        self.transport.read(&mut tail)?;
        let header = ResponseHeader::from_tail(&tail);

        let length = header.length as usize;
        if length > max_payload {
            return Err(Error::PayloadTooLarge {
                length,
                max: max_payload,
            });
        }

        let mut payload = vec![0u8; length];
        self.transport.read(&mut payload)?;

        let mut received = [0u8];
        self.transport.read(&mut received)?;

        let actual = checksum(&tail, &payload);
        if actual != received[0] {
            return Err(Error::Checksum {
                expected: received[0],
                actual,
            });
        }

        if header.group != command.group() as u8 || header.command != command.id() {
            return Err(Error::ResponseMismatch {
                expected_group: command.group() as u8,
                expected_command: command.id(),
                group: header.group,
                command: header.command,
            });
        }

        match CommandResult::from_u8(header.result) {
            CommandResult::Ok => {
                log::trace!("recv {} ({} bytes)", command, payload.len());
                Ok(payload)
            }
            CommandResult::Error => Err(Error::SoftFailure { command }),
            result => {
                log::error!(
                    "Command {} failed with result 0x{:02X} ({:?})",
                    command,
                    header.result,
                    result
                );
                Err(Error::HardFailure {
                    command,
                    code: header.result,
                })
            }
        }
    }

    /// Drop stale input, ending any partially received debug line
    pub fn discard_input(&mut self) -> Result<()> {
        self.demux.flush();
        self.transport.discard_input()
    }

    /// Log debug output until the channel stops delivering bytes
    ///
    /// Returns the number of debug lines seen.
    pub fn drain_debug_output(&mut self) -> usize {
        let before = self.demux.lines_seen();
        while let Ok(byte) = self.next_byte() {
            log::debug!("Ignoring stray byte 0x{:02X} from bridge", byte);
        }
        self.demux.lines_seen() - before
    }
}
