//! Request/response layer on top of [`Link`]
//!
//! A [`Session`] owns the link exclusively. Every call is one full round
//! trip: send the request frame, then wait for the response frame that
//! echoes the same group and command.

use crate::error::{Error, Result};
use crate::protocol::frame::Link;
use crate::protocol::Command;
use crate::transport::Transport;

/// Connection to a bridge and the Tapecart behind it
pub struct Session<T: Transport> {
    link: Link<T>,
}

impl<T: Transport> Session<T> {
    /// Wrap a transport without talking to the bridge yet
    pub fn new(transport: T) -> Self {
        Self {
            link: Link::new(transport),
        }
    }

    pub fn link_mut(&mut self) -> &mut Link<T> {
        &mut self.link
    }

    pub fn into_inner(self) -> T {
        self.link.into_inner()
    }

    /// Send `request` and return the response payload (at most `max_response` bytes)
    pub fn call(&mut self, command: Command, request: &[u8], max_response: usize) -> Result<Vec<u8>> {
        self.link.send_frame(command, request)?;
        self.link.receive_frame(command, max_response)
    }

    /// Command with an empty request and data in the response
    pub fn read_command(&mut self, command: Command, max_response: usize) -> Result<Vec<u8>> {
        self.call(command, &[], max_response)
    }

    /// Command with data in the request and an empty response
    pub fn write_command(&mut self, command: Command, request: &[u8]) -> Result<()> {
        self.call(command, request, 0)?;
        Ok(())
    }

    /// Execute a command and return the response in a fixed-size array
    pub fn call_fixed<const N: usize>(&mut self, command: Command, request: &[u8]) -> Result<[u8; N]> {
        let response = self.call(command, request, N)?;
        response
            .as_slice()
            .try_into()
            .map_err(|_| Error::ShortResponse {
                command,
                expected: N,
                actual: response.len(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::frame::tests::{response, ScriptedTransport};
    use crate::protocol::{BridgeCommand, TapecartCommand};

    #[test]
    fn test_call_roundtrip() {
        let cmd = Command::Bridge(BridgeCommand::Version);
        let mut session = Session::new(ScriptedTransport::with_input(&response(
            cmd,
            0,
            &[1, 2, 3, 4],
        )));
        let reply = session.call(cmd, &[], 4).unwrap();
        assert_eq!(reply, vec![1, 2, 3, 4]);
        assert_eq!(
            session.into_inner().written(),
            vec![0x01, 0x01, 0x01, 0x00, 0x00, 0x00]
        );
    }

    #[test]
    fn test_write_command_rejects_payload_in_ack() {
        let cmd = Command::Tapecart(TapecartCommand::EraseFlashBlock);
        let mut session = Session::new(ScriptedTransport::with_input(&response(cmd, 0, &[0])));
        assert!(matches!(
            session.write_command(cmd, &[0, 0, 0]),
            Err(Error::PayloadTooLarge { length: 1, max: 0 })
        ));
    }

    #[test]
    fn test_call_fixed_short_response() {
        let cmd = Command::Tapecart(TapecartCommand::Crc32Flash);
        let mut session = Session::new(ScriptedTransport::with_input(&response(cmd, 0, &[1, 2])));
        assert!(matches!(
            session.call_fixed::<4>(cmd, &[0; 6]),
            Err(Error::ShortResponse {
                expected: 4,
                actual: 2,
                ..
            })
        ));
    }

    #[test]
    fn test_failed_send_skips_receive() {
        let cmd = Command::Tapecart(TapecartCommand::WriteLoader);
        // Bridge answers the first chunk with garbage instead of ENQ
        let mut input = vec![0x00];
        input.extend_from_slice(&response(cmd, 0, &[]));
        let mut session = Session::new(ScriptedTransport::with_input(&input));
        assert!(matches!(
            session.write_command(cmd, &[0u8; 171]),
            Err(Error::Handshake { byte: 0x00 })
        ));
        assert!(!session.into_inner().input.is_empty());
    }
}
