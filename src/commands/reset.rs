//! Reset command implementation

use tapecart_core::{Session, Transport};

use super::CmdResult;

/// Pulse DTR to restart the bridge, then log what it prints while booting
pub fn run<T: Transport>(session: &mut Session<T>) -> CmdResult {
    println!("Resetting bridge");
    let lines = session.reset_bridge()?;
    log::debug!("Bridge printed {} debug lines after reset", lines);
    Ok(())
}
