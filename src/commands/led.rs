//! LED command implementation

use tapecart_core::{Session, Transport};

use super::CmdResult;

pub fn run<T: Transport>(session: &mut Session<T>, on: bool) -> CmdResult {
    session.set_led(on)?;
    println!("LED {}", if on { "on" } else { "off" });
    Ok(())
}
