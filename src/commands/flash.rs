//! Flash command implementation

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use tapecart_core::{workflow, Session, Transport};

use super::{CmdResult, IndicatifProgress};

/// Program a TCRT file into the Tapecart
pub fn run<T: Transport>(session: &mut Session<T>, input: &Path) -> CmdResult {
    let file =
        File::open(input).map_err(|e| format!("Failed to open {}: {}", input.display(), e))?;
    let mut reader = BufReader::new(file);

    let header = workflow::flash(session, &mut reader, &mut IndicatifProgress::new())?;

    if !header.loader_valid() {
        println!("Image has no initial loader, kept the one on the device");
    }
    println!(
        "Wrote {} bytes from {:?} to flash",
        header.flash_content_length, input
    );
    Ok(())
}
