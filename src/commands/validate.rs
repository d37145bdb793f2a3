//! Validate command implementation

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use tapecart_core::{workflow, Session, Transport};

use super::{CmdResult, IndicatifProgress};

pub fn run<T: Transport>(session: &mut Session<T>, input: &Path) -> CmdResult {
    let file =
        File::open(input).map_err(|e| format!("Failed to open {}: {}", input.display(), e))?;
    let mut reader = BufReader::new(file);

    workflow::validate(session, &mut reader, &mut IndicatifProgress::new())?;

    println!("TCRT file matches Tapecart flash");
    Ok(())
}
