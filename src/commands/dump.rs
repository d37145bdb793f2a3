//! Dump command implementation

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use tapecart_core::{workflow, Session, Transport};

use super::{CmdResult, IndicatifProgress};

/// Read the whole Tapecart into a TCRT file
pub fn run<T: Transport>(session: &mut Session<T>, output: &Path) -> CmdResult {
    let file = File::create(output)
        .map_err(|e| format!("Failed to create {}: {}", output.display(), e))?;
    let mut writer = BufWriter::new(file);

    let header = workflow::dump(session, &mut writer, &mut IndicatifProgress::new())?;

    println!(
        "Wrote {} bytes of flash content to {:?} (\"{}\")",
        header.flash_content_length,
        output,
        header.loadinfo.filename_str()
    );
    Ok(())
}
