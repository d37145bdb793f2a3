//! Info command implementation

use tapecart_core::{BoardType, BridgeVersion, Session, Transport};

use super::CmdResult;

fn board_name(board: BoardType) -> String {
    match board {
        BoardType::None => "none".to_string(),
        BoardType::Uno => "Arduino Uno".to_string(),
        BoardType::Nano => "Arduino Nano".to_string(),
        BoardType::Mega2560 => "Arduino Mega 2560".to_string(),
        BoardType::Unknown(v) => format!("unknown (0x{:02X})", v),
    }
}

/// Print bridge, device and load information
pub fn run<T: Transport>(session: &mut Session<T>, version: &BridgeVersion) -> CmdResult {
    println!("Bridge board: {}", board_name(version.board));
    println!(
        "Sketch version: {}.{}/{}",
        version.major, version.minor, version.api
    );

    let info = session.device_info()?;
    println!("Device: {}", info.name);

    let sizes = session.device_sizes()?;
    println!(
        "Flash size: {} bytes ({} KiB)",
        sizes.total_size,
        sizes.total_size / 1024
    );
    println!("Page size: {} bytes", sizes.page_size);
    println!(
        "Erase block: {} pages ({} bytes)",
        sizes.erase_pages,
        sizes.erase_block_size()
    );

    let loadinfo = session.read_loadinfo()?;
    println!("Data address: ${:04x}", loadinfo.data_address);
    println!("Data length: ${:04x}", loadinfo.data_length);
    println!("Call address: ${:04x}", loadinfo.call_address);
    println!("Filename: {}", loadinfo.filename_str());

    Ok(())
}
