//! Opening the link to the bridge

use tapecart_core::Transport;
use tapecart_serial::{SerialConfig, SerialTransport};

/// Device name that selects the in-memory emulator
#[cfg(feature = "dummy")]
pub const DUMMY_DEVICE: &str = "dummy";

/// Open the bridge named by `device`
///
/// Anything but the emulator name is treated as a serial port path.
pub fn open_device(
    device: &str,
    config: &SerialConfig,
) -> Result<Box<dyn Transport>, Box<dyn std::error::Error>> {
    #[cfg(feature = "dummy")]
    if device == DUMMY_DEVICE {
        log::info!("Using in-memory Tapecart emulator");
        return Ok(Box::new(tapecart_dummy::DummyTapecart::new_default()));
    }

    let transport = SerialTransport::open(device, config)
        .map_err(|e| format!("Failed to open {}: {}", device, e))?;
    Ok(Box::new(transport))
}
