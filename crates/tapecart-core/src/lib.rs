//! tapecart-core - Host side of the Tapecart bridge protocol
//!
//! This crate talks to a Tapecart through a bridge microcontroller over a
//! byte channel (usually a serial port). It is organised in layers:
//!
//! - [`transport`]: the byte channel abstraction
//! - [`protocol`]: wire constants, payload layouts and the frame level
//!   [`Link`](protocol::frame::Link) including the debug text demultiplexer
//! - [`session`]: request/response round trips
//! - [`commands`]: typed wrappers for every bridge and Tapecart command
//! - [`tcrt`]: the TCRT image container
//! - [`workflow`]: dump, flash and validate
//!
//! # Example
//!
//! ```no_run
//! use tapecart_core::{workflow, Session, Transport};
//! # fn open() -> Box<dyn Transport> { unimplemented!() }
//!
//! let mut session = Session::new(open());
//! session.init()?;
//! let mut file = std::fs::File::create("dump.tcrt")?;
//! workflow::dump(&mut session, &mut file, &mut workflow::NoProgress)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod commands;
pub mod crc;
pub mod error;
pub mod protocol;
pub mod session;
pub mod tcrt;
pub mod transport;
pub mod workflow;

// Re-exports
pub use crc::calculate_crc32;
pub use error::{Error, ImageError, Mismatch, Result};
pub use protocol::types::{BoardType, BridgeVersion, DeviceInfo, DeviceSizes, InitialLoader, LoadInfo};
pub use session::Session;
pub use tcrt::{MiscFlags, TcrtHeader};
pub use transport::Transport;
pub use workflow::{NoProgress, Phase, Progress};
