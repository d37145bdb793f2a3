//! CLI command implementations
//!
//! Every command works on a [`Session`](tapecart_core::Session) over any
//! transport. All but `reset` expect the session to be initialised.

pub mod dump;
pub mod flash;
pub mod info;
pub mod led;
mod progress;
pub mod reset;
pub mod validate;

pub use progress::IndicatifProgress;

/// Result type of the CLI commands
pub type CmdResult = Result<(), Box<dyn std::error::Error>>;
