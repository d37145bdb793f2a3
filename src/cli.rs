//! CLI argument parsing

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "tapecart-flasher")]
#[command(author, version, about = "Tapecart programmer via a serial bridge", long_about = None)]
pub struct Cli {
    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Serial baud rate of the bridge
    #[arg(long, default_value_t = 115_200, global = true)]
    pub baud: u32,

    /// Serial read timeout in milliseconds
    #[arg(long, value_name = "MS", default_value_t = 3000, global = true)]
    pub timeout: u64,

    /// Serial device of the bridge (e.g. /dev/ttyACM0), or "dummy" for the
    /// built-in emulator
    pub device: String,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show bridge, device and load information
    Info,

    /// Reset the bridge and show its boot messages
    Reset,

    /// Switch the Tapecart LED
    Led {
        #[arg(value_enum)]
        state: LedState,
    },

    /// Read the Tapecart into a TCRT file
    Dump {
        /// Output TCRT file
        file: PathBuf,
    },

    /// Write a TCRT file to the Tapecart
    Flash {
        /// Input TCRT file
        file: PathBuf,
    },

    /// Compare a TCRT file against the Tapecart
    Validate {
        /// TCRT file to compare
        file: PathBuf,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum LedState {
    On,
    Off,
}
