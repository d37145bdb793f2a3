//! tapecart-flasher - Tapecart programmer
//!
//! Reads, writes and validates a Tapecart through a bridge microcontroller
//! attached to a serial port. Images are stored in the TCRT container
//! format, which carries the load information, the initial loader and the
//! flash content.

mod cli;
mod commands;
mod device;

use std::time::Duration;

use clap::Parser;
use cli::{Cli, Commands, LedState};
use tapecart_core::Session;
use tapecart_serial::SerialConfig;

fn main() {
    // Initialize logger
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    // Set log level based on verbosity
    match cli.verbose {
        0 => {} // default (info)
        1 => log::set_max_level(log::LevelFilter::Debug),
        _ => log::set_max_level(log::LevelFilter::Trace),
    }

    if let Err(e) = run(cli) {
        log::error!("{}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> commands::CmdResult {
    let config = SerialConfig {
        baud: cli.baud,
        timeout: Duration::from_millis(cli.timeout),
    };
    let mut session = Session::new(device::open_device(&cli.device, &config)?);

    match cli.command {
        // The bridge restarts anyway, so no command mode
        Commands::Reset => commands::reset::run(&mut session),
        Commands::Info => {
            let version = session.init()?;
            commands::info::run(&mut session, &version)
        }
        Commands::Led { state } => {
            session.init()?;
            commands::led::run(&mut session, state == LedState::On)
        }
        Commands::Dump { file } => {
            session.init()?;
            commands::dump::run(&mut session, &file)
        }
        Commands::Flash { file } => {
            session.init()?;
            commands::flash::run(&mut session, &file)
        }
        Commands::Validate { file } => {
            session.init()?;
            commands::validate::run(&mut session, &file)
        }
    }
}
