//! Integration with clap, for binaries that drive a session.
//!
//! Flatten [`Flags`] into the parser of the binary, then turn it into a
//! [`Config`] with [`Flags::apply`], which also sets up logging.
//!
//! ```rust,no_run
//! # use pistonite_arbor as arbor;
//! use clap::Parser;
//!
//! #[derive(Parser)]
//! struct Cli {
//!     #[clap(flatten)]
//!     flags: arbor::cli::Flags,
//! }
//!
//! fn main() -> std::process::ExitCode {
//!     arbor::cli::run(|| {
//!         let config = Cli::parse().flags.apply()?;
//!         let session = arbor::Session::start(config)?;
//!         session.wait()
//!     })
//! }
//! ```
use std::process::ExitCode;

use crate::logging::{self, LogSink};
use crate::{Color, Config, Print};

/// Common flags of programs showing a session
#[derive(Debug, Clone, PartialEq, clap::Args)]
pub struct Flags {
    /// Verbose. More -v makes it more verbose (opposite of --quiet)
    #[clap(short = 'v', long, action(clap::ArgAction::Count))]
    pub verbose: u8,
    /// Quiet. More -q makes it more quiet (opposite of --verbose)
    #[clap(short = 'q', long, action(clap::ArgAction::Count))]
    pub quiet: u8,
    /// Set the color mode of the progress bars
    #[clap(long)]
    pub color: Option<Color>,
    /// Draw on the main screen instead of the alternate screen
    #[clap(long)]
    pub no_alt_screen: bool,
    /// Capacity of the event queue
    #[clap(long)]
    pub capacity: Option<usize>,
}

impl Flags {
    /// Verbosity from the -v and -q counts
    pub fn print_level(&self) -> Print {
        let level = self.verbose.min(2) as i8 - self.quiet.min(2) as i8;
        level.into()
    }

    /// Set up logging, then build the config from the environment and the flags.
    /// Flags take precedence over the environment.
    pub fn apply(&self) -> crate::Result<Config> {
        let mut config = Config::from_env()?;
        let sink = match config.get_log_file() {
            Some(path) => LogSink::File(path.clone()),
            None => LogSink::Stderr,
        };
        logging::init(self.print_level(), sink)?;
        if let Some(color) = self.color {
            config = config.color(color);
        }
        if self.no_alt_screen {
            config = config.alt_screen(false);
        }
        if let Some(capacity) = self.capacity {
            config = config.capacity(capacity);
        }
        log::debug!("config: {config:?}");
        Ok(config)
    }
}

/// Run the main function of a binary, print the error if it fails
pub fn run<F: FnOnce() -> crate::Result<()>>(f: F) -> ExitCode {
    match f() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("fatal: {e:?}");
            // the logger may not be set up or may be muted
            if !log::log_enabled!(log::Level::Error) {
                eprintln!("fatal: {e:?}");
            }
            ExitCode::FAILURE
        }
    }
}
