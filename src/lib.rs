//! RevoltTUI library exports for testing

use clap::ValueEnum;
use simplelog::LevelFilter;

pub mod client;
pub mod core;
pub mod tui;

#[cfg(test)]
pub mod test_support;

/// Log verbosity selected on the command line.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    #[default]
    Debug,
    Info,
    Warn,
    Error,
    /// Only unrecoverable errors. `log` has no level above error, so this
    /// filters the same as `Error`.
    Fatal,
}

impl LogLevel {
    pub fn filter(self) -> LevelFilter {
        match self {
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Error | LogLevel::Fatal => LevelFilter::Error,
        }
    }
}
