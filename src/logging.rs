//! File logging
//!
//! The terminal belongs to the game while it runs, so log records go to a
//! file instead of stderr.

use anyhow::{Context, Result};
use clap::ValueEnum;
use simplelog::{ConfigBuilder, LevelFilter, WriteLogger};
use std::fs::File;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Off => LevelFilter::Off,
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Trace => LevelFilter::Trace,
        }
    }
}

/// Route the `log` macros to `path`, truncating any previous log
pub fn init(path: &Path, level: LogLevel) -> Result<()> {
    let file =
        File::create(path).with_context(|| format!("Failed to create log file {:?}", path))?;
    let config = ConfigBuilder::new().set_target_level(LevelFilter::Off).build();

    WriteLogger::init(level.into(), config, file).context("Failed to initialize logger")?;
    Ok(())
}
