use std::path::PathBuf;

use anyhow::{anyhow, Result};
use log::LevelFilter;

/// Deepest parent chain we walk before assuming the window tree is broken.
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// The main user facing configuration details
#[derive(Debug, Clone)]
pub struct Config {
    /// X display to connect to. Falls back to $DISPLAY.
    pub display: Option<String>,
    /// Maximum number of windows between the active window and the root.
    pub max_depth: usize,
    /// Select StructureNotify on every frame around the active window so that
    /// moves of nested frames are reported too.
    pub watch_ancestors: bool,
    /// Log verbosity
    pub log_level: LevelFilter,
    /// Write the log to this file instead of the terminal
    pub log_file: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Config {
        Config {
            display: None,
            max_depth: DEFAULT_MAX_DEPTH,
            watch_ancestors: true,
            log_level: LevelFilter::Info,
            log_file: None,
        }
    }
}

impl Config {
    pub fn validate(&self) -> Result<()> {
        if self.max_depth == 0 {
            return Err(anyhow!("max_depth must be at least 1"));
        }
        Ok(())
    }
}
