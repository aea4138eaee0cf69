//! Side-channel log of keys that a secondary file introduced on its own.
//!
//! Notes are held in memory and written by [`AnomalyLog::persist`] once every
//! input has been merged, so a failed run leaves no partial log. A clean
//! merge leaves no `anomalies.log` behind.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::Local;
use tracing::debug;

use crate::error::Result;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug)]
pub struct AnomalyLog {
    path: PathBuf,
    lines: Vec<String>,
}

impl AnomalyLog {
    /// Starts a fresh log at `path`, deleting whatever a previous run left there.
    pub fn create(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if path.exists() {
            fs::remove_file(&path)?;
        }
        Ok(Self {
            path,
            lines: Vec::new(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of notes recorded so far.
    pub fn notes(&self) -> usize {
        self.lines.len()
    }

    /// Records `<timestamp> <message>`, stamped now.
    pub fn note(&mut self, message: &str) {
        debug!(anomaly = message, "Key introduced by a secondary file");
        self.lines
            .push(format!("{} {}\n", Local::now().format(TIMESTAMP_FORMAT), message));
    }

    /// Writes every recorded note. Does nothing when there are none.
    pub fn persist(&self) -> Result<()> {
        if self.lines.is_empty() {
            return Ok(());
        }
        fs::write(&self.path, self.lines.concat())?;
        Ok(())
    }
}
