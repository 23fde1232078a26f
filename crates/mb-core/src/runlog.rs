//! Append-only audit log of external tool invocations.
//!
//! Every line is `<RFC 3339 timestamp> [<operation>] <text>`. The file is
//! opened in append mode and never truncated or rotated.

use std::fmt::Display;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{SecondsFormat, Utc};
use parking_lot::Mutex;

use crate::Result;

/// Handle to the run log file.
#[derive(Debug)]
pub struct RunLog {
    path: PathBuf,
    file: Mutex<File>,
}

impl RunLog {
    /// Open (creating if needed) the log file for appending.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        Ok(Self {
            path,
            file: Mutex::new(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Record the fully expanded command line about to be run.
    pub fn command(&self, operation: &str, command: &dyn Display) -> Result<()> {
        tracing::info!(operation, "running: {command}");
        self.append(operation, &format!("command: {command}"))
    }

    /// Record how long an operation took, in minutes.
    pub fn runtime(&self, operation: &str, elapsed: Duration) -> Result<()> {
        let minutes = elapsed.as_secs_f64() / 60.0;
        tracing::info!(operation, "runtime: {minutes:.3} min");
        self.append(operation, &format!("runtime: {minutes:.3} [min]"))
    }

    /// Record a free-text note (probe failures, skipped passes).
    pub fn note(&self, operation: &str, text: &str) -> Result<()> {
        tracing::warn!(operation, "{text}");
        self.append(operation, text)
    }

    fn append(&self, operation: &str, text: &str) -> Result<()> {
        let ts = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);
        let mut file = self.file.lock();
        writeln!(file, "{ts} [{operation}] {text}")?;
        file.flush()?;
        Ok(())
    }
}
