//! Explicit per-run context handed to every component.

use std::path::{Path, PathBuf};

use crate::runlog::RunLog;
use crate::Result;

/// Working directory and log sink for one run.
///
/// External tools are started with `workdir` as their current directory, so
/// side files such as ffmpeg's two-pass statistics land there and nowhere
/// else.
#[derive(Debug)]
pub struct RunContext {
    workdir: PathBuf,
    log: RunLog,
}

impl RunContext {
    /// Build a context, opening `log_file` for appending. A relative
    /// `log_file` is resolved against `workdir`.
    pub fn new(workdir: impl Into<PathBuf>, log_file: &Path) -> Result<Self> {
        let workdir = workdir.into();
        let log_path = if log_file.is_absolute() {
            log_file.to_path_buf()
        } else {
            workdir.join(log_file)
        };
        Ok(Self {
            log: RunLog::open(log_path)?,
            workdir,
        })
    }

    pub fn workdir(&self) -> &Path {
        &self.workdir
    }

    pub fn log(&self) -> &RunLog {
        &self.log
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relative_log_file_lands_in_workdir() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = RunContext::new(dir.path(), Path::new("encodings.log")).unwrap();
        assert_eq!(ctx.workdir(), dir.path());
        assert_eq!(ctx.log().path(), dir.path().join("encodings.log"));
        assert!(dir.path().join("encodings.log").exists());
    }

    #[test]
    fn absolute_log_file_is_kept() {
        let dir = tempfile::tempdir().unwrap();
        let other = tempfile::tempdir().unwrap();
        let log = other.path().join("audit.log");
        let ctx = RunContext::new(dir.path(), &log).unwrap();
        assert_eq!(ctx.log().path(), log.as_path());
    }
}
