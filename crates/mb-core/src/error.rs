//! Unified error type for mediabatch.
//!
//! Only failures that stop a batch are errors. A single chapter or file
//! whose external tool exits non-zero is reported as a
//! [`crate::TaskOutcome::Failed`] value instead.

/// Unified error type covering all batch-stopping failure modes.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// An I/O operation failed.
    #[error("IO error: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// An external tool (mplayer, ffmpeg) could not be run.
    #[error("Tool error [{tool}]: {message}")]
    Tool {
        /// Name of the tool that failed.
        tool: String,
        /// Human-readable error description.
        message: String,
    },

    /// The disc structure could not be recovered from the inspection output.
    #[error("Probe error: {0}")]
    Probe(String),

    /// Configuration or encoder parameters failed validation.
    #[error("Validation error: {0}")]
    Validation(String),
}

impl Error {
    /// Convenience constructor for [`Error::Tool`].
    pub fn tool(tool: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Tool {
            tool: tool.into(),
            message: message.into(),
        }
    }
}

/// Result alias using the crate-level [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_from_std() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file missing");
        let err = Error::from(io_err);
        assert!(matches!(err, Error::Io { .. }));
        assert!(err.to_string().contains("file missing"));
    }

    #[test]
    fn tool_display() {
        let err = Error::tool("ffmpeg", "failed to spawn: not found");
        assert_eq!(
            err.to_string(),
            "Tool error [ffmpeg]: failed to spawn: not found"
        );
    }

    #[test]
    fn probe_display() {
        let err = Error::Probe("no ID_DVD_TITLES line".into());
        assert_eq!(err.to_string(), "Probe error: no ID_DVD_TITLES line");
    }

    #[test]
    fn validation_display() {
        let err = Error::Validation("threads must be at least 1".into());
        assert_eq!(
            err.to_string(),
            "Validation error: threads must be at least 1"
        );
    }
}
