//! Typed argument-list builder for external tool invocations.

use std::ffi::OsString;
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use tokio::process::Command;

/// Exit information of a finished tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToolExit {
    /// Exit code, or `None` when the process was terminated by a signal.
    pub code: Option<i32>,
}

impl ToolExit {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

impl From<ExitStatus> for ToolExit {
    fn from(status: ExitStatus) -> Self {
        Self {
            code: status.code(),
        }
    }
}

/// Output captured from a tool execution.
#[derive(Debug, Clone)]
pub struct ToolOutput {
    pub exit: ToolExit,
    /// Captured standard output (lossy UTF-8).
    pub stdout: String,
    /// Captured standard error (lossy UTF-8).
    pub stderr: String,
}

/// A builder for constructing and executing external tool invocations.
///
/// Arguments are kept as a list and handed to the OS as-is; the
/// [`Display`](fmt::Display) rendering is for logs only.
///
/// # Example
///
/// ```no_run
/// use mb_av::ToolCommand;
/// use std::path::PathBuf;
///
/// # async fn example() -> mb_core::Result<()> {
/// let mut cmd = ToolCommand::new(PathBuf::from("ffmpeg"));
/// cmd.args(["-y", "-i", "in.avi", "-c:v", "libvpx", "out.webm"]);
/// let exit = cmd.status().await?;
/// println!("{}", exit.success());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolCommand {
    program: PathBuf,
    args: Vec<OsString>,
    current_dir: Option<PathBuf>,
    timeout: Option<Duration>,
}

impl ToolCommand {
    /// Create a new command for the given program path.
    pub fn new(program: PathBuf) -> Self {
        Self {
            program,
            args: Vec::new(),
            current_dir: None,
            timeout: None,
        }
    }

    /// Append a single argument.
    pub fn arg(&mut self, s: impl Into<OsString>) -> &mut Self {
        self.args.push(s.into());
        self
    }

    /// Append a path argument. The path's bytes are passed through
    /// unchanged, even when they are not valid UTF-8.
    pub fn path_arg(&mut self, p: &Path) -> &mut Self {
        self.args.push(p.as_os_str().to_owned());
        self
    }

    /// Append multiple arguments.
    pub fn args(&mut self, iter: impl IntoIterator<Item = impl Into<OsString>>) -> &mut Self {
        self.args.extend(iter.into_iter().map(Into::into));
        self
    }

    /// Run the tool with `dir` as its working directory.
    pub fn current_dir(&mut self, dir: impl Into<PathBuf>) -> &mut Self {
        self.current_dir = Some(dir.into());
        self
    }

    /// Set a maximum execution time. Without one the tool may run forever.
    pub fn timeout(&mut self, d: Duration) -> &mut Self {
        self.timeout = Some(d);
        self
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    pub fn get_args(&self) -> &[OsString] {
        &self.args
    }

    /// Value following the first occurrence of `flag`, if it is valid UTF-8.
    pub fn value_of(&self, flag: &str) -> Option<&str> {
        self.args
            .iter()
            .position(|a| a == flag)
            .and_then(|i| self.args.get(i + 1))
            .and_then(|v| v.to_str())
    }

    pub fn has_arg(&self, arg: &str) -> bool {
        self.args.iter().any(|a| a == arg)
    }

    fn program_name(&self) -> String {
        self.program
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| self.program.to_string_lossy().to_string())
    }

    fn build(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);
        if let Some(ref dir) = self.current_dir {
            cmd.current_dir(dir);
        }
        cmd.kill_on_drop(true);
        cmd
    }

    async fn wait_bounded<T>(
        &self,
        fut: impl std::future::Future<Output = std::io::Result<T>>,
    ) -> mb_core::Result<T> {
        let result = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, fut).await.map_err(|_elapsed| {
                mb_core::Error::tool(self.program_name(), format!("timed out after {limit:?}"))
            })?,
            None => fut.await,
        };
        result.map_err(|e| {
            mb_core::Error::tool(
                self.program_name(),
                format!("I/O error waiting for process: {e}"),
            )
        })
    }

    /// Run the tool with inherited stdio and wait for it to exit.
    ///
    /// A non-zero exit is returned as a [`ToolExit`], not an error.
    ///
    /// # Errors
    ///
    /// Returns [`mb_core::Error::Tool`] if the process cannot be spawned,
    /// or if it outlives a configured timeout.
    pub async fn status(&self) -> mb_core::Result<ToolExit> {
        let mut child = self
            .build()
            .stdin(Stdio::null())
            .spawn()
            .map_err(|e| mb_core::Error::tool(self.program_name(), format!("failed to spawn: {e}")))?;

        let status = self.wait_bounded(child.wait()).await?;
        Ok(status.into())
    }

    /// Run the tool capturing stdout and stderr.
    ///
    /// # Errors
    ///
    /// Same as [`ToolCommand::status`].
    pub async fn output(&self) -> mb_core::Result<ToolOutput> {
        let child = self
            .build()
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| mb_core::Error::tool(self.program_name(), format!("failed to spawn: {e}")))?;

        let output = self.wait_bounded(child.wait_with_output()).await?;
        Ok(ToolOutput {
            exit: output.status.into(),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        })
    }
}

impl fmt::Display for ToolCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", quote(&self.program.to_string_lossy()))?;
        for arg in &self.args {
            write!(f, " {}", quote(&arg.to_string_lossy()))?;
        }
        Ok(())
    }
}

/// POSIX-shell style quoting, only where needed.
fn quote(s: &str) -> String {
    let plain = !s.is_empty()
        && s.chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_./:=,+@%".contains(c));
    if plain {
        s.to_string()
    } else {
        format!("'{}'", s.replace('\'', r"'\''"))
    }
}
