//! Process runner seam and the logged, timed invocation helper.
//!
//! Drivers never spawn processes directly; they go through a [`ToolRunner`]
//! so the split and encode loops can be exercised against a recording
//! runner in tests.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use mb_core::RunContext;

use crate::command::{ToolCommand, ToolExit, ToolOutput};

/// Executes built commands.
#[async_trait]
pub trait ToolRunner: Send + Sync {
    /// Run to completion with inherited stdio.
    async fn run(&self, cmd: &ToolCommand) -> mb_core::Result<ToolExit>;

    /// Run to completion capturing stdout and stderr.
    async fn capture(&self, cmd: &ToolCommand) -> mb_core::Result<ToolOutput>;
}

/// Runner that spawns real child processes.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

#[async_trait]
impl ToolRunner for SystemRunner {
    async fn run(&self, cmd: &ToolCommand) -> mb_core::Result<ToolExit> {
        cmd.status().await
    }

    async fn capture(&self, cmd: &ToolCommand) -> mb_core::Result<ToolOutput> {
        cmd.output().await
    }
}

/// Log `cmd`, run it in the context's working directory, and log its
/// wall-clock runtime under `operation`.
pub async fn run_logged(
    ctx: &RunContext,
    runner: &dyn ToolRunner,
    operation: &str,
    cmd: &ToolCommand,
) -> mb_core::Result<(ToolExit, Duration)> {
    let mut cmd = cmd.clone();
    cmd.current_dir(ctx.workdir());

    ctx.log().command(operation, &cmd)?;
    let started = Instant::now();
    let exit = runner.run(&cmd).await?;
    let elapsed = started.elapsed();
    ctx.log().runtime(operation, elapsed)?;

    if !exit.success() {
        tracing::warn!(operation, code = ?exit.code, "{} exited unsuccessfully", cmd.program().display());
    }

    Ok((exit, elapsed))
}


#[cfg(test)]
mod tests {
    use super::testing::RecordingRunner;
    use super::*;
    use std::path::{Path, PathBuf};

    #[tokio::test]
    async fn run_logged_writes_command_then_runtime() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = RunContext::new(dir.path(), Path::new("run.log")).unwrap();
        let runner = RecordingRunner::new();

        let mut cmd = ToolCommand::new(PathBuf::from("ffmpeg"));
        cmd.args(["-i", "a.avi", "a.webm"]);
        let (exit, _) = run_logged(&ctx, &runner, "vp8", &cmd).await.unwrap();
        assert!(exit.success());

        let log = std::fs::read_to_string(dir.path().join("run.log")).unwrap();
        let lines: Vec<&str> = log.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("[vp8] command: ffmpeg -i a.avi a.webm"));
        assert!(lines[1].contains("[vp8] runtime: "));
        assert!(lines[1].ends_with("[min]"));
    }

    #[tokio::test]
    async fn run_logged_reports_failure_exit() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = RunContext::new(dir.path(), Path::new("run.log")).unwrap();
        let runner = RecordingRunner::new();
        runner.push_exits(&[2]);

        let cmd = ToolCommand::new(PathBuf::from("mplayer"));
        let (exit, _) = run_logged(&ctx, &runner, "split", &cmd).await.unwrap();
        assert_eq!(exit.code, Some(2));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn system_runner_runs_real_process() {
        let cmd = ToolCommand::new(PathBuf::from("true"));
        let exit = SystemRunner.run(&cmd).await.unwrap();
        assert!(exit.success());
    }
}
