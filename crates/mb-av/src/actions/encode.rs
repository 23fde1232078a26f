//! VP8 / two-pass VP9 / H.264 encoding with ffmpeg.

use std::path::{Path, PathBuf};

use mb_core::profile::{H264Settings, Vp8Settings, Vp9Settings};
use mb_core::{
    BatchReport, CodecProfile, EncodeTask, FilterSweep, RunContext, TaskOutcome, TaskReport,
};

use crate::command::ToolCommand;
use crate::runner::{run_logged, ToolRunner};
use crate::workdir::{null_sink, remove_pass_logs};

/// Commands for one encode, in execution order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EncodePlan {
    OnePass(ToolCommand),
    /// `second` may only start after `first` exited successfully.
    TwoPass {
        first: ToolCommand,
        second: ToolCommand,
    },
}

/// Default output path: `<input dir>/<stem><profile suffix>.<container>`.
pub fn derive_output(input: &Path, profile: &CodecProfile) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string());
    input.with_file_name(format!(
        "{stem}{}.{}",
        profile.output_suffix(),
        profile.container()
    ))
}

/// Build an [`EncodeTask`], deriving the output path when none is given.
pub fn encode_task(input: &Path, output: Option<PathBuf>, profile: CodecProfile) -> EncodeTask {
    let output = output.unwrap_or_else(|| derive_output(input, &profile));
    EncodeTask {
        input: input.to_path_buf(),
        output,
        profile,
    }
}

fn push_filters(cmd: &mut ToolCommand, profile: &CodecProfile) {
    if let Some(chain) = profile.filters().expression() {
        cmd.arg("-vf");
        cmd.arg(chain);
    }
}

fn vp8_command(ffmpeg: &Path, task: &EncodeTask, s: &Vp8Settings) -> ToolCommand {
    let mut cmd = ToolCommand::new(ffmpeg.to_path_buf());
    cmd.args(["-y", "-i"]);
    cmd.path_arg(&task.input);
    cmd.args(["-c:v", "libvpx", "-b:v", &s.video_bitrate]);
    push_filters(&mut cmd, &task.profile);
    cmd.args(["-c:a", "libvorbis"]);
    cmd.args(["-threads", &s.threads.to_string()]);
    cmd.path_arg(&task.output);
    cmd
}

fn h264_command(ffmpeg: &Path, task: &EncodeTask, s: &H264Settings) -> ToolCommand {
    let mut cmd = ToolCommand::new(ffmpeg.to_path_buf());
    cmd.args(["-y", "-i"]);
    cmd.path_arg(&task.input);
    cmd.args(["-c:v", "libx264"]);
    cmd.args(["-crf", &s.crf.to_string()]);
    cmd.args(["-preset", &s.preset]);
    push_filters(&mut cmd, &task.profile);
    cmd.args(["-threads", &s.threads.to_string()]);
    cmd.args(["-c:a", "aac", "-b:a", &s.audio_bitrate]);
    cmd.path_arg(&task.output);
    cmd
}

fn vp9_commands(ffmpeg: &Path, task: &EncodeTask, s: &Vp9Settings) -> (ToolCommand, ToolCommand) {
    let threads = s.threads.to_string();

    // Analysis only: fast, no audio, video discarded.
    let mut first = ToolCommand::new(ffmpeg.to_path_buf());
    first.args(["-y", "-i"]);
    first.path_arg(&task.input);
    first.args(["-c:v", "libvpx-vp9", "-pass", "1", "-b:v", &s.video_bitrate]);
    if let Some(crf) = s.crf {
        first.args(["-crf", &crf.to_string()]);
    }
    first.args(["-threads", &threads, "-speed", "4"]);
    first.args(["-tile-columns", "6", "-frame-parallel", "1"]);
    first.args(["-an", "-f", "webm", null_sink()]);

    let mut second = ToolCommand::new(ffmpeg.to_path_buf());
    second.args(["-y", "-i"]);
    second.path_arg(&task.input);
    second.args(["-c:v", "libvpx-vp9", "-pass", "2", "-g", "25", "-b:v", &s.video_bitrate]);
    if let Some(crf) = s.crf {
        second.args(["-crf", &crf.to_string()]);
    }
    push_filters(&mut second, &task.profile);
    second.args(["-threads", &threads, "-speed", &s.speed.to_string()]);
    second.args(["-tile-columns", "6", "-frame-parallel", "1"]);
    second.args(["-auto-alt-ref", "1", "-lag-in-frames", "25"]);
    second.args(["-c:a", "libopus", "-b:a", &s.audio_bitrate]);
    second.args(["-f", "webm"]);
    second.path_arg(&task.output);

    (first, second)
}

/// Validate the task's profile and build its commands.
///
/// For two-pass profiles, stale `*pass*.log` statistics are removed from
/// the working directory before the first pass is built. The run log is
/// never removed, whatever its name.
pub fn build_plan(ffmpeg: &Path, ctx: &RunContext, task: &EncodeTask) -> mb_core::Result<EncodePlan> {
    task.profile.validate()?;

    let plan = match &task.profile {
        CodecProfile::Vp8(s) => EncodePlan::OnePass(vp8_command(ffmpeg, task, s)),
        CodecProfile::H264(s) => EncodePlan::OnePass(h264_command(ffmpeg, task, s)),
        CodecProfile::Vp9(s) => {
            let workdir = ctx.workdir();
            let removed = remove_pass_logs(workdir, ctx.log().path())?;
            if removed > 0 {
                tracing::info!("removed {removed} stale pass log(s) from {}", workdir.display());
            }
            let (first, second) = vp9_commands(ffmpeg, task, s);
            EncodePlan::TwoPass { first, second }
        }
    };
    Ok(plan)
}

fn operation(profile: &CodecProfile) -> String {
    if profile.is_two_pass() {
        format!("{}_encode_2pass", profile.name())
    } else {
        format!("{}_encode", profile.name())
    }
}

/// Encode one file, waiting for every pass to finish.
pub async fn encode(
    ctx: &RunContext,
    runner: &dyn ToolRunner,
    ffmpeg: &Path,
    task: &EncodeTask,
) -> mb_core::Result<TaskReport> {
    let op = operation(&task.profile);
    tracing::info!("encoding {} ({})", task.label(), task.profile);

    let plan = build_plan(ffmpeg, ctx, task)?;
    let (outcome, elapsed) = match plan {
        EncodePlan::OnePass(cmd) => {
            let (exit, elapsed) = run_logged(ctx, runner, &op, &cmd).await?;
            let outcome = if exit.success() {
                TaskOutcome::Succeeded
            } else {
                TaskOutcome::Failed {
                    stage: "encode".into(),
                    code: exit.code,
                }
            };
            (outcome, elapsed)
        }
        EncodePlan::TwoPass { first, second } => {
            let (exit, first_elapsed) = run_logged(ctx, runner, &op, &first).await?;
            if !exit.success() {
                ctx.log().note(
                    &op,
                    &format!("pass 1 failed for {}; pass 2 skipped", task.input.display()),
                )?;
                let outcome = TaskOutcome::Failed {
                    stage: "pass 1".into(),
                    code: exit.code,
                };
                (outcome, first_elapsed)
            } else {
                let (exit, second_elapsed) = run_logged(ctx, runner, &op, &second).await?;
                let outcome = if exit.success() {
                    TaskOutcome::Succeeded
                } else {
                    TaskOutcome::Failed {
                        stage: "pass 2".into(),
                        code: exit.code,
                    }
                };
                (outcome, first_elapsed + second_elapsed)
            }
        }
    };

    Ok(TaskReport {
        label: task.label(),
        outcome,
        elapsed,
    })
}

/// Encode every task in order, one at a time, recording each outcome.
pub async fn encode_batch(
    ctx: &RunContext,
    runner: &dyn ToolRunner,
    ffmpeg: &Path,
    tasks: &[EncodeTask],
) -> mb_core::Result<BatchReport> {
    let mut report = BatchReport::default();
    for (i, task) in tasks.iter().enumerate() {
        tracing::info!("[{}/{}] {}", i + 1, tasks.len(), task.input.display());
        report.push(encode(ctx, runner, ffmpeg, task).await?);
    }
    Ok(report)
}

/// The encode tasks of a filter sweep: one per combination, each with a
/// derived output name so no result overwrites another.
pub fn sweep_tasks(input: &Path, base: &CodecProfile, sweep: &FilterSweep) -> Vec<EncodeTask> {
    sweep
        .combinations()
        .map(|values| {
            let mut profile = base.clone();
            let chain = profile.filters().with_values(values);
            *profile.filters_mut() = chain;
            encode_task(input, None, profile)
        })
        .collect()
}

/// Encode `input` once per filter combination.
///
/// # Errors
///
/// Returns [`mb_core::Error::Validation`] if any candidate list is empty.
pub async fn sweep(
    ctx: &RunContext,
    runner: &dyn ToolRunner,
    ffmpeg: &Path,
    input: &Path,
    base: &CodecProfile,
    sweep: &FilterSweep,
) -> mb_core::Result<BatchReport> {
    if sweep.is_empty() {
        return Err(mb_core::Error::Validation(
            "sweep needs at least one denoise, deband and sharpen value".into(),
        ));
    }
    let tasks = sweep_tasks(input, base, sweep);
    tracing::info!("sweeping {} filter combinations over {}", tasks.len(), input.display());
    encode_batch(ctx, runner, ffmpeg, &tasks).await
}
