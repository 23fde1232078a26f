//! Split a DVD into one stream file per chapter with mplayer.

use std::path::{Path, PathBuf};

use mb_core::{BatchReport, ChapterTask, RunContext, TaskOutcome, TaskReport};

use crate::command::ToolCommand;
use crate::probe::dvd::{dvd_device_arg, DiscProbe, DvdProber, TitleInfo};
use crate::runner::{run_logged, ToolRunner};

const OPERATION: &str = "split_dvd";

/// Where and how to dump chapters.
#[derive(Debug, Clone)]
pub struct SplitOptions {
    /// Disc mount point or `VIDEO_TS` directory.
    pub device: PathBuf,
    pub out_dir: PathBuf,
    /// Dump file extension, without the dot.
    pub extension: String,
}

/// One task per chapter, in title then chapter order.
pub fn chapter_tasks(titles: &[TitleInfo], out_dir: &Path, extension: &str) -> Vec<ChapterTask> {
    titles
        .iter()
        .flat_map(|t| {
            (1..=t.chapters).map(move |chapter| ChapterTask {
                title: t.index,
                chapter,
                output: out_dir.join(ChapterTask::file_name(t.index, chapter, extension)),
            })
        })
        .collect()
}

/// `mplayer -dvd-device <disc>/ dvd://<t>-<t> -chapter <c>-<c> -dumpstream -dumpfile <out>`
pub fn extraction_command(mplayer: &Path, device: &Path, task: &ChapterTask) -> ToolCommand {
    let mut cmd = ToolCommand::new(mplayer.to_path_buf());
    cmd.arg("-dvd-device");
    cmd.arg(dvd_device_arg(device));
    cmd.arg(format!("dvd://{0}-{0}", task.title));
    cmd.arg("-chapter");
    cmd.arg(format!("{0}-{0}", task.chapter));
    cmd.args(["-dumpstream", "-dumpfile"]);
    cmd.path_arg(&task.output);
    cmd
}

/// Probe the disc and dump every chapter of every title, one at a time.
///
/// The drive is an exclusive resource so extraction is strictly sequential.
/// A chapter whose dump fails is recorded in the report and the loop moves
/// on.
///
/// # Errors
///
/// Returns [`mb_core::Error::Probe`] when the disc layout cannot be read;
/// no extraction is attempted in that case.
pub async fn split_disc(
    ctx: &RunContext,
    runner: &dyn ToolRunner,
    mplayer: &Path,
    opts: &SplitOptions,
) -> mb_core::Result<BatchReport> {
    let prober = DvdProber::new(mplayer.to_path_buf());
    let probe = match prober.probe(runner, &opts.device).await {
        Ok(p) => p,
        Err(e) => {
            ctx.log().note(OPERATION, &format!("{}: {e}", opts.device.display()))?;
            return Err(e);
        }
    };

    if probe == DiscProbe::Empty {
        ctx.log()
            .note(OPERATION, &format!("{}: disc has no titles", opts.device.display()))?;
        return Ok(BatchReport::default());
    }

    std::fs::create_dir_all(&opts.out_dir)?;
    tracing::info!(
        "extracting {} chapters from {} titles on {}",
        probe.chapter_count(),
        probe.titles().len(),
        opts.device.display()
    );
    let tasks = chapter_tasks(probe.titles(), &opts.out_dir, &opts.extension);

    let mut report = BatchReport::default();
    for task in &tasks {
        let cmd = extraction_command(mplayer, &opts.device, task);
        tracing::info!("processing {}", task.label());
        let (exit, elapsed) = run_logged(ctx, runner, OPERATION, &cmd).await?;

        let outcome = if exit.success() {
            tracing::info!("extracted {}", task.output.display());
            TaskOutcome::Succeeded
        } else {
            TaskOutcome::Failed {
                stage: "extract".into(),
                code: exit.code,
            }
        };
        report.push(TaskReport {
            label: task.label(),
            outcome,
            elapsed,
        });
    }

    Ok(report)
}
