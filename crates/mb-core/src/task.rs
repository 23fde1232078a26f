//! Task descriptors and per-task outcomes.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use crate::profile::CodecProfile;

/// One chapter of one title to dump from a disc.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChapterTask {
    /// 1-based title index.
    pub title: u32,
    /// 1-based chapter index within the title.
    pub chapter: u32,
    pub output: PathBuf,
}

impl ChapterTask {
    /// `title<NN>_chapter<NN>.<ext>`, zero-padded to two digits.
    pub fn file_name(title: u32, chapter: u32, extension: &str) -> String {
        format!("title{title:02}_chapter{chapter:02}.{extension}")
    }

    pub fn label(&self) -> String {
        format!("title {} chapter {}", self.title, self.chapter)
    }
}

/// One input file to encode with a profile.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodeTask {
    pub input: PathBuf,
    pub output: PathBuf,
    pub profile: CodecProfile,
}

impl EncodeTask {
    pub fn label(&self) -> String {
        format!("{} -> {}", self.input.display(), self.output.display())
    }
}

/// How a single task ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskOutcome {
    Succeeded,
    /// The external tool exited unsuccessfully at `stage`. `code` is `None`
    /// when the process was killed by a signal.
    Failed { stage: String, code: Option<i32> },
}

impl TaskOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Succeeded)
    }
}

impl fmt::Display for TaskOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Succeeded => write!(f, "ok"),
            Self::Failed {
                stage,
                code: Some(code),
            } => write!(f, "failed at {stage} (exit code {code})"),
            Self::Failed { stage, code: None } => {
                write!(f, "failed at {stage} (terminated by signal)")
            }
        }
    }
}

/// Outcome and wall-clock time of one task.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskReport {
    pub label: String,
    pub outcome: TaskOutcome,
    pub elapsed: Duration,
}

/// Ordered record of every task attempted in a batch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchReport {
    pub tasks: Vec<TaskReport>,
}

impl BatchReport {
    pub fn push(&mut self, report: TaskReport) {
        self.tasks.push(report);
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn succeeded(&self) -> usize {
        self.tasks.iter().filter(|t| t.outcome.is_success()).count()
    }

    pub fn failed(&self) -> usize {
        self.len() - self.succeeded()
    }

    pub fn failures(&self) -> impl Iterator<Item = &TaskReport> {
        self.tasks.iter().filter(|t| !t.outcome.is_success())
    }

    pub fn total_elapsed(&self) -> Duration {
        self.tasks.iter().map(|t| t.elapsed).sum()
    }
}
