//! # mb-av
//!
//! External tool plumbing for mediabatch.
//!
//! This crate provides:
//!
//! - **Tool discovery** ([`ToolRegistry`]) -- find `mplayer` and `ffmpeg`,
//!   honouring config overrides.
//! - **Command building** ([`ToolCommand`]) -- typed argument lists that are
//!   never round-tripped through a shell string.
//! - **Process running** ([`ToolRunner`], [`SystemRunner`], [`run_logged`])
//!   -- sequential, logged, timed execution.
//! - **Disc probing** ([`probe::DvdProber`]) -- title/chapter layout from
//!   `mplayer -identify`.
//! - **Drivers** ([`actions`]) -- chapter extraction, VP8/VP9/H.264
//!   encoding, and filter sweeps.

pub mod actions;
pub mod command;
pub mod probe;
pub mod runner;
pub mod tools;
pub mod workdir;

// ---- Re-exports for convenience ----

pub use command::{ToolCommand, ToolExit, ToolOutput};
pub use probe::{DiscProbe, DvdProber, TitleInfo};
pub use runner::{run_logged, SystemRunner, ToolRunner};
pub use tools::{ToolInfo, ToolRegistry, FFMPEG, MPLAYER};

pub use actions::{encode_batch, split_disc, sweep, SplitOptions};
