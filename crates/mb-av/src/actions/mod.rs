//! Batch drivers: DVD chapter splitting, encoding, and filter sweeps.

mod encode;
mod split;

pub use encode::{
    build_plan, derive_output, encode, encode_batch, encode_task, sweep, sweep_tasks, EncodePlan,
};
pub use split::{chapter_tasks, extraction_command, split_disc, SplitOptions};
