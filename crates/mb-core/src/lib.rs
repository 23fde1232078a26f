//! mb-core: shared types, errors, configuration, and the run context.
//!
//! This crate is the foundational dependency for the other mb-* crates,
//! providing the unified error type, codec profiles and filter chains,
//! task descriptors and outcomes, application configuration, and the
//! append-only run log that every external invocation is recorded in.

pub mod config;
pub mod context;
pub mod error;
pub mod filter;
pub mod profile;
pub mod runlog;
pub mod sweep;
pub mod task;

// Re-export the most commonly used items at the crate root.
pub use context::RunContext;
pub use error::{Error, Result};
pub use filter::{FilterChain, FilterKind, FilterValues};
pub use profile::{CodecProfile, H264Settings, Vp8Settings, Vp9Settings};
pub use runlog::RunLog;
pub use sweep::{Combinations, FilterSweep};
pub use task::{BatchReport, ChapterTask, EncodeTask, TaskOutcome, TaskReport};
