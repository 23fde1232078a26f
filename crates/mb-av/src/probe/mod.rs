//! Probe backends that shell out to external tools.
//!
//! [`DvdProber`] recovers a disc's title and chapter layout from
//! `mplayer -identify` output.

pub mod dvd;

pub use self::dvd::{DiscProbe, DvdProber, TitleInfo};
