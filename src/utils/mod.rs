//! Utility modules for benchlens

pub mod command;
pub mod timing;

pub use command::{ProbeExecutor, ShellProbe, StaticProbe};
pub use timing::{format_duration, Timer};
