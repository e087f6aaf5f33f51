//! Growthsync CLI support
//!
//! Configuration loading, draft file persistence, and the status report used
//! by the `growthsync` binary.

#![warn(unreachable_pub)]

pub mod config;
pub mod draft_file;
pub mod logging;
pub mod report;

pub use config::AppConfig;
pub use report::StatusReport;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
