//! Subprocess plumbing used by the installer.
//!
//! This module contains:
//!
//! - `spawn`: launches an external tool, merging its stdout and stderr into
//!   one ordered stream of [`OutputMessage`]s
//! - `spawn_detached`: fire-and-forget launch with no I/O attached
//! - [`LicenseResponder`]: answers interactive license prompts on a child's stdin

mod license;
mod runner;

pub use license::LicenseResponder;
pub use runner::{spawn, spawn_detached, LaunchError, OutputMessage, SpawnOptions, Subprocess};
