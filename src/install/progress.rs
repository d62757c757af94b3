//! Progress reporting types for installation operations.
//!
//! This module provides types for tracking and reporting installation progress.
//! The [`InstallProgress`] enum represents the discrete stages of a run, which
//! are reported to the caller through a callback in this order:
//!
//! 1. one or more [`InstallProgress::Extracting`]
//! 2. one or more [`InstallProgress::InstallingPlatformTools`], only when enabled
//! 3. exactly one [`InstallProgress::Completed`]
//!
//! No event is reported after a fatal error.

use super::ExtractionMethod;
use crate::process::OutputMessage;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Progress stages during installation.
///
/// # Example
///
/// ```rust
/// use sdk_cmdline_installer::InstallProgress;
///
/// fn on_progress(progress: InstallProgress) {
///     match &progress {
///         InstallProgress::Extracting { method, output: None } => {
///             println!("Extracting with {}...", method.display_name());
///         }
///         InstallProgress::InstallingPlatformTools { output: None } => {
///             println!("Installing platform-tools...");
///         }
///         InstallProgress::Extracting { output: Some(line), .. }
///         | InstallProgress::InstallingPlatformTools { output: Some(line) } => {
///             if line.is_error {
///                 eprintln!("  {}", line.text);
///             } else {
///                 println!("  {}", line.text);
///             }
///         }
///         InstallProgress::Completed(done) => {
///             for dir in done.path_dirs() {
///                 println!("Add to PATH: {}", dir.display());
///             }
///         }
///     }
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum InstallProgress {
    /// The archive is being extracted.
    ///
    /// Reported once without output when a method starts, then once per
    /// line of output from a native tool.
    Extracting {
        /// The method doing the extraction.
        method: ExtractionMethod,
        /// A line of tool output, if this event carries one.
        output: Option<OutputMessage>,
    },

    /// `sdkmanager` is installing platform-tools.
    InstallingPlatformTools {
        /// A line of `sdkmanager` output, if this event carries one.
        output: Option<OutputMessage>,
    },

    /// Installation completed successfully.
    Completed(CompletedInstall),
}

impl InstallProgress {
    /// Get a human-readable description of the current progress stage.
    ///
    /// # Example
    ///
    /// ```rust
    /// use sdk_cmdline_installer::InstallProgress;
    ///
    /// let progress = InstallProgress::InstallingPlatformTools { output: None };
    /// assert_eq!(progress.description(), "Installing platform-tools");
    /// ```
    pub fn description(&self) -> &'static str {
        match self {
            Self::Extracting { .. } => "Extracting",
            Self::InstallingPlatformTools { .. } => "Installing platform-tools",
            Self::Completed(_) => "Installation complete",
        }
    }

    /// Check if this progress stage indicates completion.
    pub fn is_complete(&self) -> bool {
        matches!(self, Self::Completed(_))
    }

    /// The subprocess output carried by this event, if any.
    pub fn output(&self) -> Option<&OutputMessage> {
        match self {
            Self::Extracting { output, .. } | Self::InstallingPlatformTools { output } => {
                output.as_ref()
            }
            Self::Completed(_) => None,
        }
    }
}

/// The outcome of a successful installation.
///
/// `path_entries` are relative to `install_root`, each given as a list of
/// path segments so they can be joined on any platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletedInstall {
    /// The SDK root everything was installed into.
    pub install_root: PathBuf,

    /// Directories to add to the executable search path, in order.
    ///
    /// Always starts with `cmdline-tools/latest/bin`; `platform-tools`
    /// follows if it was installed.
    pub path_entries: Vec<Vec<String>>,
}

impl CompletedInstall {
    /// Absolute directories to add to `PATH`, in order.
    ///
    /// # Example
    ///
    /// ```rust
    /// use sdk_cmdline_installer::CompletedInstall;
    /// use std::path::PathBuf;
    ///
    /// let done = CompletedInstall {
    ///     install_root: PathBuf::from("/opt/android-sdk"),
    ///     path_entries: vec![vec!["platform-tools".to_string()]],
    /// };
    /// assert_eq!(done.path_dirs(), vec![PathBuf::from("/opt/android-sdk/platform-tools")]);
    /// ```
    pub fn path_dirs(&self) -> Vec<PathBuf> {
        self.path_entries
            .iter()
            .map(|segments| resolve(&self.install_root, segments))
            .collect()
    }
}

fn resolve(root: &Path, segments: &[String]) -> PathBuf {
    segments
        .iter()
        .fold(root.to_path_buf(), |path, segment| path.join(segment))
}
