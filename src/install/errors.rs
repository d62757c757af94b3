//! Error types for installation operations.
//!
//! This module defines the errors that can abort an installation run. Each
//! variant names the stage that failed and carries an actionable fix
//! suggestion. None of them are retried, and files left behind by the failed
//! stage are not cleaned up.

use super::ExtractionMethod;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during installation.
///
/// Each variant includes contextual information about what went wrong and
/// a `fix` field with an actionable suggestion for resolving the issue.
///
/// # Example
///
/// ```rust
/// use sdk_cmdline_installer::InstallError;
///
/// fn handle_error(error: InstallError) {
///     eprintln!("Installation failed: {}", error);
///     eprintln!("To fix: {}", error.fix_suggestion());
/// }
/// ```
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum InstallError {
    /// The host OS is not macOS, Linux or Windows.
    #[error("Platform not supported: {os}")]
    UnsupportedPlatform {
        /// The OS identifier of the host.
        os: String,
        /// Actionable suggestion for resolving the issue.
        fix: String,
    },

    /// A native extraction tool started but exited unsuccessfully.
    ///
    /// The extraction chain does not fall back to another tool in this case.
    #[error("Extraction with {} {}", .method.display_name(), exit_status(.exit_code))]
    ExtractFailed {
        /// The tool that failed.
        method: ExtractionMethod,
        /// Exit code of the tool; `None` if it was killed by a signal.
        exit_code: Option<i32>,
        /// Actionable suggestion for resolving the issue.
        fix: String,
    },

    /// The built-in ZIP decoder could not read or write the archive.
    #[error("Failed to decode archive {}: {message}", .archive.display())]
    ArchiveDecodeFailed {
        /// The archive being extracted.
        archive: PathBuf,
        /// Description of the failure.
        message: String,
        /// Actionable suggestion for resolving the issue.
        fix: String,
    },

    /// A directory of the SDK layout could not be created or moved into place.
    #[error("Failed to prepare {}: {source}", .path.display())]
    PrepareFailed {
        /// The directory that could not be prepared.
        path: PathBuf,
        /// The underlying filesystem error.
        #[source]
        source: io::Error,
        /// Actionable suggestion for resolving the issue.
        fix: String,
    },

    /// `sdkmanager` exited unsuccessfully while installing platform-tools.
    #[error("Installing platform-tools {}", exit_status(.exit_code))]
    PlatformToolsFailed {
        /// Exit code of `sdkmanager`; `None` if it was killed by a signal.
        exit_code: Option<i32>,
        /// Actionable suggestion for resolving the issue.
        fix: String,
    },

    /// A required program could not be launched.
    ///
    /// Missing extraction tools never produce this error; they are skipped.
    #[error("Failed to launch {program}: {source}")]
    LaunchFailed {
        /// The program that could not be launched.
        program: String,
        /// The underlying launch error.
        #[source]
        source: io::Error,
        /// Actionable suggestion for resolving the issue.
        fix: String,
    },

    /// Waiting on a launched program failed.
    #[error("Lost track of {program}: {source}")]
    ProcessFailed {
        /// The program being waited on.
        program: String,
        /// The underlying I/O error.
        #[source]
        source: io::Error,
        /// Actionable suggestion for resolving the issue.
        fix: String,
    },
}

impl InstallError {
    /// Get an actionable suggestion for fixing this error.
    ///
    /// # Example
    ///
    /// ```rust
    /// use sdk_cmdline_installer::InstallError;
    ///
    /// let error = InstallError::PlatformToolsFailed {
    ///     exit_code: Some(1),
    ///     fix: "Run sdkmanager --install platform-tools manually to see the error".to_string(),
    /// };
    /// assert!(error.fix_suggestion().contains("sdkmanager"));
    /// ```
    pub fn fix_suggestion(&self) -> &str {
        match self {
            Self::UnsupportedPlatform { fix, .. } => fix,
            Self::ExtractFailed { fix, .. } => fix,
            Self::ArchiveDecodeFailed { fix, .. } => fix,
            Self::PrepareFailed { fix, .. } => fix,
            Self::PlatformToolsFailed { fix, .. } => fix,
            Self::LaunchFailed { fix, .. } => fix,
            Self::ProcessFailed { fix, .. } => fix,
        }
    }

    /// The exit code of the failing tool, for errors caused by one.
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            Self::ExtractFailed { exit_code, .. } | Self::PlatformToolsFailed { exit_code, .. } => {
                *exit_code
            }
            _ => None,
        }
    }
}

fn exit_status(exit_code: &Option<i32>) -> String {
    match exit_code {
        Some(code) => format!("failed with exit code {code}"),
        None => "was terminated by a signal".to_string(),
    }
}
