//! Installation options configuration.
//!
//! This module provides the [`InstallOptions`] struct for configuring which
//! optional stages of an installation run and how external tools are invoked.

use serde::{Deserialize, Serialize};

/// Configuration options for an installation run.
///
/// Every field has a default, so a partially specified configuration
/// (for example a TOML or JSON fragment) deserializes into a complete one.
///
/// # Interactive terminals
///
/// `inherit_stdio` and license auto-acceptance are mutually exclusive. With
/// `inherit_stdio: true` the `sdkmanager` talks to the real terminal, no
/// output events are produced for it and the user answers license prompts
/// themselves. A declined license is not detected in that mode.
///
/// # Example
///
/// ```rust
/// use sdk_cmdline_installer::InstallOptions;
///
/// // Defaults: delete the archive, install platform-tools, auto-accept licenses
/// let opts = InstallOptions::default();
/// assert!(opts.delete_archive);
/// assert!(opts.install_platform_tools);
/// assert!(!opts.inherit_stdio);
///
/// // Only unpack the command-line tools
/// let opts = InstallOptions {
///     install_platform_tools: false,
///     ..Default::default()
/// };
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InstallOptions {
    /// Delete the downloaded archive once it has been extracted.
    ///
    /// Default: `true`
    pub delete_archive: bool,

    /// Open the system environment-variable editor after installing.
    ///
    /// Only has an effect on Windows. Default: `false`
    pub open_path_settings: bool,

    /// Ask external tools for verbose output.
    ///
    /// Default: `false`
    pub verbose: bool,

    /// Install `platform-tools` through `sdkmanager` after relocation.
    ///
    /// Default: `true`
    pub install_platform_tools: bool,

    /// Let `sdkmanager` use the parent's terminal instead of piping its I/O.
    ///
    /// Default: `false`
    pub inherit_stdio: bool,
}

impl Default for InstallOptions {
    fn default() -> Self {
        Self {
            delete_archive: true,
            open_path_settings: false,
            verbose: false,
            install_platform_tools: true,
            inherit_stdio: false,
        }
    }
}

impl InstallOptions {
    /// Whether license prompts are answered automatically.
    pub fn auto_accept_licenses(&self) -> bool {
        !self.inherit_stdio
    }
}
