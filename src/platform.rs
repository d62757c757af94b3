//! Host platform classification.

use crate::InstallError;
use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;

/// The class of host operating system the installer is running on.
///
/// Every platform-dependent decision (which archive tools to try, what the
/// toolchain manager executable is called, whether an OS integration step
/// exists) is keyed on this value rather than on scattered `cfg!` checks.
///
/// # Example
///
/// ```rust
/// use sdk_cmdline_installer::PlatformClass;
///
/// assert_eq!(PlatformClass::from_os("linux"), PlatformClass::Unix);
/// assert_eq!(PlatformClass::from_os("windows"), PlatformClass::Windows);
/// assert_eq!(PlatformClass::from_os("freebsd"), PlatformClass::Unsupported);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::EnumIter)]
pub enum PlatformClass {
    /// macOS or Linux.
    Unix,
    /// Microsoft Windows.
    Windows,
    /// Anything else. Only the in-process decoder is available.
    Unsupported,
}

impl PlatformClass {
    /// The platform class of the running host.
    pub fn current() -> Self {
        Self::from_os(std::env::consts::OS)
    }

    /// Classify an OS identifier as reported by `std::env::consts::OS`.
    pub fn from_os(os: &str) -> Self {
        match os {
            "macos" | "linux" => Self::Unix,
            "windows" => Self::Windows,
            _ => Self::Unsupported,
        }
    }

    /// The identifier the SDK repository uses for this host's downloads.
    ///
    /// This is what a download collaborator needs to pick the right
    /// `commandlinetools-<id>-*.zip` archive. A class does not know which
    /// Unix it stands for, so `Unix` answers for the running host ("mac" on
    /// macOS builds, "linux" otherwise). Use [`PlatformClass::repository_id_for_os`]
    /// to ask about an OS other than the host.
    ///
    /// # Example
    ///
    /// ```rust
    /// use sdk_cmdline_installer::PlatformClass;
    ///
    /// assert_eq!(PlatformClass::Windows.repository_id().unwrap(), "win");
    /// assert!(PlatformClass::Unsupported.repository_id().is_err());
    /// ```
    pub fn repository_id(&self) -> Result<&'static str, InstallError> {
        match self {
            Self::Unix if cfg!(target_os = "macos") => Ok("mac"),
            Self::Unix => Ok("linux"),
            Self::Windows => Ok("win"),
            Self::Unsupported => Err(unsupported(std::env::consts::OS)),
        }
    }

    /// The repository identifier for an OS named as in `std::env::consts::OS`.
    ///
    /// # Example
    ///
    /// ```rust
    /// use sdk_cmdline_installer::PlatformClass;
    ///
    /// assert_eq!(PlatformClass::repository_id_for_os("macos").unwrap(), "mac");
    /// assert!(PlatformClass::repository_id_for_os("freebsd").is_err());
    /// ```
    pub fn repository_id_for_os(os: &str) -> Result<&'static str, InstallError> {
        match os {
            "macos" => Ok("mac"),
            "linux" => Ok("linux"),
            "windows" => Ok("win"),
            _ => Err(unsupported(os)),
        }
    }

    /// File name of the toolchain manager inside `cmdline-tools/latest/bin`.
    pub fn sdk_manager_file_name(&self) -> &'static str {
        match self {
            Self::Windows => "sdkmanager.bat",
            Self::Unix | Self::Unsupported => "sdkmanager",
        }
    }

    /// Whether this platform has an OS integration step after installation.
    pub fn has_path_settings_ui(&self) -> bool {
        matches!(self, Self::Windows)
    }

    /// Iterator over all platform classes.
    pub fn all() -> impl Iterator<Item = Self> {
        <Self as IntoEnumIterator>::iter()
    }
}

fn unsupported(os: &str) -> InstallError {
    InstallError::UnsupportedPlatform {
        os: os.to_string(),
        fix: "Install the command-line tools manually from https://developer.android.com/studio#command-line-tools-only".to_string(),
    }
}
