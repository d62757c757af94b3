//! SDK directory layout.
//!
//! The command-line tools archive contains a single top-level
//! `cmdline-tools/` directory. It is extracted under `<root>/cmdline-tools/`
//! and then renamed to `<root>/cmdline-tools/latest/`, which is where
//! `sdkmanager` expects to live. `sdkmanager` then derives the SDK root
//! from its own location and installs `<root>/platform-tools/`.

use crate::{InstallError, PlatformClass};
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Directory holding every installed version of the command-line tools.
pub const CMDLINE_TOOLS_DIR: &str = "cmdline-tools";

/// Version directory `sdkmanager` treats as the current one.
pub const LATEST_DIR: &str = "latest";

/// Executables directory inside a command-line tools version.
pub const BIN_DIR: &str = "bin";

/// Directory `sdkmanager` installs the platform-tools package into.
pub const PLATFORM_TOOLS_DIR: &str = "platform-tools";

/// The `sdkmanager` package name of the platform-tools.
pub(crate) const PLATFORM_TOOLS_PACKAGE: &str = "platform-tools";

/// Where the archive is extracted to.
pub(crate) fn extraction_dir(root: &Path) -> PathBuf {
    root.join(CMDLINE_TOOLS_DIR)
}

/// The archive's top-level directory, right after extraction.
pub(crate) fn extracted_dir(root: &Path) -> PathBuf {
    extraction_dir(root).join(CMDLINE_TOOLS_DIR)
}

/// The relocated command-line tools.
pub fn latest_dir(root: &Path) -> PathBuf {
    extraction_dir(root).join(LATEST_DIR)
}

/// Path of the toolchain manager once relocation is done.
///
/// # Example
///
/// ```rust
/// use sdk_cmdline_installer::{layout, PlatformClass};
/// use std::path::Path;
///
/// let manager = layout::sdk_manager_path(Path::new("/sdk"), PlatformClass::Unix);
/// assert!(manager.ends_with("cmdline-tools/latest/bin/sdkmanager"));
/// ```
pub fn sdk_manager_path(root: &Path, platform: PlatformClass) -> PathBuf {
    latest_dir(root)
        .join(BIN_DIR)
        .join(platform.sdk_manager_file_name())
}

/// `cmdline-tools/latest/bin` as path segments.
pub(crate) fn bin_entry() -> Vec<String> {
    vec![
        CMDLINE_TOOLS_DIR.to_string(),
        LATEST_DIR.to_string(),
        BIN_DIR.to_string(),
    ]
}

/// `platform-tools` as path segments.
pub(crate) fn platform_tools_entry() -> Vec<String> {
    vec![PLATFORM_TOOLS_DIR.to_string()]
}

/// Move the freshly extracted tools to `cmdline-tools/latest`.
///
/// Fails if `latest` already exists; an existing installation is never
/// merged into or replaced.
pub(crate) async fn relocate(root: &Path) -> Result<PathBuf, InstallError> {
    let from = extracted_dir(root);
    let to = latest_dir(root);

    let occupied = tokio::fs::try_exists(&to)
        .await
        .map_err(|source| prepare_failed(&to, source))?;
    if occupied {
        return Err(prepare_failed(
            &to,
            io::Error::new(
                io::ErrorKind::AlreadyExists,
                "a command-line tools installation already exists",
            ),
        ));
    }

    debug!(from = %from.display(), to = %to.display(), "relocating command-line tools");
    tokio::fs::rename(&from, &to)
        .await
        .map_err(|source| prepare_failed(&to, source))?;
    Ok(to)
}

pub(crate) fn prepare_failed(path: &Path, source: io::Error) -> InstallError {
    let fix = match source.kind() {
        io::ErrorKind::AlreadyExists => format!(
            "Remove {} or install into a different SDK root",
            path.display()
        ),
        io::ErrorKind::PermissionDenied => format!(
            "Make sure you can write to {}",
            path.parent().unwrap_or(path).display()
        ),
        io::ErrorKind::NotFound => {
            "The archive did not contain a top-level cmdline-tools directory; download it again"
                .to_string()
        }
        _ => format!("Check that {} is writable and try again", path.display()),
    };
    InstallError::PrepareFailed {
        path: path.to_path_buf(),
        source,
        fix,
    }
}
