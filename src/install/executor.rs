//! Installation execution.
//!
//! This module provides the [`Installer`] and the [`install`] shortcut that
//! take a downloaded command-line tools archive through every stage:
//!
//! 1. Extract the archive (native tool, or the built-in decoder)
//! 2. Delete the archive, if requested
//! 3. Move the tools to `cmdline-tools/latest`
//! 4. Install platform-tools through `sdkmanager`, if requested
//! 5. Open the OS environment-variable editor, if requested (Windows only)
//! 6. Report completion
//!
//! Stages run strictly in order. The first fatal error ends the run and
//! nothing already written to disk is rolled back. Running two installations
//! against the same SDK root at once is not supported.

use super::{layout, CompletedInstall, ExtractionChain, InstallError, InstallProgress};
use crate::process::{spawn, spawn_detached, LicenseResponder, SpawnOptions};
use crate::{InstallOptions, PlatformClass};
use std::path::Path;
use tracing::{debug, info, warn};

/// Program and argument opening the Windows environment-variable editor.
const PATH_SETTINGS_COMMAND: (&str, &str) = ("rundll32", "sysdm.cpl,EditEnvironmentVariables");

/// Drives one installation run.
///
/// Defaults to the host platform and its extraction strategy table; both can
/// be overridden. `with_platform` resets the extraction chain to that
/// platform's table, so call `with_extraction_chain` after it.
///
/// # Example
///
/// ```rust,no_run
/// use sdk_cmdline_installer::{InstallOptions, Installer};
/// use std::path::Path;
///
/// #[tokio::main(flavor = "current_thread")]
/// async fn main() {
///     let installer = Installer::new(InstallOptions::default());
///     let done = installer
///         .run(
///             Path::new("commandlinetools-linux-11076708_latest.zip"),
///             Path::new("/opt/android-sdk"),
///             |progress| println!("{}", progress.description()),
///         )
///         .await
///         .unwrap();
///     println!("{:?}", done.path_dirs());
/// }
/// ```
#[derive(Debug, Clone)]
pub struct Installer {
    platform: PlatformClass,
    options: InstallOptions,
    extraction: ExtractionChain,
    responder: LicenseResponder,
}

impl Installer {
    /// An installer for the host platform.
    pub fn new(options: InstallOptions) -> Self {
        let platform = PlatformClass::current();
        Self {
            platform,
            extraction: ExtractionChain::for_platform(platform, options.verbose),
            options,
            responder: LicenseResponder::default(),
        }
    }

    /// Install as if running on `platform`.
    pub fn with_platform(mut self, platform: PlatformClass) -> Self {
        self.platform = platform;
        self.extraction = ExtractionChain::for_platform(platform, self.options.verbose);
        self
    }

    /// Use a custom extraction chain.
    pub fn with_extraction_chain(mut self, extraction: ExtractionChain) -> Self {
        self.extraction = extraction;
        self
    }

    /// Use a custom license responder.
    pub fn with_license_responder(mut self, responder: LicenseResponder) -> Self {
        self.responder = responder;
        self
    }

    /// The platform this installer targets.
    pub fn platform(&self) -> PlatformClass {
        self.platform
    }

    /// The options this installer runs with.
    pub fn options(&self) -> &InstallOptions {
        &self.options
    }

    /// Install `archive` into `sdk_root`.
    ///
    /// Progress is reported through `on_progress`; the run does not continue
    /// until the callback returns. On success the last event is
    /// [`InstallProgress::Completed`] carrying the same value that is returned.
    ///
    /// There is no timeout: a hung external tool hangs the run. Dropping the
    /// returned future kills the subprocess currently running.
    pub async fn run<F>(
        &self,
        archive: &Path,
        sdk_root: &Path,
        on_progress: F,
    ) -> Result<CompletedInstall, InstallError>
    where
        F: Fn(InstallProgress) + Send + Sync,
    {
        // sdkmanager's launcher is platform specific; refuse before touching disk.
        if self.options.install_platform_tools {
            self.platform.repository_id()?;
        }

        info!(
            archive = %archive.display(),
            root = %sdk_root.display(),
            "installing command-line tools"
        );

        // Step 1: Extract
        let method = self
            .extraction
            .extract(archive, &layout::extraction_dir(sdk_root), &on_progress)
            .await?;
        debug!(method = method.display_name(), "archive extracted");

        // Step 2: Archive cleanup (best effort)
        if self.options.delete_archive {
            if let Err(e) = tokio::fs::remove_file(archive).await {
                warn!(archive = %archive.display(), error = %e, "could not delete archive");
            }
        }

        // Step 3: Relocate
        layout::relocate(sdk_root).await?;

        // Step 4: Platform-tools
        let mut path_entries = vec![layout::bin_entry()];
        if self.options.install_platform_tools {
            self.install_platform_tools(sdk_root, &on_progress).await?;
            path_entries.push(layout::platform_tools_entry());
        }

        // Step 5: OS integration (fire and forget)
        if self.options.open_path_settings && self.platform.has_path_settings_ui() {
            open_path_settings();
        }

        // Step 6: Report Completed
        let completed = CompletedInstall {
            install_root: sdk_root.to_path_buf(),
            path_entries,
        };
        info!(root = %sdk_root.display(), "installation complete");
        on_progress(InstallProgress::Completed(completed.clone()));
        Ok(completed)
    }

    async fn install_platform_tools<F>(
        &self,
        sdk_root: &Path,
        on_progress: &F,
    ) -> Result<(), InstallError>
    where
        F: Fn(InstallProgress),
    {
        let manager = layout::sdk_manager_path(sdk_root, self.platform);
        let mut args = vec!["--install", layout::PLATFORM_TOOLS_PACKAGE];
        if self.options.verbose {
            args.push("--verbose");
        }
        let spawn_options = SpawnOptions {
            working_dir: Some(sdk_root.to_path_buf()),
            inherit_stdio: self.options.inherit_stdio,
            attach_input: self.options.auto_accept_licenses(),
            ..Default::default()
        };

        let mut process = spawn(&manager, &args, &spawn_options).map_err(|e| {
            InstallError::LaunchFailed {
                program: e.program,
                source: e.source,
                fix: format!(
                    "Check that {} exists and is executable (it needs a Java runtime on PATH)",
                    manager.display()
                ),
            }
        })?;
        on_progress(InstallProgress::InstallingPlatformTools { output: None });

        let input = process.take_input();
        let accept = async {
            match input {
                Some(stdin) => Some(self.responder.run(stdin).await),
                None => None,
            }
        };
        let drain = async move {
            while let Some(line) = process.next_output().await {
                on_progress(InstallProgress::InstallingPlatformTools { output: Some(line) });
            }
            let program = process.program().to_string();
            process
                .wait()
                .await
                .map_err(|source| InstallError::ProcessFailed {
                    program,
                    source,
                    fix: "Run sdkmanager --install platform-tools manually".to_string(),
                })
        };
        let (exit_code, accepted) = futures::future::join(drain, accept).await;
        let exit_code = exit_code?;
        if let Some(accepted) = accepted {
            debug!(responses = accepted, "license responder finished");
        }

        if exit_code != Some(0) {
            warn!(?exit_code, "sdkmanager failed");
            return Err(InstallError::PlatformToolsFailed {
                exit_code,
                fix: format!(
                    "Run {} --install platform-tools manually to see the error",
                    manager.display()
                ),
            });
        }
        Ok(())
    }
}

fn open_path_settings() {
    let (program, arg) = PATH_SETTINGS_COMMAND;
    if let Err(e) = spawn_detached(program, [arg]) {
        warn!(error = %e, "could not open the environment variable editor");
    }
}

/// Install the command-line tools from `archive` into `sdk_root`.
///
/// Shortcut for `Installer::new(options).run(...)` on the host platform.
///
/// # Returns
///
/// - `Ok(CompletedInstall)` with the directories to add to `PATH`
/// - `Err(InstallError)` with an actionable fix suggestion if any stage failed
///
/// # Example
///
/// ```rust,no_run
/// use sdk_cmdline_installer::{install, InstallOptions};
/// use std::path::Path;
///
/// #[tokio::main]
/// async fn main() {
///     let result = install(
///         Path::new("tools.zip"),
///         Path::new("/opt/android-sdk"),
///         InstallOptions::default(),
///         |progress| println!("{:?}", progress),
///     )
///     .await;
///
///     match result {
///         Ok(done) => println!("Add to PATH: {:?}", done.path_dirs()),
///         Err(e) => println!("Failed: {}. Fix: {}", e, e.fix_suggestion()),
///     }
/// }
/// ```
pub async fn install<F>(
    archive: &Path,
    sdk_root: &Path,
    options: InstallOptions,
    on_progress: F,
) -> Result<CompletedInstall, InstallError>
where
    F: Fn(InstallProgress) + Send + Sync,
{
    Installer::new(options)
        .run(archive, sdk_root, on_progress)
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::install::testing::{write_zip, ZipEntry};
    use crate::install::{ExtractionMethod, NativeTool};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    fn stage_name(progress: &InstallProgress) -> &'static str {
        match progress {
            InstallProgress::Extracting { .. } => "Extracting",
            InstallProgress::InstallingPlatformTools { .. } => "InstallingPlatformTools",
            InstallProgress::Completed(_) => "Completed",
        }
    }

    fn installer(options: InstallOptions) -> Installer {
        Installer::new(options)
            .with_platform(PlatformClass::Unix)
            .with_extraction_chain(ExtractionChain::in_process_only())
            .with_license_responder(LicenseResponder::new("y\n", Duration::from_millis(5)))
    }

    fn no_platform_tools() -> InstallOptions {
        InstallOptions {
            install_platform_tools: false,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_run_without_platform_tools() {
        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("tools.zip");
        write_zip(
            &archive,
            &[ZipEntry::file("cmdline-tools/bin/toolX", b"tool", 0o755)],
        );
        let root = dir.path().join("sdk");
        let stages = Arc::new(Mutex::new(Vec::new()));
        let stages_clone = stages.clone();

        let done = installer(no_platform_tools())
            .run(&archive, &root, move |progress| {
                stages_clone.lock().unwrap().push(progress);
            })
            .await
            .unwrap();

        assert!(root.join("cmdline-tools/latest/bin/toolX").is_file());
        assert!(!archive.exists(), "archive should be deleted");
        assert_eq!(done.install_root, root);
        assert_eq!(done.path_entries, vec![vec!["cmdline-tools", "latest", "bin"]]);

        let stages = stages.lock().unwrap();
        let names: Vec<_> = stages.iter().map(stage_name).collect();
        assert_eq!(names, vec!["Extracting", "Completed"]);
        assert_eq!(stages.last(), Some(&InstallProgress::Completed(done)));
    }

    #[tokio::test]
    async fn test_keeps_archive_when_asked() {
        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("tools.zip");
        write_zip(&archive, &[ZipEntry::file("cmdline-tools/bin/toolX", b"x", 0o755)]);

        installer(InstallOptions {
            delete_archive: false,
            ..no_platform_tools()
        })
        .run(&archive, &dir.path().join("sdk"), |_| {})
        .await
        .unwrap();

        assert!(archive.exists());
    }

    #[tokio::test]
    async fn test_unsupported_platform_aborts_before_io() {
        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("tools.zip");
        write_zip(&archive, &[ZipEntry::file("cmdline-tools/bin/toolX", b"x", 0o755)]);
        let root = dir.path().join("sdk");
        let stages = Arc::new(Mutex::new(Vec::new()));
        let stages_clone = stages.clone();

        let err = installer(InstallOptions::default())
            .with_platform(PlatformClass::Unsupported)
            .run(&archive, &root, move |p| stages_clone.lock().unwrap().push(p))
            .await
            .unwrap_err();

        assert!(matches!(err, InstallError::UnsupportedPlatform { .. }));
        assert!(stages.lock().unwrap().is_empty());
        assert!(!root.exists());
        assert!(archive.exists());
    }

    #[tokio::test]
    async fn test_unsupported_platform_still_extracts_without_platform_tools() {
        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("tools.zip");
        write_zip(&archive, &[ZipEntry::file("cmdline-tools/bin/toolX", b"x", 0o755)]);
        let root = dir.path().join("sdk");

        let done = installer(no_platform_tools())
            .with_platform(PlatformClass::Unsupported)
            .run(&archive, &root, |_| {})
            .await
            .unwrap();

        assert_eq!(done.path_dirs(), vec![root.join("cmdline-tools/latest/bin")]);
    }

    #[tokio::test]
    async fn test_existing_installation_is_prepare_failure() {
        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("tools.zip");
        write_zip(&archive, &[ZipEntry::file("cmdline-tools/bin/toolX", b"x", 0o755)]);
        let root = dir.path().join("sdk");
        std::fs::create_dir_all(root.join("cmdline-tools/latest/bin")).unwrap();
        let stages = Arc::new(Mutex::new(Vec::new()));
        let stages_clone = stages.clone();

        let err = installer(no_platform_tools())
            .run(&archive, &root, move |p| stages_clone.lock().unwrap().push(p))
            .await
            .unwrap_err();

        assert!(matches!(err, InstallError::PrepareFailed { .. }));
        // The extracted copy is left where it is.
        assert!(root.join("cmdline-tools/cmdline-tools/bin/toolX").is_file());
        assert!(!stages.lock().unwrap().iter().any(|p| p.is_complete()));
    }

    #[tokio::test]
    async fn test_corrupt_archive_fails_extraction() {
        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("tools.zip");
        std::fs::write(&archive, b"not a zip").unwrap();

        let err = installer(no_platform_tools())
            .run(&archive, &dir.path().join("sdk"), |_| {})
            .await
            .unwrap_err();

        assert!(matches!(err, InstallError::ArchiveDecodeFailed { .. }));
        assert!(archive.exists(), "archive is only deleted after extraction");
    }

    #[cfg(unix)]
    const FAKE_SDKMANAGER: &[u8] = br#"#!/bin/sh
[ "$1" = "--install" ] && [ "$2" = "platform-tools" ] || exit 64
for license in android-sdk-license android-sdk-preview-license; do
    echo "License $license:"
    printf 'Accept? (y/N): '
    read answer || exit 2
    [ "$answer" = y ] || exit 3
done
mkdir -p platform-tools
echo "done" 1>&2
"#;

    #[cfg(unix)]
    #[tokio::test]
    async fn test_run_with_platform_tools() {
        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("tools.zip");
        write_zip(
            &archive,
            &[
                ZipEntry::dir("cmdline-tools/bin/"),
                ZipEntry::file("cmdline-tools/bin/sdkmanager", FAKE_SDKMANAGER, 0o755),
            ],
        );
        let root = dir.path().join("sdk");
        let stages = Arc::new(Mutex::new(Vec::new()));
        let stages_clone = stages.clone();

        let done = installer(InstallOptions::default())
            .run(&archive, &root, move |p| stages_clone.lock().unwrap().push(p))
            .await
            .unwrap();

        assert!(root.join("platform-tools").is_dir());
        assert_eq!(
            done.path_entries,
            vec![
                vec!["cmdline-tools", "latest", "bin"],
                vec!["platform-tools"],
            ]
        );

        let stages = stages.lock().unwrap();
        let names: Vec<_> = stages.iter().map(stage_name).collect();
        let first_tools = names
            .iter()
            .position(|n| *n == "InstallingPlatformTools")
            .unwrap();
        assert!(names[..first_tools].iter().all(|n| *n == "Extracting"));
        assert!(!names[..first_tools].is_empty());
        assert!(names[first_tools..names.len() - 1]
            .iter()
            .all(|n| *n == "InstallingPlatformTools"));
        assert_eq!(names.last(), Some(&"Completed"));
        assert!(stages
            .iter()
            .filter_map(InstallProgress::output)
            .any(|line| line.is_error && line.text == "done"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_sdkmanager_failure() {
        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("tools.zip");
        write_zip(
            &archive,
            &[ZipEntry::file(
                "cmdline-tools/bin/sdkmanager",
                b"#!/bin/sh\necho 'Error: Failed to find package' 1>&2\nexit 1\n",
                0o755,
            )],
        );
        let root = dir.path().join("sdk");
        let stages = Arc::new(Mutex::new(Vec::new()));
        let stages_clone = stages.clone();

        let err = installer(InstallOptions::default())
            .run(&archive, &root, move |p| stages_clone.lock().unwrap().push(p))
            .await
            .unwrap_err();

        assert!(matches!(err, InstallError::PlatformToolsFailed { .. }));
        assert_eq!(err.exit_code(), Some(1));
        assert!(!stages.lock().unwrap().iter().any(|p| p.is_complete()));
        // Relocation already happened and stays.
        assert!(root.join("cmdline-tools/latest/bin/sdkmanager").is_file());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_inherited_terminal_gets_no_responder() {
        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("tools.zip");
        write_zip(
            &archive,
            &[ZipEntry::file(
                "cmdline-tools/bin/sdkmanager",
                b"#!/bin/sh\necho 'platform-tools: written straight to the terminal'\nmkdir -p platform-tools\n",
                0o755,
            )],
        );
        let root = dir.path().join("sdk");
        let stages = Arc::new(Mutex::new(Vec::new()));
        let stages_clone = stages.clone();
        let options = InstallOptions {
            inherit_stdio: true,
            ..Default::default()
        };
        assert!(!options.auto_accept_licenses());

        let done = installer(options)
            .run(&archive, &root, move |p| stages_clone.lock().unwrap().push(p))
            .await
            .unwrap();

        assert!(root.join("platform-tools").is_dir());
        assert_eq!(done.path_entries.last().unwrap(), &vec!["platform-tools"]);

        let stages = stages.lock().unwrap();
        let tools: Vec<_> = stages
            .iter()
            .filter(|p| matches!(p, InstallProgress::InstallingPlatformTools { .. }))
            .collect();
        assert_eq!(
            tools,
            vec![&InstallProgress::InstallingPlatformTools { output: None }]
        );
        assert!(stages.last().unwrap().is_complete());
    }

    #[tokio::test]
    async fn test_missing_sdkmanager_is_launch_failure() {
        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("tools.zip");
        write_zip(&archive, &[ZipEntry::file("cmdline-tools/bin/toolX", b"x", 0o755)]);

        let err = installer(InstallOptions::default())
            .run(&archive, &dir.path().join("sdk"), |_| {})
            .await
            .unwrap_err();

        assert!(matches!(err, InstallError::LaunchFailed { .. }));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_native_tool_exit_code_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("tools.zip");
        write_zip(&archive, &[ZipEntry::file("cmdline-tools/bin/toolX", b"x", 0o755)]);
        let broken = crate::install::testing::write_script(dir.path(), "7z", "exit 2\n");

        let err = installer(no_platform_tools())
            .with_extraction_chain(ExtractionChain::new(
                vec![NativeTool::with_program(ExtractionMethod::SevenZip, &broken)],
                false,
            ))
            .run(&archive, &dir.path().join("sdk"), |_| {})
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            InstallError::ExtractFailed {
                method: ExtractionMethod::SevenZip,
                exit_code: Some(2),
                ..
            }
        ));
        assert!(archive.exists());
    }

    #[test]
    fn test_with_platform_resets_chain() {
        let installer = Installer::new(no_platform_tools())
            .with_extraction_chain(ExtractionChain::in_process_only())
            .with_platform(PlatformClass::Windows);
        assert_eq!(installer.platform(), PlatformClass::Windows);
        assert_eq!(
            installer.extraction,
            ExtractionChain::for_platform(PlatformClass::Windows, false)
        );
        assert!(!installer.options().install_platform_tools);
    }
}
