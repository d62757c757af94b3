//! Archive extraction with native tools and an in-process fallback.
//!
//! Native tools are tried in a fixed order for the host platform. A tool
//! that cannot be launched is skipped; a tool that launches and then fails
//! aborts extraction. If no tool launches, the archive is decoded with the
//! `zip` crate.

use super::InstallProgress;
use crate::process::{spawn, SpawnOptions};
use crate::{InstallError, PlatformClass};
use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// How the archive was (or is being) extracted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::EnumIter)]
pub enum ExtractionMethod {
    /// The `7z` command (macOS/Linux).
    SevenZip,
    /// The `unzip` command (macOS/Linux).
    Unzip,
    /// PowerShell's `Expand-Archive` (Windows).
    ExpandArchive,
    /// The built-in ZIP decoder.
    InProcess,
}

impl ExtractionMethod {
    /// Whether this method runs an external program.
    pub fn is_native(&self) -> bool {
        !matches!(self, Self::InProcess)
    }

    /// Human-readable name for messages.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::SevenZip => "7-Zip",
            Self::Unzip => "unzip",
            Self::ExpandArchive => "Expand-Archive",
            Self::InProcess => "built-in decoder",
        }
    }

    /// The program this method runs by default.
    pub fn default_program(&self) -> Option<&'static str> {
        match self {
            Self::SevenZip => Some("7z"),
            Self::Unzip => Some("unzip"),
            Self::ExpandArchive => Some("powershell"),
            Self::InProcess => None,
        }
    }

    /// Command-line arguments for extracting `archive` into `dest`.
    ///
    /// Empty for [`ExtractionMethod::InProcess`].
    pub fn native_args(&self, archive: &Path, dest: &Path, verbose: bool) -> Vec<OsString> {
        match self {
            Self::SevenZip => {
                let mut output_flag = OsString::from("-o");
                output_flag.push(dest);
                let mut args = vec![
                    OsString::from("x"),
                    OsString::from("-y"),
                    output_flag,
                    archive.as_os_str().to_owned(),
                ];
                if verbose {
                    args.push(OsString::from("-bb1"));
                }
                args
            }
            Self::Unzip => {
                // unzip's -v lists instead of extracting; verbose means not quiet.
                let mut args = vec![OsString::from("-o")];
                if !verbose {
                    args.push(OsString::from("-q"));
                }
                args.push(archive.as_os_str().to_owned());
                args.push(OsString::from("-d"));
                args.push(dest.as_os_str().to_owned());
                args
            }
            Self::ExpandArchive => {
                let mut script = format!(
                    "Expand-Archive -LiteralPath '{}' -DestinationPath '{}' -Force",
                    powershell_quote(archive),
                    powershell_quote(dest)
                );
                if verbose {
                    script.push_str(" -Verbose");
                }
                vec![
                    OsString::from("-NoProfile"),
                    OsString::from("-NonInteractive"),
                    OsString::from("-Command"),
                    OsString::from(script),
                ]
            }
            Self::InProcess => Vec::new(),
        }
    }
}

fn powershell_quote(path: &Path) -> String {
    path.to_string_lossy().replace('\'', "''")
}

/// One native extraction tool in the chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NativeTool {
    /// Which method this tool implements; decides its arguments.
    pub method: ExtractionMethod,
    /// Program name or path to launch.
    pub program: PathBuf,
}

impl NativeTool {
    /// The tool for `method` using its default program.
    ///
    /// Returns `None` for [`ExtractionMethod::InProcess`].
    pub fn new(method: ExtractionMethod) -> Option<Self> {
        method.default_program().map(|program| Self {
            method,
            program: PathBuf::from(program),
        })
    }

    /// Run `method` through a different program.
    pub fn with_program(method: ExtractionMethod, program: impl Into<PathBuf>) -> Self {
        Self {
            method,
            program: program.into(),
        }
    }
}

/// The ordered list of native tools to try before the in-process decoder.
///
/// # Example
///
/// ```rust
/// use sdk_cmdline_installer::{ExtractionChain, ExtractionMethod, PlatformClass};
///
/// let chain = ExtractionChain::for_platform(PlatformClass::Unix, false);
/// let methods: Vec<_> = chain.tools().iter().map(|t| t.method).collect();
/// assert_eq!(methods, vec![ExtractionMethod::SevenZip, ExtractionMethod::Unzip]);
///
/// assert!(ExtractionChain::for_platform(PlatformClass::Unsupported, false)
///     .tools()
///     .is_empty());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionChain {
    tools: Vec<NativeTool>,
    verbose: bool,
}

impl ExtractionChain {
    /// A chain trying `tools` in order.
    pub fn new(tools: Vec<NativeTool>, verbose: bool) -> Self {
        Self { tools, verbose }
    }

    /// The strategy table for `platform`.
    pub fn for_platform(platform: PlatformClass, verbose: bool) -> Self {
        let methods: &[ExtractionMethod] = match platform {
            PlatformClass::Unix => &[ExtractionMethod::SevenZip, ExtractionMethod::Unzip],
            PlatformClass::Windows => &[ExtractionMethod::ExpandArchive],
            PlatformClass::Unsupported => &[],
        };
        Self::new(
            methods.iter().copied().filter_map(NativeTool::new).collect(),
            verbose,
        )
    }

    /// A chain that always uses the in-process decoder.
    pub fn in_process_only() -> Self {
        Self::new(Vec::new(), false)
    }

    /// The native tools, in the order they are tried.
    pub fn tools(&self) -> &[NativeTool] {
        &self.tools
    }

    /// Extract `archive` into `dest`, reporting progress through `on_progress`.
    ///
    /// Emits an [`InstallProgress::Extracting`] event without output once a
    /// method is in use, then one per line of native tool output.
    pub async fn extract<F>(
        &self,
        archive: &Path,
        dest: &Path,
        on_progress: &F,
    ) -> Result<ExtractionMethod, InstallError>
    where
        F: Fn(InstallProgress),
    {
        tokio::fs::create_dir_all(dest)
            .await
            .map_err(|source| super::layout::prepare_failed(dest, source))?;

        for tool in &self.tools {
            let args = tool.method.native_args(archive, dest, self.verbose);
            let mut process = match spawn(&tool.program, &args, &SpawnOptions::default()) {
                Ok(process) => process,
                Err(e) => {
                    info!(
                        tool = tool.method.display_name(),
                        error = %e,
                        "extraction tool unavailable, trying next"
                    );
                    continue;
                }
            };

            let method = tool.method;
            on_progress(InstallProgress::Extracting {
                method,
                output: None,
            });
            while let Some(line) = process.next_output().await {
                on_progress(InstallProgress::Extracting {
                    method,
                    output: Some(line),
                });
            }

            let program = process.program().to_string();
            let exit_code = process
                .wait()
                .await
                .map_err(|source| InstallError::ProcessFailed {
                    program,
                    source,
                    fix: "Try the installation again".to_string(),
                })?;
            if exit_code != Some(0) {
                warn!(tool = method.display_name(), ?exit_code, "extraction failed");
                return Err(InstallError::ExtractFailed {
                    method,
                    exit_code,
                    fix: format!(
                        "Check that {} is a complete ZIP archive and that there is enough disk space",
                        archive.display()
                    ),
                });
            }
            return Ok(method);
        }

        info!("no native extraction tool available, using built-in decoder");
        on_progress(InstallProgress::Extracting {
            method: ExtractionMethod::InProcess,
            output: None,
        });

        let archive_owned = archive.to_path_buf();
        let dest_owned = dest.to_path_buf();
        tokio::task::spawn_blocking(move || extract_zip(&archive_owned, &dest_owned))
            .await
            .map_err(|e| decode_failed(archive, format!("decoder task failed: {e}")))??;
        Ok(ExtractionMethod::InProcess)
    }
}

/// Decode a ZIP archive into `dest_dir` without any external tool.
///
/// Directories are created idempotently and files are overwritten, so
/// running this twice over the same destination is harmless. Entries whose
/// names would escape `dest_dir` are skipped. Returns the number of files
/// written.
pub fn extract_zip(archive_path: &Path, dest_dir: &Path) -> Result<usize, InstallError> {
    let file = File::open(archive_path)
        .map_err(|e| decode_failed(archive_path, format!("cannot open archive: {e}")))?;
    let mut archive = zip::ZipArchive::new(file)
        .map_err(|e| decode_failed(archive_path, e.to_string()))?;

    let mut files = 0;
    for i in 0..archive.len() {
        let mut entry = archive
            .by_index(i)
            .map_err(|e| decode_failed(archive_path, e.to_string()))?;
        let entry_path = match entry.enclosed_name() {
            Some(path) => path,
            None => {
                warn!(name = entry.name(), "skipping unsafe path in archive");
                continue;
            }
        };
        let dest_path = dest_dir.join(&entry_path);

        if entry.is_dir() {
            fs::create_dir_all(&dest_path).map_err(|e| write_failed(archive_path, &dest_path, e))?;
            continue;
        }

        if let Some(parent) = dest_path.parent() {
            fs::create_dir_all(parent).map_err(|e| write_failed(archive_path, parent, e))?;
        }
        let mut outfile =
            File::create(&dest_path).map_err(|e| write_failed(archive_path, &dest_path, e))?;
        io::copy(&mut entry, &mut outfile).map_err(|e| write_failed(archive_path, &dest_path, e))?;

        #[cfg(unix)]
        set_unix_permissions(&dest_path, entry.unix_mode())
            .map_err(|e| write_failed(archive_path, &dest_path, e))?;
        files += 1;
    }

    debug!(files, dest = %dest_dir.display(), "ZIP extraction complete");
    Ok(files)
}

#[cfg(unix)]
fn set_unix_permissions(path: &Path, mode: Option<u32>) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;

    match mode {
        Some(mode) => fs::set_permissions(path, fs::Permissions::from_mode(mode & 0o7777)),
        None => Ok(()),
    }
}

fn decode_failed(archive: &Path, message: String) -> InstallError {
    InstallError::ArchiveDecodeFailed {
        archive: archive.to_path_buf(),
        message,
        fix: "Download the archive again; it may be truncated or corrupt".to_string(),
    }
}

fn write_failed(archive: &Path, path: &Path, e: io::Error) -> InstallError {
    InstallError::ArchiveDecodeFailed {
        archive: archive.to_path_buf(),
        message: format!("cannot write {}: {e}", path.display()),
        fix: format!(
            "Make sure {} is writable and the disk is not full",
            path.display()
        ),
    }
}
