//! # sdk-cmdline-installer
//!
//! Installs the Android SDK command-line tools from a downloaded archive.
//!
//! This crate does not download anything. Given the archive and an SDK root
//! it extracts the tools with the best available program (`7z` or `unzip`
//! on macOS/Linux, PowerShell's `Expand-Archive` on Windows, a built-in ZIP
//! decoder otherwise), moves them to `cmdline-tools/latest`, and can run
//! `sdkmanager --install platform-tools` while answering its license prompts.
//!
//! ## Features
//!
//! - `install()` / `Installer` driving the whole pipeline with progress callbacks
//! - `InstallProgress` events carrying subprocess output line by line
//! - `InstallError` naming the failing stage, with a fix suggestion
//! - `process` module with the merged-output subprocess runner and the
//!   `LicenseResponder`
//!
//! Partial results of a failed run are left on disk; nothing is rolled back.
//!
//! ## Example
//!
//! ```rust,no_run
//! use sdk_cmdline_installer::{install, InstallOptions, PlatformClass};
//! use std::path::Path;
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() {
//!     // Tell the download collaborator which archive to fetch
//!     let id = PlatformClass::current().repository_id().unwrap();
//!     println!("fetch commandlinetools-{id}-*_latest.zip");
//!
//!     let result = install(
//!         Path::new("tools.zip"),
//!         Path::new("/opt/android-sdk"),
//!         InstallOptions::default(),
//!         |progress| println!("{:?}", progress),
//!     )
//!     .await;
//!
//!     match result {
//!         Ok(done) => println!("Add to PATH: {:?}", done.path_dirs()),
//!         Err(e) => eprintln!("{e}\nTo fix: {}", e.fix_suggestion()),
//!     }
//! }
//! ```

mod install;
mod options;
mod platform;
pub mod process;

pub use install::layout;
pub use install::{
    extract_zip, install, CompletedInstall, ExtractionChain, ExtractionMethod, InstallError,
    InstallProgress, Installer, NativeTool,
};
pub use options::InstallOptions;
pub use platform::PlatformClass;
