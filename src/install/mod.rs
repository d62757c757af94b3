//! Installation of the Android SDK command-line tools.
//!
//! This module takes a downloaded command-line tools archive and turns it
//! into a working SDK root. Use [`install`] for the host platform defaults,
//! or [`Installer`] to override the platform, the extraction tools or the
//! license responder.
//!
//! # Example
//!
//! ```rust,no_run
//! use sdk_cmdline_installer::{install, InstallOptions, InstallProgress};
//! use std::path::Path;
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() {
//!     let options = InstallOptions {
//!         install_platform_tools: true,
//!         ..Default::default()
//!     };
//!     let done = install(
//!         Path::new("commandlinetools-mac-11076708_latest.zip"),
//!         Path::new("/Users/me/Library/Android/sdk"),
//!         options,
//!         |progress| {
//!             if let Some(line) = progress.output() {
//!                 println!("  {}", line.text);
//!             } else {
//!                 println!("{}", progress.description());
//!             }
//!         },
//!     )
//!     .await
//!     .unwrap();
//!
//!     println!("\nAdd these to your PATH:");
//!     for dir in done.path_dirs() {
//!         println!("  {}", dir.display());
//!     }
//! }
//! ```

mod errors;
mod executor;
mod extract;
pub mod layout;
mod progress;

#[cfg(test)]
mod testing;

pub use errors::InstallError;
pub use executor::{install, Installer};
pub use extract::{extract_zip, ExtractionChain, ExtractionMethod, NativeTool};
pub use progress::{CompletedInstall, InstallProgress};
