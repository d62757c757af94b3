//! Fixtures shared by the installer's unit tests.

use std::fs::File;
use std::io::Write;
use std::path::Path;

/// One entry of a synthetic ZIP archive.
pub(crate) struct ZipEntry<'a> {
    name: &'a str,
    contents: Option<&'a [u8]>,
    mode: u32,
}

impl<'a> ZipEntry<'a> {
    pub(crate) fn dir(name: &'a str) -> Self {
        Self {
            name,
            contents: None,
            mode: 0o755,
        }
    }

    pub(crate) fn file(name: &'a str, contents: &'a [u8], mode: u32) -> Self {
        Self {
            name,
            contents: Some(contents),
            mode,
        }
    }
}

pub(crate) fn write_zip(path: &Path, entries: &[ZipEntry<'_>]) {
    let file = File::create(path).unwrap();
    let mut zip = zip::ZipWriter::new(file);

    for entry in entries {
        let options = zip::write::SimpleFileOptions::default()
            .compression_method(zip::CompressionMethod::Deflated)
            .unix_permissions(entry.mode);
        match entry.contents {
            Some(contents) => {
                zip.start_file(entry.name, options).unwrap();
                zip.write_all(contents).unwrap();
            }
            None => zip.add_directory(entry.name, options).unwrap(),
        }
    }

    zip.finish().unwrap();
}

/// Write an executable `sh` script into `dir`.
#[cfg(unix)]
pub(crate) fn write_script(dir: &Path, name: &str, body: &str) -> std::path::PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join(name);
    std::fs::write(&path, format!("#!/bin/sh\n{body}")).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path
}
