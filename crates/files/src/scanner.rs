//! File scanning for deploy.
//!
//! Recursively walks input directories and produces [`StaticFile`] records
//! with forward-slash relative paths, sizes and MD5s. File contents are not
//! loaded; each record points back at the file on disk.

use std::path::{Path, PathBuf};

use staticship_protocol::ShipError;
use tracing::{debug, warn};

use crate::byte_source::ByteSource;
use crate::checksum::md5_file;
use crate::static_file::StaticFile;

/// OS and VCS clutter that never belongs in a deploy.
const JUNK_FILES: &[&str] = &[".DS_Store", "Thumbs.db", "desktop.ini", "._.DS_Store"];
const JUNK_DIRS: &[&str] = &["__MACOSX", ".git"];

/// Scans a directory recursively. Paths are relative to `root`.
///
/// Files that cannot be stat'ed or hashed are returned as failed records
/// rather than aborting the scan, so validation can report them together
/// with everything else.
pub fn scan_directory(root: &Path) -> Result<Vec<StaticFile>, ShipError> {
    let mut files = Vec::new();
    walk_dir(root, root, "", &mut files)?;
    debug!(root = %root.display(), files = files.len(), "scan complete");
    Ok(files)
}

/// Resolves a mix of files and directories into one batch.
///
/// A directory contributes its files prefixed with the directory's own name
/// (`dist/index.html`); a plain file contributes its file name. Path
/// optimization later strips whatever root the batch shares.
pub fn resolve_inputs(inputs: &[PathBuf]) -> Result<Vec<StaticFile>, ShipError> {
    if inputs.is_empty() {
        return Err(ShipError::Business("No input paths given".into()));
    }

    let mut files = Vec::new();
    for input in inputs {
        let metadata = std::fs::metadata(input)
            .map_err(|e| ShipError::File(format!("{}: {e}", input.display())))?;
        let name = input
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        if metadata.is_dir() {
            walk_dir(input, input, &name, &mut files)?;
        } else if metadata.is_file() {
            files.push(load_entry(input, name, metadata.len()));
        }
    }
    debug!(inputs = inputs.len(), files = files.len(), "inputs resolved");
    Ok(files)
}

fn walk_dir(
    root: &Path,
    current: &Path,
    prefix: &str,
    files: &mut Vec<StaticFile>,
) -> Result<(), ShipError> {
    let entries = std::fs::read_dir(current)
        .map_err(|e| ShipError::File(format!("{}: {e}", current.display())))?;

    for entry in entries {
        let entry = entry?;
        let path = entry.path();
        let file_name = entry.file_name();
        let file_name = file_name.to_string_lossy();
        let file_name: &str = &file_name;

        let metadata = match entry.metadata() {
            Ok(m) => m,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "cannot stat file");
                files.push(StaticFile::failed(
                    relative_key(root, &path, prefix),
                    format!("Cannot read file: {e}"),
                ));
                continue;
            }
        };

        if metadata.is_dir() {
            if !JUNK_DIRS.contains(&file_name) {
                walk_dir(root, &path, prefix, files)?;
            }
        } else if metadata.is_file() && !JUNK_FILES.contains(&file_name) {
            files.push(load_entry(&path, relative_key(root, &path, prefix), metadata.len()));
        }
    }

    Ok(())
}

fn load_entry(path: &Path, key: String, size: u64) -> StaticFile {
    match md5_file(path) {
        Ok(md5) => StaticFile::new(key, ByteSource::File(path.to_path_buf()), size as i64, md5),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "cannot hash file");
            StaticFile::failed(key, format!("Cannot read file: {e}"))
        }
    }
}

/// Forward-slash key for `path` under `root`, with an optional leading prefix.
fn relative_key(root: &Path, path: &Path, prefix: &str) -> String {
    let rel = path.strip_prefix(root).unwrap_or(path);
    let rel = rel.to_string_lossy().replace('\\', "/");
    if prefix.is_empty() {
        rel
    } else {
        format!("{prefix}/{rel}")
    }
}
