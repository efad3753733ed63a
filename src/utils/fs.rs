//! Filesystem helpers for generated output.

use std::{fs, io, path::Path};

/// Write `content` to `path` unless the file already holds exactly that.
///
/// Returns `true` when the file was written. Rebuilding an unchanged archive
/// therefore leaves every page's mtime untouched.
pub fn write_if_changed(path: &Path, content: &[u8]) -> io::Result<bool> {
    match fs::read(path) {
        Ok(existing) if existing == content => return Ok(false),
        Ok(_) => {}
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => return Err(e),
    }
    fs::write(path, content)?;
    Ok(true)
}

/// Write `content` to `path` only if nothing exists there yet.
///
/// Returns `true` when the file was created.
pub fn write_if_absent(path: &Path, content: &[u8]) -> io::Result<bool> {
    if path.exists() {
        return Ok(false);
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, content)?;
    Ok(true)
}
