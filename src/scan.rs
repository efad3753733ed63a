//! Directory scanning and entry classification.
//!
//! A scan looks at the immediate children of one directory only. Files are
//! classified by lower-cased suffix; subdirectories are collected for the
//! walker. Permission bits are normalized as a side effect so the generated
//! site is readable by a web server.

use crate::{Logger, log};
use anyhow::{Context, Result};
use std::{
    fs,
    path::{Path, PathBuf},
};

/// Directory names that hold derived output at the archive root.
pub const RESERVED_NAMES: &[&str] = &["Thumbs", "Text", "scripts", "css", "config"];

/// Suffixes indexed as documents.
const DOCUMENT_SUFFIXES: &[&str] = &["pdf", "jpg", "png"];

/// Suffixes listed as archives (never expanded).
const ARCHIVE_SUFFIXES: &[&str] = &["zip", "gz", "tar", "xz", "7z"];

/// Mode applied to every regular file.
#[cfg(unix)]
const FILE_MODE: u32 = 0o644;

/// Mode applied to every directory the walker descends into.
#[cfg(unix)]
const DIR_MODE: u32 = 0o755;

/// Kind of a classified file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    /// Listed with a thumbnail and extracted text
    Document(DocumentKind),
    /// Compressed bundle, listed but not indexed
    Archive,
}

/// How a document's text is extracted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    /// PDF, indexed with `pdftotext` and the OCR fallback
    Pdf,
    /// Scanned page image, indexed with OCR
    Image,
}

impl FileKind {
    /// Classify a path by its lower-cased suffix.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "pdf" => Some(Self::Document(DocumentKind::Pdf)),
            e if DOCUMENT_SUFFIXES.contains(&e) => Some(Self::Document(DocumentKind::Image)),
            e if ARCHIVE_SUFFIXES.contains(&e) => Some(Self::Archive),
            _ => None,
        }
    }
}

/// A classified document file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub path: PathBuf,
    pub kind: DocumentKind,
}

impl Document {
    /// File name as displayed on the index page.
    pub fn name(&self) -> String {
        file_name(&self.path)
    }

    /// File name without its suffix.
    pub fn stem(&self) -> String {
        self.path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// Name of the mirrored thumbnail: `<stem>_thumb.png`.
    pub fn thumb_name(&self) -> String {
        format!("{}_thumb.png", self.stem())
    }

    /// Name of the mirrored text file: `<stem>.txt`.
    pub fn text_name(&self) -> String {
        format!("{}.txt", self.stem())
    }
}

/// Classified snapshot of a directory's immediate entries.
///
/// Every list is sorted by file name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Entries {
    pub subdirectories: Vec<PathBuf>,
    pub documents: Vec<Document>,
    pub archives: Vec<PathBuf>,
}

/// Scan `dir` and classify its children.
///
/// At the root, subdirectories named in [`RESERVED_NAMES`] are left out
/// entirely. Deeper in the tree they are ordinary subdirectories.
pub fn scan_directory(dir: &Path, is_root: bool, logger: &Logger) -> Result<Entries> {
    loop {
        let entries = classify(dir, is_root, logger)?;
        if !expand_archives(&entries) {
            return Ok(entries);
        }
    }
}

/// Hook for unpacking archives before re-classifying.
///
/// Returns `true` when the directory changed and must be scanned again.
/// Archives are never unpacked, so one pass is always enough.
const fn expand_archives(_entries: &Entries) -> bool {
    false
}

fn classify(dir: &Path, is_root: bool, logger: &Logger) -> Result<Entries> {
    let mut children: Vec<_> = fs::read_dir(dir)
        .with_context(|| format!("Failed to read directory: {}", dir.display()))?
        .filter_map(Result::ok)
        .collect();
    children.sort_by_key(fs::DirEntry::file_name);

    let mut entries = Entries::default();

    for child in children {
        let path = child.path();
        let Ok(file_type) = child.file_type() else {
            continue;
        };

        // Follow symlinks so linked subtrees are treated like real ones
        let is_dir = file_type.is_dir() || (file_type.is_symlink() && path.is_dir());

        if is_dir {
            if is_root && is_reserved(&path) {
                continue;
            }
            entries.subdirectories.push(path);
            continue;
        }

        // A linked file may live outside the archive
        if !file_type.is_symlink() {
            normalize_permissions(&path, false, logger);
        }

        match FileKind::from_path(&path) {
            Some(FileKind::Document(kind)) => entries.documents.push(Document { path, kind }),
            Some(FileKind::Archive) => entries.archives.push(path),
            None => {}
        }
    }

    Ok(entries)
}

/// Whether a root-level directory holds derived output.
fn is_reserved(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|name| RESERVED_NAMES.contains(&name))
}

/// Set a file to `0644` or a directory to `0755`.
///
/// Failures are logged and otherwise ignored.
#[cfg(unix)]
pub fn normalize_permissions(path: &Path, is_dir: bool, logger: &Logger) {
    use std::os::unix::fs::PermissionsExt;

    let mode = if is_dir { DIR_MODE } else { FILE_MODE };
    if let Err(e) = fs::set_permissions(path, fs::Permissions::from_mode(mode)) {
        log!(logger; "warn"; "chmod {:o} {}: {}", mode, path.display(), e);
    }
}

#[cfg(not(unix))]
pub fn normalize_permissions(_path: &Path, _is_dir: bool, _logger: &Logger) {}

/// Lossy file name of a path.
pub fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

// ============================================================================
// Tests
// ============================================================================
