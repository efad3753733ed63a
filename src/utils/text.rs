//! Cheap check for whether an extracted text file holds any text.
//!
//! Used only to decide whether the expensive OCR fallback should run. It
//! never certifies that the text is any good.

use regex::Regex;
use std::{fs::File, io::Read, path::Path, sync::OnceLock};

/// Bytes inspected at the start of the file.
const PREFIX_LEN: u64 = 1024;

/// Sizes typical of a failed extractor run (empty, or a lone form feed
/// plus line ending pair).
const EMPTY_SIZES: &[u64] = &[0, 4];

fn word_char() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\w").unwrap())
}

/// Whether the file at `path` appears to contain extracted text.
///
/// Absent and unreadable files report `false`.
pub fn has_text(path: &Path) -> bool {
    let Ok(meta) = path.metadata() else {
        return false;
    };
    if !meta.is_file() || EMPTY_SIZES.contains(&meta.len()) {
        return false;
    }

    let Ok(file) = File::open(path) else {
        return false;
    };
    let mut prefix = Vec::with_capacity(PREFIX_LEN as usize);
    if file.take(PREFIX_LEN).read_to_end(&mut prefix).is_err() {
        return false;
    }

    word_char().is_match(&String::from_utf8_lossy(&prefix))
}
