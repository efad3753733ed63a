//! Sitewide assets embedded in the binary.
//!
//! The stylesheet, row-shading script and favicon live once at the archive
//! root and every index page links them through its root prefix. Existing
//! copies are never overwritten, so an archive can carry its own styling.

use crate::{Logger, debug, error::BuildError, paths::DirPaths, utils::fs::write_if_absent};
use std::path::Path;

/// Thumbnail used when the converter produces nothing.
pub const PLACEHOLDER_THUMB: &[u8] = include_bytes!("../assets/placeholder_thumb.png");

/// Root-relative destination and content of each sitewide asset.
const SITEWIDE: &[(&str, &[u8])] = &[
    ("css/archive.css", include_bytes!("../assets/css/archive.css")),
    ("scripts/shade.js", include_bytes!("../assets/scripts/shade.js")),
    ("favicon.svg", include_bytes!("../assets/favicon.svg")),
];

/// Copy missing sitewide assets into the archive root.
///
/// Returns how many files were created.
///
/// # Errors
///
/// [`BuildError::SitewideCopyMisuse`] when `paths` is not the root, and
/// [`BuildError::Io`] when an asset cannot be written.
pub fn copy_sitewide_assets(
    paths: &DirPaths,
    root: &Path,
    logger: &Logger,
) -> Result<usize, BuildError> {
    if !paths.is_root {
        return Err(BuildError::SitewideCopyMisuse(paths.current.clone()));
    }

    let mut created = 0;
    for (relative, content) in SITEWIDE {
        let dest = root.join(relative);
        if write_if_absent(&dest, content).map_err(|e| BuildError::Io(dest.clone(), e))? {
            debug!(logger; "assets"; "created {}", relative);
            created += 1;
        }
    }
    Ok(created)
}
