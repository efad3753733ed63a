//! Document thumbnails in the `Thumbs/` mirror tree.
//!
//! The first page of each document is shrunk to fit the configured geometry.
//! When the converter leaves nothing behind, the built-in placeholder is
//! written instead, so every listed document has a thumbnail to link.

use crate::{
    assets::PLACEHOLDER_THUMB,
    build::BuildContext,
    debug, log,
    paths::THUMBS_DIR,
    scan::Document,
    utils::exec::{EMPTY_FILTER, filter_args, run_logged, to_os},
};
use std::{fs, path::Path};

/// What happened to one document's thumbnail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThumbnailOutcome {
    /// Already present, nothing ran
    Existing,
    /// Produced by the converter
    Converted,
    /// Converter failed, placeholder written
    Placeholder,
    /// Not even the placeholder could be written
    Failed,
}

/// Ensure `doc` has a thumbnail.
pub fn generate_thumbnail(ctx: &BuildContext, doc: &Document) -> ThumbnailOutcome {
    let site = ctx.site();
    let logger = site.logger();
    let dir = ctx.paths().mirror_dir(site.root(), THUMBS_DIR);
    let thumb = dir.join(doc.thumb_name());

    if thumb.exists() {
        return ThumbnailOutcome::Existing;
    }
    if let Err(e) = fs::create_dir_all(&dir) {
        log!(logger; "error"; "Failed to create {}: {}", dir.display(), e);
        return ThumbnailOutcome::Failed;
    }

    debug!(logger; "thumb"; "{}", doc.name());

    // `[0]` selects the first page
    let mut first_page = doc.path.as_os_str().to_owned();
    first_page.push("[0]");

    let tools = site.tools();
    let args = filter_args(&[
        first_page,
        to_os("-thumbnail"),
        to_os(&tools.thumb_geometry),
        to_os(&thumb),
    ]);
    run_logged(site.runner(), logger, &tools.convert, &args, &EMPTY_FILTER);

    if is_nonempty(&thumb) {
        return ThumbnailOutcome::Converted;
    }

    log!(logger; "warn"; "no thumbnail for {}, using placeholder", doc.name());
    match fs::write(&thumb, PLACEHOLDER_THUMB) {
        Ok(()) => ThumbnailOutcome::Placeholder,
        Err(e) => {
            log!(logger; "error"; "Failed to write {}: {}", thumb.display(), e);
            ThumbnailOutcome::Failed
        }
    }
}

fn is_nonempty(path: &Path) -> bool {
    fs::metadata(path).is_ok_and(|m| m.is_file() && m.len() > 0)
}
