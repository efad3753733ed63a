//! Per-directory artifact generation.
//!
//! - `index_page` - the directory's `index.html`
//! - `thumbnail` - `Thumbs/` mirror, one PNG per document
//! - `text` - `Text/` mirror, one text file per document
//! - `search` - indexer configuration and the indexer run (root only)
//!
//! Every generator checks for its target first and leaves existing artifacts
//! alone. Failures are logged and never leave the directory.

pub mod index_page;
pub mod search;
pub mod text;
pub mod thumbnail;

use crate::{
    build::{BuildContext, BuildReport},
    debug, log,
};

/// Write the index page, then a thumbnail and a text file for each document.
pub fn generate_artifacts(ctx: &BuildContext, report: &mut BuildReport) {
    let logger = ctx.site().logger();

    match index_page::write_index_page(ctx) {
        Ok(true) => {
            report.pages_written += 1;
            debug!(logger; "page"; "wrote {}", ctx.paths().current.join(index_page::INDEX_FILE).display());
        }
        Ok(false) => debug!(logger; "page"; "unchanged {}", ctx.title()),
        Err(e) => {
            report.failures += 1;
            log!(logger; "error"; "{:#}", e);
        }
    }

    for doc in &ctx.entries().documents {
        report.record_thumbnail(thumbnail::generate_thumbnail(ctx, doc));
        report.record_text(text::extract_text(ctx, doc));
    }
}
