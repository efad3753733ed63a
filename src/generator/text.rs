//! Extracted text in the `Text/` mirror tree.
//!
//! # Fallback chain
//!
//! ```text
//! PDF:    pdftotext ──no text──► gs (1-bit TIFF) → tesseract ──no text──► placeholder
//! Image:  tesseract ──no text──► placeholder
//! ```
//!
//! "No text" is decided by [`has_text`], which only looks at a short prefix.
//! The text file always exists afterwards, so the indexer and the page links
//! never point at nothing.

use crate::{
    build::{BuildContext, Site},
    debug, log,
    paths::TEXT_DIR,
    scan::{Document, DocumentKind},
    utils::{
        exec::{EMPTY_FILTER, OCR_FILTER, filter_args, run_logged, to_os},
        text::has_text,
    },
};
use std::{ffi::OsString, fs, path::Path};

/// What happened to one document's text file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextOutcome {
    /// Already present, nothing ran
    Existing,
    /// Produced by the direct extractor (PDF) or OCR (image)
    Extracted,
    /// Produced by rasterizing the PDF and running OCR
    OcrFallback,
    /// Every strategy failed, placeholder note written
    Placeholder,
    /// Not even the placeholder could be written
    Failed,
}

/// Ensure `doc` has a text file.
pub fn extract_text(ctx: &BuildContext, doc: &Document) -> TextOutcome {
    let site = ctx.site();
    let logger = site.logger();
    let dir = ctx.paths().mirror_dir(site.root(), TEXT_DIR);
    let text = dir.join(doc.text_name());

    if text.exists() {
        return TextOutcome::Existing;
    }
    if let Err(e) = fs::create_dir_all(&dir) {
        log!(logger; "error"; "Failed to create {}: {}", dir.display(), e);
        return TextOutcome::Failed;
    }

    debug!(logger; "text"; "{}", doc.name());

    match doc.kind {
        DocumentKind::Pdf => extract_pdf(site, &doc.path, &text),
        DocumentKind::Image => ocr(site, &doc.path, &text),
    }
    if has_text(&text) {
        return TextOutcome::Extracted;
    }

    if doc.kind == DocumentKind::Pdf {
        debug!(logger; "text"; "no text layer in {}, trying OCR", doc.name());
        if ocr_pdf(site, &doc.path, &text) {
            return TextOutcome::OcrFallback;
        }
    }

    log!(logger; "warn"; "no text found in {}, writing placeholder", doc.name());
    match fs::write(&text, placeholder(doc)) {
        Ok(()) => TextOutcome::Placeholder,
        Err(e) => {
            log!(logger; "error"; "Failed to write {}: {}", text.display(), e);
            TextOutcome::Failed
        }
    }
}

/// Direct extraction of the PDF's text layer.
fn extract_pdf(site: &Site, pdf: &Path, text: &Path) {
    let args = filter_args(&[to_os(pdf), to_os(text)]);
    run_logged(site.runner(), site.logger(), &site.tools().pdftotext, &args, &EMPTY_FILTER);
}

/// OCR `image` into `text`.
///
/// The OCR tool takes an output base and appends `.txt` itself.
fn ocr(site: &Site, image: &Path, text: &Path) {
    let args = filter_args(&[to_os(image), to_os(text.with_extension(""))]);
    run_logged(site.runner(), site.logger(), &site.tools().ocr, &args, &OCR_FILTER);
}

/// Rasterize `pdf` to a bilevel TIFF next to `text`, then OCR it.
///
/// The intermediate image is removed afterwards. Returns whether `text` now
/// holds text.
fn ocr_pdf(site: &Site, pdf: &Path, text: &Path) -> bool {
    let logger = site.logger();
    let tools = site.tools();
    let raster = text.with_extension("tiff");

    let mut output = OsString::from("-sOutputFile=");
    output.push(&raster);

    let args = filter_args(&[
        to_os("-q"),
        to_os("-dNOPAUSE"),
        to_os("-dBATCH"),
        to_os("-dSAFER"),
        to_os("-sDEVICE=tiffg4"),
        to_os(format!("-r{}", tools.raster_dpi)),
        output,
        to_os(pdf),
    ]);
    let rasterized = run_logged(site.runner(), logger, &tools.rasterize, &args, &EMPTY_FILTER);

    if rasterized && raster.is_file() {
        ocr(site, &raster, text);
    }

    if raster.exists()
        && let Err(e) = fs::remove_file(&raster)
    {
        log!(logger; "warn"; "Failed to remove {}: {}", raster.display(), e);
    }

    has_text(text)
}

/// Note written when no strategy found any text.
fn placeholder(doc: &Document) -> String {
    format!("Text extraction failed for {}\n", doc.name())
}
