//! Default values for configuration fields.
//!
//! These functions are used by serde for default deserialization.

pub fn r#true() -> bool {
    true
}

// ============================================================================
// [archive] Section Defaults
// ============================================================================

pub mod archive {
    use std::path::PathBuf;

    pub fn root() -> PathBuf {
        "./".into()
    }

    pub fn url() -> Option<String> {
        None
    }

    pub fn title() -> Option<String> {
        None
    }

    pub fn indexer_config_dir() -> Option<PathBuf> {
        None
    }
}

// ============================================================================
// [tools] Section Defaults
// ============================================================================

pub mod tools {
    pub fn convert() -> Vec<String> {
        vec!["convert".into()]
    }

    pub fn pdftotext() -> Vec<String> {
        vec!["pdftotext".into()]
    }

    pub fn ocr() -> Vec<String> {
        vec!["tesseract".into()]
    }

    pub fn rasterize() -> Vec<String> {
        vec!["gs".into()]
    }

    pub fn indexer() -> Vec<String> {
        vec!["recollindex".into()]
    }

    pub fn thumb_geometry() -> String {
        "160x160".into()
    }

    pub fn raster_dpi() -> u32 {
        300
    }
}
