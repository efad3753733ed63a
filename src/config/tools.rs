//! `[tools]` section configuration.
//!
//! Commands for the external programs the build shells out to. Each command
//! is a vector so wrappers and fixed flags can be prepended, e.g.
//! `ocr = ["tesseract", "--oem", "1"]`.

use super::defaults;
use educe::Educe;
use serde::Deserialize;

/// `[tools]` section in pdfarchive.toml.
///
/// # Example
/// ```toml
/// [tools]
/// convert = ["magick"]
/// thumb_geometry = "200x200"
/// raster_dpi = 200
/// ```
#[derive(Debug, Clone, Educe, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct ToolsConfig {
    /// Image converter producing thumbnails (ImageMagick).
    #[serde(default = "defaults::tools::convert")]
    #[educe(Default = defaults::tools::convert())]
    pub convert: Vec<String>,

    /// Direct PDF text extractor (poppler).
    #[serde(default = "defaults::tools::pdftotext")]
    #[educe(Default = defaults::tools::pdftotext())]
    pub pdftotext: Vec<String>,

    /// OCR engine, invoked as `<ocr> <image> <output base>`.
    #[serde(default = "defaults::tools::ocr")]
    #[educe(Default = defaults::tools::ocr())]
    pub ocr: Vec<String>,

    /// PDF rasterizer for the OCR fallback (Ghostscript).
    #[serde(default = "defaults::tools::rasterize")]
    #[educe(Default = defaults::tools::rasterize())]
    pub rasterize: Vec<String>,

    /// Full-text indexer, invoked as `<indexer> -c <config dir>`.
    #[serde(default = "defaults::tools::indexer")]
    #[educe(Default = defaults::tools::indexer())]
    pub indexer: Vec<String>,

    /// Bounding box for thumbnails, `WIDTHxHEIGHT`.
    #[serde(default = "defaults::tools::thumb_geometry")]
    #[educe(Default = defaults::tools::thumb_geometry())]
    pub thumb_geometry: String,

    /// Resolution of the bilevel image fed to the OCR fallback.
    #[serde(default = "defaults::tools::raster_dpi")]
    #[educe(Default = defaults::tools::raster_dpi())]
    pub raster_dpi: u32,
}

impl ToolsConfig {
    /// Every configured command with its config key, for preflight checks.
    pub fn commands(&self) -> [(&'static str, &[String]); 5] {
        [
            ("[tools.convert]", self.convert.as_slice()),
            ("[tools.pdftotext]", self.pdftotext.as_slice()),
            ("[tools.ocr]", self.ocr.as_slice()),
            ("[tools.rasterize]", self.rasterize.as_slice()),
            ("[tools.indexer]", self.indexer.as_slice()),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::super::ArchiveConfig;

    #[test]
    fn test_tools_defaults() {
        let config: ArchiveConfig = toml::from_str("").unwrap();

        assert_eq!(config.tools.convert, vec!["convert"]);
        assert_eq!(config.tools.pdftotext, vec!["pdftotext"]);
        assert_eq!(config.tools.ocr, vec!["tesseract"]);
        assert_eq!(config.tools.rasterize, vec!["gs"]);
        assert_eq!(config.tools.indexer, vec!["recollindex"]);
        assert_eq!(config.tools.thumb_geometry, "160x160");
        assert_eq!(config.tools.raster_dpi, 300);
    }

    #[test]
    fn test_tools_override() {
        let config: ArchiveConfig = toml::from_str(
            r#"
            [tools]
            convert = ["magick", "-quiet"]
            raster_dpi = 200
        "#,
        )
        .unwrap();

        assert_eq!(config.tools.convert, vec!["magick", "-quiet"]);
        assert_eq!(config.tools.raster_dpi, 200);
        assert_eq!(config.tools.ocr, vec!["tesseract"]);
    }

    #[test]
    fn test_unknown_tool_rejected() {
        let result: Result<ArchiveConfig, _> = toml::from_str(
            r#"
            [tools]
            ffmpeg = ["ffmpeg"]
        "#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_commands_lists_every_tool() {
        let config = ArchiveConfig::default();
        let keys: Vec<_> = config.tools.commands().iter().map(|(k, _)| *k).collect();
        assert_eq!(keys.len(), 5);
        assert!(keys.contains(&"[tools.indexer]"));
    }
}
