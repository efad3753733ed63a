//! `[archive]` section configuration.
//!
//! Where the archive lives, how it is addressed on the web, and how paths
//! are resolved.

use super::defaults;
use educe::Educe;
use serde::Deserialize;
use std::path::PathBuf;

/// `[archive]` section in pdfarchive.toml.
///
/// # Example
/// ```toml
/// [archive]
/// root = "/srv/archive"
/// url = "https://archive.example.org/"
/// title = "Club Newsletter Archive"
/// resolve = true
/// ```
#[derive(Debug, Clone, Educe, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct ArchiveSection {
    /// Archive root directory (usually set via CLI `--base-dir`).
    #[serde(default = "defaults::archive::root")]
    #[educe(Default = defaults::archive::root())]
    pub root: PathBuf,

    /// URL of the archive root. Defaults to the root's `file://` URL.
    #[serde(default = "defaults::archive::url")]
    #[educe(Default = defaults::archive::url())]
    pub url: Option<String>,

    /// Title of the root page. Defaults to the root directory's name.
    #[serde(default = "defaults::archive::title")]
    #[educe(Default = defaults::archive::title())]
    pub title: Option<String>,

    /// Canonicalize paths (resolving symlinks) before containment checks.
    /// Must be off for archives with symlinked subtrees.
    #[serde(default = "defaults::r#true")]
    #[educe(Default = true)]
    pub resolve: bool,

    /// Where the search indexer configuration is written.
    /// Defaults to `<root>/config`.
    #[serde(default = "defaults::archive::indexer_config_dir")]
    #[educe(Default = defaults::archive::indexer_config_dir())]
    pub indexer_config_dir: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::super::ArchiveConfig;
    use std::path::PathBuf;

    #[test]
    fn test_archive_section_full() {
        let config: ArchiveConfig = toml::from_str(
            r#"
            [archive]
            root = "/srv/archive"
            url = "https://archive.example.org"
            title = "Newsletters"
            resolve = false
            indexer_config_dir = "/etc/archive-index"
        "#,
        )
        .unwrap();

        assert_eq!(config.archive.root, PathBuf::from("/srv/archive"));
        assert_eq!(config.archive.url.as_deref(), Some("https://archive.example.org"));
        assert_eq!(config.archive.title.as_deref(), Some("Newsletters"));
        assert!(!config.archive.resolve);
        assert_eq!(
            config.archive.indexer_config_dir,
            Some(PathBuf::from("/etc/archive-index"))
        );
    }

    #[test]
    fn test_archive_section_defaults() {
        let config: ArchiveConfig = toml::from_str("[archive]").unwrap();

        assert_eq!(config.archive.root, PathBuf::from("./"));
        assert_eq!(config.archive.url, None);
        assert_eq!(config.archive.title, None);
        assert!(config.archive.resolve);
        assert_eq!(config.archive.indexer_config_dir, None);
    }

    #[test]
    fn test_unknown_field_rejection() {
        let result: Result<ArchiveConfig, _> = toml::from_str(
            r#"
            [archive]
            unknown_field = "should_fail"
        "#,
        );
        let err = result.unwrap_err().to_string();
        assert!(err.contains("unknown field"));
    }
}
