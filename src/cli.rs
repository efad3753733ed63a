//! Command-line interface definitions.

use clap::Parser;
use std::path::PathBuf;

/// Rebuild the index pages, thumbnails, text and search index of a PDF archive
#[derive(Parser, Debug, Clone, Default)]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Archive root directory
    #[arg(short = 'f', long = "base-dir", visible_alias = "directory")]
    pub base_dir: Option<PathBuf>,

    /// URL/URI of the archive root
    #[arg(short = 'u', long = "base-url", visible_aliases = ["url", "base-uri", "uri"])]
    pub base_url: Option<String>,

    /// Title of the root archive page
    #[arg(short = 't', long = "archive-title", visible_alias = "title")]
    pub archive_title: Option<String>,

    /// Enable debug logging
    #[arg(short, long, visible_alias = "verbose")]
    pub debug: bool,

    /// Resolve directory paths; must be false if the archive has symlinked portions
    #[arg(short, long, action = clap::ArgAction::Set, num_args = 0..=1, default_missing_value = "true", require_equals = false)]
    pub resolve: Option<bool>,

    /// Destination directory of the text indexer configuration
    #[arg(short = 'i', long = "indexer-config-dir")]
    pub indexer_config_dir: Option<PathBuf>,

    /// Rebuild only this subtree of the archive
    #[arg(short = 's', long = "start-dir")]
    pub start_dir: Option<PathBuf>,

    /// Config file (default: pdfarchive.toml in the working directory)
    #[arg(short = 'C', long, default_value = "pdfarchive.toml")]
    pub config: PathBuf,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_long_flags() {
        let cli = Cli::try_parse_from([
            "pdfarchive",
            "--base-dir",
            "/srv/archive",
            "--base-url",
            "https://example.org",
            "--archive-title",
            "Scans",
            "--debug",
            "--indexer-config-dir",
            "/etc/idx",
        ])
        .unwrap();

        assert_eq!(cli.base_dir, Some(PathBuf::from("/srv/archive")));
        assert_eq!(cli.base_url.as_deref(), Some("https://example.org"));
        assert_eq!(cli.archive_title.as_deref(), Some("Scans"));
        assert!(cli.debug);
        assert_eq!(cli.indexer_config_dir, Some(PathBuf::from("/etc/idx")));
        assert_eq!(cli.resolve, None);
        assert_eq!(cli.config, PathBuf::from("pdfarchive.toml"));
    }

    #[test]
    fn test_parse_aliases() {
        let cli = Cli::try_parse_from([
            "pdfarchive",
            "--directory",
            "a",
            "--uri",
            "file:///a",
            "--title",
            "T",
            "--verbose",
        ])
        .unwrap();

        assert_eq!(cli.base_dir, Some(PathBuf::from("a")));
        assert_eq!(cli.base_url.as_deref(), Some("file:///a"));
        assert_eq!(cli.archive_title.as_deref(), Some("T"));
        assert!(cli.debug);
    }

    #[test]
    fn test_resolve_flag_values() {
        let cli = Cli::try_parse_from(["pdfarchive", "-r"]).unwrap();
        assert_eq!(cli.resolve, Some(true));

        let cli = Cli::try_parse_from(["pdfarchive", "--resolve", "false"]).unwrap();
        assert_eq!(cli.resolve, Some(false));
    }
}
