//! Archive configuration management for `pdfarchive.toml`.
//!
//! The file is optional; every field has a default and the CLI can override
//! the `[archive]` values.
//!
//! # Sections
//!
//! | Section     | Purpose                                            |
//! |-------------|----------------------------------------------------|
//! | `[archive]` | Root directory, base URL, title, path resolution   |
//! | `[tools]`   | External converter, extractor, OCR, indexer        |
//!
//! # Example
//!
//! ```toml
//! [archive]
//! root = "/srv/archive"
//! url = "https://archive.example.org/"
//! title = "Club Newsletters"
//!
//! [tools]
//! convert = ["magick"]
//! raster_dpi = 200
//! ```

mod archive;
pub mod defaults;
mod error;
mod tools;

pub use archive::ArchiveSection;
pub use error::ConfigError;
pub use tools::ToolsConfig;

use crate::{Logger, cli::Cli, log};
use anyhow::{Result, bail};
use educe::Educe;
use serde::Deserialize;
use std::{
    fs,
    path::{Path, PathBuf},
};

/// Name of the default indexer configuration directory under the root.
pub const CONFIG_DIR: &str = "config";

// ============================================================================
// Root Configuration
// ============================================================================

/// Root configuration structure representing pdfarchive.toml
#[derive(Debug, Clone, Educe, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct ArchiveConfig {
    /// Absolute path to the config file (set after loading)
    #[serde(skip)]
    pub config_path: PathBuf,

    /// Enable debug logging (CLI only)
    #[serde(skip)]
    pub debug: bool,

    /// Subtree to rebuild instead of the whole archive (CLI only)
    #[serde(skip)]
    pub start_dir: Option<PathBuf>,

    /// Archive location and addressing
    #[serde(default)]
    pub archive: ArchiveSection,

    /// External tools
    #[serde(default)]
    pub tools: ToolsConfig,
}

impl ArchiveConfig {
    /// Parse configuration from TOML string
    pub fn from_str(content: &str) -> Result<Self> {
        let config: ArchiveConfig = toml::from_str(content).map_err(ConfigError::from)?;
        Ok(config)
    }

    /// Load configuration from file path
    pub fn from_path(path: &Path) -> Result<Self> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;
        Self::from_str(&content)
    }

    /// Load the config file named by the CLI (if present) and apply CLI overrides.
    pub fn load(cli: &Cli) -> Result<Self> {
        let mut config = if cli.config.exists() {
            Self::from_path(&cli.config)?
        } else {
            Self::default()
        };
        config.config_path = Self::normalize_path(&cli.config);
        config.update_with_cli(cli);
        Ok(config)
    }

    /// Archive root directory
    #[inline]
    pub fn root(&self) -> &Path {
        &self.archive.root
    }

    /// Directory the walk starts from (the root unless `--start-dir` is set)
    pub fn start_dir(&self) -> &Path {
        self.start_dir.as_deref().unwrap_or(&self.archive.root)
    }

    /// Base URL of the archive, always ending with `/`.
    ///
    /// Falls back to the root's `file://` URL.
    pub fn base_url(&self) -> String {
        let url = match &self.archive.url {
            Some(url) => url.clone(),
            None => file_url(self.root()),
        };
        canonicalize_url(url)
    }

    /// Title of the root page
    pub fn title(&self) -> String {
        match &self.archive.title {
            Some(title) => title.clone(),
            None => self
                .root()
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| "Archive".into()),
        }
    }

    /// Where the search indexer configuration is written
    pub fn indexer_config_dir(&self) -> PathBuf {
        self.archive
            .indexer_config_dir
            .clone()
            .unwrap_or_else(|| self.root().join(CONFIG_DIR))
    }

    /// Update configuration with CLI arguments
    pub fn update_with_cli(&mut self, cli: &Cli) {
        Self::update_option(&mut self.archive.root, cli.base_dir.as_ref());
        Self::update_option(&mut self.archive.resolve, cli.resolve.as_ref());

        if cli.base_url.is_some() {
            self.archive.url = cli.base_url.clone();
        }
        if cli.archive_title.is_some() {
            self.archive.title = cli.archive_title.clone();
        }
        if cli.indexer_config_dir.is_some() {
            self.archive.indexer_config_dir = cli.indexer_config_dir.clone();
        }

        self.debug = cli.debug;

        let resolve = self.archive.resolve;
        self.start_dir = cli
            .start_dir
            .as_deref()
            .map(|path| Self::expand_path(path, resolve));
        self.archive.root = Self::expand_path(&self.archive.root, resolve);
        self.archive.indexer_config_dir = self
            .archive
            .indexer_config_dir
            .as_deref()
            .map(|path| Self::expand_path(path, resolve));
    }

    /// Update config option if CLI value is provided
    fn update_option<T: Clone>(config_option: &mut T, cli_option: Option<&T>) {
        if let Some(option) = cli_option {
            *config_option = option.clone();
        }
    }

    /// Expand `~` and make a path absolute.
    ///
    /// Symlinks are resolved only with `resolve` on, so a symlinked subtree
    /// keeps its in-archive path otherwise.
    fn expand_path(path: &Path, resolve: bool) -> PathBuf {
        let expanded = PathBuf::from(shellexpand::tilde(&path.to_string_lossy()).into_owned());
        if resolve {
            Self::normalize_path(&expanded)
        } else {
            std::path::absolute(&expanded).unwrap_or(expanded)
        }
    }

    /// Normalize a path to absolute, using canonicalize if the path exists
    fn normalize_path(path: &Path) -> PathBuf {
        path.canonicalize().unwrap_or_else(|_| {
            // For non-existent paths, manually make them absolute
            if path.is_absolute() {
                path.to_path_buf()
            } else {
                std::env::current_dir()
                    .map(|cwd| cwd.join(path))
                    .unwrap_or_else(|_| path.to_path_buf())
            }
        })
    }

    /// Validate configuration before the walk starts
    pub fn validate(&self) -> Result<()> {
        let root = self.root();
        if !root.exists() {
            bail!(ConfigError::Validation(format!(
                "[archive.root] `{}` not found",
                root.display()
            )));
        }
        if !root.is_dir() {
            bail!(ConfigError::Validation(format!(
                "[archive.root] `{}` is not a directory",
                root.display()
            )));
        }

        if let Some(start) = &self.start_dir
            && !start.is_dir()
        {
            bail!(ConfigError::Validation(format!(
                "--start-dir `{}` is not a directory",
                start.display()
            )));
        }

        if let Some(url) = &self.archive.url
            && url.trim().is_empty()
        {
            bail!(ConfigError::Validation("[archive.url] must not be empty".into()));
        }

        if self.tools.thumb_geometry.split_once('x').is_none() {
            bail!(ConfigError::Validation(
                "[tools.thumb_geometry] must look like WIDTHxHEIGHT".into()
            ));
        }

        for (field, command) in self.tools.commands() {
            if command.is_empty() {
                bail!(ConfigError::Validation(format!(
                    "{field} must have at least one element"
                )));
            }
        }

        Ok(())
    }

    /// Warn about configured tools that are not on `PATH`.
    ///
    /// Missing tools are not fatal: their artifacts fall back to placeholders.
    /// Returns the number of missing tools.
    pub fn check_tools(&self, logger: &Logger) -> usize {
        let mut missing = 0;
        for (field, command) in self.tools.commands() {
            let Some(cmd) = command.first() else {
                continue;
            };
            if which::which(cmd).is_err() {
                log!(logger; "warn"; "{field} `{cmd}` not found, placeholders will be used");
                missing += 1;
            }
        }
        missing
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Ensure a URL ends with exactly one trailing `/`.
fn canonicalize_url(mut url: String) -> String {
    if !url.ends_with('/') {
        url.push('/');
    }
    url
}

/// `file://` URL of an absolute path, percent-encoding each component.
fn file_url(path: &Path) -> String {
    let encoded: Vec<String> = path
        .components()
        .filter_map(|c| match c {
            std::path::Component::Normal(name) => {
                Some(urlencoding::encode(&name.to_string_lossy()).into_owned())
            }
            _ => None,
        })
        .collect();
    format!("file:///{}", encoded.join("/"))
}

// ============================================================================
// Tests
// ============================================================================
