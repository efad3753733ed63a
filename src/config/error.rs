//! Errors raised while loading `pdfarchive.toml`.

use std::path::PathBuf;
use thiserror::Error;

/// Why the configuration could not be used.
///
/// All of these stop the program before the walk starts.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file exists but could not be read.
    #[error("cannot read config file `{0}`")]
    Io(PathBuf, #[source] std::io::Error),

    /// Not TOML, or a field that is unknown or has the wrong type.
    #[error("invalid pdfarchive.toml: {0}")]
    Parse(#[from] toml::de::Error),

    /// Well-formed but unusable, e.g. a root that is not a directory.
    /// The message starts with the offending key or flag.
    #[error("{0}")]
    Validation(String),
}
