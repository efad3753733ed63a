//! Build error types.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while walking the archive.
///
/// Only [`BuildError::Containment`] aborts a build. The other variants are
/// logged by the caller and the walk continues.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("`{current}` is not contained by archive root `{root}`")]
    Containment { root: PathBuf, current: PathBuf },

    #[error("IO error at `{0}`")]
    Io(PathBuf, #[source] std::io::Error),

    #[error("sitewide assets can only be copied from the archive root, not `{0}`")]
    SitewideCopyMisuse(PathBuf),
}

impl BuildError {
    /// Whether this error must stop the whole build.
    pub const fn is_fatal(&self) -> bool {
        matches!(self, Self::Containment { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Error, ErrorKind};

    #[test]
    fn test_build_error_display() {
        let err = BuildError::Containment {
            root: PathBuf::from("/srv/archive"),
            current: PathBuf::from("/tmp/elsewhere"),
        };
        let display = format!("{err}");
        assert!(display.contains("/tmp/elsewhere"));
        assert!(display.contains("/srv/archive"));

        let io_err = BuildError::Io(
            PathBuf::from("Mags"),
            Error::new(ErrorKind::PermissionDenied, "denied"),
        );
        assert!(format!("{io_err}").contains("Mags"));
    }

    #[test]
    fn test_only_containment_is_fatal() {
        let containment = BuildError::Containment {
            root: PathBuf::from("/a"),
            current: PathBuf::from("/b"),
        };
        assert!(containment.is_fatal());
        assert!(!BuildError::SitewideCopyMisuse(PathBuf::from("/a/b")).is_fatal());
    }
}
