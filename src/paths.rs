//! Path resolution between archive directories and the archive root.
//!
//! Every directory page addresses two kinds of shared resources:
//!
//! - root assets (`css/`, `scripts/`, `favicon.svg`), reached by climbing
//!   `path_to_root`
//! - mirror trees (`Thumbs/`, `Text/`), reached by climbing to the root and
//!   descending `relative_path` again
//!
//! # Architecture
//!
//! ```text
//! PathResolver (root fixed for the build)
//!     │
//!     └── resolve(current) → DirPaths
//!                               │
//!                               ├── relative       → Mags/1981
//!                               ├── path_to_root   → ../..
//!                               ├── root_prefix()  → "../../"
//!                               └── mirror_url()   → "../../Thumbs/Mags/1981/x_thumb.png"
//! ```

use crate::error::BuildError;
use std::path::{Component, Path, PathBuf};

/// Name of the thumbnail mirror tree.
pub const THUMBS_DIR: &str = "Thumbs";
/// Name of the extracted-text mirror tree.
pub const TEXT_DIR: &str = "Text";

/// Resolves directories against a fixed archive root.
#[derive(Debug, Clone)]
pub struct PathResolver {
    /// Archive root (canonical when `resolve` is on)
    root: PathBuf,
    /// Resolve symlinks before comparing paths
    resolve: bool,
}

/// Addressing information for one directory of the archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirPaths {
    /// Absolute path of the directory
    pub current: PathBuf,
    /// `current` relative to the archive root (empty at the root)
    pub relative: PathBuf,
    /// `..` steps from `current` back to the root (empty at the root)
    pub path_to_root: PathBuf,
    /// Whether `current` is the archive root
    pub is_root: bool,
}

impl PathResolver {
    /// Create a resolver for `root`.
    ///
    /// With `resolve` on, the root is canonicalized (so it must exist).
    /// With it off, the root is only made absolute.
    pub fn new(root: &Path, resolve: bool) -> Result<Self, BuildError> {
        Ok(Self {
            root: normalize(root, resolve)?,
            resolve,
        })
    }

    #[inline]
    pub fn root(&self) -> &Path {
        &self.root
    }

    #[inline]
    pub const fn resolves(&self) -> bool {
        self.resolve
    }

    /// Compute the addressing of `current` relative to the root.
    ///
    /// # Errors
    ///
    /// [`BuildError::Containment`] when `current` is not the root or one of
    /// its descendants. Containment compares whole path components, so
    /// `/srv/archive-old` is not inside `/srv/archive`.
    pub fn resolve(&self, current: &Path) -> Result<DirPaths, BuildError> {
        let current = normalize(current, self.resolve)?;

        let relative = current
            .strip_prefix(&self.root)
            .map_err(|_| BuildError::Containment {
                root: self.root.clone(),
                current: current.clone(),
            })?
            .to_path_buf();

        let path_to_root = self.climb_to_root(&current);
        let is_root = relative.as_os_str().is_empty();

        Ok(DirPaths {
            current,
            relative,
            path_to_root,
            is_root,
        })
    }

    /// Walk parent pointers from `current` until the root is reached.
    fn climb_to_root(&self, current: &Path) -> PathBuf {
        current
            .ancestors()
            .take_while(|ancestor| *ancestor != self.root)
            .map(|_| Component::ParentDir)
            .collect()
    }
}

impl DirPaths {
    /// URL prefix that leads from this directory's page to the root.
    ///
    /// `""` at the root, `"../"` one level down, and so on.
    pub fn root_prefix(&self) -> String {
        "../".repeat(self.depth())
    }

    /// Number of levels below the root.
    pub fn depth(&self) -> usize {
        self.path_to_root.components().count()
    }

    /// Directory inside a mirror tree that corresponds to this directory.
    ///
    /// ```ignore
    /// paths.mirror_dir(root, "Thumbs") → /root/Thumbs/Mags/1981
    /// ```
    pub fn mirror_dir(&self, root: &Path, tree: &str) -> PathBuf {
        root.join(tree).join(&self.relative)
    }

    /// Page-relative URL of `file_name` inside a mirror tree.
    ///
    /// Each path component is percent-encoded separately.
    pub fn mirror_url(&self, tree: &str, file_name: &str) -> String {
        let mut url = self.root_prefix();
        url.push_str(tree);
        for component in self.relative.components() {
            url.push('/');
            url.push_str(&urlencoding::encode(&component.as_os_str().to_string_lossy()));
        }
        url.push('/');
        url.push_str(&urlencoding::encode(file_name));
        url
    }

    /// Site URL of this directory, relative to the archive base URL.
    pub fn site_path(&self) -> String {
        self.relative
            .components()
            .map(|c| urlencoding::encode(&c.as_os_str().to_string_lossy()).into_owned())
            .map(|c| c + "/")
            .collect()
    }
}

/// Normalize a path to absolute form.
///
/// Canonicalizes (resolving symlinks) when `resolve` is on.
fn normalize(path: &Path, resolve: bool) -> Result<PathBuf, BuildError> {
    let result = if resolve {
        path.canonicalize()
    } else {
        std::path::absolute(path)
    };
    result.map_err(|err| BuildError::Io(path.to_path_buf(), err))
}

// ============================================================================
// Tests
// ============================================================================
