//! Archive build orchestration.
//!
//! Walks the archive depth-first and drives every per-directory stage.
//!
//! # Architecture
//!
//! ```text
//! build_archive()
//!     │
//!     └── BuildContext::build()            one per directory
//!             │
//!             ├── scan_directory()         classify children, chmod files
//!             ├── copy_sitewide_assets()   root only
//!             ├── generate_artifacts()     index.html, Thumbs/, Text/
//!             ├── resolve, chmod, build()  each subdirectory, in name order
//!             │
//!             └── build_search_index()     root only, after every subtree
//! ```
//!
//! A directory's artifacts are written before any of its subdirectories is
//! scanned, and the search index is built only once the whole `Text/` tree
//! exists. Only containment violations abort the walk; everything else is
//! logged and the walk moves on.

use crate::{
    Logger,
    assets::copy_sitewide_assets,
    config::{ArchiveConfig, ToolsConfig},
    debug,
    error::BuildError,
    generator::{self, search::build_search_index, text::TextOutcome, thumbnail::ThumbnailOutcome},
    log,
    paths::{DirPaths, PathResolver, TEXT_DIR},
    scan::{Entries, file_name, normalize_permissions, scan_directory},
    templates::Templates,
    utils::exec::Runner,
};
use anyhow::Result;
use std::{
    collections::HashSet,
    fs,
    path::{Path, PathBuf},
};
use walkdir::WalkDir;

// ============================================================================
// Site
// ============================================================================

/// Read-only state shared by every directory of one build.
pub struct Site<'a> {
    config: &'a ArchiveConfig,
    resolver: PathResolver,
    base_url: String,
    title: String,
    logger: Logger,
    runner: &'a dyn Runner,
    templates: &'a dyn Templates,
}

impl<'a> Site<'a> {
    /// Prepare a build of the archive described by `config`.
    ///
    /// # Errors
    /// Returns [`BuildError::Io`] if the root cannot be resolved.
    pub fn new(
        config: &'a ArchiveConfig,
        logger: Logger,
        runner: &'a dyn Runner,
        templates: &'a dyn Templates,
    ) -> Result<Self, BuildError> {
        Ok(Self {
            resolver: PathResolver::new(config.root(), config.archive.resolve)?,
            base_url: config.base_url(),
            title: config.title(),
            config,
            logger,
            runner,
            templates,
        })
    }

    /// Archive root as the resolver sees it.
    #[inline]
    pub fn root(&self) -> &Path {
        self.resolver.root()
    }

    #[inline]
    pub const fn config(&self) -> &ArchiveConfig {
        self.config
    }

    #[inline]
    pub fn tools(&self) -> &ToolsConfig {
        &self.config.tools
    }

    /// Base URL, always ending with `/`.
    #[inline]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Title of the root page.
    #[inline]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[inline]
    pub const fn logger(&self) -> &Logger {
        &self.logger
    }

    #[inline]
    pub fn runner(&self) -> &dyn Runner {
        self.runner
    }

    #[inline]
    pub fn templates(&self) -> &dyn Templates {
        self.templates
    }
}

// ============================================================================
// Build Report
// ============================================================================

/// Counters collected over one build.
#[derive(Debug, Default)]
pub struct BuildReport {
    /// Directories scanned
    pub directories: usize,
    /// Documents seen across all directories
    pub documents: usize,
    /// Index pages whose content changed
    pub pages_written: usize,
    /// Thumbnails produced by the converter
    pub thumbnails: usize,
    /// Text files produced by the direct extractor or image OCR
    pub texts: usize,
    /// Text files produced by the rasterize-and-OCR fallback
    pub ocr_fallbacks: usize,
    /// Placeholder thumbnails and text notes
    pub placeholders: usize,
    /// Artifacts that could not be written at all
    pub failures: usize,
    /// Outcome of the search indexer; `None` when the walk did not start at
    /// the root, `Some(false)` when it failed or the root could not be scanned
    pub search_indexed: Option<bool>,
    /// Canonical paths of visited directories
    visited: HashSet<PathBuf>,
}

impl BuildReport {
    /// Mark `dir` as visited. Returns `false` if it was seen before.
    fn visit(&mut self, dir: &Path) -> bool {
        let key = fs::canonicalize(dir).unwrap_or_else(|_| dir.to_path_buf());
        self.visited.insert(key)
    }

    pub fn record_thumbnail(&mut self, outcome: ThumbnailOutcome) {
        match outcome {
            ThumbnailOutcome::Existing => {}
            ThumbnailOutcome::Converted => self.thumbnails += 1,
            ThumbnailOutcome::Placeholder => self.placeholders += 1,
            ThumbnailOutcome::Failed => self.failures += 1,
        }
    }

    pub fn record_text(&mut self, outcome: TextOutcome) {
        match outcome {
            TextOutcome::Existing => {}
            TextOutcome::Extracted => self.texts += 1,
            TextOutcome::OcrFallback => self.ocr_fallbacks += 1,
            TextOutcome::Placeholder => self.placeholders += 1,
            TextOutcome::Failed => self.failures += 1,
        }
    }
}

// ============================================================================
// Walker
// ============================================================================

/// Build the archive, starting at the configured start directory.
///
/// # Errors
/// Returns an error only when a directory escapes the archive root or the
/// start directory itself cannot be resolved.
pub fn build_archive(site: &Site) -> Result<BuildReport> {
    let start = site.config().start_dir();
    let paths = site.resolver.resolve(start)?;
    let (title, parent_title) = start_titles(site, &paths);

    log!(site.logger(); "build"; "building {}", display_relative(&paths));
    debug!(
        site.logger();
        "build";
        "root {}, resolve {}",
        site.root().display(),
        if site.resolver.resolves() { "on" } else { "off" }
    );

    let mut report = BuildReport::default();
    BuildContext::new(site, paths, title, parent_title).build(&mut report)?;

    log_build_result(site, &report);
    Ok(report)
}

/// Titles of the start directory's page and of its parent's page.
fn start_titles(site: &Site, paths: &DirPaths) -> (String, Option<String>) {
    if paths.is_root {
        return (site.title().to_owned(), None);
    }

    let parent_title = match paths.relative.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => file_name(parent),
        _ => site.title().to_owned(),
    };
    (file_name(&paths.current), Some(parent_title))
}

/// Per-directory state, alive only while its subtree is built.
pub struct BuildContext<'a> {
    site: &'a Site<'a>,
    paths: DirPaths,
    title: String,
    parent_title: Option<String>,
    entries: Entries,
}

impl<'a> BuildContext<'a> {
    fn new(site: &'a Site<'a>, paths: DirPaths, title: String, parent_title: Option<String>) -> Self {
        Self {
            site,
            paths,
            title,
            parent_title,
            entries: Entries::default(),
        }
    }

    #[inline]
    pub const fn site(&self) -> &'a Site<'a> {
        self.site
    }

    #[inline]
    pub const fn paths(&self) -> &DirPaths {
        &self.paths
    }

    #[inline]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Title of the containing directory's page; `None` at the root.
    #[inline]
    pub fn parent_title(&self) -> Option<&str> {
        self.parent_title.as_deref()
    }

    #[inline]
    pub const fn entries(&self) -> &Entries {
        &self.entries
    }

    /// Build this directory and its whole subtree.
    fn build(mut self, report: &mut BuildReport) -> Result<(), BuildError> {
        let logger = self.site.logger();

        if !report.visit(&self.paths.current) {
            debug!(logger; "build"; "skipping {}, already visited", display_relative(&self.paths));
            return Ok(());
        }
        report.directories += 1;

        debug!(logger; "scan"; "{}", display_relative(&self.paths));
        self.entries = match scan_directory(&self.paths.current, self.paths.is_root, logger) {
            Ok(entries) => entries,
            Err(e) => {
                log!(logger; "error"; "{:#}", e);
                if self.paths.is_root {
                    report.search_indexed = Some(false);
                }
                return Ok(());
            }
        };
        report.documents += self.entries.documents.len();

        if self.paths.is_root
            && let Err(e) = copy_sitewide_assets(&self.paths, self.site.root(), logger)
        {
            log!(logger; "error"; "{:#}", anyhow::Error::from(e));
        }

        generator::generate_artifacts(&self, report);

        for dir in &self.entries.subdirectories {
            match self.child(dir) {
                Ok(child) => {
                    normalize_permissions(&child.paths.current, true, logger);
                    child.build(report)?;
                }
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => log!(logger; "error"; "{:#}", anyhow::Error::from(e)),
            }
        }

        if self.paths.is_root {
            report.search_indexed = Some(self.index_search());
        }
        Ok(())
    }

    /// Context for a subdirectory, titled with its own name.
    fn child(&self, dir: &Path) -> Result<BuildContext<'a>, BuildError> {
        let paths = self.site.resolver.resolve(dir)?;
        let title = file_name(&paths.current);
        Ok(BuildContext::new(self.site, paths, title, Some(self.title.clone())))
    }

    /// Run the search indexer over the finished `Text/` tree.
    fn index_search(&self) -> bool {
        let logger = self.site.logger();
        log!(logger; "search"; "indexing {}", TEXT_DIR);
        match build_search_index(self.site) {
            Ok(()) => true,
            Err(e) => {
                log!(logger; "error"; "{:#}", e);
                false
            }
        }
    }
}

/// Directory as shown in log lines.
fn display_relative(paths: &DirPaths) -> String {
    if paths.is_root {
        "archive root".into()
    } else {
        paths.relative.display().to_string()
    }
}

/// Log a one-line summary of the build.
fn log_build_result(site: &Site, report: &BuildReport) {
    let logger = site.logger();

    log!(
        logger;
        "build";
        "done: {} directories, {} documents, {} text files in {}/",
        report.directories,
        report.documents,
        count_files(&site.root().join(TEXT_DIR), "txt"),
        TEXT_DIR
    );

    debug!(
        logger;
        "build";
        "{} pages written, {} thumbnails, {} texts, {} via OCR fallback",
        report.pages_written,
        report.thumbnails,
        report.texts,
        report.ocr_fallbacks
    );

    if report.failures > 0 {
        log!(logger; "error"; "{} artifacts could not be written", report.failures);
    }
    if report.placeholders > 0 {
        log!(logger; "warn"; "{} placeholders written, see log above", report.placeholders);
    }
    if report.search_indexed.is_none() {
        log!(logger; "search"; "skipped, build did not start at the archive root");
    }
}

/// Count regular files with extension `ext` under `dir`.
fn count_files(dir: &Path, ext: &str) -> usize {
    WalkDir::new(dir)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file())
        .filter(|e| e.path().extension().is_some_and(|x| x == ext))
        .count()
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        templates::BuiltinTemplates,
        test_utils::{FakeRunner, config_for, simulate, touch},
    };
    use std::time::SystemTime;
    use tempfile::TempDir;

    fn build(config: &ArchiveConfig, runner: &FakeRunner) -> BuildReport {
        let site = Site::new(config, Logger::quiet(), runner, &BuiltinTemplates).unwrap();
        build_archive(&site).unwrap()
    }

    fn mtime(path: &Path) -> SystemTime {
        fs::metadata(path).unwrap().modified().unwrap()
    }

    /// `report.pdf` at the root, `Archive/old.pdf` one level down.
    fn small_archive() -> TempDir {
        let dir = TempDir::new().unwrap();
        touch(&dir.path().join("report.pdf"), b"%PDF-1.4");
        touch(&dir.path().join("Archive/old.pdf"), b"%PDF-1.4");
        dir
    }

    #[test]
    fn test_full_build() {
        let dir = small_archive();
        let config = config_for(dir.path());
        let runner = FakeRunner::working();

        let report = build(&config, &runner);
        let root = dir.path().canonicalize().unwrap();

        for artifact in [
            "index.html",
            "Archive/index.html",
            "Thumbs/report_thumb.png",
            "Thumbs/Archive/old_thumb.png",
            "Text/report.txt",
            "Text/Archive/old.txt",
            "css/archive.css",
            "scripts/shade.js",
            "favicon.svg",
            "config/recoll.conf",
        ] {
            assert!(root.join(artifact).is_file(), "missing {artifact}");
        }

        assert_eq!(report.directories, 2);
        assert_eq!(report.documents, 2);
        assert_eq!(report.thumbnails, 2);
        assert_eq!(report.texts, 2);
        assert_eq!(report.placeholders, 0);
        assert_eq!(report.search_indexed, Some(true));
        assert_eq!(runner.count("recollindex"), 1);
    }

    #[test]
    fn test_search_index_runs_last() {
        let dir = small_archive();
        let config = config_for(dir.path());
        let runner = FakeRunner::working();
        build(&config, &runner);

        let programs = runner.programs();
        assert_eq!(programs.last().map(String::as_str), Some("recollindex"));
        assert_eq!(programs.iter().filter(|p| *p == "recollindex").count(), 1);
    }

    #[test]
    fn test_parent_artifacts_before_children() {
        let dir = small_archive();
        let config = config_for(dir.path());
        let runner = FakeRunner::working();
        build(&config, &runner);

        let calls = runner.calls();
        let position = |needle: &str| {
            calls
                .iter()
                .position(|call| call.iter().any(|arg| arg.contains(needle)))
                .unwrap()
        };
        assert!(position("report.pdf") < position("old.pdf"));
    }

    #[test]
    fn test_page_addressing() {
        let dir = small_archive();
        let config = config_for(dir.path());
        build(&config, &FakeRunner::working());

        let root_page = fs::read_to_string(dir.path().join("index.html")).unwrap();
        assert!(root_page.contains(r#"href="Archive/index.html""#));
        assert!(root_page.contains(r#"src="Thumbs/report_thumb.png""#));
        assert!(root_page.contains(r#"href="Text/report.txt""#));
        assert!(!root_page.contains(r#"class="up""#));

        let child_page = fs::read_to_string(dir.path().join("Archive/index.html")).unwrap();
        assert!(child_page.contains(r#"src="../Thumbs/Archive/old_thumb.png""#));
        assert!(child_page.contains(r#"href="../Text/Archive/old.txt""#));
        assert!(child_page.contains(r#"href="../css/archive.css""#));
        assert!(child_page.contains("Test Archive</a>"));
        assert!(child_page.contains(r#"href="https://archive.test/Archive/""#));
    }

    #[test]
    fn test_second_build_is_idempotent() {
        let dir = small_archive();
        let config = config_for(dir.path());
        build(&config, &FakeRunner::working());

        let watched = ["index.html", "Archive/index.html", "Thumbs/report_thumb.png", "Text/Archive/old.txt"];
        let before: Vec<_> = watched.iter().map(|p| mtime(&dir.path().join(p))).collect();
        let bytes_before = fs::read(dir.path().join("index.html")).unwrap();

        let runner = FakeRunner::working();
        let report = build(&config, &runner);

        let after: Vec<_> = watched.iter().map(|p| mtime(&dir.path().join(p))).collect();
        assert_eq!(before, after);
        assert_eq!(fs::read(dir.path().join("index.html")).unwrap(), bytes_before);
        assert_eq!(report.pages_written, 0);
        assert_eq!(report.thumbnails + report.texts + report.placeholders, 0);

        // Only the indexer runs again
        assert_eq!(runner.programs(), vec!["recollindex"]);
    }

    #[test]
    fn test_failing_tools_still_yield_every_artifact() {
        let dir = small_archive();
        touch(&dir.path().join("Archive/scan.JPG"), b"jpeg");
        let config = config_for(dir.path());
        let runner = FakeRunner::failing();

        let report = build(&config, &runner);

        for artifact in [
            "Thumbs/report_thumb.png",
            "Thumbs/Archive/old_thumb.png",
            "Thumbs/Archive/scan_thumb.png",
            "Text/report.txt",
            "Text/Archive/old.txt",
            "Text/Archive/scan.txt",
        ] {
            assert!(dir.path().join(artifact).is_file(), "missing {artifact}");
        }
        assert_eq!(report.placeholders, 6);
        assert_eq!(report.search_indexed, Some(false));
        assert!(dir.path().join("Archive/index.html").is_file());
    }

    #[test]
    fn test_reserved_names_only_skipped_at_root() {
        let dir = TempDir::new().unwrap();
        touch(&dir.path().join("Thumbs/stale_thumb.png"), b"png");
        touch(&dir.path().join("Mags/Thumbs/cover.pdf"), b"%PDF");
        let config = config_for(dir.path());

        let report = build(&config, &FakeRunner::working());

        assert!(!dir.path().join("Thumbs/index.html").exists());
        assert!(dir.path().join("Mags/Thumbs/index.html").is_file());
        assert!(dir.path().join("Text/Mags/Thumbs/cover.txt").is_file());
        assert_eq!(report.directories, 3);
    }

    #[test]
    fn test_empty_archive() {
        let dir = TempDir::new().unwrap();
        let config = config_for(dir.path());
        let runner = FakeRunner::working();

        let report = build(&config, &runner);

        let page = fs::read_to_string(dir.path().join("index.html")).unwrap();
        assert!(!page.contains("<table"));
        assert_eq!(report.directories, 1);
        assert_eq!(runner.programs(), vec!["recollindex"]);
    }

    #[test]
    fn test_start_dir_skips_search() {
        let dir = small_archive();
        let mut config = config_for(dir.path());
        config.start_dir = Some(config.root().join("Archive"));
        let runner = FakeRunner::working();

        let report = build(&config, &runner);

        assert!(dir.path().join("Archive/index.html").is_file());
        assert!(dir.path().join("Text/Archive/old.txt").is_file());
        assert!(!dir.path().join("index.html").exists());
        assert!(!dir.path().join("Text/report.txt").exists());
        assert_eq!(report.search_indexed, None);
        assert_eq!(runner.count("recollindex"), 0);

        let page = fs::read_to_string(dir.path().join("Archive/index.html")).unwrap();
        assert!(page.contains("Test Archive</a>"));
    }

    #[cfg(unix)]
    #[test]
    fn test_directory_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let dir = small_archive();
        let sub = dir.path().join("Archive");
        fs::set_permissions(&sub, fs::Permissions::from_mode(0o700)).unwrap();
        fs::set_permissions(sub.join("old.pdf"), fs::Permissions::from_mode(0o600)).unwrap();

        build(&config_for(dir.path()), &FakeRunner::working());

        let mode = |p: &Path| fs::metadata(p).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode(&sub), 0o755);
        assert_eq!(mode(&sub.join("old.pdf")), 0o644);
    }

    #[cfg(unix)]
    #[test]
    fn test_symlink_outside_root_aborts_with_resolve() {
        use std::os::unix::fs::PermissionsExt;

        let dir = small_archive();
        let outside = TempDir::new().unwrap();
        touch(&outside.path().join("elsewhere.pdf"), b"%PDF");
        fs::set_permissions(outside.path(), fs::Permissions::from_mode(0o700)).unwrap();
        std::os::unix::fs::symlink(outside.path(), dir.path().join("Linked")).unwrap();

        let config = config_for(dir.path());
        let runner = FakeRunner::working();
        let site = Site::new(&config, Logger::quiet(), &runner, &BuiltinTemplates).unwrap();
        let err = build_archive(&site).unwrap_err();

        assert!(matches!(
            err.downcast_ref::<BuildError>(),
            Some(BuildError::Containment { .. })
        ));
        assert_eq!(runner.count("recollindex"), 0);

        // Nothing outside the archive was touched
        let mode = fs::metadata(outside.path()).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o700);
    }

    #[cfg(unix)]
    #[test]
    fn test_start_dir_on_symlinked_subtree_with_resolve_off() {
        use crate::cli::Cli;

        let dir = small_archive();
        let outside = TempDir::new().unwrap();
        touch(&outside.path().join("elsewhere.pdf"), b"%PDF");
        std::os::unix::fs::symlink(outside.path(), dir.path().join("Linked")).unwrap();

        let cli = Cli {
            base_dir: Some(dir.path().to_path_buf()),
            resolve: Some(false),
            start_dir: Some(dir.path().join("Linked")),
            config: dir.path().join("pdfarchive.toml"),
            ..Default::default()
        };
        let config = ArchiveConfig::load(&cli).unwrap();
        let report = build(&config, &FakeRunner::working());

        assert!(dir.path().join("Linked/index.html").is_file());
        assert!(dir.path().join("Thumbs/Linked/elsewhere_thumb.png").is_file());
        assert!(dir.path().join("Text/Linked/elsewhere.txt").is_file());
        assert!(!dir.path().join("index.html").exists());
        assert_eq!(report.search_indexed, None);
    }

    #[test]
    fn test_unreadable_root_counts_as_failed_search() {
        let dir = TempDir::new().unwrap();
        let mut config = config_for(dir.path());
        config.archive.root = config.root().join("gone");
        config.archive.resolve = false;
        let runner = FakeRunner::working();

        let report = build(&config, &runner);

        assert_eq!(report.directories, 1);
        assert_eq!(report.search_indexed, Some(false));
        assert!(runner.calls().is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn test_symlinked_subtree_with_resolve_off() {
        let dir = small_archive();
        let outside = TempDir::new().unwrap();
        touch(&outside.path().join("elsewhere.pdf"), b"%PDF");
        std::os::unix::fs::symlink(outside.path(), dir.path().join("Linked")).unwrap();

        let mut config = config_for(dir.path());
        config.archive.resolve = false;
        let report = build(&config, &FakeRunner::working());

        assert!(dir.path().join("Thumbs/Linked/elsewhere_thumb.png").is_file());
        assert!(dir.path().join("Text/Linked/elsewhere.txt").is_file());
        assert_eq!(report.search_indexed, Some(true));
    }

    #[cfg(unix)]
    #[test]
    fn test_symlink_loop_visits_once() {
        let dir = small_archive();
        std::os::unix::fs::symlink(dir.path(), dir.path().join("Archive/Loop")).unwrap();

        let mut config = config_for(dir.path());
        config.archive.resolve = false;
        let report = build(&config, &FakeRunner::working());

        assert_eq!(report.directories, 2);
    }

    #[test]
    fn test_scanned_pdf_uses_ocr_fallback() {
        let dir = TempDir::new().unwrap();
        touch(&dir.path().join("scan.pdf"), b"%PDF");
        let config = config_for(dir.path());
        let runner = FakeRunner::new(|program, args| {
            if program == "pdftotext" {
                return args.last().is_some_and(|out| fs::write(out, "\x0c").is_ok());
            }
            simulate(program, args)
        });

        let report = build(&config, &runner);

        assert_eq!(report.ocr_fallbacks, 1);
        assert_eq!(
            fs::read_to_string(dir.path().join("Text/scan.txt")).unwrap(),
            "ocr text\n"
        );
        assert!(!dir.path().join("Text/scan.tiff").exists());
        assert_eq!(
            runner.programs(),
            vec!["convert", "pdftotext", "gs", "tesseract", "recollindex"]
        );
    }

    #[test]
    fn test_count_files() {
        let dir = TempDir::new().unwrap();
        touch(&dir.path().join("a.txt"), b"a");
        touch(&dir.path().join("sub/b.txt"), b"b");
        touch(&dir.path().join("sub/c.tiff"), b"c");
        assert_eq!(count_files(dir.path(), "txt"), 2);
        assert_eq!(count_files(&dir.path().join("missing"), "txt"), 0);
    }
}
