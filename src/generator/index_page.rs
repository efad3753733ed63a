//! Directory index pages.
//!
//! One `index.html` per directory, listing subdirectories, documents (with
//! thumbnail and text links into the mirror trees) and archives. Names are
//! HTML-escaped for display and percent-encoded in links.

use crate::{
    build::BuildContext,
    paths::{TEXT_DIR, THUMBS_DIR},
    scan::file_name,
    templates::{self, Templates, html_escape},
    utils::fs::write_if_changed,
};
use anyhow::{Context, Result};

/// File name of every generated page.
pub const INDEX_FILE: &str = "index.html";

/// Render and write the page for `ctx`.
///
/// Returns `true` when the file changed on disk.
pub fn write_index_page(ctx: &BuildContext) -> Result<bool> {
    let html = render_index_page(ctx)?;
    let path = ctx.paths().current.join(INDEX_FILE);
    write_if_changed(&path, html.as_bytes())
        .with_context(|| format!("Failed to write {}", path.display()))
}

/// Render the page for `ctx`.
///
/// Tables with no rows are left out entirely.
pub fn render_index_page(ctx: &BuildContext) -> Result<String> {
    let site = ctx.site();
    let templates = site.templates();
    let paths = ctx.paths();
    let entries = ctx.entries();

    let containing_dir = match ctx.parent_title() {
        Some(parent) => templates.render(templates::CONTAINING_DIR, &[("parent", &*html_escape(parent))])?,
        None => String::new(),
    };

    let dir_rows = entries
        .subdirectories
        .iter()
        .map(|dir| {
            let name = file_name(dir);
            templates.render(
                templates::DIR_ROW,
                &[
                    ("href", &*urlencoding::encode(&name)),
                    ("name", &*html_escape(&name)),
                ],
            )
        })
        .collect::<Result<Vec<_>>>()?;

    let file_rows = entries
        .documents
        .iter()
        .enumerate()
        .map(|(i, doc)| {
            let name = doc.name();
            let id = (i + 1).to_string();
            let thumb = paths.mirror_url(THUMBS_DIR, &doc.thumb_name());
            let text = paths.mirror_url(TEXT_DIR, &doc.text_name());
            templates.render(
                templates::FILE_ROW,
                &[
                    ("id", &*id),
                    ("href", &*urlencoding::encode(&name)),
                    ("thumb", &*thumb),
                    ("stem", &*html_escape(&doc.stem())),
                    ("name", &*html_escape(&name)),
                    ("text", &*text),
                ],
            )
        })
        .collect::<Result<Vec<_>>>()?;

    let archive_rows = entries
        .archives
        .iter()
        .map(|archive| {
            let name = file_name(archive);
            templates.render(
                templates::ARCHIVE_ROW,
                &[
                    ("href", &*urlencoding::encode(&name)),
                    ("name", &*html_escape(&name)),
                ],
            )
        })
        .collect::<Result<Vec<_>>>()?;

    let page_url = format!("{}{}", site.base_url(), paths.site_path());
    let root = paths.root_prefix();

    templates.render(
        templates::INDEX,
        &[
            ("title", &*html_escape(ctx.title())),
            ("page_url", &*html_escape(&page_url)),
            ("root", &*root),
            ("containing_dir", &*containing_dir),
            ("dir_table", &*table(templates, templates::DIR_TABLE, &dir_rows)?),
            ("file_table", &*table(templates, templates::FILE_TABLE, &file_rows)?),
            ("archive_table", &*table(templates, templates::ARCHIVE_TABLE, &archive_rows)?),
        ],
    )
}

/// Wrap rows in a table template, or nothing if there are no rows.
fn table(templates: &dyn Templates, name: &str, rows: &[String]) -> Result<String> {
    if rows.is_empty() {
        return Ok(String::new());
    }
    templates.render(name, &[("rows", &*rows.concat())])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        Logger,
        build::{Site, build_archive},
        templates::BuiltinTemplates,
        test_utils::{FakeRunner, config_for, touch},
    };
    use std::fs;
    use tempfile::TempDir;

    fn page(root: &std::path::Path, dir: &str) -> String {
        let config = config_for(root);
        let runner = FakeRunner::working();
        let site = Site::new(&config, Logger::quiet(), &runner, &BuiltinTemplates).unwrap();
        build_archive(&site).unwrap();
        fs::read_to_string(root.join(dir).join(INDEX_FILE)).unwrap()
    }

    #[test]
    fn test_names_are_escaped_and_encoded() {
        let dir = TempDir::new().unwrap();
        touch(&dir.path().join("Tom & Jerry <1>.pdf"), b"%PDF");
        touch(&dir.path().join("Old Mags/a.pdf"), b"%PDF");

        let html = page(dir.path(), "");

        assert!(html.contains(r#"href="Tom%20%26%20Jerry%20%3C1%3E.pdf""#));
        assert!(html.contains(">Tom &amp; Jerry &lt;1&gt;.pdf<"));
        assert!(html.contains(r#"src="Thumbs/Tom%20%26%20Jerry%20%3C1%3E_thumb.png""#));
        assert!(html.contains(r#"href="Old%20Mags/index.html""#));
        assert!(html.contains(">Old Mags<"));
    }

    #[test]
    fn test_rows_are_sorted_with_ordinal_ids() {
        let dir = TempDir::new().unwrap();
        for name in ["b.pdf", "a.pdf", "c.png"] {
            touch(&dir.path().join(name), b"data");
        }

        let html = page(dir.path(), "");

        let a = html.find(r#"id="doc1""#).unwrap();
        let b = html.find(r#"id="doc2""#).unwrap();
        let c = html.find(r#"id="doc3""#).unwrap();
        assert!(a < b && b < c);
        assert!(html[a..b].contains("a.pdf"));
        assert!(html[c..].contains("c.png"));
    }

    #[test]
    fn test_archives_listed_without_artifacts() {
        let dir = TempDir::new().unwrap();
        touch(&dir.path().join("bundle.zip"), b"PK");

        let html = page(dir.path(), "");

        assert!(html.contains(r#"<table id="archivelist">"#));
        assert!(html.contains(r#"href="bundle.zip""#));
        assert!(!html.contains(r#"id="filelist""#));
        assert!(!dir.path().join("Thumbs/bundle_thumb.png").exists());
        assert!(!dir.path().join("Text/bundle.txt").exists());
    }

    #[test]
    fn test_deep_page_climbs_to_root() {
        let dir = TempDir::new().unwrap();
        touch(&dir.path().join("Mags/1981/June/issue.pdf"), b"%PDF");

        let html = page(dir.path(), "Mags/1981/June");

        assert!(html.contains(r#"href="../../../css/archive.css""#));
        assert!(html.contains(r#"src="../../../Thumbs/Mags/1981/June/issue_thumb.png""#));
        assert!(html.contains(r#"href="../../../Text/Mags/1981/June/issue.txt""#));
        assert!(html.contains("&uarr; 1981</a>"));
        assert!(html.contains("<title>June</title>"));
    }
}
