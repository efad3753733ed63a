//! Page and configuration templates.
//!
//! Rendering is a pure function of a template name and named values. Values
//! are substituted verbatim into `{{name}}` placeholders, so callers escape
//! and percent-encode before rendering.

use anyhow::{Result, anyhow, bail};
use regex::{Captures, Regex};
use std::{borrow::Cow, sync::OnceLock};

// ============================================================================
// Template Names
// ============================================================================

pub const INDEX: &str = "index";
pub const CONTAINING_DIR: &str = "containing_dir";
pub const DIR_TABLE: &str = "dir_table";
pub const DIR_ROW: &str = "dir_row";
pub const FILE_TABLE: &str = "file_table";
pub const FILE_ROW: &str = "file_row";
pub const ARCHIVE_TABLE: &str = "archive_table";
pub const ARCHIVE_ROW: &str = "archive_row";
pub const INDEXER_CONFIG: &str = "indexer_config";

/// Renders named templates.
pub trait Templates {
    /// Render `name` with `vars`.
    ///
    /// # Errors
    /// Unknown template names and placeholders without a value.
    fn render(&self, name: &str, vars: &[(&str, &str)]) -> Result<String>;
}

/// Templates compiled into the binary.
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinTemplates;

impl Templates for BuiltinTemplates {
    fn render(&self, name: &str, vars: &[(&str, &str)]) -> Result<String> {
        let source = builtin(name).ok_or_else(|| anyhow!("unknown template `{name}`"))?;
        substitute(name, source, vars)
    }
}

fn builtin(name: &str) -> Option<&'static str> {
    Some(match name {
        INDEX => INDEX_HTML,
        CONTAINING_DIR => CONTAINING_DIR_HTML,
        DIR_TABLE => DIR_TABLE_HTML,
        DIR_ROW => DIR_ROW_HTML,
        FILE_TABLE => FILE_TABLE_HTML,
        FILE_ROW => FILE_ROW_HTML,
        ARCHIVE_TABLE => ARCHIVE_TABLE_HTML,
        ARCHIVE_ROW => ARCHIVE_ROW_HTML,
        INDEXER_CONFIG => INDEXER_CONF,
        _ => return None,
    })
}

fn placeholder() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\{\{\s*([a-z_]+)\s*\}\}").unwrap())
}

/// Replace every `{{key}}` in `source` with its value.
fn substitute(name: &str, source: &str, vars: &[(&str, &str)]) -> Result<String> {
    let mut missing = None;
    let rendered = placeholder().replace_all(source, |caps: &Captures| {
        let key = &caps[1];
        match vars.iter().find(|(k, _)| *k == key) {
            Some((_, value)) => (*value).to_owned(),
            None => {
                missing.get_or_insert_with(|| key.to_owned());
                String::new()
            }
        }
    });

    if let Some(key) = missing {
        bail!("template `{name}` has no value for `{key}`");
    }
    Ok(rendered.into_owned())
}

/// Escape text for HTML element content and attribute values.
pub fn html_escape(s: &str) -> Cow<'_, str> {
    if !s.contains(['&', '<', '>', '"', '\'']) {
        return Cow::Borrowed(s);
    }
    Cow::Owned(
        s.replace('&', "&amp;")
            .replace('<', "&lt;")
            .replace('>', "&gt;")
            .replace('"', "&quot;")
            .replace('\'', "&#39;"),
    )
}

// ============================================================================
// Template Sources
// ============================================================================

const INDEX_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>{{title}}</title>
<link rel="canonical" href="{{page_url}}">
<link rel="icon" href="{{root}}favicon.svg" type="image/svg+xml">
<link rel="stylesheet" href="{{root}}css/archive.css">
<script src="{{root}}scripts/shade.js" defer></script>
</head>
<body>
<header>
<h1>{{title}}</h1>
{{containing_dir}}
</header>
<main>
{{dir_table}}
{{file_table}}
{{archive_table}}
</main>
</body>
</html>
"#;

const CONTAINING_DIR_HTML: &str = r#"<nav class="up"><a href="../index.html">&uarr; {{parent}}</a></nav>"#;

const DIR_TABLE_HTML: &str = r#"<table id="dirlist">
<tr><th>Folders</th></tr>
{{rows}}</table>"#;

const DIR_ROW_HTML: &str = r#"<tr class="dir"><td><a href="{{href}}/index.html">{{name}}</a></td></tr>
"#;

const FILE_TABLE_HTML: &str = r#"<table id="filelist">
<tr><th>Preview</th><th>Document</th><th>Text</th></tr>
{{rows}}</table>"#;

const FILE_ROW_HTML: &str = r#"<tr class="pdffile" id="doc{{id}}"><td><a href="{{href}}"><img src="{{thumb}}" alt="{{stem}}" loading="lazy"></a></td><td><a href="{{href}}">{{name}}</a></td><td><a href="{{text}}">text</a></td></tr>
"#;

const ARCHIVE_TABLE_HTML: &str = r#"<table id="archivelist">
<tr><th>Archives</th></tr>
{{rows}}</table>"#;

const ARCHIVE_ROW_HTML: &str = r#"<tr class="archive"><td><a href="{{href}}">{{name}}</a></td></tr>
"#;

const INDEXER_CONF: &str = r#"# Written by pdfarchive. Local edits are overwritten on the next build.
topdirs = {{text_dir}}
dbdir = {{db_dir}}
indexedmimetypes = text/plain
skippedNames = *.tiff index.html
# Text/<path>.txt is served at {{text_url}}<path>.txt
pdfarchive_text_url = {{text_url}}
pdfarchive_site_url = {{base_url}}
"#;

// ============================================================================
// Tests
// ============================================================================
