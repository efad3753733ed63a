//! Full-text search index over the `Text/` mirror tree.
//!
//! Runs once per build, from the root, after every subtree is finished. The
//! indexer's configuration is rendered from a template and rewritten only
//! when it changes; the indexer itself is then run against that directory.

use crate::{
    build::Site,
    debug, exec, log,
    paths::TEXT_DIR,
    templates,
    utils::fs::write_if_changed,
};
use anyhow::{Context, Result};
use std::{fs, path::Path};

/// Indexer configuration file inside the config directory.
pub const INDEXER_CONFIG_FILE: &str = "recoll.conf";

/// Index database directory inside the config directory.
const DATABASE_DIR: &str = "xapiandb";

/// Write the indexer configuration and run the indexer.
///
/// # Errors
/// Returns an error if the configuration cannot be written or the indexer
/// fails. The caller logs it; the build itself still succeeds.
pub fn build_search_index(site: &Site) -> Result<()> {
    let logger = site.logger();
    let config_dir = site.config().indexer_config_dir();
    let text_dir = site.root().join(TEXT_DIR);

    // An archive without documents still gets an (empty) index
    for dir in [&config_dir, &text_dir] {
        fs::create_dir_all(dir).with_context(|| format!("Failed to create {}", dir.display()))?;
    }

    let config = render_config(site, &config_dir, &text_dir)?;
    let config_path = config_dir.join(INDEXER_CONFIG_FILE);
    if write_if_changed(&config_path, config.as_bytes())
        .with_context(|| format!("Failed to write {}", config_path.display()))?
    {
        debug!(logger; "search"; "wrote {}", config_path.display());
    }

    let output = exec!(site.runner(); &site.tools().indexer; "-c", &config_dir)
        .context("Search indexing failed")?;

    let stderr = String::from_utf8_lossy(&output.stderr);
    if !stderr.trim().is_empty() {
        debug!(logger; "search"; "{}", stderr.trim());
    }
    log!(logger; "search"; "index updated");
    Ok(())
}

fn render_config(site: &Site, config_dir: &Path, text_dir: &Path) -> Result<String> {
    let text_url = format!("{}{}/", site.base_url(), TEXT_DIR);
    site.templates().render(
        templates::INDEXER_CONFIG,
        &[
            ("text_dir", &*text_dir.to_string_lossy()),
            ("db_dir", &*config_dir.join(DATABASE_DIR).to_string_lossy()),
            ("text_url", &*text_url),
            ("base_url", site.base_url()),
        ],
    )
}
