//! pdfarchive - Static, searchable index pages for a tree of PDFs and scans.

mod assets;
mod build;
mod cli;
mod config;
mod error;
mod generator;
mod logger;
mod paths;
mod scan;
mod templates;
mod utils;

#[cfg(test)]
mod test_utils;

pub use logger::Logger;

use anyhow::Result;
use build::{Site, build_archive};
use clap::Parser;
use cli::Cli;
use config::ArchiveConfig;
use templates::BuiltinTemplates;
use utils::exec::SystemRunner;

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli)?;
    let logger = Logger::from_debug(config.debug);

    if config.config_path.is_file() {
        debug!(logger; "config"; "loaded {}", config.config_path.display());
    }
    config.check_tools(&logger);

    let site = Site::new(&config, logger, &SystemRunner, &BuiltinTemplates)?;
    build_archive(&site)?;
    Ok(())
}

/// Load and validate configuration from CLI arguments
fn load_config(cli: &Cli) -> Result<ArchiveConfig> {
    let config = ArchiveConfig::load(cli)?;
    config.validate()?;
    Ok(config)
}
