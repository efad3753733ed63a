//! Logging with colored module prefixes.
//!
//! Every build context carries a [`Logger`] handle. The level is decided once
//! in `main` and copied into each child context, so nothing mutates a
//! process-wide verbosity while the tree is being walked.
//!
//! # Example
//!
//! ```ignore
//! let logger = Logger::new(Level::Debug);
//! log!(logger; "index"; "{} documents", count);
//! debug!(logger; "scan"; "entering {}", dir.display());
//! ```

use colored::{ColoredString, Colorize};
use crossterm::terminal::size;
use std::{
    io::{Write, stdout},
    sync::OnceLock,
};

/// Cached terminal width (fetched once on first use)
static TERMINAL_WIDTH: OnceLock<u16> = OnceLock::new();

// ============================================================================
// Layout Constants
// ============================================================================
//
// Line format: "[module] message"
//               ^------^
//               prefix

/// Length of brackets around module name: "[]"
const BRACKET_LEN: usize = 2;
/// Space after prefix: "[module] " <- this space
const SPACE_AFTER_PREFIX: usize = 1;

/// Calculate total prefix length for a module name.
///
/// Returns: `module.len() + 3` (for `[`, `]`, and trailing space)
#[inline]
const fn calc_prefix_len(module_len: usize) -> usize {
    module_len + BRACKET_LEN + SPACE_AFTER_PREFIX
}

/// Get terminal width, cached after first call.
/// Falls back to 120 columns if detection fails.
fn get_terminal_width() -> u16 {
    *TERMINAL_WIDTH.get_or_init(|| size().map(|(w, _)| w).unwrap_or(120))
}

// ============================================================================
// Log Macros
// ============================================================================

/// Log a message with a colored module prefix.
///
/// # Usage
/// ```ignore
/// log!(logger; "module"; "message with {} formatting", args);
/// ```
#[macro_export]
macro_rules! log {
    ($logger:expr; $module:expr; $($arg:tt)*) => {{
        $logger.log($module, &format!($($arg)*))
    }};
}

/// Log a message only when debug output is enabled.
///
/// The message is not formatted at all below [`Level::Debug`].
#[macro_export]
macro_rules! debug {
    ($logger:expr; $module:expr; $($arg:tt)*) => {{
        let logger = &$logger;
        if logger.is_debug() {
            logger.log($module, &format!($($arg)*))
        }
    }};
}

// ============================================================================
// Logger Handle
// ============================================================================

/// Verbosity of a [`Logger`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Level {
    /// Print nothing (used by tests).
    Quiet,
    /// Regular progress, warnings and errors.
    Info,
    /// Everything, including per-directory and per-tool chatter.
    Debug,
}

/// Explicit logging handle shared by all build contexts.
#[derive(Debug, Clone, Copy)]
pub struct Logger {
    level: Level,
}

impl Logger {
    pub const fn new(level: Level) -> Self {
        Self { level }
    }

    /// A logger that swallows everything.
    pub const fn quiet() -> Self {
        Self::new(Level::Quiet)
    }

    /// Build a logger from the `--debug` flag.
    pub const fn from_debug(debug: bool) -> Self {
        if debug {
            Self::new(Level::Debug)
        } else {
            Self::new(Level::Info)
        }
    }

    #[inline]
    pub const fn level(&self) -> Level {
        self.level
    }

    #[inline]
    pub fn is_debug(&self) -> bool {
        self.level() >= Level::Debug
    }

    /// Log a message with a colored module prefix.
    ///
    /// Single-line messages are truncated to fit the terminal width.
    pub fn log(&self, module: &str, message: &str) {
        if self.level() == Level::Quiet {
            return;
        }

        let prefix = colorize_prefix(module, &module.to_ascii_lowercase());
        let mut stdout = stdout().lock();

        if message.contains('\n') {
            writeln!(stdout, "{prefix} {message}").ok();
        } else {
            let width = get_terminal_width() as usize;
            let max_msg_len = width.saturating_sub(calc_prefix_len(module.len()));
            writeln!(stdout, "{prefix} {}", truncate_str(message, max_msg_len)).ok();
        }

        stdout.flush().ok();
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Apply color to a module prefix based on module type.
#[inline]
fn colorize_prefix(module: &str, module_lower: &str) -> ColoredString {
    let prefix = format!("[{module}]");
    match module_lower {
        "error" => prefix.bright_red().bold(),
        "warn" => prefix.bright_magenta().bold(),
        "search" => prefix.bright_blue().bold(),
        "build" => prefix.bright_green().bold(),
        _ => prefix.bright_yellow().bold(),
    }
}

/// Truncate a string to fit within `max_len` bytes.
///
/// Ensures the result is valid UTF-8 by finding the nearest character boundary.
#[inline]
fn truncate_str(s: &str, max_len: usize) -> &str {
    if s.len() <= max_len {
        return s;
    }
    let mut end = max_len;
    while end > 0 && !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

// ============================================================================
// Tests
// ============================================================================
