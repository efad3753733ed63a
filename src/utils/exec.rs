//! External command execution.
//!
//! Every converter, extractor and indexer is a black box: it gets an argument
//! list, and we get back an exit status plus captured stdout/stderr. Calls are
//! blocking and strictly one at a time.
//!
//! The [`Runner`] trait is the seam between the build and the operating
//! system, so tests can substitute a recording fake.

use crate::{Logger, debug, log};
use regex::Regex;
use std::{
    ffi::OsString,
    process::{Command, Output},
    sync::OnceLock,
};
use thiserror::Error;

// ============================================================================
// Macros
// ============================================================================

/// Run an external tool through a [`Runner`].
///
/// Empty arguments are dropped, so optional flags can be passed as `""`.
///
/// # Examples
/// ```ignore
/// exec!(runner; &tools.pdftotext; "-layout", pdf, txt)?;
/// ```
#[macro_export]
macro_rules! exec {
    ($runner:expr; $cmd:expr; $($arg:expr),* $(,)?) => {
        $runner.run(
            $cmd,
            &$crate::utils::exec::filter_args(&[$($crate::utils::exec::to_os($arg)),*]),
        )
    };
}

// ============================================================================
// Errors
// ============================================================================

/// A tool could not be run or reported failure.
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("Empty command")]
    Empty,

    #[error("Failed to execute `{name}`")]
    Spawn {
        name: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{0}")]
    Failed(String),
}

// ============================================================================
// Argument Conversion
// ============================================================================

/// Convert to `OsString`.
#[inline]
pub fn to_os<S: Into<OsString>>(s: S) -> OsString {
    s.into()
}

/// Filter out empty args.
#[inline]
pub fn filter_args(args: &[OsString]) -> Vec<OsString> {
    args.iter().filter(|a| !a.is_empty()).cloned().collect()
}

// ============================================================================
// Runner
// ============================================================================

/// Runs external commands.
pub trait Runner {
    /// Run `cmd` (program plus leading arguments) followed by `args`.
    ///
    /// # Errors
    /// Returns [`ToolError`] if the program cannot be spawned or exits
    /// non-zero.
    fn run(&self, cmd: &[String], args: &[OsString]) -> Result<Output, ToolError>;
}

/// Runs commands as real child processes.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl Runner for SystemRunner {
    fn run(&self, cmd: &[String], args: &[OsString]) -> Result<Output, ToolError> {
        exec(cmd, args)
    }
}

/// Execute a command and capture its output.
///
/// # Errors
/// Returns error if command fails to execute or returns non-zero exit code.
pub fn exec(cmd: &[String], args: &[OsString]) -> Result<Output, ToolError> {
    let (name, mut command) = prepare(cmd, args)?;

    let output = command
        .output()
        .map_err(|source| ToolError::Spawn {
            name: name.clone(),
            source,
        })?;

    if !output.status.success() {
        return Err(ToolError::Failed(format_error(&name, &output)));
    }
    Ok(output)
}

/// Prepare a Command from components.
fn prepare(cmd: &[String], args: &[OsString]) -> Result<(String, Command), ToolError> {
    let (program, leading) = cmd.split_first().ok_or(ToolError::Empty)?;

    let mut command = Command::new(program);
    command.args(leading).args(args);

    Ok((program.clone(), command))
}

/// Run a tool and absorb any failure into the log.
///
/// Returns `true` when the tool exited successfully. Stderr of a successful
/// run is logged at debug level after `filter` drops known noise.
pub fn run_logged(
    runner: &dyn Runner,
    logger: &Logger,
    cmd: &[String],
    args: &[OsString],
    filter: &FilterRule,
) -> bool {
    match runner.run(cmd, args) {
        Ok(output) => {
            if logger.is_debug() {
                let name = cmd.first().map(String::as_str).unwrap_or_default();
                let stderr = String::from_utf8_lossy(&output.stderr);
                if let Some(message) = filter.apply(stderr.trim()) {
                    debug!(logger; name; "{}", message);
                }
            }
            true
        }
        Err(e) => {
            log!(logger; "warn"; "{:#}", anyhow::Error::from(e));
            false
        }
    }
}

// ============================================================================
// Output Filtering
// ============================================================================

fn strip_ansi(s: &str) -> std::borrow::Cow<'_, str> {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| Regex::new(r"\x1b\[[0-9;]*m").unwrap());
    re.replace_all(s, "")
}

/// Filter rule for skipping known noise in tool output.
pub struct FilterRule {
    /// Prefixes to match at the start of output lines.
    pub skip_prefixes: &'static [&'static str],
}

impl FilterRule {
    /// Create a new filter rule with the given prefixes.
    pub const fn new(skip_prefixes: &'static [&'static str]) -> Self {
        Self { skip_prefixes }
    }

    /// Check if a line should be skipped.
    fn should_skip(&self, line: &str) -> bool {
        line.is_empty() || self.skip_prefixes.iter().any(|p| line.starts_with(p))
    }

    /// Keep the lines worth logging, or `None` if nothing is left.
    fn apply(&self, output: &str) -> Option<String> {
        let lines: Vec<_> = output
            .lines()
            .filter(|line| !self.should_skip(strip_ansi(line).trim()))
            .collect();

        (!lines.is_empty()).then(|| lines.join("\n"))
    }
}

/// Empty filter (no skipping).
pub const EMPTY_FILTER: FilterRule = FilterRule::new(&[]);

/// Tesseract prints its banner and page progress on stderr.
pub const OCR_FILTER: FilterRule =
    FilterRule::new(&["Tesseract Open Source OCR Engine", "Page ", "Estimating resolution"]);

/// Stdout of failed runs that is not worth repeating.
const STDOUT_FILTER: FilterRule = FilterRule::new(&["<!DOCTYPE", "{"]);

/// Format command error message.
fn format_error(name: &str, output: &Output) -> String {
    let stderr = String::from_utf8_lossy(&output.stderr);
    let stdout = String::from_utf8_lossy(&output.stdout);

    let mut msg = format!("Command `{name}` failed with {}", output.status);

    let stderr_trimmed = stderr.trim();
    if !stderr_trimmed.is_empty() {
        msg.push('\n');
        msg.push_str(&strip_ansi(stderr_trimmed));
    }

    let stdout_trimmed = stdout.trim();
    if !stdout_trimmed.is_empty() && !STDOUT_FILTER.should_skip(stdout_trimmed) {
        msg.push_str("\nStdout:\n");
        msg.push_str(stdout_trimmed);
    }
    msg
}

// ============================================================================
// Tests
// ============================================================================
