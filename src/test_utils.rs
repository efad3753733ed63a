//! Shared fixtures for unit tests.

use crate::{
    assets::PLACEHOLDER_THUMB,
    config::ArchiveConfig,
    utils::exec::{Runner, ToolError},
};
use std::{
    cell::RefCell,
    ffi::OsString,
    fs,
    path::{Path, PathBuf},
    process::{ExitStatus, Output},
};

type Behavior = dyn Fn(&str, &[OsString]) -> bool;

/// A [`Runner`] that records every invocation instead of spawning anything.
///
/// The behavior closure gets the program name and the arguments and returns
/// whether the "process" succeeded. It may create output files itself.
pub struct FakeRunner {
    calls: RefCell<Vec<Vec<String>>>,
    behavior: Box<Behavior>,
}

impl FakeRunner {
    pub fn new(behavior: impl Fn(&str, &[OsString]) -> bool + 'static) -> Self {
        Self {
            calls: RefCell::new(Vec::new()),
            behavior: Box::new(behavior),
        }
    }

    /// Every tool succeeds and writes plausible output.
    pub fn working() -> Self {
        Self::new(simulate)
    }

    /// Every tool exits non-zero without writing anything.
    pub fn failing() -> Self {
        Self::new(|_, _| false)
    }

    /// Full command lines of every invocation, in order.
    pub fn calls(&self) -> Vec<Vec<String>> {
        self.calls.borrow().clone()
    }

    /// Program names of every invocation, in order.
    pub fn programs(&self) -> Vec<String> {
        self.calls
            .borrow()
            .iter()
            .filter_map(|call| call.first().cloned())
            .collect()
    }

    pub fn count(&self, program: &str) -> usize {
        self.programs().iter().filter(|p| *p == program).count()
    }
}

impl Runner for FakeRunner {
    fn run(&self, cmd: &[String], args: &[OsString]) -> Result<Output, ToolError> {
        let program = cmd.first().ok_or(ToolError::Empty)?;

        let mut call = cmd.to_vec();
        call.extend(args.iter().map(|a| a.to_string_lossy().into_owned()));
        self.calls.borrow_mut().push(call);

        if (self.behavior)(program, args) {
            Ok(Output {
                status: ExitStatus::default(),
                stdout: Vec::new(),
                stderr: Vec::new(),
            })
        } else {
            Err(ToolError::Failed(format!("Command `{program}` failed")))
        }
    }
}

/// Pretend to be the default tools, writing where each one would.
pub fn simulate(program: &str, args: &[OsString]) -> bool {
    match program {
        "convert" => args.last().is_some_and(|out| fs::write(out, PLACEHOLDER_THUMB).is_ok()),
        "pdftotext" => args
            .last()
            .is_some_and(|out| fs::write(out, "Minutes of the annual meeting\n").is_ok()),
        "tesseract" => args.last().is_some_and(|base| {
            let mut out = base.clone();
            out.push(".txt");
            fs::write(out, "ocr text\n").is_ok()
        }),
        "gs" => args
            .iter()
            .find_map(|a| a.to_str()?.strip_prefix("-sOutputFile=").map(PathBuf::from))
            .is_some_and(|out| fs::write(out, b"II*\0").is_ok()),
        _ => true,
    }
}

/// Config for an archive at `root` with a fixed URL and title.
pub fn config_for(root: &Path) -> ArchiveConfig {
    let mut config = ArchiveConfig::default();
    config.archive.root = root.canonicalize().unwrap();
    config.archive.url = Some("https://archive.test/".into());
    config.archive.title = Some("Test Archive".into());
    config
}

/// Create `path` (and its parents) with `content`.
pub fn touch(path: &Path, content: &[u8]) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, content).unwrap();
}
