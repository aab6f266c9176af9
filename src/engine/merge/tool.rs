//! External merge tool
//!
//! `lconvert` from Qt Linguist folds a fresh template into an existing TS file.

use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Arguments for one merge
#[derive(Debug, Clone, Copy)]
pub struct MergeRequest<'a> {
    pub template: &'a Path,
    pub existing: &'a Path,
    pub target_language: &'a str,
    pub destination: &'a Path,
    /// Drop `<location>` elements from the output
    pub strip_locations: bool,
}

/// Capability to merge a template into a translation file.
pub trait MergeTool {
    /// Run the merge to completion and return its exit code.
    /// `Err` means the tool could not be started at all.
    fn invoke(&self, request: &MergeRequest<'_>) -> io::Result<i32>;

    fn is_available(&self) -> bool {
        true
    }

    fn describe(&self) -> String {
        "merge tool".to_string()
    }
}

/// Runs `lconvert` as a child process and waits for it.
pub struct LconvertTool {
    program: PathBuf,
}

impl LconvertTool {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    /// `[--locations none] -no-obsolete -target-language <lang> -i <template> <existing> -o <dest>`
    pub fn args(request: &MergeRequest<'_>) -> Vec<OsString> {
        let mut args: Vec<OsString> = Vec::with_capacity(10);
        if request.strip_locations {
            args.push("--locations".into());
            args.push("none".into());
        }
        args.push("-no-obsolete".into());
        args.push("-target-language".into());
        args.push(request.target_language.into());
        args.push("-i".into());
        args.push(request.template.into());
        args.push(request.existing.into());
        args.push("-o".into());
        args.push(request.destination.into());
        args
    }
}

impl MergeTool for LconvertTool {
    fn invoke(&self, request: &MergeRequest<'_>) -> io::Result<i32> {
        let args = Self::args(request);
        tracing::debug!(program = %self.program.display(), ?args, "running merge tool");

        let status = Command::new(&self.program).args(&args).status()?;
        // killed by a signal: no code
        Ok(status.code().unwrap_or(-1))
    }

    fn is_available(&self) -> bool {
        which::which(&self.program).is_ok()
    }

    fn describe(&self) -> String {
        self.program.display().to_string()
    }
}
