//! Top-level error type and process exit codes

use crate::engine::branch::BranchError;
use crate::engine::config::ConfigError;
use crate::engine::fetch::FetchError;
use crate::engine::merge::{MergeError, MergeReport};
use thiserror::Error;

/// Everything finished (manual-merge hints included)
pub const EXIT_OK: u8 = 0;
/// The run could not complete, or at least one merge failed
pub const EXIT_ERROR: u8 = 1;
/// Reserved for unrecoverable setup problems; clap usage errors also exit with 2
pub const EXIT_FATAL: u8 = 2;

#[derive(Error, Debug)]
pub enum UpdaterError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Merge(#[from] MergeError),
    #[error("{count} of {total} file(s) failed to merge")]
    MergeFailures { count: usize, total: usize },
}

impl UpdaterError {
    /// The network failure behind this error, if that is what stopped the run
    pub fn fetch_failure(&self) -> Option<&FetchError> {
        match self {
            Self::Merge(MergeError::Fetch(e)) | Self::Merge(MergeError::Branch(BranchError::Fetch(e))) => Some(e),
            _ => None,
        }
    }

    /// Turn a finished run into an error when any of its merges failed
    pub fn check_report(report: &MergeReport) -> Result<(), Self> {
        match report.failed().count() {
            0 => Ok(()),
            count => Err(Self::MergeFailures {
                count,
                total: report.files.len(),
            }),
        }
    }

    pub fn exit_code(&self) -> u8 {
        EXIT_ERROR
    }
}
