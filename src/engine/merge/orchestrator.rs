//! Download-and-merge workflow
//!
//! Resolve a branch, fetch every template of the mapping, then seed or merge
//! each translation file. All downloads finish before the first merge starts.

use super::mapping::{ComponentSelection, FileMapping, MappingEntry};
use super::tool::{MergeRequest, MergeTool};
use crate::engine::branch::{resolve_branch, BranchError};
use crate::engine::config::UpdaterConfig;
use crate::engine::fetch::{DownloadError, Downloader, FetchError, RemoteSource};
use std::fs;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MergeError {
    #[error(transparent)]
    Branch(#[from] BranchError),
    #[error("Failed to download template: {0}")]
    Fetch(#[from] FetchError),
    #[error("Failed to {action} {}: {source}", .path.display())]
    Io {
        action: &'static str,
        path: PathBuf,
        source: io::Error,
    },
}

impl From<DownloadError> for MergeError {
    fn from(err: DownloadError) -> Self {
        match err {
            DownloadError::Fetch(e) => Self::Fetch(e),
            DownloadError::Write { path, source } => Self::Io {
                action: "save template",
                path,
                source,
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MergeOptions {
    /// Run the merge tool (otherwise only print instructions)
    pub merge: bool,
    /// Copy an existing translation to `<file>~` before merging
    pub backup: bool,
    pub strip_locations: bool,
}

impl Default for MergeOptions {
    fn default() -> Self {
        Self {
            merge: true,
            backup: true,
            strip_locations: false,
        }
    }
}

/// Everything the caller decides for one run
#[derive(Debug, Clone)]
pub struct UpdateRequest {
    pub selection: ComponentSelection,
    pub language: String,
    pub branch: Option<String>,
    pub options: MergeOptions,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MergeOutcome {
    /// No translation existed; the template was copied in its place
    Seeded,
    Merged,
    /// Merge tool exited non-zero
    Failed { code: i32 },
    /// Merge tool could not be started
    ToolUnavailable { reason: String },
    /// Merging disabled; the user merges by hand
    ManualMergeRequired,
}

impl MergeOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failed { .. } | Self::ToolUnavailable { .. })
    }
}

#[derive(Debug, Clone)]
pub struct FileReport {
    pub component: String,
    pub template: PathBuf,
    pub target: PathBuf,
    pub backup: Option<PathBuf>,
    pub outcome: MergeOutcome,
}

#[derive(Debug, Clone, Default)]
pub struct MergeReport {
    pub branch: String,
    pub files: Vec<FileReport>,
}

impl MergeReport {
    pub fn failed(&self) -> impl Iterator<Item = &FileReport> {
        self.files.iter().filter(|f| f.outcome.is_failure())
    }

    pub fn is_success(&self) -> bool {
        self.failed().next().is_none()
    }
}

/// Progress notifications, in the order they happen
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MergeEvent {
    BranchSelected { branch: String },
    Downloading { component: String, url: String },
    Downloaded { component: String, path: PathBuf, bytes: u64 },
    Seeded { target: PathBuf },
    BackedUp { target: PathBuf, backup: PathBuf },
    Merging { target: PathBuf },
    Finished { target: PathBuf, outcome: MergeOutcome },
    ManualMerge { template: PathBuf, target: PathBuf },
}

/// `qtbase_zh_TW.ts` -> `qtbase_zh_TW.ts~`
pub fn backup_path(target: &Path) -> PathBuf {
    let mut name = target.as_os_str().to_owned();
    name.push("~");
    PathBuf::from(name)
}

/// Where seeding writes: the target itself, or `<target>/<template name>` when a directory sits there
fn seed_destination(template: &Path, target: &Path) -> PathBuf {
    match template.file_name() {
        Some(name) if target.is_dir() => target.join(name),
        _ => target.to_path_buf(),
    }
}

pub struct MergeOrchestrator<'a, S: RemoteSource + ?Sized, T: MergeTool + ?Sized> {
    config: &'a UpdaterConfig,
    source: &'a S,
    tool: &'a T,
    work_dir: PathBuf,
}

impl<'a, S: RemoteSource + ?Sized, T: MergeTool + ?Sized> MergeOrchestrator<'a, S, T> {
    pub fn new(config: &'a UpdaterConfig, source: &'a S, tool: &'a T, work_dir: impl Into<PathBuf>) -> Self {
        Self {
            config,
            source,
            tool,
            work_dir: work_dir.into(),
        }
    }

    /// Full run: branch selection, downloads, merges.
    pub fn run<R, W, F>(
        &self,
        request: &UpdateRequest,
        input: &mut R,
        out: &mut W,
        mut on_event: F,
    ) -> Result<MergeReport, MergeError>
    where
        R: BufRead,
        W: Write,
        F: FnMut(&MergeEvent),
    {
        let branch = resolve_branch(self.source, self.config, request.branch.as_deref(), input, out)?;
        on_event(&MergeEvent::BranchSelected {
            branch: branch.clone(),
        });

        let mapping = FileMapping::build(self.config, &request.selection, &request.language);
        self.download_templates(&branch, &mapping, &mut on_event)?;
        let files = self.merge_all(&mapping, &request.language, &request.options, &mut on_event)?;

        Ok(MergeReport { branch, files })
    }

    /// Fetch every template of `mapping`; the first failure aborts the run.
    pub fn download_templates<F: FnMut(&MergeEvent)>(
        &self,
        branch: &str,
        mapping: &FileMapping,
        on_event: &mut F,
    ) -> Result<(), MergeError> {
        let downloader = Downloader::new(self.source);

        for entry in mapping.entries() {
            let url = self.config.template_url(branch, &entry.template);
            on_event(&MergeEvent::Downloading {
                component: entry.component.clone(),
                url: url.clone(),
            });

            let result = downloader.download(&url, &self.work_dir.join(&entry.template))?;
            on_event(&MergeEvent::Downloaded {
                component: entry.component.clone(),
                path: result.path,
                bytes: result.bytes_written,
            });
        }
        Ok(())
    }

    /// Seed or merge each entry. Merge tool failures are recorded, not returned.
    pub fn merge_all<F: FnMut(&MergeEvent)>(
        &self,
        mapping: &FileMapping,
        language: &str,
        options: &MergeOptions,
        on_event: &mut F,
    ) -> Result<Vec<FileReport>, MergeError> {
        let tool_available = !options.merge || self.tool.is_available();
        if !tool_available {
            tracing::warn!(tool = %self.tool.describe(), "merge tool not found");
        }

        let mut reports = Vec::with_capacity(mapping.len());
        for entry in mapping.entries() {
            reports.push(self.merge_entry(entry, language, options, tool_available, on_event)?);
        }
        Ok(reports)
    }

    fn merge_entry<F: FnMut(&MergeEvent)>(
        &self,
        entry: &MappingEntry,
        language: &str,
        options: &MergeOptions,
        tool_available: bool,
        on_event: &mut F,
    ) -> Result<FileReport, MergeError> {
        let template = self.work_dir.join(&entry.template);
        let target = self.work_dir.join(&entry.target);
        let mut report = FileReport {
            component: entry.component.clone(),
            template: template.clone(),
            target: target.clone(),
            backup: None,
            outcome: MergeOutcome::ManualMergeRequired,
        };

        if !options.merge {
            on_event(&MergeEvent::ManualMerge { template, target });
            return Ok(report);
        }

        if !target.is_file() {
            let seeded = seed_destination(&template, &target);
            if seeded != target {
                tracing::warn!(file = %target.display(), "target is a directory, seeding inside it");
            }
            fs::copy(&template, &seeded).map_err(|source| MergeError::Io {
                action: "seed",
                path: seeded.clone(),
                source,
            })?;
            report.outcome = MergeOutcome::Seeded;
            on_event(&MergeEvent::Seeded { target: seeded });
            return Ok(report);
        }

        if !tool_available {
            report.outcome = MergeOutcome::ToolUnavailable {
                reason: format!("{} not found", self.tool.describe()),
            };
            on_event(&MergeEvent::Finished {
                target,
                outcome: report.outcome.clone(),
            });
            return Ok(report);
        }

        if options.backup {
            let backup = backup_path(&target);
            fs::copy(&target, &backup).map_err(|source| MergeError::Io {
                action: "back up",
                path: target.clone(),
                source,
            })?;
            on_event(&MergeEvent::BackedUp {
                target: target.clone(),
                backup: backup.clone(),
            });
            report.backup = Some(backup);
        }

        on_event(&MergeEvent::Merging {
            target: target.clone(),
        });
        let request = MergeRequest {
            template: &template,
            existing: &target,
            target_language: language,
            destination: &target,
            strip_locations: options.strip_locations,
        };
        report.outcome = match self.tool.invoke(&request) {
            Ok(0) => MergeOutcome::Merged,
            Ok(code) => {
                tracing::warn!(file = %target.display(), code, "merge tool failed");
                MergeOutcome::Failed { code }
            }
            Err(e) => {
                tracing::warn!(file = %target.display(), error = %e, "merge tool could not start");
                MergeOutcome::ToolUnavailable { reason: e.to_string() }
            }
        };

        on_event(&MergeEvent::Finished {
            target,
            outcome: report.outcome.clone(),
        });
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::collections::HashMap;
    use tempfile::tempdir;

    struct MapSource(HashMap<String, String>);

    impl RemoteSource for MapSource {
        fn fetch_text(&self, url: &str) -> Result<String, FetchError> {
            self.0.get(url).cloned().ok_or_else(|| FetchError::Connection {
                url: url.to_string(),
                reason: "unreachable".to_string(),
            })
        }
    }

    /// Overwrites the destination and returns a fixed code.
    struct StubTool {
        code: i32,
        calls: RefCell<Vec<PathBuf>>,
    }

    impl StubTool {
        fn new(code: i32) -> Self {
            Self {
                code,
                calls: RefCell::new(Vec::new()),
            }
        }
    }

    impl MergeTool for StubTool {
        fn invoke(&self, request: &MergeRequest<'_>) -> io::Result<i32> {
            self.calls.borrow_mut().push(request.destination.to_path_buf());
            fs::write(request.destination, "merged")?;
            Ok(self.code)
        }
    }

    struct MissingTool;

    impl MergeTool for MissingTool {
        fn invoke(&self, _request: &MergeRequest<'_>) -> io::Result<i32> {
            Err(io::Error::new(io::ErrorKind::NotFound, "no such program"))
        }

        fn is_available(&self) -> bool {
            false
        }
    }

    fn config() -> UpdaterConfig {
        let mut config = UpdaterConfig::default();
        config.components = vec!["qtbase".into(), "designer".into()];
        config
    }

    fn mapping(config: &UpdaterConfig) -> FileMapping {
        FileMapping::build(config, &ComponentSelection::All, "zh_TW")
    }

    fn write_templates(dir: &Path) {
        fs::write(dir.join("qtbase_untranslated.ts"), "base template").unwrap();
        fs::write(dir.join("designer_untranslated.ts"), "designer template").unwrap();
    }

    #[test]
    fn test_backup_path() {
        assert_eq!(
            backup_path(Path::new("/tmp/qtbase_zh_TW.ts")),
            PathBuf::from("/tmp/qtbase_zh_TW.ts~")
        );
    }

    #[test]
    fn test_download_failure_stops_before_later_components() {
        let dir = tempdir().unwrap();
        let config = config();
        let source = MapSource(HashMap::from([(
            config.template_url("qt5-dev", "qtbase_untranslated.ts"),
            "base".to_string(),
        )]));
        let tool = StubTool::new(0);
        let orchestrator = MergeOrchestrator::new(&config, &source, &tool, dir.path());

        let mut events = Vec::new();
        let err = orchestrator
            .download_templates("qt5-dev", &mapping(&config), &mut |e: &MergeEvent| events.push(e.clone()))
            .unwrap_err();

        match err {
            MergeError::Fetch(e) => assert!(e.location().ends_with("/qt5-dev/designer_untranslated.ts")),
            other => panic!("expected a fetch error, got {other}"),
        }
        assert!(dir.path().join("qtbase_untranslated.ts").exists());
        assert!(!dir.path().join("designer_untranslated.ts").exists());
        assert_eq!(events.len(), 3);
    }

    #[test]
    fn test_merge_disabled_touches_nothing() {
        let dir = tempdir().unwrap();
        write_templates(dir.path());
        fs::write(dir.path().join("qtbase_zh_TW.ts"), "old").unwrap();

        let config = config();
        let source = MapSource(HashMap::new());
        let tool = StubTool::new(0);
        let orchestrator = MergeOrchestrator::new(&config, &source, &tool, dir.path());
        let options = MergeOptions {
            merge: false,
            ..MergeOptions::default()
        };

        let mut manual = 0;
        let reports = orchestrator
            .merge_all(&mapping(&config), "zh_TW", &options, &mut |e: &MergeEvent| {
                if matches!(e, MergeEvent::ManualMerge { .. }) {
                    manual += 1;
                }
            })
            .unwrap();

        assert_eq!(manual, 2);
        assert!(tool.calls.borrow().is_empty());
        assert!(reports.iter().all(|r| r.outcome == MergeOutcome::ManualMergeRequired));
        assert_eq!(fs::read_to_string(dir.path().join("qtbase_zh_TW.ts")).unwrap(), "old");
        assert!(!dir.path().join("designer_zh_TW.ts").exists());
        assert!(!dir.path().join("qtbase_zh_TW.ts~").exists());
    }

    #[test]
    fn test_failed_merge_does_not_stop_others() {
        let dir = tempdir().unwrap();
        write_templates(dir.path());
        fs::write(dir.path().join("qtbase_zh_TW.ts"), "old base").unwrap();
        fs::write(dir.path().join("designer_zh_TW.ts"), "old designer").unwrap();

        let config = config();
        let source = MapSource(HashMap::new());
        let tool = StubTool::new(3);
        let orchestrator = MergeOrchestrator::new(&config, &source, &tool, dir.path());

        let reports = orchestrator
            .merge_all(&mapping(&config), "zh_TW", &MergeOptions::default(), &mut |_: &MergeEvent| {})
            .unwrap();

        assert_eq!(tool.calls.borrow().len(), 2);
        assert!(reports.iter().all(|r| r.outcome == MergeOutcome::Failed { code: 3 }));
        let report = MergeReport {
            branch: "qt5-dev".to_string(),
            files: reports,
        };
        assert!(!report.is_success());
        assert_eq!(report.failed().count(), 2);
    }

    #[test]
    fn test_backup_disabled() {
        let dir = tempdir().unwrap();
        write_templates(dir.path());
        fs::write(dir.path().join("qtbase_zh_TW.ts"), "old base").unwrap();
        fs::write(dir.path().join("qtbase_zh_TW.ts~"), "ancient").unwrap();

        let mut config = config();
        config.components = vec!["qtbase".into()];
        let source = MapSource(HashMap::new());
        let tool = StubTool::new(0);
        let orchestrator = MergeOrchestrator::new(&config, &source, &tool, dir.path());
        let options = MergeOptions {
            backup: false,
            ..MergeOptions::default()
        };

        let reports = orchestrator
            .merge_all(&mapping(&config), "zh_TW", &options, &mut |_: &MergeEvent| {})
            .unwrap();

        assert_eq!(reports[0].outcome, MergeOutcome::Merged);
        assert_eq!(reports[0].backup, None);
        assert_eq!(fs::read_to_string(dir.path().join("qtbase_zh_TW.ts~")).unwrap(), "ancient");
    }

    #[test]
    fn test_missing_tool_still_seeds() {
        let dir = tempdir().unwrap();
        write_templates(dir.path());
        fs::write(dir.path().join("designer_zh_TW.ts"), "old designer").unwrap();

        let config = config();
        let source = MapSource(HashMap::new());
        let orchestrator = MergeOrchestrator::new(&config, &source, &MissingTool, dir.path());

        let reports = orchestrator
            .merge_all(&mapping(&config), "zh_TW", &MergeOptions::default(), &mut |_: &MergeEvent| {})
            .unwrap();

        assert_eq!(reports[0].outcome, MergeOutcome::Seeded);
        assert!(matches!(reports[1].outcome, MergeOutcome::ToolUnavailable { .. }));
        assert_eq!(
            fs::read_to_string(dir.path().join("designer_zh_TW.ts")).unwrap(),
            "old designer"
        );
        assert!(!dir.path().join("designer_zh_TW.ts~").exists());
    }

    #[test]
    fn test_directory_in_place_of_target_is_seeded_into() {
        let dir = tempdir().unwrap();
        write_templates(dir.path());
        fs::create_dir(dir.path().join("qtbase_zh_TW.ts")).unwrap();

        let config = config();
        let source = MapSource(HashMap::new());
        let tool = StubTool::new(0);
        let orchestrator = MergeOrchestrator::new(&config, &source, &tool, dir.path());

        let mut seeded = Vec::new();
        let reports = orchestrator
            .merge_all(&mapping(&config), "zh_TW", &MergeOptions::default(), &mut |e: &MergeEvent| {
                if let MergeEvent::Seeded { target } = e {
                    seeded.push(target.clone());
                }
            })
            .unwrap();

        let inside = dir.path().join("qtbase_zh_TW.ts").join("qtbase_untranslated.ts");
        assert_eq!(fs::read_to_string(&inside).unwrap(), "base template");
        assert_eq!(
            fs::read_to_string(dir.path().join("designer_zh_TW.ts")).unwrap(),
            "designer template"
        );
        assert!(reports.iter().all(|r| r.outcome == MergeOutcome::Seeded));
        assert_eq!(seeded, vec![inside, dir.path().join("designer_zh_TW.ts")]);
        assert!(tool.calls.borrow().is_empty());
    }

    #[test]
    fn test_template_write_failure_is_a_local_io_error() {
        let dir = tempdir().unwrap();
        let config = config();
        let source = MapSource(HashMap::from([(
            config.template_url("qt5-dev", "qtbase_untranslated.ts"),
            "base".to_string(),
        )]));
        let tool = StubTool::new(0);
        let missing = dir.path().join("gone");
        let orchestrator = MergeOrchestrator::new(&config, &source, &tool, &missing);

        let err = orchestrator
            .download_templates("qt5-dev", &mapping(&config), &mut |_: &MergeEvent| {})
            .unwrap_err();
        match err {
            MergeError::Io { action, path, .. } => {
                assert_eq!(action, "save template");
                assert_eq!(path, missing.join("qtbase_untranslated.ts"));
            }
            other => panic!("expected an IO error, got {other}"),
        }
    }
}
