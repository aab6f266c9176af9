//! Template Merge Module
//!
//! Filename mapping, the external merge tool, and the download-and-merge workflow

pub mod mapping;
pub mod orchestrator;
pub mod tool;

pub use mapping::{ComponentSelection, FileMapping, MappingEntry};
pub use orchestrator::{
    backup_path, FileReport, MergeError, MergeEvent, MergeOptions, MergeOrchestrator, MergeOutcome,
    MergeReport, UpdateRequest,
};
pub use tool::{LconvertTool, MergeRequest, MergeTool};
