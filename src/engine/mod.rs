// Updater Engine - Core module structure
pub mod branch;
pub mod cli;
pub mod config;
pub mod error;
pub mod fetch;
pub mod merge;

pub use config::UpdaterConfig;
pub use error::UpdaterError;
pub use merge::MergeOrchestrator;
