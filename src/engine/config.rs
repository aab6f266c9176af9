//! Updater Configuration Module
//! Built-in server layout and component list, optionally overridden by tsupdate.config.json

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const CONFIG_FILE_NAME: &str = "tsupdate.config.json";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Config file not found: {0}")]
    NotFound(PathBuf),
    #[error("Failed to read config: {0}")]
    ReadError(#[from] std::io::Error),
    #[error("Invalid config format: {0}")]
    ParseError(#[from] serde_json::Error),
}

/// Immutable settings shared by every component of a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UpdaterConfig {
    /// Plain-text list of `<family> <version> <tag>` lines
    pub branch_map_url: String,
    /// Templates live under `<download_base_url>/<branch-id>/`
    pub download_base_url: String,
    /// Substring a family token must contain to be listed
    pub product_marker: String,
    /// Takes the place of the language code in template filenames
    pub untranslated_marker: String,
    /// Components expanded by `all`
    pub components: Vec<String>,
    /// Program used to merge templates into translations
    pub merge_program: PathBuf,
}

impl Default for UpdaterConfig {
    fn default() -> Self {
        Self {
            branch_map_url: "http://l10n-files.qt.io/l10n-files/branch-map.txt".to_string(),
            download_base_url: "http://l10n-files.qt.io/l10n-files".to_string(),
            product_marker: "qt".to_string(),
            untranslated_marker: "untranslated".to_string(),
            components: default_components(),
            merge_program: PathBuf::from("lconvert"),
        }
    }
}

fn default_components() -> Vec<String> {
    [
        "qt",
        "qtbase",
        "qtdeclarative",
        "qtquickcontrols",
        "qtquickcontrols2",
        "qtscript",
        "qtmultimedia",
        "qtxmlpatterns",
        "qtconnectivity",
        "qtlocation",
        "assistant",
        "designer",
        "linguist",
        "qt_help",
    ]
    .iter()
    .map(|c| c.to_string())
    .collect()
}

impl UpdaterConfig {
    /// Load an explicit config file. Keys missing from the file keep their defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }
        let content = std::fs::read_to_string(path)?;
        let config: UpdaterConfig = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Use `tsupdate.config.json` from `work_dir` if present, defaults otherwise.
    pub fn discover(work_dir: &Path) -> Result<Self, ConfigError> {
        let config_path = work_dir.join(CONFIG_FILE_NAME);
        if config_path.is_file() {
            tracing::debug!(path = %config_path.display(), "loading config override");
            Self::load(&config_path)
        } else {
            Ok(Self::default())
        }
    }

    /// `<component>_<langcode>.ts`
    pub fn translation_filename(&self, component: &str, langcode: &str) -> String {
        format!("{}_{}.ts", component, langcode)
    }

    pub fn template_filename(&self, component: &str) -> String {
        self.translation_filename(component, &self.untranslated_marker)
    }

    pub fn template_url(&self, branch_id: &str, template_filename: &str) -> String {
        format!(
            "{}/{}/{}",
            self.download_base_url.trim_end_matches('/'),
            branch_id,
            template_filename
        )
    }

    pub fn is_known_component(&self, component: &str) -> bool {
        self.components.iter().any(|c| c == component)
    }
}
