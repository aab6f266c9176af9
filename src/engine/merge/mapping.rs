//! Template -> Translation Filename Mapping

use crate::engine::config::UpdaterConfig;

/// Which components a run covers
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ComponentSelection {
    /// Every component in the configured allow-list
    All,
    Single(String),
}

impl ComponentSelection {
    pub fn parse(name: &str) -> Self {
        if name == "all" {
            Self::All
        } else {
            Self::Single(name.to_string())
        }
    }
}

/// One template/translation pair
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappingEntry {
    pub component: String,
    /// `<component>_untranslated.ts`
    pub template: String,
    /// `<component>_<langcode>.ts`
    pub target: String,
}

/// Every pair handled in one run, in allow-list order.
#[derive(Debug, Clone, Default)]
pub struct FileMapping {
    entries: Vec<MappingEntry>,
}

impl FileMapping {
    pub fn build(config: &UpdaterConfig, selection: &ComponentSelection, langcode: &str) -> Self {
        let components: Vec<&str> = match selection {
            ComponentSelection::All => config.components.iter().map(String::as_str).collect(),
            ComponentSelection::Single(name) => {
                if !config.is_known_component(name) {
                    tracing::warn!(component = %name, "component is not in the known component list");
                }
                vec![name.as_str()]
            }
        };

        let mut entries: Vec<MappingEntry> = Vec::with_capacity(components.len());
        for component in components {
            if entries.iter().any(|e| e.component == component) {
                continue;
            }
            entries.push(MappingEntry {
                component: component.to_string(),
                template: config.template_filename(component),
                target: config.translation_filename(component, langcode),
            });
        }

        Self { entries }
    }

    pub fn entries(&self) -> &[MappingEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
