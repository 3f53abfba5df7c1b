use std::path::PathBuf;

use crate::{hooks::PluginHooks, manifest::PluginManifest};

/// A loaded plugin.
#[derive(Clone)]
pub struct PluginRecord {
    /// Final path segment of the plugin's directory.
    pub name: String,
    pub path: PathBuf,
    pub manifest: PluginManifest,
    pub hooks: PluginHooks,
}

impl PluginRecord {
    /// A record with no backing directory, for plugins compiled into the binary.
    pub fn in_process(name: impl Into<String>, hooks: PluginHooks) -> Self {
        Self {
            name: name.into(),
            path: PathBuf::new(),
            manifest: PluginManifest::default(),
            hooks,
        }
    }
}

impl std::fmt::Debug for PluginRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginRecord")
            .field("name", &self.name)
            .field("path", &self.path)
            .field("hooks", &self.hooks.defined_points())
            .finish()
    }
}

/// Plugins in load order. Built once by the loader and read-only afterwards.
#[derive(Debug, Clone, Default)]
pub struct PluginRegistry {
    plugins: Vec<PluginRecord>,
}

impl PluginRegistry {
    pub fn from_records(plugins: Vec<PluginRecord>) -> Self {
        Self { plugins }
    }

    pub fn iter(&self) -> impl Iterator<Item = &PluginRecord> {
        self.plugins.iter()
    }

    pub fn get(&self, name: &str) -> Option<&PluginRecord> {
        self.plugins.iter().find(|p| p.name == name)
    }

    pub fn names(&self) -> Vec<&str> {
        self.plugins.iter().map(|p| p.name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preserves_insertion_order() {
        let registry = PluginRegistry::from_records(vec![
            PluginRecord::in_process("zeta", PluginHooks::default()),
            PluginRecord::in_process("alpha", PluginHooks::default()),
        ]);
        assert_eq!(registry.names(), vec!["zeta", "alpha"]);
        assert_eq!(registry.len(), 2);
        assert!(registry.get("alpha").is_some());
        assert!(registry.get("beta").is_none());
    }
}
