//! Plugin discovery and loading.

use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
};

use {
    anyhow::Context,
    futures::future::join_all,
    tracing::{debug, info, warn},
};

use crate::{
    manifest::PluginManifest,
    module::{ModuleCatalog, ModuleSpec},
    registry::{PluginRecord, PluginRegistry},
};

/// File that marks a directory entry as a plugin.
pub const PLUGIN_MANIFEST: &str = "plugin.toml";

/// Probe result for one directory entry, as shown by `scribe plugins`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CandidateStatus {
    Loaded,
    NoManifest,
    Failed(String),
}

#[derive(Debug, Clone)]
pub struct Candidate {
    pub name: String,
    pub path: PathBuf,
    pub status: CandidateStatus,
}

struct Probe {
    name: String,
    path: PathBuf,
    result: anyhow::Result<Option<PluginRecord>>,
}

pub struct PluginLoader {
    dir: PathBuf,
    catalog: ModuleCatalog,
}

impl PluginLoader {
    pub fn new(dir: impl Into<PathBuf>, catalog: ModuleCatalog) -> Self {
        Self {
            dir: dir.into(),
            catalog,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Load every plugin in the directory.
    ///
    /// Entries are probed concurrently but the registry keeps directory
    /// enumeration order. Entries that fail to load are logged and left out;
    /// an unreadable directory gives an empty registry.
    pub async fn load(&self) -> PluginRegistry {
        let probed = match self.probe_all().await {
            Ok(probed) => probed,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(dir = %self.dir.display(), "plugin directory does not exist");
                return PluginRegistry::default();
            },
            Err(e) => {
                warn!(dir = %self.dir.display(), error = %e, "cannot read plugin directory");
                return PluginRegistry::default();
            },
        };

        let records: Vec<PluginRecord> = probed
            .into_iter()
            .filter_map(|probe| match probe.result {
                Ok(Some(record)) => Some(record),
                Ok(None) => {
                    debug!(plugin = %probe.name, "no {PLUGIN_MANIFEST}, skipping");
                    None
                },
                Err(e) => {
                    warn!(plugin = %probe.name, error = %format!("{e:#}"), "failed to load plugin");
                    None
                },
            })
            .collect();

        let registry = PluginRegistry::from_records(records);
        info!(
            dir = %self.dir.display(),
            count = registry.len(),
            plugins = ?registry.names(),
            "plugins loaded"
        );
        registry
    }

    /// Probe every entry and report what would load, without keeping the hooks.
    pub async fn discover(&self) -> std::io::Result<Vec<Candidate>> {
        Ok(self
            .probe_all()
            .await?
            .into_iter()
            .map(|probe| Candidate {
                name: probe.name,
                path: probe.path,
                status: match probe.result {
                    Ok(Some(_)) => CandidateStatus::Loaded,
                    Ok(None) => CandidateStatus::NoManifest,
                    Err(e) => CandidateStatus::Failed(format!("{e:#}")),
                },
            })
            .collect())
    }

    async fn probe_all(&self) -> std::io::Result<Vec<Probe>> {
        let entries = self.entries().await?;
        Ok(join_all(entries.into_iter().map(|path| async move {
            let name = entry_name(&path);
            let result = self.load_entry(&name, &path).await;
            Probe { name, path, result }
        }))
        .await)
    }

    /// Directory entries in enumeration order.
    async fn entries(&self) -> std::io::Result<Vec<PathBuf>> {
        let mut entries = Vec::new();
        let mut dir = tokio::fs::read_dir(&self.dir).await?;
        while let Some(entry) = dir.next_entry().await? {
            entries.push(entry.path());
        }
        Ok(entries)
    }

    async fn load_entry(&self, name: &str, path: &Path) -> anyhow::Result<Option<PluginRecord>> {
        let metadata = tokio::fs::metadata(path)
            .await
            .with_context(|| format!("cannot stat {}", path.display()))?;
        if !metadata.is_dir() {
            return Ok(None);
        }

        let manifest_path = path.join(PLUGIN_MANIFEST);
        if !tokio::fs::try_exists(&manifest_path).await? {
            return Ok(None);
        }

        let raw = tokio::fs::read_to_string(&manifest_path)
            .await
            .with_context(|| format!("failed to read {}", manifest_path.display()))?;
        let manifest = PluginManifest::parse(&raw)
            .with_context(|| format!("invalid {}", manifest_path.display()))?;
        let hooks = self.catalog.resolve(&ModuleSpec {
            name,
            dir: path,
            manifest: &manifest,
        })?;

        Ok(Some(PluginRecord {
            name: name.to_string(),
            path: path.to_path_buf(),
            manifest,
            hooks,
        }))
    }
}

fn entry_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
