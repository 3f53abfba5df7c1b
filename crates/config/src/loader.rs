use std::{
    path::{Path, PathBuf},
    sync::Mutex,
};

use {
    anyhow::Context,
    tracing::{debug, warn},
};

use crate::{env_subst::substitute_env, schema::ScribeConfig};

/// Standard config file names, checked in order.
const CONFIG_FILENAMES: &[&str] = &["scribe.toml", "scribe.yaml", "scribe.yml", "scribe.json"];

/// Override for the config directory, set via `set_config_dir()`.
static CONFIG_DIR_OVERRIDE: Mutex<Option<PathBuf>> = Mutex::new(None);

/// Restrict discovery to a single directory (used by tests and `--config-dir`).
pub fn set_config_dir(path: PathBuf) {
    *CONFIG_DIR_OVERRIDE
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(path);
}

fn config_dir_override() -> Option<PathBuf> {
    CONFIG_DIR_OVERRIDE
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
        .clone()
}

/// Load config from the given path (any supported format).
pub fn load_config(path: &Path) -> anyhow::Result<ScribeConfig> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let raw = substitute_env(&raw);
    parse_config(&raw, path).with_context(|| format!("failed to parse {}", path.display()))
}

/// Resolve the effective configuration.
///
/// An explicit path must load; a discovered file that fails to parse is
/// reported and replaced by defaults. No file at all means defaults.
pub fn discover_and_load(explicit: Option<&Path>) -> anyhow::Result<ScribeConfig> {
    if let Some(path) = explicit {
        debug!(path = %path.display(), "loading explicit config");
        return load_config(path);
    }

    let Some(path) = find_config_file() else {
        debug!("no config file found, using defaults");
        return Ok(ScribeConfig::default());
    };

    debug!(path = %path.display(), "loading config");
    match load_config(&path) {
        Ok(cfg) => Ok(cfg),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "failed to load config, using defaults");
            Ok(ScribeConfig::default())
        },
    }
}

/// Find the first config file in standard locations.
///
/// When a config dir override is set, only that directory is searched.
pub fn find_config_file() -> Option<PathBuf> {
    if let Some(dir) = config_dir_override() {
        return first_existing(&dir);
    }

    first_existing(Path::new(".")).or_else(|| config_dir().and_then(|dir| first_existing(&dir)))
}

fn first_existing(dir: &Path) -> Option<PathBuf> {
    CONFIG_FILENAMES
        .iter()
        .map(|name| dir.join(name))
        .find(|p| p.exists())
}

/// Returns the config directory: override, or `~/.config/scribe/`.
pub fn config_dir() -> Option<PathBuf> {
    if let Some(dir) = config_dir_override() {
        return Some(dir);
    }
    directories::BaseDirs::new().map(|d| d.home_dir().join(".config").join("scribe"))
}

fn parse_config(raw: &str, path: &Path) -> anyhow::Result<ScribeConfig> {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("toml");

    match ext {
        "toml" => Ok(toml::from_str(raw)?),
        "yaml" | "yml" => Ok(serde_yaml::from_str(raw)?),
        "json" => Ok(serde_json::from_str(raw)?),
        _ => anyhow::bail!("unsupported config format: .{ext}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::StorageBackend;

    #[test]
    fn loads_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scribe.toml");
        std::fs::write(&path, "[server]\nport = 7000\n[storage]\nbackend = \"memory\"\n").unwrap();

        let cfg = load_config(&path).unwrap();
        assert_eq!(cfg.server.port, 7000);
        assert_eq!(cfg.storage.backend, StorageBackend::Memory);
    }

    #[test]
    fn loads_yaml_and_json() {
        let dir = tempfile::tempdir().unwrap();

        let yaml = dir.path().join("scribe.yaml");
        std::fs::write(&yaml, "plugins:\n  enabled: false\n").unwrap();
        assert!(!load_config(&yaml).unwrap().plugins.enabled);

        let json = dir.path().join("scribe.json");
        std::fs::write(&json, r#"{"pad": {"default_text": "hi"}}"#).unwrap();
        assert_eq!(load_config(&json).unwrap().pad.default_text, "hi");
    }

    #[test]
    fn rejects_unknown_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scribe.ini");
        std::fs::write(&path, "port=1").unwrap();
        assert!(load_config(&path).is_err());
    }

    #[test]
    fn explicit_missing_path_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.toml");
        assert!(discover_and_load(Some(&missing)).is_err());
    }

    #[test]
    fn explicit_path_applies_env_fallbacks() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.toml");
        std::fs::write(
            &path,
            "[server]\nbind = \"${SCRIBE_LOADER_TEST_UNSET_BIND:-127.0.0.1}\"\n",
        )
        .unwrap();
        let cfg = discover_and_load(Some(&path)).unwrap();
        assert_eq!(cfg.server.bind, "127.0.0.1");
    }
}
