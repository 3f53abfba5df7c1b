/// Config schema types (server, storage, plugins, pad defaults).
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Root configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScribeConfig {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub plugins: PluginsConfig,
    pub pad: PadConfig,
}

/// HTTP/WebSocket listener settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Interface to bind.
    pub bind: String,
    pub port: u16,
    /// `max-age` for `/static` and `/minified` responses, in seconds.
    pub max_age_secs: u64,
    /// Directory holding the client pages and static assets.
    pub static_dir: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0".into(),
            port: 9001,
            max_age_secs: 6 * 60 * 60,
            static_dir: PathBuf::from("static"),
        }
    }
}

impl ServerConfig {
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.bind, self.port)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    Sqlite,
    Memory,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    /// SQLite database file. Ignored by the memory backend.
    pub path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::Sqlite,
            path: PathBuf::from("var/scribe.db"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PluginsConfig {
    /// When false the plugin directory is not scanned at all.
    pub enabled: bool,
    /// Directory whose entries are plugin candidates.
    pub dir: PathBuf,
}

impl Default for PluginsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            dir: PathBuf::from("plugins"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PadConfig {
    /// Text of a freshly created pad.
    pub default_text: String,
}

impl Default for PadConfig {
    fn default() -> Self {
        Self {
            default_text: "Welcome to Scribe!\n\nThis pad text is synchronized as you type, so that \
                           everyone viewing this page sees the same text.\n"
                .into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_sections_keep_defaults() {
        let cfg: ScribeConfig = toml::from_str("[server]\nport = 8080\n").unwrap();
        assert_eq!(cfg.server.port, 8080);
        assert_eq!(cfg.server.bind, "0.0.0.0");
        assert_eq!(cfg.server.max_age_secs, 21600);
        assert!(cfg.plugins.enabled);
    }

    #[test]
    fn backend_is_lowercase() {
        let cfg: ScribeConfig = toml::from_str("[storage]\nbackend = \"memory\"\n").unwrap();
        assert_eq!(cfg.storage.backend, StorageBackend::Memory);
        assert!(toml::from_str::<ScribeConfig>("[storage]\nbackend = \"Memory\"\n").is_err());
    }

    #[test]
    fn listen_addr_joins_bind_and_port() {
        let server = ServerConfig {
            bind: "127.0.0.1".into(),
            port: 1234,
            ..Default::default()
        };
        assert_eq!(server.listen_addr(), "127.0.0.1:1234");
    }
}
