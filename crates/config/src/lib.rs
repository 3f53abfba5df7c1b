//! Configuration: schema, discovery, and multi-format loading.
//!
//! Files are looked up as `scribe.{toml,yaml,yml,json}`, first in the working
//! directory, then in `~/.config/scribe/`. `${VAR}` placeholders are expanded
//! from the environment before parsing.

pub mod env_subst;
pub mod loader;
pub mod schema;

pub use {
    loader::{config_dir, discover_and_load, find_config_file, load_config, set_config_dir},
    schema::{PadConfig, PluginsConfig, ScribeConfig, ServerConfig, StorageBackend, StorageConfig},
};
