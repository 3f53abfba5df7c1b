//! Plugin system: discovery, loading, hook dispatch, and the plugin route table.
//!
//! A plugin is a directory entry under the plugins directory that contains a
//! `plugin.toml`. Plugins are loaded once at boot into an ordered
//! [`PluginRegistry`] and invoked at three hook points while the server
//! starts: `preInitialize`, `initializeRoutes`, `postInitialize`.

pub mod declarative;
pub mod hooks;
pub mod loader;
pub mod manifest;
pub mod module;
pub mod registry;
pub mod routes;

pub use {
    hooks::{HookContext, HookFn, HookPoint, HookReport, PluginHooks, dispatch},
    loader::{Candidate, CandidateStatus, PLUGIN_MANIFEST, PluginLoader},
    manifest::PluginManifest,
    module::{ModuleCatalog, ModuleSpec},
    registry::{PluginRecord, PluginRegistry},
    routes::{PluginRoutes, RouteError},
};
