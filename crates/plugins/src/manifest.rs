use std::{collections::BTreeMap, path::PathBuf};

use serde::{Deserialize, Serialize};

/// Parsed `plugin.toml`.
///
/// A manifest either names an in-process `module` registered in the
/// [`ModuleCatalog`](crate::ModuleCatalog), or describes its hooks
/// declaratively with the remaining fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PluginManifest {
    pub description: Option<String>,
    /// Name of a built-in module that provides the hooks.
    pub module: Option<String>,
    /// Directory (relative to the plugin) served under `/plugins/<name>/static`.
    pub static_dir: Option<PathBuf>,
    /// Fixed-body GET routes.
    pub routes: Vec<PageRoute>,
    /// Storage keys seeded at `preInitialize` when absent.
    pub storage: BTreeMap<String, serde_json::Value>,
    pub post_initialize: Option<PostInitialize>,
    /// Free-form settings handed to built-in modules.
    pub settings: serde_json::Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PageRoute {
    pub path: String,
    pub body: String,
    #[serde(default = "default_content_type")]
    pub content_type: String,
}

fn default_content_type() -> String {
    "text/html; charset=utf-8".into()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PostInitialize {
    /// Program and arguments, run from the plugin directory.
    pub command: Vec<String>,
}

impl PluginManifest {
    pub fn parse(raw: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(raw)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_manifest_is_valid() {
        let manifest = PluginManifest::parse("").unwrap();
        assert_eq!(manifest, PluginManifest::default());
    }

    #[test]
    fn parses_declarative_sections() {
        let manifest = PluginManifest::parse(
            r#"
description = "adds a help page"
static_dir = "public"

[[routes]]
path = "/help"
body = "<h1>Help</h1>"

[[routes]]
path = "/help.txt"
body = "help"
content_type = "text/plain"

[storage]
"settings:help" = { enabled = true }

[post_initialize]
command = ["echo", "ready"]
"#,
        )
        .unwrap();

        assert_eq!(manifest.static_dir, Some(PathBuf::from("public")));
        assert_eq!(manifest.routes.len(), 2);
        assert_eq!(manifest.routes[0].content_type, "text/html; charset=utf-8");
        assert_eq!(manifest.routes[1].content_type, "text/plain");
        assert_eq!(
            manifest.storage["settings:help"],
            serde_json::json!({"enabled": true})
        );
        assert_eq!(manifest.post_initialize.unwrap().command, vec!["echo", "ready"]);
    }

    #[test]
    fn rejects_unknown_keys() {
        assert!(PluginManifest::parse("entrypoint = \"init.js\"").is_err());
    }

    #[test]
    fn module_settings_are_free_form() {
        let manifest =
            PluginManifest::parse("module = \"stats\"\n[settings]\ninterval = 5\n").unwrap();
        assert_eq!(manifest.module.as_deref(), Some("stats"));
        assert_eq!(manifest.settings["interval"], 5);
    }
}
