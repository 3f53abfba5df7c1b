use std::{collections::HashMap, path::Path, sync::Arc};

use crate::{declarative, hooks::PluginHooks, manifest::PluginManifest};

/// What a module factory gets to build a plugin's hooks from.
pub struct ModuleSpec<'a> {
    pub name: &'a str,
    pub dir: &'a Path,
    pub manifest: &'a PluginManifest,
}

pub type ModuleFactory =
    Arc<dyn Fn(&ModuleSpec<'_>) -> anyhow::Result<PluginHooks> + Send + Sync>;

/// Built-in modules a manifest can refer to by name.
///
/// Manifests without a `module` key are resolved declaratively.
#[derive(Clone, Default)]
pub struct ModuleCatalog {
    factories: HashMap<String, ModuleFactory>,
}

impl ModuleCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<F>(&mut self, module: impl Into<String>, factory: F)
    where
        F: Fn(&ModuleSpec<'_>) -> anyhow::Result<PluginHooks> + Send + Sync + 'static,
    {
        self.factories.insert(module.into(), Arc::new(factory));
    }

    pub fn contains(&self, module: &str) -> bool {
        self.factories.contains_key(module)
    }

    pub fn resolve(&self, spec: &ModuleSpec<'_>) -> anyhow::Result<PluginHooks> {
        let Some(module) = spec.manifest.module.as_deref() else {
            return Ok(declarative::hooks(spec));
        };
        let Some(factory) = self.factories.get(module) else {
            anyhow::bail!("unknown module {module:?}");
        };
        factory(spec)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hooks::HookPoint;

    fn spec<'a>(manifest: &'a PluginManifest) -> ModuleSpec<'a> {
        ModuleSpec {
            name: "demo",
            dir: Path::new("/tmp/demo"),
            manifest,
        }
    }

    #[test]
    fn resolves_registered_module() {
        let mut catalog = ModuleCatalog::new();
        catalog.register("greeter", |spec| {
            assert_eq!(spec.name, "demo");
            Ok(PluginHooks::default().on(HookPoint::PostInitialize, |_| Ok(())))
        });
        assert!(catalog.contains("greeter"));

        let manifest = PluginManifest {
            module: Some("greeter".into()),
            ..Default::default()
        };
        let hooks = catalog.resolve(&spec(&manifest)).unwrap();
        assert_eq!(hooks.defined_points(), vec![HookPoint::PostInitialize]);
    }

    #[test]
    fn unknown_module_fails() {
        let manifest = PluginManifest {
            module: Some("missing".into()),
            ..Default::default()
        };
        let err = ModuleCatalog::new()
            .resolve(&spec(&manifest))
            .err()
            .unwrap();
        assert!(err.to_string().contains("missing"));
    }

    #[test]
    fn no_module_means_declarative() {
        let manifest = PluginManifest::default();
        let hooks = ModuleCatalog::new().resolve(&spec(&manifest)).unwrap();
        assert!(hooks.defined_points().is_empty());
    }
}
