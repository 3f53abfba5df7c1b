//! Hooks built from a manifest's declarative sections.

use std::{collections::BTreeMap, path::Path, sync::Arc};

use {
    anyhow::Context,
    scribe_storage::Store,
    tokio::runtime::Handle,
    tracing::{debug, info, warn},
};

use crate::{
    hooks::{HookPoint, PluginHooks},
    manifest::PageRoute,
    module::ModuleSpec,
};

pub fn hooks(spec: &ModuleSpec<'_>) -> PluginHooks {
    let manifest = spec.manifest;
    let mut hooks = PluginHooks::default();

    if !manifest.storage.is_empty() {
        let plugin = spec.name.to_string();
        let defaults = manifest.storage.clone();
        hooks = hooks.on(HookPoint::PreInitialize, move |ctx| {
            let runtime = Handle::try_current().context("storage seeding needs a tokio runtime")?;
            runtime.spawn(seed_storage(
                plugin.clone(),
                Arc::clone(&ctx.storage),
                defaults.clone(),
            ));
            Ok(())
        });
    }

    if manifest.static_dir.is_some() || !manifest.routes.is_empty() {
        let plugin = spec.name.to_string();
        let static_dir = manifest.static_dir.as_ref().map(|d| spec.dir.join(d));
        let pages: Vec<PageRoute> = manifest.routes.clone();
        hooks = hooks.on(HookPoint::InitializeRoutes, move |ctx| {
            if let Some(dir) = &static_dir {
                ctx.routes
                    .serve_dir(&format!("/plugins/{plugin}/static"), dir.clone())?;
            }
            for page in &pages {
                ctx.routes.page(&page.path, &page.content_type, &page.body)?;
            }
            Ok(())
        });
    }

    if let Some(post) = manifest.post_initialize.as_ref()
        && !post.command.is_empty()
    {
        let plugin = spec.name.to_string();
        let dir = spec.dir.to_path_buf();
        let command = post.command.clone();
        hooks = hooks.on(HookPoint::PostInitialize, move |_| {
            spawn_command(&plugin, &dir, &command)
        });
    }

    hooks
}

async fn seed_storage(
    plugin: String,
    storage: Arc<dyn Store>,
    defaults: BTreeMap<String, serde_json::Value>,
) {
    for (key, value) in defaults {
        match storage.get(&key).await {
            Ok(Some(_)) => continue,
            Ok(None) => {
                if let Err(e) = storage.set(&key, &value).await {
                    warn!(plugin = %plugin, key = %key, error = %e, "failed to seed storage key");
                } else {
                    debug!(plugin = %plugin, key = %key, "seeded storage key");
                }
            },
            Err(e) => {
                warn!(plugin = %plugin, key = %key, error = %e, "failed to read storage key");
            },
        }
    }
}

fn spawn_command(plugin: &str, dir: &Path, command: &[String]) -> anyhow::Result<()> {
    let runtime = Handle::try_current().context("post_initialize command needs a tokio runtime")?;
    let _guard = runtime.enter();

    let (program, args) = command
        .split_first()
        .context("post_initialize command is empty")?;
    let mut child = tokio::process::Command::new(program)
        .args(args)
        .current_dir(dir)
        .spawn()
        .with_context(|| format!("failed to spawn {program}"))?;

    let plugin = plugin.to_string();
    let program = program.clone();
    runtime.spawn(async move {
        match child.wait().await {
            Ok(status) if status.success() => {
                info!(plugin = %plugin, program = %program, "post_initialize command finished")
            },
            Ok(status) => {
                warn!(plugin = %plugin, program = %program, %status, "post_initialize command failed")
            },
            Err(e) => warn!(plugin = %plugin, program = %program, error = %e, "post_initialize command lost"),
        }
    });
    Ok(())
}
