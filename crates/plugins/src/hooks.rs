//! Hook points and the dispatcher that walks the registry.

use std::{
    fmt,
    panic::{AssertUnwindSafe, catch_unwind},
    sync::Arc,
};

use {
    scribe_config::ScribeConfig,
    scribe_storage::Store,
    tracing::{debug, warn},
};

use crate::{registry::PluginRegistry, routes::PluginRoutes};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HookPoint {
    PreInitialize,
    InitializeRoutes,
    PostInitialize,
}

impl HookPoint {
    pub const ALL: [HookPoint; 3] = [
        HookPoint::PreInitialize,
        HookPoint::InitializeRoutes,
        HookPoint::PostInitialize,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::PreInitialize => "preInitialize",
            Self::InitializeRoutes => "initializeRoutes",
            Self::PostInitialize => "postInitialize",
        }
    }
}

impl fmt::Display for HookPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a hook may touch.
pub struct HookContext<'a> {
    pub routes: &'a mut PluginRoutes,
    pub storage: Arc<dyn Store>,
    pub config: &'a ScribeConfig,
}

/// A hook function. Runs synchronously; async work it starts is not awaited.
pub type HookFn = Arc<dyn Fn(&mut HookContext<'_>) -> anyhow::Result<()> + Send + Sync>;

#[derive(Clone, Default)]
pub struct PluginHooks {
    pub pre_initialize: Option<HookFn>,
    pub initialize_routes: Option<HookFn>,
    pub post_initialize: Option<HookFn>,
}

impl PluginHooks {
    pub fn get(&self, point: HookPoint) -> Option<&HookFn> {
        match point {
            HookPoint::PreInitialize => self.pre_initialize.as_ref(),
            HookPoint::InitializeRoutes => self.initialize_routes.as_ref(),
            HookPoint::PostInitialize => self.post_initialize.as_ref(),
        }
    }

    /// Set the function for `point`, replacing any previous one.
    pub fn on<F>(mut self, point: HookPoint, f: F) -> Self
    where
        F: Fn(&mut HookContext<'_>) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        let f: HookFn = Arc::new(f);
        match point {
            HookPoint::PreInitialize => self.pre_initialize = Some(f),
            HookPoint::InitializeRoutes => self.initialize_routes = Some(f),
            HookPoint::PostInitialize => self.post_initialize = Some(f),
        }
        self
    }

    pub fn defined_points(&self) -> Vec<HookPoint> {
        HookPoint::ALL
            .into_iter()
            .filter(|p| self.get(*p).is_some())
            .collect()
    }
}

/// Outcome of one dispatch, by plugin name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HookReport {
    pub point: HookPoint,
    pub invoked: Vec<String>,
    pub skipped: Vec<String>,
    /// (plugin, error message)
    pub failed: Vec<(String, String)>,
}

impl HookReport {
    fn new(point: HookPoint) -> Self {
        Self {
            point,
            invoked: Vec::new(),
            skipped: Vec::new(),
            failed: Vec::new(),
        }
    }
}

/// Call `point` on every plugin that defines it, in registry order.
///
/// A hook that errors or panics is logged and counted as failed; the
/// remaining plugins still run.
pub fn dispatch(
    registry: &PluginRegistry,
    point: HookPoint,
    ctx: &mut HookContext<'_>,
) -> HookReport {
    let mut report = HookReport::new(point);

    for plugin in registry.iter() {
        let Some(hook) = plugin.hooks.get(point) else {
            report.skipped.push(plugin.name.clone());
            continue;
        };

        debug!(plugin = %plugin.name, hook = %point, "invoking plugin hook");
        report.invoked.push(plugin.name.clone());

        let outcome = catch_unwind(AssertUnwindSafe(|| hook(ctx)));
        let error = match outcome {
            Ok(Ok(())) => continue,
            Ok(Err(e)) => format!("{e:#}"),
            Err(panic) => panic_message(panic.as_ref()),
        };
        warn!(plugin = %plugin.name, hook = %point, error = %error, "plugin hook failed");
        report.failed.push((plugin.name.clone(), error));
    }

    report
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        format!("panicked: {s}")
    } else if let Some(s) = payload.downcast_ref::<String>() {
        format!("panicked: {s}")
    } else {
        "panicked".into()
    }
}
