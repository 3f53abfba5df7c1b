use std::{future::Future, net::SocketAddr, path::Path, pin::Pin, sync::Arc};

use {
    anyhow::Context,
    async_trait::async_trait,
    axum::{
        Router,
        http::{HeaderValue, header},
    },
    scribe_config::ScribeConfig,
    scribe_plugins::{
        HookContext, HookPoint, ModuleCatalog, PluginLoader, PluginRegistry, PluginRoutes,
        dispatch,
    },
    scribe_protocol::{PROTOCOL_VERSION, SERVER_PRODUCT, components},
    scribe_storage::Store,
    tokio::sync::oneshot,
    tower_http::{set_header::SetResponseHeaderLayer, trace::TraceLayer},
    tracing::{info, warn},
};

use crate::{
    bootstrap::{self, BootError, BootStages},
    export::{HtmlExporter, PlainHtmlExporter},
    pad::PadMessageHandler,
    pads::PadRepository,
    router::ComponentRouter,
    routes::{self, RESERVED_PATHS, RESERVED_PREFIXES},
    state::GatewayState,
    timeslider::TimesliderMessageHandler,
};

// ── Shared app state ─────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct AppState {
    pub gateway: Arc<GatewayState>,
    pub components: Arc<ComponentRouter>,
    pub exporter: Arc<dyn HtmlExporter>,
    /// `Cache-Control` for static assets and bundles.
    pub cache_control: HeaderValue,
}

impl AppState {
    pub fn new(
        gateway: Arc<GatewayState>,
        components: Arc<ComponentRouter>,
        exporter: Arc<dyn HtmlExporter>,
    ) -> Self {
        let cache_control = routes::cache_control(gateway.config.server.max_age_secs);
        Self {
            gateway,
            components,
            exporter,
            cache_control,
        }
    }

    pub fn static_dir(&self) -> &Path {
        &self.gateway.config.server.static_dir
    }
}

// ── Server startup ───────────────────────────────────────────────────────────

/// Build the full HTTP app: core routes, plugin routes, fallback, and the
/// layers every response goes through.
pub fn build_gateway_app(app: AppState, plugin_routes: Router) -> Router {
    let server_header = HeaderValue::from_str(&app.gateway.server_name)
        .unwrap_or_else(|_| HeaderValue::from_static(SERVER_PRODUCT));

    routes::core_routes(&app)
        .with_state(app)
        .merge(plugin_routes)
        .fallback(routes::fallback_handler)
        .layer(SetResponseHeaderLayer::overriding(
            header::SERVER,
            server_header,
        ))
        .layer(TraceLayer::new_for_http())
}

/// Boot the server and serve until Ctrl-C.
pub async fn start_gateway(config: ScribeConfig, catalog: ModuleCatalog) -> Result<(), BootError> {
    bootstrap::run(&mut GatewayStages::new(config, catalog)).await
}

type ShutdownSignal = Pin<Box<dyn Future<Output = ()> + Send>>;

/// The production boot stages.
pub struct GatewayStages {
    config: Arc<ScribeConfig>,
    catalog: ModuleCatalog,
    shutdown: Option<ShutdownSignal>,
    ready: Option<oneshot::Sender<SocketAddr>>,
}

impl GatewayStages {
    pub fn new(config: ScribeConfig, catalog: ModuleCatalog) -> Self {
        Self {
            config: Arc::new(config),
            catalog,
            shutdown: None,
            ready: None,
        }
    }

    /// Stop serving when `signal` completes instead of on Ctrl-C.
    pub fn with_shutdown(mut self, signal: impl Future<Output = ()> + Send + 'static) -> Self {
        self.shutdown = Some(Box::pin(signal));
        self
    }

    /// Report the bound address once post-initialize hooks have run.
    pub fn on_ready(mut self, ready: oneshot::Sender<SocketAddr>) -> Self {
        self.ready = Some(ready);
        self
    }
}

#[async_trait]
impl BootStages for GatewayStages {
    type Storage = Arc<dyn Store>;
    type Loaded = (Arc<dyn Store>, PluginRegistry);

    async fn storage_init(&mut self) -> anyhow::Result<Self::Storage> {
        let storage = scribe_storage::open(&self.config.storage)
            .await
            .with_context(|| format!("cannot open {:?} storage", self.config.storage.backend))?;
        Ok(storage)
    }

    async fn plugin_load(&mut self, storage: Self::Storage) -> anyhow::Result<Self::Loaded> {
        if !self.config.plugins.enabled {
            info!("plugins disabled");
            return Ok((storage, PluginRegistry::default()));
        }
        let loader = PluginLoader::new(self.config.plugins.dir.clone(), self.catalog.clone());
        Ok((storage, loader.load().await))
    }

    async fn server_init(&mut self, loaded: Self::Loaded) -> anyhow::Result<()> {
        let (storage, plugins) = loaded;
        let config = Arc::clone(&self.config);
        let state = GatewayState::new(Arc::clone(&storage), Arc::clone(&config));
        let pads = PadRepository::new(Arc::clone(&storage));

        // Components are registered before the transport exists.
        let mut router = ComponentRouter::new();
        router.register(
            components::PAD,
            Arc::new(PadMessageHandler::new(Arc::clone(&state), pads.clone())),
        )?;
        router.register(
            components::TIMESLIDER,
            Arc::new(TimesliderMessageHandler::new(
                Arc::clone(&state),
                pads.clone(),
            )),
        )?;

        let mut plugin_routes = PluginRoutes::new(RESERVED_PATHS, RESERVED_PREFIXES);
        run_hooks(&plugins, HookPoint::PreInitialize, &mut plugin_routes, &storage, &config);

        let app_state = AppState::new(
            Arc::clone(&state),
            Arc::new(router),
            Arc::new(PlainHtmlExporter::new(pads)),
        );
        let component_names: Vec<String> = app_state
            .components
            .component_names()
            .into_iter()
            .map(String::from)
            .collect();

        run_hooks(&plugins, HookPoint::InitializeRoutes, &mut plugin_routes, &storage, &config);
        plugin_routes.seal();
        let app = build_gateway_app(app_state, plugin_routes.router());

        let addr = config.server.listen_addr();
        let listener = tokio::net::TcpListener::bind(&addr)
            .await
            .with_context(|| format!("cannot bind {addr}"))?;
        let local_addr = listener.local_addr()?;

        // Startup banner.
        let lines = [
            format!("scribe v{}", state.version),
            format!("protocol v{PROTOCOL_VERSION}, listening on {local_addr}"),
            format!("components: {}", component_names.join(", ")),
            format!("{} plugins: {}", plugins.len(), plugins.names().join(", ")),
        ];
        let width = lines.iter().map(|l| l.len()).max().unwrap_or(0) + 4;
        info!("┌{}┐", "─".repeat(width));
        for line in &lines {
            info!("│  {:<w$}│", line, w = width - 2);
        }
        info!("└{}┘", "─".repeat(width));

        let shutdown = self
            .shutdown
            .take()
            .unwrap_or_else(|| Box::pin(ctrl_c()));
        let server = tokio::spawn(async move {
            axum::serve(
                listener,
                app.into_make_service_with_connect_info::<SocketAddr>(),
            )
            .with_graceful_shutdown(shutdown)
            .await
        });

        run_hooks(&plugins, HookPoint::PostInitialize, &mut plugin_routes, &storage, &config);
        if let Some(ready) = self.ready.take() {
            ready.send(local_addr).ok();
        }

        server
            .await
            .context("server task panicked")?
            .context("server error")?;
        info!("server stopped");
        Ok(())
    }
}

fn run_hooks(
    plugins: &PluginRegistry,
    point: HookPoint,
    routes: &mut PluginRoutes,
    storage: &Arc<dyn Store>,
    config: &ScribeConfig,
) {
    if plugins.is_empty() {
        return;
    }
    let mut ctx = HookContext {
        routes,
        storage: Arc::clone(storage),
        config,
    };
    let report = dispatch(plugins, point, &mut ctx);
    info!(
        hook = %point,
        invoked = report.invoked.len(),
        skipped = report.skipped.len(),
        failed = report.failed.len(),
        "plugin hooks dispatched"
    );
}

async fn ctrl_c() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "cannot listen for ctrl-c, serving until killed");
        std::future::pending::<()>().await;
    }
    info!("shutdown requested");
}
