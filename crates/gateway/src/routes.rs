//! Core HTTP routes: client pages, static assets, the script bundle, export.

use std::path::PathBuf;

use {
    axum::{
        Router,
        extract::{Path, Request, State},
        http::{HeaderValue, Method, StatusCode, Uri, header},
        response::{Html, IntoResponse, Response},
        routing::get,
    },
    scribe_protocol::{SOCKET_PATH, is_valid_pad_name},
    tower::{ServiceBuilder, ServiceExt},
    tower_http::{
        services::{ServeDir, ServeFile},
        set_header::SetResponseHeaderLayer,
    },
    tracing::{error, warn},
};

use crate::{server::AppState, ws::ws_upgrade_handler};

/// Exact paths plugins may not claim.
pub const RESERVED_PATHS: &[&str] = &["/", "/robots.txt", "/favicon.ico", SOCKET_PATH];

/// Prefixes plugins may not claim anything below.
pub const RESERVED_PREFIXES: &[&str] = &["/static", "/minified", "/p"];

/// The only bundle `/minified/{id}` knows about.
pub const PAD_BUNDLE_ID: &str = "pad.js";

/// Scripts concatenated into the pad bundle, relative to the static dir.
pub const PAD_BUNDLE: &[&str] = &["js/pad_utils.js", "js/pad_editor.js", "js/pad.js"];

pub fn core_routes(app: &AppState) -> Router<AppState> {
    let static_files = ServiceBuilder::new()
        .layer(SetResponseHeaderLayer::overriding(
            header::CACHE_CONTROL,
            app.cache_control.clone(),
        ))
        .service(ServeDir::new(app.static_dir()));

    Router::new()
        .route("/", get(index_handler))
        .route("/robots.txt", get(robots_handler))
        .route("/favicon.ico", get(favicon_handler))
        .route(SOCKET_PATH, get(ws_upgrade_handler))
        .route("/minified/{id}", get(minified_handler))
        .route("/p/{pad}", get(pad_handler))
        .route("/p/{pad}/timeslider", get(timeslider_handler))
        .route("/p/{pad}/export/html", get(export_html_handler))
        .nest_service("/static", static_files)
}

pub fn cache_control(max_age_secs: u64) -> HeaderValue {
    HeaderValue::from_str(&format!("public, max-age={max_age_secs}"))
        .unwrap_or_else(|_| HeaderValue::from_static("no-cache"))
}

/// Body of every unmatched request, and of pad routes with an invalid id.
pub fn not_found(method: &Method, uri: &Uri) -> Response {
    (
        StatusCode::NOT_FOUND,
        format!("Cannot {method} {}", uri.path()),
    )
        .into_response()
}

pub async fn fallback_handler(method: Method, uri: Uri) -> Response {
    not_found(&method, &uri)
}

// ── Handlers ─────────────────────────────────────────────────────────────────

async fn serve_file(path: PathBuf, req: Request) -> Response {
    match ServeFile::new(path).oneshot(req).await {
        Ok(res) => res.into_response(),
        Err(never) => match never {},
    }
}

async fn index_handler(State(app): State<AppState>, req: Request) -> Response {
    serve_file(app.static_dir().join("index.html"), req).await
}

async fn robots_handler(State(app): State<AppState>, req: Request) -> Response {
    serve_file(app.static_dir().join("robots.txt"), req).await
}

async fn favicon_handler(State(app): State<AppState>, req: Request) -> Response {
    serve_file(app.static_dir().join("favicon.ico"), req).await
}

async fn pad_handler(
    State(app): State<AppState>,
    Path(pad): Path<String>,
    req: Request,
) -> Response {
    if !is_valid_pad_name(&pad) {
        return not_found(req.method(), req.uri());
    }
    serve_file(app.static_dir().join("pad.html"), req).await
}

async fn timeslider_handler(
    State(app): State<AppState>,
    Path(pad): Path<String>,
    req: Request,
) -> Response {
    if !is_valid_pad_name(&pad) {
        return not_found(req.method(), req.uri());
    }
    serve_file(app.static_dir().join("timeslider.html"), req).await
}

async fn export_html_handler(
    State(app): State<AppState>,
    Path(pad): Path<String>,
    method: Method,
    uri: Uri,
) -> Response {
    if !is_valid_pad_name(&pad) {
        return not_found(&method, &uri);
    }
    match app.exporter.render(&pad).await {
        Ok(Some(html)) => Html(html).into_response(),
        Ok(None) => not_found(&method, &uri),
        Err(e) => {
            error!(pad = %pad, error = %format!("{e:#}"), "html export failed");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        },
    }
}

async fn minified_handler(
    State(app): State<AppState>,
    Path(id): Path<String>,
    method: Method,
    uri: Uri,
) -> Response {
    if id != PAD_BUNDLE_ID {
        return not_found(&method, &uri);
    }

    let dir = app.static_dir();
    let mut bundle = String::new();
    for script in PAD_BUNDLE {
        match tokio::fs::read_to_string(dir.join(script)).await {
            Ok(source) => {
                bundle.push_str(&format!("// {script}\n"));
                bundle.push_str(&source);
                bundle.push('\n');
            },
            Err(e) => warn!(script, error = %e, "bundle script missing"),
        }
    }

    (
        [
            (
                header::CONTENT_TYPE,
                HeaderValue::from_static("application/javascript; charset=utf-8"),
            ),
            (header::CACHE_CONTROL, app.cache_control.clone()),
        ],
        bundle,
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use {
        axum::body::Body,
        scribe_config::ScribeConfig,
        scribe_plugins::PluginRoutes,
        scribe_storage::{MemoryStore, Store},
    };

    use super::*;
    use crate::{
        export::PlainHtmlExporter, pads::PadRepository, router::ComponentRouter,
        server::build_gateway_app, state::GatewayState,
    };

    struct Fixture {
        _static: tempfile::TempDir,
        pads: PadRepository,
        app: Router,
    }

    fn fixture(plugin_routes: Router) -> Fixture {
        let static_dir = tempfile::tempdir().unwrap();
        let root = static_dir.path();
        std::fs::create_dir_all(root.join("js")).unwrap();
        std::fs::write(root.join("index.html"), "<h1>index</h1>").unwrap();
        std::fs::write(root.join("pad.html"), "<h1>pad</h1>").unwrap();
        std::fs::write(root.join("timeslider.html"), "<h1>timeslider</h1>").unwrap();
        std::fs::write(root.join("robots.txt"), "User-agent: *").unwrap();
        std::fs::write(root.join("js/pad_utils.js"), "var utils;").unwrap();
        std::fs::write(root.join("js/pad.js"), "var pad;").unwrap();

        let mut config = ScribeConfig::default();
        config.server.static_dir = root.to_path_buf();
        config.server.max_age_secs = 60;
        let storage: Arc<dyn Store> = Arc::new(MemoryStore::new());
        let state = GatewayState::with_version(storage.clone(), Arc::new(config), "abc1234".into());
        let pads = PadRepository::new(storage);
        let app_state = AppState::new(
            state,
            Arc::new(ComponentRouter::new()),
            Arc::new(PlainHtmlExporter::new(pads.clone())),
        );
        Fixture {
            _static: static_dir,
            pads,
            app: build_gateway_app(app_state, plugin_routes),
        }
    }

    async fn get(app: &Router, path: &str) -> (StatusCode, axum::http::HeaderMap, String) {
        let response = app
            .clone()
            .oneshot(
                axum::http::Request::get(path)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, headers, String::from_utf8_lossy(&body).into_owned())
    }

    #[tokio::test]
    async fn serves_pad_pages_for_valid_ids() {
        let f = fixture(Router::new());
        let (status, headers, body) = get(&f.app, "/p/foo-bar").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "<h1>pad</h1>");
        assert_eq!(headers[header::SERVER], "Scribe abc1234");

        let (status, _, body) = get(&f.app, "/p/foo-bar/timeslider").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "<h1>timeslider</h1>");
    }

    #[tokio::test]
    async fn invalid_pad_ids_fall_through() {
        let f = fixture(Router::new());
        for path in ["/p/foo$bar", "/p/foo$bar/timeslider", "/p/foo$bar/export/html"] {
            let (status, headers, body) = get(&f.app, path).await;
            assert_eq!(status, StatusCode::NOT_FOUND, "{path}");
            assert_eq!(body, format!("Cannot GET {path}"));
            assert_eq!(headers[header::SERVER], "Scribe abc1234");
        }
    }

    #[tokio::test]
    async fn trailing_slash_never_matches() {
        let f = fixture(Router::new());
        let (status, _, body) = get(&f.app, "/p/foo/").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, "Cannot GET /p/foo/");
    }

    #[tokio::test]
    async fn static_files_carry_cache_control() {
        let f = fixture(Router::new());
        let (status, headers, body) = get(&f.app, "/static/robots.txt").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "User-agent: *");
        assert_eq!(headers[header::CACHE_CONTROL], "public, max-age=60");
    }

    #[tokio::test]
    async fn root_files_are_served() {
        let f = fixture(Router::new());
        assert_eq!(get(&f.app, "/").await.2, "<h1>index</h1>");
        assert_eq!(get(&f.app, "/robots.txt").await.2, "User-agent: *");
        assert_eq!(get(&f.app, "/favicon.ico").await.0, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn minified_serves_only_the_pad_bundle() {
        let f = fixture(Router::new());
        let (status, headers, body) = get(&f.app, "/minified/pad.js").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            headers[header::CONTENT_TYPE],
            "application/javascript; charset=utf-8"
        );
        assert_eq!(headers[header::CACHE_CONTROL], "public, max-age=60");
        let utils = body.find("var utils;").unwrap();
        let pad = body.find("var pad;").unwrap();
        assert!(utils < pad);

        let (status, _, body) = get(&f.app, "/minified/other.js").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, "Cannot GET /minified/other.js");
    }

    #[tokio::test]
    async fn exports_existing_pads() {
        let f = fixture(Router::new());
        f.pads.get_or_create("notes", "x < y").await.unwrap();

        let (status, headers, body) = get(&f.app, "/p/notes/export/html").await;
        assert_eq!(status, StatusCode::OK);
        assert!(headers[header::CONTENT_TYPE]
            .to_str()
            .unwrap()
            .starts_with("text/html"));
        assert!(body.contains("x &lt; y"));

        let (status, _, _) = get(&f.app, "/p/ghost/export/html").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn plugin_routes_are_merged() {
        let mut routes = PluginRoutes::new(RESERVED_PATHS, RESERVED_PREFIXES);
        routes.page("/hello", "text/plain", "from a plugin").unwrap();
        let f = fixture(routes.router());

        let (status, headers, body) = get(&f.app, "/hello").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "from a plugin");
        assert_eq!(headers[header::SERVER], "Scribe abc1234");
    }

    #[test]
    fn plugins_cannot_shadow_core_routes() {
        let mut routes = PluginRoutes::new(RESERVED_PATHS, RESERVED_PREFIXES);
        for path in ["/", "/socket", "/favicon.ico", "/p/x", "/static/app.js", "/minified/pad.js"] {
            assert!(routes.page(path, "text/plain", "x").is_err(), "{path}");
        }
    }
}
