//! Route table handed to plugins during `initializeRoutes`.

use std::{collections::BTreeSet, path::PathBuf};

use {
    axum::{Router, http::header, routing::MethodRouter},
    tower_http::services::ServeDir,
    tracing::debug,
};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RouteError {
    #[error("invalid route path {0:?}: must start with '/' and contain only static segments")]
    InvalidPath(String),
    #[error("route {0} is reserved by the server")]
    Reserved(String),
    #[error("route {0} is already registered")]
    Duplicate(String),
    #[error("route table is sealed, {0} was not added")]
    Sealed(String),
}

/// Routes contributed by plugins, merged into the server after
/// `initializeRoutes`. Plugin paths are static; they may not shadow a core
/// route or each other.
pub struct PluginRoutes {
    router: Router,
    reserved_exact: Vec<String>,
    reserved_prefixes: Vec<String>,
    paths: BTreeSet<String>,
    sealed: bool,
}

impl PluginRoutes {
    /// `reserved_exact` paths and everything below `reserved_prefixes`
    /// belong to the server.
    pub fn new(reserved_exact: &[&str], reserved_prefixes: &[&str]) -> Self {
        Self {
            router: Router::new(),
            reserved_exact: reserved_exact.iter().map(|s| s.to_string()).collect(),
            reserved_prefixes: reserved_prefixes.iter().map(|s| s.to_string()).collect(),
            paths: BTreeSet::new(),
            sealed: false,
        }
    }

    pub fn route(&mut self, path: &str, method_router: MethodRouter) -> Result<(), RouteError> {
        self.claim(path)?;
        self.router = std::mem::take(&mut self.router).route(path, method_router);
        Ok(())
    }

    /// A GET route answering with a fixed body.
    pub fn page(&mut self, path: &str, content_type: &str, body: &str) -> Result<(), RouteError> {
        let content_type = content_type.to_string();
        let body = body.to_string();
        self.route(
            path,
            axum::routing::get(move || {
                let content_type = content_type.clone();
                let body = body.clone();
                async move { ([(header::CONTENT_TYPE, content_type)], body) }
            }),
        )
    }

    /// Serve the files under `dir` below `prefix`.
    pub fn serve_dir(&mut self, prefix: &str, dir: PathBuf) -> Result<(), RouteError> {
        self.claim(prefix)?;
        debug!(prefix, dir = %dir.display(), "plugin static directory");
        self.router = std::mem::take(&mut self.router).nest_service(prefix, ServeDir::new(dir));
        Ok(())
    }

    /// Refuse further additions.
    pub fn seal(&mut self) {
        self.sealed = true;
    }

    pub fn is_sealed(&self) -> bool {
        self.sealed
    }

    pub fn paths(&self) -> Vec<&str> {
        self.paths.iter().map(String::as_str).collect()
    }

    /// The routes added so far.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    fn claim(&mut self, path: &str) -> Result<(), RouteError> {
        if self.sealed {
            return Err(RouteError::Sealed(path.to_string()));
        }
        if !is_static_path(path) {
            return Err(RouteError::InvalidPath(path.to_string()));
        }
        if self.is_reserved(path) {
            return Err(RouteError::Reserved(path.to_string()));
        }
        if !self.paths.insert(path.to_string()) {
            return Err(RouteError::Duplicate(path.to_string()));
        }
        Ok(())
    }

    fn is_reserved(&self, path: &str) -> bool {
        self.reserved_exact.iter().any(|r| r == path)
            || self.reserved_prefixes.iter().any(|prefix| {
                path == prefix
                    || path
                        .strip_prefix(prefix.as_str())
                        .is_some_and(|rest| rest.starts_with('/'))
            })
    }
}

fn is_static_path(path: &str) -> bool {
    path.len() > 1
        && path.starts_with('/')
        && !path.ends_with('/')
        && path[1..]
            .split('/')
            .all(|seg| !seg.is_empty() && !seg.contains(['{', '}', ':', '*']))
}
