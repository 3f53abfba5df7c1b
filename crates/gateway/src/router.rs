//! Routes realtime frames to the component that owns them.
//!
//! All components share one socket. Each inbound frame names its component;
//! the router strips that tag and hands the rest to the registered handler
//! together with the connection id.

use std::sync::Arc;

use {
    async_trait::async_trait,
    scribe_protocol::{ComponentMessage, InboundFrame},
    tracing::{debug, warn},
};

// ── Handler trait ────────────────────────────────────────────────────────────

#[async_trait]
pub trait ComponentHandler: Send + Sync {
    /// A client opened the socket.
    async fn handle_connect(&self, _conn_id: &str) {}

    async fn handle_message(&self, conn_id: &str, message: ComponentMessage)
    -> anyhow::Result<()>;

    /// The client's socket closed.
    async fn handle_disconnect(&self, _conn_id: &str) {}
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RouterError {
    #[error("component {0:?} is already registered")]
    DuplicateComponent(String),
}

/// What happened to one inbound frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteOutcome {
    Delivered,
    /// No handler for the component; the frame was dropped.
    Unmatched,
    /// The handler returned an error.
    Failed(String),
    /// The text was not a valid envelope.
    Malformed(String),
}

// ── Router ───────────────────────────────────────────────────────────────────

struct ComponentRoute {
    name: String,
    handler: Arc<dyn ComponentHandler>,
}

/// Component name → handler table. Built during server init, then shared
/// read-only behind an `Arc`.
#[derive(Default)]
pub struct ComponentRouter {
    routes: Vec<ComponentRoute>,
}

impl ComponentRouter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a handler. A name that is already taken is refused and the first
    /// registration stays in place.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        handler: Arc<dyn ComponentHandler>,
    ) -> Result<(), RouterError> {
        let name = name.into();
        if self.handler(&name).is_some() {
            return Err(RouterError::DuplicateComponent(name));
        }
        debug!(component = %name, "component registered");
        self.routes.push(ComponentRoute { name, handler });
        Ok(())
    }

    /// Swap the handler for `name`, returning the previous one. Registers it
    /// if the name is new.
    pub fn replace(
        &mut self,
        name: &str,
        handler: Arc<dyn ComponentHandler>,
    ) -> Option<Arc<dyn ComponentHandler>> {
        match self.routes.iter_mut().find(|r| r.name == name) {
            Some(route) => Some(std::mem::replace(&mut route.handler, handler)),
            None => {
                self.routes.push(ComponentRoute {
                    name: name.to_string(),
                    handler,
                });
                None
            },
        }
    }

    pub fn handler(&self, name: &str) -> Option<&Arc<dyn ComponentHandler>> {
        self.routes
            .iter()
            .find(|r| r.name == name)
            .map(|r| &r.handler)
    }

    /// Registered names, in registration order.
    pub fn component_names(&self) -> Vec<&str> {
        self.routes.iter().map(|r| r.name.as_str()).collect()
    }

    pub async fn route(&self, conn_id: &str, frame: InboundFrame) -> RouteOutcome {
        let (component, message) = frame.into_parts();
        let Some(handler) = self.handler(&component) else {
            debug!(conn_id, component = %component, "no handler for component, dropping frame");
            return RouteOutcome::Unmatched;
        };

        let kind = message.kind.clone();
        match handler.handle_message(conn_id, message).await {
            Ok(()) => RouteOutcome::Delivered,
            Err(e) => {
                let error = format!("{e:#}");
                warn!(conn_id, component = %component, kind = %kind, error = %error, "component handler failed");
                RouteOutcome::Failed(error)
            },
        }
    }

    /// Parse a text frame off the socket and route it.
    pub async fn route_text(&self, conn_id: &str, text: &str) -> RouteOutcome {
        match InboundFrame::parse(text) {
            Ok(frame) => self.route(conn_id, frame).await,
            Err(e) => {
                debug!(conn_id, error = %e, "dropping malformed frame");
                RouteOutcome::Malformed(e.to_string())
            },
        }
    }

    pub async fn connect(&self, conn_id: &str) {
        for route in &self.routes {
            route.handler.handle_connect(conn_id).await;
        }
    }

    pub async fn disconnect(&self, conn_id: &str) {
        for route in &self.routes {
            route.handler.handle_disconnect(conn_id).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use serde_json::json;

    use super::*;

    type Log = Arc<Mutex<Vec<String>>>;

    struct Recorder {
        name: &'static str,
        log: Log,
    }

    impl Recorder {
        fn new(name: &'static str, log: &Log) -> Arc<Self> {
            Arc::new(Self {
                name,
                log: Arc::clone(log),
            })
        }

        fn push(&self, event: String) {
            self.log.lock().unwrap().push(event);
        }
    }

    #[async_trait]
    impl ComponentHandler for Recorder {
        async fn handle_connect(&self, conn_id: &str) {
            self.push(format!("{}:connect:{conn_id}", self.name));
        }

        async fn handle_message(
            &self,
            conn_id: &str,
            message: ComponentMessage,
        ) -> anyhow::Result<()> {
            anyhow::ensure!(message.kind != "EXPLODE", "cannot handle {}", message.kind);
            self.push(format!("{}:{}:{conn_id}", self.name, message.kind));
            Ok(())
        }

        async fn handle_disconnect(&self, conn_id: &str) {
            self.push(format!("{}:disconnect:{conn_id}", self.name));
        }
    }

    fn frame(component: &str, kind: &str) -> InboundFrame {
        InboundFrame::new(component, kind, json!({}))
    }

    #[tokio::test]
    async fn duplicate_registration_keeps_first_handler() {
        let log = Log::default();
        let mut router = ComponentRouter::new();
        router.register("pad", Recorder::new("first", &log)).unwrap();

        let err = router
            .register("pad", Recorder::new("second", &log))
            .unwrap_err();
        assert_eq!(err, RouterError::DuplicateComponent("pad".into()));

        let outcome = router.route("c1", frame("pad", "CLIENT_READY")).await;
        assert_eq!(outcome, RouteOutcome::Delivered);
        assert_eq!(*log.lock().unwrap(), vec!["first:CLIENT_READY:c1"]);
    }

    #[tokio::test]
    async fn frames_reach_only_their_component() {
        let log = Log::default();
        let mut router = ComponentRouter::new();
        router.register("pad", Recorder::new("pad", &log)).unwrap();
        router
            .register("timeslider", Recorder::new("timeslider", &log))
            .unwrap();

        assert_eq!(
            router.route("c1", frame("pad", "USER_CHANGES")).await,
            RouteOutcome::Delivered
        );
        assert_eq!(
            router.route("c1", frame("ghost", "ANYTHING")).await,
            RouteOutcome::Unmatched
        );
        // The connection keeps working after an unmatched frame.
        assert_eq!(
            router.route("c1", frame("timeslider", "CHANGESET_REQ")).await,
            RouteOutcome::Delivered
        );

        assert_eq!(*log.lock().unwrap(), vec![
            "pad:USER_CHANGES:c1",
            "timeslider:CHANGESET_REQ:c1"
        ]);
    }

    #[tokio::test]
    async fn handler_errors_are_contained() {
        let log = Log::default();
        let mut router = ComponentRouter::new();
        router.register("pad", Recorder::new("pad", &log)).unwrap();

        let outcome = router.route("c1", frame("pad", "EXPLODE")).await;
        assert!(matches!(outcome, RouteOutcome::Failed(ref e) if e.contains("EXPLODE")));
        assert_eq!(
            router.route("c1", frame("pad", "CLIENT_READY")).await,
            RouteOutcome::Delivered
        );
    }

    #[tokio::test]
    async fn route_text_drops_malformed_frames() {
        let router = ComponentRouter::new();
        assert!(matches!(
            router.route_text("c1", "not json").await,
            RouteOutcome::Malformed(_)
        ));
        assert!(matches!(
            router
                .route_text("c1", r#"{"component":"","type":"X"}"#)
                .await,
            RouteOutcome::Malformed(_)
        ));
        assert_eq!(
            router
                .route_text("c1", r#"{"component":"ghost","type":"X"}"#)
                .await,
            RouteOutcome::Unmatched
        );
    }

    #[tokio::test]
    async fn lifecycle_fans_out_in_registration_order() {
        let log = Log::default();
        let mut router = ComponentRouter::new();
        router.register("pad", Recorder::new("pad", &log)).unwrap();
        router
            .register("timeslider", Recorder::new("timeslider", &log))
            .unwrap();

        router.connect("c9").await;
        router.disconnect("c9").await;

        assert_eq!(*log.lock().unwrap(), vec![
            "pad:connect:c9",
            "timeslider:connect:c9",
            "pad:disconnect:c9",
            "timeslider:disconnect:c9",
        ]);
        assert_eq!(router.component_names(), vec!["pad", "timeslider"]);
    }

    #[tokio::test]
    async fn replace_swaps_handler_in_place() {
        let log = Log::default();
        let mut router = ComponentRouter::new();
        router.register("pad", Recorder::new("old", &log)).unwrap();
        router.register("chat", Recorder::new("chat", &log)).unwrap();

        assert!(router.replace("pad", Recorder::new("new", &log)).is_some());
        router.route("c1", frame("pad", "PING")).await;

        assert_eq!(*log.lock().unwrap(), vec!["new:PING:c1"]);
        assert_eq!(router.component_names(), vec!["pad", "chat"]);
    }
}
