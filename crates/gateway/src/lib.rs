//! Gateway: HTTP + WebSocket server, realtime component dispatch, startup.
//!
//! Lifecycle (see `bootstrap`):
//! 1. StorageInit: open the configured store
//! 2. PluginLoad: scan the plugin directory into a registry
//! 3. ServerInit: register components, run plugin hooks around route
//!    setup, bind, serve
//!
//! Realtime traffic shares one socket; `router` hands each frame to the
//! component named in its envelope.

pub mod bootstrap;
pub mod export;
pub mod pad;
pub mod pads;
pub mod router;
pub mod routes;
pub mod server;
pub mod state;
pub mod timeslider;
pub mod version;
pub mod ws;

pub use {
    bootstrap::{BootError, BootStage, BootStages},
    router::{ComponentHandler, ComponentRouter, RouteOutcome, RouterError},
    server::{AppState, GatewayStages, build_gateway_app, start_gateway},
};
