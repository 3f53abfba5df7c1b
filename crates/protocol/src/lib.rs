//! Realtime wire protocol shared by the gateway and its component handlers.
//!
//! Every frame on the shared socket is a JSON envelope
//! `{ "component": ..., "type": ..., "payload": ... }`. The component name
//! selects the subsystem; the rest is opaque to the router.

pub mod frames;
pub mod pad;

pub use {
    frames::{ComponentMessage, FrameError, InboundFrame, OutboundFrame},
    pad::is_valid_pad_name,
};

pub const PROTOCOL_VERSION: u32 = 1;

/// Product name used in the `Server` response header.
pub const SERVER_PRODUCT: &str = "Scribe";

/// Path of the WebSocket upgrade endpoint.
pub const SOCKET_PATH: &str = "/socket";

/// Built-in component names.
pub mod components {
    pub const PAD: &str = "pad";
    pub const TIMESLIDER: &str = "timeslider";
}

/// Message types exchanged with the `pad` and `timeslider` components.
pub mod message_types {
    pub const CLIENT_READY: &str = "CLIENT_READY";
    pub const CLIENT_VARS: &str = "CLIENT_VARS";
    pub const USER_CHANGES: &str = "USER_CHANGES";
    pub const ACCEPT_COMMIT: &str = "ACCEPT_COMMIT";
    pub const NEW_CHANGES: &str = "NEW_CHANGES";
    pub const USER_NEWINFO: &str = "USER_NEWINFO";
    pub const USER_LEAVE: &str = "USER_LEAVE";
    pub const CHANGESET_REQ: &str = "CHANGESET_REQ";
}
