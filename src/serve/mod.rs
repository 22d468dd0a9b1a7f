// src/serve/mod.rs

//! The dev server bridge: a local proxy in front of the already-running
//! theme server, plus a WebSocket channel that pushes style injections and
//! full reloads into connected browsers.

pub mod bridge;

pub use bridge::{BridgeMessage, DevServerBridge};
