//! Development server with live reload.
//!
//! Serves the compiled site from `temp`, falling back to `dist` and
//! `public`, injects a small reload client into HTML responses, and
//! pushes change events to connected browsers over a WebSocket.

mod http;
pub mod state;
mod websocket;

pub use http::{create_router, serve};
pub use state::{ReloadEvent, ServerState};
