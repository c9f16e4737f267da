//! ScanFlow REST and WebSocket client library.
//!
//! Provides a typed wrapper over the server's HTTP API, the push channel
//! that streams job progress, fixed-delay reconnection for that channel,
//! and a helper that follows a single job until it finishes.

pub mod api;
pub mod reconnect;
pub mod watch;
pub mod ws;
