//! Reconnection logic for the ScanFlow push channel.
//!
//! The push channel is kept open for as long as the caller wants
//! updates. When it drops, [`reconnect_loop`] waits and retries until a
//! connection succeeds or the [`CancellationToken`] is triggered.
//! [`follow_updates`] combines both into a session that never ends on
//! its own.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use scanflow_core::types::ProgressUpdate;

use crate::ws::{ProgressStream, ScanFlowSocket};

/// Delay between reconnection attempts when nothing else is configured.
pub const DEFAULT_RECONNECT_DELAY: Duration = Duration::from_secs(5);

/// How long to wait between reconnection attempts.
#[derive(Debug, Clone)]
pub struct ReconnectConfig {
    pub delay: Duration,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self::fixed(DEFAULT_RECONNECT_DELAY)
    }
}

impl ReconnectConfig {
    /// Retry every `delay`, forever.
    pub fn fixed(delay: Duration) -> Self {
        Self { delay }
    }
}

/// Reconnect to the push channel, waiting before every attempt.
///
/// Returns `Some(stream)` once a connection succeeds, or `None` if the
/// `cancel` token is triggered first.
pub async fn reconnect_loop(
    socket: &ScanFlowSocket,
    config: &ReconnectConfig,
    cancel: &CancellationToken,
) -> Option<ProgressStream> {
    let delay = config.delay;
    let mut attempt = 0u32;

    loop {
        tokio::select! {
            _ = cancel.cancelled() => return None,
            _ = tokio::time::sleep(delay) => {}
        }

        attempt += 1;
        tracing::debug!(
            attempt,
            delay_ms = delay.as_millis() as u64,
            "Reconnecting push channel",
        );

        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::debug!("Reconnect cancelled");
                return None;
            }
            result = socket.connect() => {
                match result {
                    Ok(stream) => {
                        tracing::info!(attempt, "Push channel reconnected");
                        return Some(stream);
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "Reconnect attempt {attempt} failed");
                    }
                }
            }
        }
    }
}

/// Connection state changes and payloads produced by [`follow_updates`].
#[derive(Debug, Clone, PartialEq)]
pub enum SocketEvent {
    Connected,
    Disconnected,
    Update(ProgressUpdate),
}

enum SessionEnd {
    Closed,
    Stopped,
}

/// Keep the push channel open and forward everything to `tx`.
///
/// Connect, forward updates until the socket drops, report the drop,
/// wait, reconnect, repeat. Returns when `cancel` is triggered or the
/// receiving side of `tx` is gone.
pub async fn follow_updates(
    socket: &ScanFlowSocket,
    config: &ReconnectConfig,
    cancel: &CancellationToken,
    tx: &mpsc::Sender<SocketEvent>,
) {
    let first = tokio::select! {
        _ = cancel.cancelled() => return,
        result = socket.connect() => result,
    };

    let mut stream = match first {
        Ok(stream) => stream,
        Err(e) => {
            tracing::warn!(error = %e, "Push channel unavailable, retrying");
            match reconnect_loop(socket, config, cancel).await {
                Some(stream) => stream,
                None => return,
            }
        }
    };

    loop {
        if tx.send(SocketEvent::Connected).await.is_err() {
            stream.close().await;
            return;
        }

        match forward_session(&mut stream, cancel, tx).await {
            SessionEnd::Stopped => {
                stream.close().await;
                return;
            }
            SessionEnd::Closed => {}
        }

        if tx.send(SocketEvent::Disconnected).await.is_err() {
            return;
        }
        tracing::info!("Push channel lost, reconnecting");

        stream = match reconnect_loop(socket, config, cancel).await {
            Some(stream) => stream,
            None => return,
        };
    }
}

/// Pump updates from one connection into `tx`.
async fn forward_session(
    stream: &mut ProgressStream,
    cancel: &CancellationToken,
    tx: &mpsc::Sender<SocketEvent>,
) -> SessionEnd {
    loop {
        let next = tokio::select! {
            _ = cancel.cancelled() => return SessionEnd::Stopped,
            update = stream.next_update() => update,
        };

        match next {
            Some(update) => {
                if tx.send(SocketEvent::Update(update)).await.is_err() {
                    return SessionEnd::Stopped;
                }
            }
            None => return SessionEnd::Closed,
        }
    }
}
