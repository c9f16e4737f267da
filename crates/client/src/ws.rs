//! WebSocket client for the ScanFlow push channel.
//!
//! [`ScanFlowSocket`] holds the `/api/v1/ws` URL for one server. Call
//! [`ScanFlowSocket::connect`] to open a live [`ProgressStream`], then
//! pull [`ProgressUpdate`]s from it until the server closes the socket.

use futures::StreamExt;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use url::Url;

use scanflow_core::types::ProgressUpdate;

use crate::api::ScanFlowApi;

/// Path of the push channel relative to the server origin.
pub const WS_PATH: &str = "/api/v1/ws";

type WsStream = WebSocketStream<MaybeTlsStream<tokio::net::TcpStream>>;

/// Connection settings for the push channel of one server.
#[derive(Debug, Clone)]
pub struct ScanFlowSocket {
    url: Url,
}

/// A live push-channel connection.
pub struct ProgressStream {
    ws_stream: WsStream,
}

/// Errors that can occur when working with the push channel.
#[derive(Debug, thiserror::Error)]
pub enum ScanFlowSocketError {
    /// The server origin could not be turned into a WebSocket URL.
    #[error("Invalid WebSocket URL: {0}")]
    InvalidUrl(String),

    /// Failed to establish the WebSocket connection.
    #[error("Connection error: {0}")]
    Connection(String),
}

impl ScanFlowSocket {
    /// Derive the push-channel URL from an HTTP server origin.
    pub fn new(base_url: &Url, api_key: Option<&str>) -> Result<Self, ScanFlowSocketError> {
        Ok(Self {
            url: ws_url(base_url, api_key)?,
        })
    }

    /// Push channel of the server an API client talks to.
    pub fn for_api(api: &ScanFlowApi) -> Result<Self, ScanFlowSocketError> {
        Self::new(api.base_url(), api.api_key())
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    /// The URL without its query string, safe to log.
    pub fn display_url(&self) -> String {
        let mut url = self.url.clone();
        url.set_query(None);
        url.to_string()
    }

    /// Open the push channel.
    pub async fn connect(&self) -> Result<ProgressStream, ScanFlowSocketError> {
        let (ws_stream, _response) = connect_async(self.url.as_str()).await.map_err(|e| {
            ScanFlowSocketError::Connection(format!(
                "Failed to connect to {}: {e}",
                self.display_url()
            ))
        })?;

        tracing::info!(url = %self.display_url(), "Push channel connected");
        Ok(ProgressStream { ws_stream })
    }
}

impl ProgressStream {
    /// Wait for the next job update.
    ///
    /// Text frames that are not valid updates are logged and skipped.
    /// Returns `None` once the socket closes, the stream ends, or a
    /// receive error occurs.
    pub async fn next_update(&mut self) -> Option<ProgressUpdate> {
        while let Some(msg_result) = self.ws_stream.next().await {
            match msg_result {
                Ok(Message::Text(text)) => match parse_update(&text) {
                    Ok(update) => {
                        tracing::debug!(job_id = %update.job_id, "Received job update");
                        return Some(update);
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, raw_message = %text, "Failed to parse job update");
                    }
                },
                Ok(Message::Binary(_)) => {
                    tracing::trace!("Ignoring binary frame");
                }
                Ok(Message::Ping(_) | Message::Pong(_)) => {
                    // Handled automatically by tungstenite.
                }
                Ok(Message::Close(frame)) => {
                    tracing::info!(?frame, "Push channel closed by server");
                    return None;
                }
                Ok(Message::Frame(_)) => {}
                Err(e) => {
                    tracing::warn!(error = %e, "Push channel receive error");
                    return None;
                }
            }
        }
        None
    }

    /// Send a close frame and drop the connection.
    pub async fn close(mut self) {
        if let Err(e) = self.ws_stream.close(None).await {
            tracing::debug!(error = %e, "Error while closing push channel");
        }
    }
}

/// Parse a push-channel text frame.
pub fn parse_update(text: &str) -> Result<ProgressUpdate, serde_json::Error> {
    serde_json::from_str(text)
}

/// Map an HTTP origin to its push-channel URL.
///
/// `http` becomes `ws`, `https` becomes `wss`, the path becomes
/// [`WS_PATH`] under any base path, and the API key travels as the
/// `api_key` query parameter.
pub fn ws_url(base_url: &Url, api_key: Option<&str>) -> Result<Url, ScanFlowSocketError> {
    let scheme = match base_url.scheme() {
        "http" | "ws" => "ws",
        "https" | "wss" => "wss",
        other => {
            return Err(ScanFlowSocketError::InvalidUrl(format!(
                "unsupported scheme '{other}'"
            )))
        }
    };

    let mut url = base_url.clone();
    url.set_scheme(scheme)
        .map_err(|()| ScanFlowSocketError::InvalidUrl(base_url.to_string()))?;
    url.set_query(None);
    url.set_fragment(None);

    let base_path = url.path().trim_end_matches('/').to_string();
    url.set_path(&format!("{base_path}{WS_PATH}"));

    if let Some(key) = api_key.filter(|k| !k.is_empty()) {
        url.query_pairs_mut().append_pair("api_key", key);
    }
    Ok(url)
}
