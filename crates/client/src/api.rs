//! REST API client for the ScanFlow HTTP endpoints.
//!
//! Wraps status, device, profile, output and scan-job endpoints under
//! `/api/v1` using [`reqwest`].

use std::time::Duration;

use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use url::Url;

use scanflow_core::types::{
    Device, DocumentMetadata, OutputConfig, OutputTarget, Profile, ScanJob, ScanRequest,
    ServerStatus,
};

/// Overall timeout for a single HTTP request.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Header carrying a per-request correlation id.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// HTTP client for a single ScanFlow server.
#[derive(Clone)]
pub struct ScanFlowApi {
    client: reqwest::Client,
    base_url: Url,
    api_key: Option<String>,
}

/// Response of `GET /api/v1/health`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Health {
    pub status: String,
    pub version: String,
}

#[derive(Deserialize)]
struct DeviceList {
    #[serde(default)]
    devices: Vec<Device>,
}

#[derive(Deserialize)]
struct ProfileList {
    #[serde(default)]
    profiles: Vec<Profile>,
}

#[derive(Deserialize)]
struct OutputList {
    #[serde(default)]
    outputs: Vec<OutputTarget>,
}

#[derive(Serialize)]
struct FinishRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    output: Option<&'a OutputConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    metadata: Option<&'a DocumentMetadata>,
}

/// Errors from the ScanFlow REST API layer.
#[derive(Debug, thiserror::Error)]
pub enum ScanFlowApiError {
    /// The base URL could not be used to build endpoint URLs.
    #[error("Invalid server URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    /// The HTTP request itself failed (network, DNS, TLS, timeout).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The server answered with a non-2xx status code.
    #[error("Server error ({status}): {message}")]
    ApiError { status: u16, message: String },

    /// A success response carried a body of the wrong shape.
    #[error("Failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),
}

impl ScanFlowApiError {
    /// HTTP status of an [`ApiError`](Self::ApiError), if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::ApiError { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl ScanFlowApi {
    /// Create a new API client.
    ///
    /// * `base_url` - server origin, e.g. `http://scanner.local:8080`.
    /// * `api_key`  - sent as a bearer token when present.
    pub fn new(base_url: &str, api_key: Option<String>) -> Result<Self, ScanFlowApiError> {
        let client = reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Self::with_client(client, base_url, api_key)
    }

    /// Create an API client reusing an existing [`reqwest::Client`].
    pub fn with_client(
        client: reqwest::Client,
        base_url: &str,
        api_key: Option<String>,
    ) -> Result<Self, ScanFlowApiError> {
        let base_url = parse_base_url(base_url)?;
        Ok(Self {
            client,
            base_url,
            api_key: api_key.filter(|k| !k.is_empty()),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref()
    }

    /// `GET /api/v1/health`.
    pub async fn health(&self) -> Result<Health, ScanFlowApiError> {
        self.get_json(&["health"]).await
    }

    /// `GET /api/v1/status`.
    pub async fn status(&self) -> Result<ServerStatus, ScanFlowApiError> {
        self.get_json(&["status"]).await
    }

    /// `GET /api/v1/scanner/devices`.
    pub async fn list_devices(&self) -> Result<Vec<Device>, ScanFlowApiError> {
        let list: DeviceList = self.get_json(&["scanner", "devices"]).await?;
        Ok(list.devices)
    }

    /// `GET /api/v1/profiles`.
    pub async fn list_profiles(&self) -> Result<Vec<Profile>, ScanFlowApiError> {
        let list: ProfileList = self.get_json(&["profiles"]).await?;
        Ok(list.profiles)
    }

    /// `GET /api/v1/profiles/{name}`.
    pub async fn get_profile(&self, name: &str) -> Result<Profile, ScanFlowApiError> {
        self.get_json(&["profiles", name]).await
    }

    /// `GET /api/v1/outputs`.
    pub async fn list_outputs(&self) -> Result<Vec<OutputTarget>, ScanFlowApiError> {
        let list: OutputList = self.get_json(&["outputs"]).await?;
        Ok(list.outputs)
    }

    /// Submit a new scan job.
    ///
    /// Sends `POST /api/v1/scan` and returns the freshly created job
    /// record, usually still `pending`.
    pub async fn start_scan(&self, request: &ScanRequest) -> Result<ScanJob, ScanFlowApiError> {
        let response = self
            .request(Method::POST, &["scan"])
            .json(request)
            .send()
            .await?;

        let job: ScanJob = Self::parse_response(response).await?;
        tracing::info!(job_id = %job.id, profile = %job.profile, "Scan job created");
        Ok(job)
    }

    /// `GET /api/v1/scan/{id}`.
    pub async fn get_job(&self, job_id: &str) -> Result<ScanJob, ScanFlowApiError> {
        self.get_json(&["scan", job_id]).await
    }

    /// Cancel a queued or running job (`DELETE /api/v1/scan/{id}`).
    pub async fn cancel_job(&self, job_id: &str) -> Result<(), ScanFlowApiError> {
        let response = self.request(Method::DELETE, &["scan", job_id]).send().await?;
        Self::check_status(response).await
    }

    /// Ask the server to scan another batch of pages into the same job.
    pub async fn continue_scan(&self, job_id: &str) -> Result<(), ScanFlowApiError> {
        let response = self
            .request(Method::POST, &["scan", job_id, "continue"])
            .send()
            .await?;
        Self::check_status(response).await
    }

    /// Finalize a multi-batch job and deliver the document.
    pub async fn finish_scan(
        &self,
        job_id: &str,
        output: Option<&OutputConfig>,
        metadata: Option<&DocumentMetadata>,
    ) -> Result<(), ScanFlowApiError> {
        let body = FinishRequest { output, metadata };
        let response = self
            .request(Method::POST, &["scan", job_id, "finish"])
            .json(&body)
            .send()
            .await?;
        Self::check_status(response).await
    }

    /// Remove a page (1-indexed) from an unfinished job.
    pub async fn delete_page(&self, job_id: &str, page: u32) -> Result<(), ScanFlowApiError> {
        let page = page.to_string();
        let response = self
            .request(Method::DELETE, &["scan", job_id, "pages", &page])
            .send()
            .await?;
        Self::check_status(response).await
    }

    // ---- private helpers ----

    /// Build `<base>/api/v1/<segments...>`, percent-encoding each segment.
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(["api", "v1"]).extend(segments);
        }
        url
    }

    fn request(&self, method: Method, segments: &[&str]) -> reqwest::RequestBuilder {
        let request_id = uuid::Uuid::new_v4().to_string();
        tracing::debug!(%method, path = %self.endpoint(segments).path(), %request_id, "API request");

        let builder = self
            .client
            .request(method, self.endpoint(segments))
            .header(REQUEST_ID_HEADER, request_id);
        match &self.api_key {
            Some(key) => builder.bearer_auth(key),
            None => builder,
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, segments: &[&str]) -> Result<T, ScanFlowApiError> {
        let response = self.request(Method::GET, segments).send().await?;
        Self::parse_response(response).await
    }

    /// Ensure the response has a success status code. On failure the
    /// server's `{"error": "..."}` message is extracted when present.
    async fn ensure_success(
        response: reqwest::Response,
    ) -> Result<reqwest::Response, ScanFlowApiError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ScanFlowApiError::ApiError {
                status: status.as_u16(),
                message: error_message(status, &body),
            });
        }
        Ok(response)
    }

    async fn parse_response<T: DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, ScanFlowApiError> {
        let response = Self::ensure_success(response).await?;
        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }

    async fn check_status(response: reqwest::Response) -> Result<(), ScanFlowApiError> {
        Self::ensure_success(response).await?;
        Ok(())
    }
}

/// Validate a server origin. Only `http` and `https` are accepted.
pub fn parse_base_url(raw: &str) -> Result<Url, ScanFlowApiError> {
    let invalid = |reason: &str| ScanFlowApiError::InvalidUrl {
        url: raw.to_string(),
        reason: reason.to_string(),
    };

    let url = Url::parse(raw.trim()).map_err(|e| invalid(&e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid("scheme must be http or https"));
    }
    if url.cannot_be_a_base() {
        return Err(invalid("URL cannot be used as a base"));
    }
    Ok(url)
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error: String,
}

/// Human-readable message for a failed response: the JSON `error` field
/// when present, otherwise the status reason phrase.
pub fn error_message(status: StatusCode, body: &str) -> String {
    match serde_json::from_str::<ErrorBody>(body) {
        Ok(parsed) if !parsed.error.is_empty() => parsed.error,
        _ => status
            .canonical_reason()
            .map(str::to_string)
            .unwrap_or_else(|| status.as_u16().to_string()),
    }
}
