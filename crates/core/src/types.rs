//! Records exchanged with the ScanFlow server.
//!
//! The server owns every entity; these types only mirror its JSON. Fields
//! the client never needs are still deserialized so `--json` output can
//! pass them through, and anything optional defaults when absent.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// All timestamps are UTC.
pub type Timestamp = DateTime<Utc>;

// ---------------------------------------------------------------------------
// Server status
// ---------------------------------------------------------------------------

/// Response of `GET /api/v1/status`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerStatus {
    pub status: String,
    pub version: String,
    /// Whether the scanner backend is reachable on the server side.
    pub scanner: bool,
    /// Number of scanner devices the server currently sees.
    pub devices: u32,
    pub active_jobs: u32,
    pub total_jobs: u32,
}

// ---------------------------------------------------------------------------
// Devices, profiles, outputs
// ---------------------------------------------------------------------------

/// A scanner device known to the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Device {
    pub name: String,
    #[serde(default)]
    pub vendor: String,
    #[serde(default)]
    pub model: String,
    #[serde(rename = "type", default)]
    pub kind: String,
}

/// A named scan preset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub profile: ProfileInfo,
    #[serde(default)]
    pub scanner: ProfileScanner,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileInfo {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

/// Scanner settings a profile applies.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileScanner {
    /// Resolution in DPI.
    pub resolution: u32,
    pub mode: String,
    pub source: String,
    pub page_height: f64,
}

impl Profile {
    pub fn name(&self) -> &str {
        &self.profile.name
    }

    /// Label shown in profile pickers: `"<name> - <description>"`.
    pub fn label(&self) -> String {
        format!("{} - {}", self.profile.name, self.profile.description)
    }
}

/// A delivery target configured on the server (paperless, smb, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputTarget {
    pub name: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub available: bool,
}

// ---------------------------------------------------------------------------
// Scan requests
// ---------------------------------------------------------------------------

/// Body of `POST /api/v1/scan`. Unset fields are left for the server to
/// fill from the profile.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScanRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<ScanOptions>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<OutputConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<DocumentMetadata>,
}

/// Per-request overrides of the profile's scanner settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScanOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolution: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_width: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_height: Option<f64>,
}

/// Where the finished document goes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OutputConfig {
    pub target: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
}

impl OutputConfig {
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            filename: None,
        }
    }
}

/// Document metadata forwarded to the output target.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correspondent: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document_type: Option<u32>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<u32>,
}

impl DocumentMetadata {
    /// Returns `true` when no field would be sent.
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.created.is_none()
            && self.correspondent.is_none()
            && self.document_type.is_none()
            && self.tags.is_empty()
    }
}

impl ScanRequest {
    /// Start a request for the given profile.
    pub fn for_profile(profile: impl Into<String>) -> Self {
        Self {
            profile: Some(profile.into()),
            ..Default::default()
        }
    }

    /// Deliver the document to `target`.
    pub fn with_output(mut self, target: impl Into<String>) -> Self {
        self.output = Some(OutputConfig::new(target));
        self
    }

    /// Set the document title. An empty title leaves the metadata untouched.
    pub fn with_title(mut self, title: &str) -> Self {
        let title = title.trim();
        if !title.is_empty() {
            self.metadata.get_or_insert_with(Default::default).title = Some(title.to_string());
        }
        self
    }

    /// Attach metadata unless every field is empty.
    pub fn with_metadata(mut self, metadata: DocumentMetadata) -> Self {
        if !metadata.is_empty() {
            self.metadata = Some(metadata);
        }
        self
    }

    /// Reject requests the server would refuse outright.
    pub fn validate(&self) -> Result<(), CoreError> {
        if matches!(self.profile.as_deref(), Some(p) if p.trim().is_empty()) {
            return Err(CoreError::Validation("profile must not be empty".into()));
        }
        if let Some(output) = &self.output {
            if output.target.trim().is_empty() {
                return Err(CoreError::Validation("output target must not be empty".into()));
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Jobs
// ---------------------------------------------------------------------------

/// A scan job record as returned by the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanJob {
    pub id: String,
    pub status: String,
    #[serde(default)]
    pub profile: String,
    /// Absent or `null` until the first page arrives.
    #[serde(default)]
    pub pages: Option<Vec<Page>>,
    #[serde(default)]
    pub progress: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<Timestamp>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<Timestamp>,
}

/// One scanned page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page {
    pub number: u32,
    #[serde(default)]
    pub width: u32,
    #[serde(default)]
    pub height: u32,
}

/// Length of the abbreviated job id shown in listings.
pub const SHORT_ID_LEN: usize = 8;

impl ScanJob {
    pub fn page_count(&self) -> usize {
        self.pages.as_ref().map_or(0, Vec::len)
    }

    /// Progress as a percentage in `0..=100`.
    pub fn progress_percent(&self) -> u8 {
        clamp_percent(self.progress.unwrap_or(0))
    }

    /// First eight characters of the id.
    pub fn short_id(&self) -> &str {
        short_id(&self.id)
    }

    pub fn is_terminal(&self) -> bool {
        crate::job_status::is_terminal(&self.status)
    }
}

/// Abbreviate a job id to [`SHORT_ID_LEN`] characters.
pub fn short_id(id: &str) -> &str {
    match id.char_indices().nth(SHORT_ID_LEN) {
        Some((idx, _)) => &id[..idx],
        None => id,
    }
}

/// Clamp a raw progress value into `0..=100`.
pub fn clamp_percent(progress: i32) -> u8 {
    progress.clamp(0, 100) as u8
}

// ---------------------------------------------------------------------------
// Push updates
// ---------------------------------------------------------------------------

/// A job update delivered over the `/api/v1/ws` push channel.
///
/// Only `job_id` is guaranteed. The server omits zero values, so an
/// absent `progress` means "unchanged", not zero.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProgressUpdate {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    pub job_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progress: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preview_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn job_without_pages_or_progress() {
        let json = r#"{"id":"0123456789abcdef","status":"pending","profile":"standard"}"#;
        let job: ScanJob = serde_json::from_str(json).unwrap();
        assert_eq!(job.page_count(), 0);
        assert_eq!(job.progress_percent(), 0);
        assert_eq!(job.short_id(), "01234567");
        assert!(!job.is_terminal());
    }

    #[test]
    fn job_with_null_pages() {
        let json = r#"{"id":"abc","status":"completed","profile":"p","pages":null,"progress":100}"#;
        let job: ScanJob = serde_json::from_str(json).unwrap();
        assert_eq!(job.page_count(), 0);
        assert_eq!(job.progress_percent(), 100);
        assert_eq!(job.short_id(), "abc");
        assert!(job.is_terminal());
    }

    #[test]
    fn job_with_pages_and_timestamps() {
        let json = r#"{
            "id":"f47ac10b-58cc-4372-a567-0e02b2c3d479",
            "status":"scanning",
            "profile":"duplex",
            "pages":[{"number":1,"width":2480,"height":3508},{"number":2}],
            "progress":140,
            "output":{"target":"paperless"},
            "created_at":"2026-01-05T10:00:00Z",
            "updated_at":"2026-01-05T10:00:03Z"
        }"#;
        let job: ScanJob = serde_json::from_str(json).unwrap();
        assert_eq!(job.page_count(), 2);
        assert_eq!(job.progress_percent(), 100);
        assert_eq!(job.short_id(), "f47ac10b");
        assert!(job.created_at.is_some());
    }

    #[test]
    fn negative_progress_clamps_to_zero() {
        assert_eq!(clamp_percent(-5), 0);
        assert_eq!(clamp_percent(42), 42);
    }

    #[test]
    fn status_defaults_missing_fields() {
        let status: ServerStatus = serde_json::from_str(r#"{"devices":2}"#).unwrap();
        assert_eq!(status.devices, 2);
        assert!(status.version.is_empty());
        assert!(!status.scanner);
    }

    #[test]
    fn profile_label_and_missing_scanner_section() {
        let json = r#"{"profile":{"name":"standard","description":"300 DPI grey"}}"#;
        let profile: Profile = serde_json::from_str(json).unwrap();
        assert_eq!(profile.name(), "standard");
        assert_eq!(profile.label(), "standard - 300 DPI grey");
        assert_eq!(profile.scanner.resolution, 0);
    }

    #[test]
    fn device_type_field_is_renamed() {
        let json = r#"{"name":"escl:1","vendor":"Brother","model":"ADS-1700W","type":"sheetfed"}"#;
        let device: Device = serde_json::from_str(json).unwrap();
        assert_eq!(device.kind, "sheetfed");
    }

    #[test]
    fn scan_request_omits_unset_fields() {
        let req = ScanRequest::for_profile("standard").with_output("paperless");
        let value = serde_json::to_value(&req).unwrap();
        assert_eq!(
            value,
            serde_json::json!({"profile": "standard", "output": {"target": "paperless"}})
        );
    }

    #[test]
    fn scan_request_title_creates_metadata() {
        let req = ScanRequest::for_profile("standard").with_title("  Invoice 42 ");
        let value = serde_json::to_value(&req).unwrap();
        assert_eq!(value["metadata"], serde_json::json!({"title": "Invoice 42"}));
    }

    #[test]
    fn scan_request_empty_title_is_ignored() {
        let req = ScanRequest::for_profile("standard").with_title("   ");
        assert!(req.metadata.is_none());
    }

    #[test]
    fn scan_request_empty_metadata_is_dropped() {
        let req = ScanRequest::for_profile("standard").with_metadata(DocumentMetadata::default());
        assert!(req.metadata.is_none());
    }

    #[test]
    fn validate_rejects_blank_profile_and_target() {
        assert!(ScanRequest::for_profile(" ").validate().is_err());
        assert!(ScanRequest::for_profile("standard")
            .with_output("")
            .validate()
            .is_err());
        assert!(ScanRequest::for_profile("standard")
            .with_output("smb")
            .validate()
            .is_ok());
        assert!(ScanRequest::default().validate().is_ok());
    }

    #[test]
    fn progress_update_minimal() {
        let update: ProgressUpdate = serde_json::from_str(r#"{"job_id":"abc"}"#).unwrap();
        assert_eq!(update.job_id, "abc");
        assert!(update.status.is_none());
        assert!(update.progress.is_none());
    }

    #[test]
    fn progress_update_full() {
        let json = r#"{"type":"page_scanned","job_id":"abc","status":"scanning","page":3,"progress":60,"message":"page 3","preview_url":"/api/v1/scan/abc/preview"}"#;
        let update: ProgressUpdate = serde_json::from_str(json).unwrap();
        assert_eq!(update.kind.as_deref(), Some("page_scanned"));
        assert_eq!(update.page, Some(3));
        assert_eq!(update.progress, Some(60));
    }
}
