//! Integration tests for the REST client against an in-process mock
//! ScanFlow server.

mod common;

use assert_matches::assert_matches;
use serde_json::json;

use common::{MockBackend, MockState};
use scanflow_client::api::{ScanFlowApi, ScanFlowApiError};
use scanflow_core::types::{DocumentMetadata, OutputConfig, ScanRequest};

// ---------------------------------------------------------------------------
// Test: status and list endpoints
// ---------------------------------------------------------------------------

#[tokio::test]
async fn status_reports_device_count() {
    let backend = MockBackend::start(MockState::default()).await;

    let status = backend.api().status().await.unwrap();

    assert_eq!(status.devices, 2);
    assert_eq!(status.total_jobs, 7);
    assert!(status.scanner);
}

#[tokio::test]
async fn health_returns_version() {
    let backend = MockBackend::start(MockState::default()).await;

    let health = backend.api().health().await.unwrap();

    assert_eq!(health.status, "ok");
    assert_eq!(health.version, "0.1.0");
}

#[tokio::test]
async fn list_devices_unwraps_envelope() {
    let backend = MockBackend::start(MockState::default()).await;

    let devices = backend.api().list_devices().await.unwrap();

    assert_eq!(devices.len(), 2);
    assert_eq!(devices[0].vendor, "Brother");
    assert_eq!(devices[0].model, "ADS-1700W");
    assert_eq!(devices[1].name, "fujitsu:fi-7160:1");
}

#[tokio::test]
async fn list_profiles_tolerates_missing_scanner_section() {
    let backend = MockBackend::start(MockState::default()).await;

    let profiles = backend.api().list_profiles().await.unwrap();

    assert_eq!(profiles.len(), 2);
    assert_eq!(profiles[0].label(), "standard - 300 DPI grey duplex");
    assert_eq!(profiles[0].scanner.resolution, 300);
    assert_eq!(profiles[1].name(), "photo");
    assert_eq!(profiles[1].scanner.resolution, 0);
}

#[tokio::test]
async fn list_outputs_returns_targets() {
    let backend = MockBackend::start(MockState::default()).await;

    let outputs = backend.api().list_outputs().await.unwrap();

    assert_eq!(outputs.len(), 2);
    assert!(outputs[0].available);
    assert!(!outputs[1].enabled);
}

// ---------------------------------------------------------------------------
// Test: error mapping
// ---------------------------------------------------------------------------

#[tokio::test]
async fn unknown_profile_maps_server_message() {
    let backend = MockBackend::start(MockState::default()).await;

    let err = backend.api().get_profile("nope").await.unwrap_err();

    assert_matches!(
        err,
        ScanFlowApiError::ApiError { status: 404, ref message } if message == "profile not found"
    );
    assert_eq!(err.to_string(), "Server error (404): profile not found");
}

#[tokio::test]
async fn non_json_success_body_is_a_decode_error() {
    let backend = MockBackend::start(MockState {
        garbage_status: true,
        ..Default::default()
    })
    .await;

    let err = backend.api().status().await.unwrap_err();

    assert_matches!(err, ScanFlowApiError::Decode(_));
}

#[tokio::test]
async fn unreachable_server_is_a_request_error() {
    let api = ScanFlowApi::new("http://127.0.0.1:9", None).unwrap();

    let err = api.status().await.unwrap_err();

    assert_matches!(err, ScanFlowApiError::Request(_));
}

#[tokio::test]
async fn rejected_scan_surfaces_server_message() {
    let backend = MockBackend::start(MockState::default()).await;

    let err = backend
        .api()
        .start_scan(&ScanRequest::for_profile("broken"))
        .await
        .unwrap_err();

    assert_eq!(err.status(), Some(400));
    assert_matches!(err, ScanFlowApiError::ApiError { ref message, .. } if message == "unknown profile: broken");
}

// ---------------------------------------------------------------------------
// Test: authentication headers
// ---------------------------------------------------------------------------

#[tokio::test]
async fn bearer_token_and_request_id_are_sent() {
    let backend = MockBackend::start(MockState::default().with_api_key("k3y-for-tests")).await;

    backend.api().list_devices().await.unwrap();

    let recorded = backend.state.recorded();
    assert_eq!(recorded.len(), 1);
    assert_eq!(recorded[0].authorization.as_deref(), Some("Bearer k3y-for-tests"));
    assert!(recorded[0].request_id.as_deref().is_some_and(|id| id.len() == 36));
}

#[tokio::test]
async fn missing_key_is_unauthorized() {
    let backend = MockBackend::start(MockState::default().with_api_key("k3y-for-tests")).await;
    let api = ScanFlowApi::new(&backend.base_url(), None).unwrap();

    let err = api.status().await.unwrap_err();

    assert_matches!(err, ScanFlowApiError::ApiError { status: 401, ref message } if message == "unauthorized");
    assert!(backend.state.recorded()[0].authorization.is_none());
}

// ---------------------------------------------------------------------------
// Test: scan job lifecycle calls
// ---------------------------------------------------------------------------

#[tokio::test]
async fn start_scan_posts_profile_output_and_title() {
    let backend = MockBackend::start(MockState::default()).await;
    let request = ScanRequest::for_profile("standard")
        .with_output("paperless")
        .with_title("Invoice 2026-001");

    let job = backend.api().start_scan(&request).await.unwrap();

    assert_eq!(job.status, "pending");
    assert_eq!(job.profile, "standard");
    assert_eq!(job.short_id(), "f47ac10b");
    assert_eq!(job.page_count(), 0);

    let bodies = backend.state.scan_bodies.lock().unwrap().clone();
    assert_eq!(
        bodies,
        vec![json!({
            "profile": "standard",
            "output": {"target": "paperless"},
            "metadata": {"title": "Invoice 2026-001"}
        })]
    );
}

#[tokio::test]
async fn job_management_calls_hit_expected_paths() {
    let backend = MockBackend::start(MockState::default().with_job_statuses(&["scanning"])).await;
    let api = backend.api();
    let id = "job-1";

    let job = api.get_job(id).await.unwrap();
    assert_eq!(job.status, "scanning");
    assert_eq!(job.page_count(), 1);

    api.continue_scan(id).await.unwrap();
    api.delete_page(id, 2).await.unwrap();
    api.cancel_job(id).await.unwrap();

    assert_eq!(
        backend.state.paths(),
        vec![
            "GET /api/v1/scan/job-1",
            "POST /api/v1/scan/job-1/continue",
            "DELETE /api/v1/scan/job-1/pages/2",
            "DELETE /api/v1/scan/job-1",
        ]
    );
}

#[tokio::test]
async fn finish_scan_sends_output_and_metadata() {
    let backend = MockBackend::start(MockState::default()).await;
    let output = OutputConfig::new("smb");
    let metadata = DocumentMetadata {
        title: Some("Contract".into()),
        tags: vec![3, 7],
        ..Default::default()
    };

    backend
        .api()
        .finish_scan("job-9", Some(&output), Some(&metadata))
        .await
        .unwrap();
    backend.api().finish_scan("job-9", None, None).await.unwrap();

    let bodies = backend.state.finish_bodies.lock().unwrap().clone();
    assert_eq!(
        bodies,
        vec![
            json!({"output": {"target": "smb"}, "metadata": {"title": "Contract", "tags": [3, 7]}}),
            json!({}),
        ]
    );
}

#[tokio::test]
async fn missing_job_is_not_found() {
    let backend = MockBackend::start(MockState::default()).await;

    let err = backend.api().get_job("missing").await.unwrap_err();

    assert_eq!(err.status(), Some(404));
}
