//! Well-known job status names.
//!
//! These must match the status strings the ScanFlow server writes into
//! job records and push updates.

/// The job is queued and waiting for the scanner.
pub const JOB_PENDING: &str = "pending";

/// Pages are being acquired from the device.
pub const JOB_SCANNING: &str = "scanning";

/// Pages are being post-processed (OCR, PDF assembly, delivery).
pub const JOB_PROCESSING: &str = "processing";

/// The document was produced and delivered.
pub const JOB_COMPLETED: &str = "completed";

/// The job failed; the record carries an `error` message.
pub const JOB_FAILED: &str = "failed";

/// The job was cancelled by a client.
pub const JOB_CANCELLED: &str = "cancelled";

/// Returns `true` once a job can no longer change state.
pub fn is_terminal(status: &str) -> bool {
    matches!(status, JOB_COMPLETED | JOB_FAILED | JOB_CANCELLED)
}

/// Returns `true` while the server is actively working on the job.
pub fn is_active(status: &str) -> bool {
    matches!(status, JOB_SCANNING | JOB_PROCESSING)
}
