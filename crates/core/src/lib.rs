//! Shared types for the ScanFlow client.
//!
//! Wire records exchanged with the ScanFlow server, job status names,
//! and small formatting helpers used by every front end.

pub mod error;
pub mod format;
pub mod job_status;
pub mod types;
