//! Follow a single job until it reaches a terminal status.
//!
//! The push channel is tried first: every update for the job triggers a
//! fresh `GET` of the job record. If the channel is unavailable or drops
//! before the job finishes, the job is polled instead.

use std::time::Duration;

use tokio_util::sync::CancellationToken;

use scanflow_core::types::ScanJob;

use crate::api::{ScanFlowApi, ScanFlowApiError};
use crate::ws::ScanFlowSocket;

/// Default delay between job polls when the push channel is unavailable.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);

#[derive(Debug, thiserror::Error)]
pub enum WaitError {
    #[error(transparent)]
    Api(#[from] ScanFlowApiError),

    #[error("Waiting for job {0} was cancelled")]
    Cancelled(String),
}

/// Wait for `job_id` to complete, fail, or be cancelled.
///
/// `on_update` is called with every job record fetched along the way,
/// including the final one that is also returned.
pub async fn wait_for_job<F>(
    api: &ScanFlowApi,
    socket: Option<&ScanFlowSocket>,
    job_id: &str,
    poll_interval: Duration,
    cancel: &CancellationToken,
    mut on_update: F,
) -> Result<ScanJob, WaitError>
where
    F: FnMut(&ScanJob),
{
    if let Some(socket) = socket {
        if let Some(job) = follow_push(api, socket, job_id, cancel, &mut on_update).await? {
            return Ok(job);
        }
    }

    poll_job(api, job_id, poll_interval, cancel, &mut on_update).await
}

/// Follow the job over the push channel. `Ok(None)` means the channel
/// was unavailable or closed early and the caller should poll.
async fn follow_push<F>(
    api: &ScanFlowApi,
    socket: &ScanFlowSocket,
    job_id: &str,
    cancel: &CancellationToken,
    on_update: &mut F,
) -> Result<Option<ScanJob>, WaitError>
where
    F: FnMut(&ScanJob),
{
    let connected = tokio::select! {
        biased;
        _ = cancel.cancelled() => return Err(WaitError::Cancelled(job_id.to_string())),
        result = socket.connect() => result,
    };
    let mut stream = match connected {
        Ok(stream) => stream,
        Err(e) => {
            tracing::debug!(error = %e, "Push channel unavailable, polling instead");
            return Ok(None);
        }
    };

    // The job may have finished before the socket was open.
    let job = tokio::select! {
        biased;
        _ = cancel.cancelled() => {
            stream.close().await;
            return Err(WaitError::Cancelled(job_id.to_string()));
        }
        job = api.get_job(job_id) => job?,
    };
    on_update(&job);
    if job.is_terminal() {
        stream.close().await;
        return Ok(Some(job));
    }

    loop {
        let next = tokio::select! {
            _ = cancel.cancelled() => {
                stream.close().await;
                return Err(WaitError::Cancelled(job_id.to_string()));
            }
            update = stream.next_update() => update,
        };

        let Some(update) = next else {
            tracing::info!(job_id, "Push channel closed, falling back to polling");
            return Ok(None);
        };
        if update.job_id != job_id {
            continue;
        }

        let refreshed = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                stream.close().await;
                return Err(WaitError::Cancelled(job_id.to_string()));
            }
            job = api.get_job(job_id) => job,
        };
        match refreshed {
            Ok(job) => {
                on_update(&job);
                if job.is_terminal() {
                    stream.close().await;
                    return Ok(Some(job));
                }
            }
            Err(e) => {
                tracing::debug!(job_id, error = %e, "Failed to refresh job after update");
            }
        }
    }
}

async fn poll_job<F>(
    api: &ScanFlowApi,
    job_id: &str,
    poll_interval: Duration,
    cancel: &CancellationToken,
    on_update: &mut F,
) -> Result<ScanJob, WaitError>
where
    F: FnMut(&ScanJob),
{
    loop {
        let job = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(WaitError::Cancelled(job_id.to_string())),
            job = api.get_job(job_id) => job?,
        };
        on_update(&job);
        if job.is_terminal() {
            return Ok(job);
        }

        tokio::select! {
            _ = cancel.cancelled() => return Err(WaitError::Cancelled(job_id.to_string())),
            _ = tokio::time::sleep(poll_interval) => {}
        }
    }
}
