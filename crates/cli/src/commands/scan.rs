//! `scanflow scan`: submit a job and follow it to the end.
//!
//! Interactive mode scans in batches: after each batch the user can scan
//! more pages into the same job, drop the last page, finish the document
//! or cancel the job.

use std::io::{BufRead, Write};
use std::time::Duration;

use anyhow::{bail, Context as _};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use scanflow_client::api::ScanFlowApi;
use scanflow_client::watch::{wait_for_job, DEFAULT_POLL_INTERVAL};
use scanflow_client::ws::ScanFlowSocket;
use scanflow_core::error::CoreError;
use scanflow_core::job_status::{JOB_CANCELLED, JOB_COMPLETED, JOB_FAILED};
use scanflow_core::types::{DocumentMetadata, ScanJob, ScanRequest};

use crate::args::ScanArgs;
use crate::commands::{print_json, Context};
use crate::config::DefaultsSection;

/// Time the scanner needs before a batch shows up on the job.
const BATCH_SETTLE_DELAY: Duration = Duration::from_secs(2);

const SPINNER: [&str; 4] = ["|", "/", "-", "\\"];

/// Build the request from flags, falling back to the configured defaults.
pub fn build_request(
    args: &ScanArgs,
    defaults: &DefaultsSection,
) -> Result<ScanRequest, CoreError> {
    let profile = args.profile.as_deref().unwrap_or(&defaults.profile);
    let output = args.output.as_deref().unwrap_or(&defaults.output);

    let mut request = ScanRequest::for_profile(profile);
    if !output.is_empty() {
        request = request.with_output(output);
    }
    if let Some(filename) = args.filename.as_deref().filter(|f| !f.is_empty()) {
        let target = request.output.get_or_insert_with(Default::default);
        target.filename = Some(filename.to_string());
    }

    let metadata = DocumentMetadata {
        title: args
            .title
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string),
        correspondent: args.correspondent.filter(|id| *id > 0),
        document_type: args.document_type.filter(|id| *id > 0),
        tags: args.tags.clone(),
        ..Default::default()
    };
    request = request.with_metadata(metadata);

    request.validate()?;
    Ok(request)
}

pub async fn run(ctx: &Context, args: &ScanArgs) -> anyhow::Result<()> {
    let api = ctx.api()?;
    let request = build_request(args, &ctx.config.defaults)?;

    if args.interactive || ctx.config.defaults.interactive {
        return run_interactive(ctx, &api, request).await;
    }

    let profile = request.profile.as_deref().unwrap_or_default();
    if !args.json {
        println!("Starting scan (profile: {profile})...");
    }
    let job = api
        .start_scan(&request)
        .await
        .context("Failed to start scan")?;
    tracing::debug!(job_id = %job.id, "Scan accepted");

    if args.no_wait {
        if args.json {
            return print_json(&job);
        }
        println!("Job ID: {}", job.id);
        return Ok(());
    }

    if !args.json {
        println!("Job ID: {}", job.id);
    }
    let socket = ctx.socket(&api);
    let quiet = args.json;
    let job = wait_quietly(&api, socket.as_ref(), &job.id, &ctx.cancel, quiet).await?;

    if args.json {
        print_json(&job)?;
        return ensure_not_failed(&job);
    }
    report_final(&job)
}

/// Wait for the job, drawing a one-line status spinner.
pub async fn wait_with_progress(
    api: &ScanFlowApi,
    socket: Option<&ScanFlowSocket>,
    job_id: &str,
    poll_interval: Duration,
    cancel: &CancellationToken,
) -> anyhow::Result<ScanJob> {
    let mut line = ProgressLine::default();
    let result = wait_for_job(api, socket, job_id, poll_interval, cancel, |job| line.show(job)).await;
    line.finish();
    Ok(result?)
}

async fn wait_quietly(
    api: &ScanFlowApi,
    socket: Option<&ScanFlowSocket>,
    job_id: &str,
    cancel: &CancellationToken,
    quiet: bool,
) -> anyhow::Result<ScanJob> {
    if quiet {
        return Ok(wait_for_job(api, socket, job_id, DEFAULT_POLL_INTERVAL, cancel, |_| {}).await?);
    }
    wait_with_progress(api, socket, job_id, DEFAULT_POLL_INTERVAL, cancel).await
}

/// Error out when the job failed.
pub fn ensure_not_failed(job: &ScanJob) -> anyhow::Result<()> {
    if job.status == JOB_FAILED {
        bail!(
            "Scan failed: {}",
            job.error.as_deref().unwrap_or("unknown error")
        );
    }
    Ok(())
}

/// Print the outcome of a finished job.
pub fn report_final(job: &ScanJob) -> anyhow::Result<()> {
    ensure_not_failed(job)?;
    match job.status.as_str() {
        JOB_COMPLETED => println!("Scan completed successfully ({} pages)", job.page_count()),
        JOB_CANCELLED => println!("Scan was cancelled"),
        other => println!("Job {} ended as {other}", job.short_id()),
    }
    Ok(())
}

#[derive(Default)]
struct ProgressLine {
    last_status: Option<String>,
    frame: usize,
}

impl ProgressLine {
    fn show(&mut self, job: &ScanJob) {
        if self.last_status.as_deref() != Some(job.status.as_str()) {
            if self.last_status.is_some() {
                println!();
            }
            self.last_status = Some(job.status.clone());
        }
        self.frame = (self.frame + 1) % SPINNER.len();
        print!(
            "\r  {} {} [{} pages]",
            SPINNER[self.frame],
            job.status,
            job.page_count()
        );
        let _ = std::io::stdout().flush();
    }

    fn finish(&self) {
        if self.last_status.is_some() {
            println!();
        }
    }
}

// ---------------------------------------------------------------------------
// Interactive batches
// ---------------------------------------------------------------------------

/// Action picked after a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchChoice {
    More,
    Finish,
    DeleteLast,
    Quit,
}

pub fn parse_choice(input: &str) -> Option<BatchChoice> {
    match input.trim().to_ascii_lowercase().as_str() {
        "w" => Some(BatchChoice::More),
        "f" => Some(BatchChoice::Finish),
        "d" => Some(BatchChoice::DeleteLast),
        "q" => Some(BatchChoice::Quit),
        _ => None,
    }
}

async fn run_interactive(ctx: &Context, api: &ScanFlowApi, request: ScanRequest) -> anyhow::Result<()> {
    // Output and metadata are applied when the document is finished.
    let start = ScanRequest {
        profile: request.profile.clone(),
        ..Default::default()
    };
    let job = api
        .start_scan(&start)
        .await
        .context("Failed to start scan")?;
    let job_id = job.id;

    println!("Job ID: {job_id}");
    println!("Scanning...");
    let mut input = LineReader::spawn(std::io::BufReader::new(std::io::stdin()));
    settle(&ctx.cancel).await?;

    loop {
        let job = api.get_job(&job_id).await?;

        println!("\n{} pages scanned\n", job.page_count());
        println!("[W] Scan more pages");
        println!("[F] Finish and create PDF");
        println!("[D] Delete last page");
        println!("[Q] Cancel and quit");
        print!("\nChoice: ");
        let _ = std::io::stdout().flush();

        let Some(choice) = input.next_line(&ctx.cancel).await else {
            api.cancel_job(&job_id).await?;
            bail!("Input closed, job {} cancelled", job.short_id());
        };

        match parse_choice(&choice) {
            Some(BatchChoice::More) => {
                println!("Scanning more pages...");
                if let Err(e) = api.continue_scan(&job_id).await {
                    println!("Error: {e}");
                }
                settle(&ctx.cancel).await?;
            }
            Some(BatchChoice::Finish) => {
                api.finish_scan(&job_id, request.output.as_ref(), request.metadata.as_ref())
                    .await
                    .context("Failed to finish scan")?;
                let socket = ctx.socket(api);
                let job = wait_with_progress(
                    api,
                    socket.as_ref(),
                    &job_id,
                    DEFAULT_POLL_INTERVAL,
                    &ctx.cancel,
                )
                .await?;
                return report_final(&job);
            }
            Some(BatchChoice::DeleteLast) => {
                match job.pages.as_ref().and_then(|pages| pages.last()) {
                    Some(page) => match api.delete_page(&job_id, page.number).await {
                        Ok(()) => println!("Page {} deleted", page.number),
                        Err(e) => println!("Error: {e}"),
                    },
                    None => println!("No pages to delete"),
                }
            }
            Some(BatchChoice::Quit) => {
                if let Err(e) = api.cancel_job(&job_id).await {
                    println!("Error cancelling: {e}");
                }
                println!("Scan cancelled");
                return Ok(());
            }
            None => println!("Unknown option"),
        }
    }
}

async fn settle(cancel: &CancellationToken) -> anyhow::Result<()> {
    tokio::select! {
        _ = cancel.cancelled() => bail!("Interrupted"),
        _ = tokio::time::sleep(BATCH_SETTLE_DELAY) => Ok(()),
    }
}

/// Lines from a blocking reader, read on one helper thread for the
/// whole session.
struct LineReader {
    rx: mpsc::Receiver<String>,
}

impl LineReader {
    fn spawn<R: BufRead + Send + 'static>(reader: R) -> Self {
        let (tx, rx) = mpsc::channel(1);
        std::thread::spawn(move || {
            for line in reader.lines() {
                let Ok(line) = line else { break };
                if tx.blocking_send(line).is_err() {
                    return;
                }
            }
        });
        Self { rx }
    }

    /// `None` on EOF, read error or cancellation.
    async fn next_line(&mut self, cancel: &CancellationToken) -> Option<String> {
        tokio::select! {
            _ = cancel.cancelled() => None,
            line = self.rx.recv() => line,
        }
    }
}
