//! Live terminal dashboard.
//!
//! The [`Dashboard`] state lives on the task running [`run_dashboard`].
//! The status ticker, list loaders, scan submissions, the stdin reader and
//! the push follower run independently and report back over channels; the
//! screen is redrawn after every event.

pub mod input;
pub mod state;

use std::io::{BufRead, Write};
use std::ops::ControlFlow;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use scanflow_client::api::{ScanFlowApi, ScanFlowApiError};
use scanflow_client::reconnect::{follow_updates, ReconnectConfig, SocketEvent};
use scanflow_client::ws::ScanFlowSocket;
use scanflow_core::types::{Device, Profile, ScanJob, ServerStatus};

pub use input::{parse_command, CommandError, DashboardCommand};
pub use state::{Connection, Dashboard, JobCard, ListState, ScanForm};

const EVENT_BUFFER: usize = 64;

/// `tokio::time::interval` rejects a zero period.
const MIN_STATUS_INTERVAL: Duration = Duration::from_secs(1);

const CLEAR_SCREEN: &str = "\x1b[2J\x1b[H";

/// Settings for [`run_dashboard`].
#[derive(Debug, Clone)]
pub struct DashboardOptions {
    pub status_interval: Duration,
    pub reconnect_delay: Duration,
    pub profile: String,
    pub output: String,
}

enum Event {
    Status(Result<ServerStatus, ScanFlowApiError>),
    Devices(Result<Vec<Device>, ScanFlowApiError>),
    Profiles(Result<Vec<Profile>, ScanFlowApiError>),
    Submitted(Result<ScanJob, ScanFlowApiError>),
    Input(String),
    InputClosed,
}

/// Run the dashboard until `quit` is typed or `cancel` fires.
pub async fn run_dashboard(
    api: ScanFlowApi,
    options: DashboardOptions,
    cancel: CancellationToken,
) -> anyhow::Result<()> {
    let socket = ScanFlowSocket::for_api(&api)?;
    let mut dashboard = Dashboard::new(
        api.base_url().as_str(),
        options.profile.as_str(),
        options.output.as_str(),
    );

    let (tx, mut rx) = mpsc::channel::<Event>(EVENT_BUFFER);
    let (socket_tx, mut socket_rx) = mpsc::channel::<SocketEvent>(EVENT_BUFFER);

    tracing::info!(push = %socket.display_url(), "Starting dashboard");

    spawn_status_ticker(&api, options.status_interval, &tx, &cancel);
    spawn_list_loaders(&api, &tx);
    spawn_input_reader(tx.clone());
    {
        let cancel = cancel.clone();
        let config = ReconnectConfig::fixed(options.reconnect_delay);
        tokio::spawn(async move { follow_updates(&socket, &config, &cancel, &socket_tx).await });
    }

    redraw(&dashboard);
    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            Some(event) = socket_rx.recv() => match event {
                SocketEvent::Connected => dashboard.set_push_connected(true),
                SocketEvent::Disconnected => dashboard.set_push_connected(false),
                SocketEvent::Update(update) => dashboard.apply_update(&update),
            },
            Some(event) = rx.recv() => {
                if handle_event(&mut dashboard, event, &api, &tx).is_break() {
                    break;
                }
            }
        }
        redraw(&dashboard);
    }

    cancel.cancel();
    Ok(())
}

fn handle_event(
    dashboard: &mut Dashboard,
    event: Event,
    api: &ScanFlowApi,
    tx: &mpsc::Sender<Event>,
) -> ControlFlow<()> {
    match event {
        Event::Status(result) => dashboard.apply_status(result),
        Event::Devices(result) => dashboard.apply_devices(result),
        Event::Profiles(result) => dashboard.apply_profiles(result),
        Event::Submitted(result) => dashboard.scan_submitted(result),
        Event::InputClosed => tracing::debug!("Stdin closed, commands disabled"),
        Event::Input(line) => match parse_command(&line) {
            Ok(Some(command)) => return run_command(dashboard, command, api, tx),
            Ok(None) => {}
            Err(e) => dashboard.set_alert(e.to_string()),
        },
    }
    ControlFlow::Continue(())
}

fn run_command(
    dashboard: &mut Dashboard,
    command: DashboardCommand,
    api: &ScanFlowApi,
    tx: &mpsc::Sender<Event>,
) -> ControlFlow<()> {
    match command {
        DashboardCommand::Scan {
            profile,
            output,
            title,
        } => {
            if let Some(profile) = profile {
                if let Err(e) = dashboard.select_profile(&profile) {
                    dashboard.set_alert(e.to_string());
                    return ControlFlow::Continue(());
                }
            }
            if let Some(output) = output {
                dashboard.set_output(&output);
            }
            if let Some(title) = title {
                dashboard.set_title(&title);
            }
            submit_scan(dashboard, api, tx);
        }
        DashboardCommand::Profile(name) => {
            if let Err(e) = dashboard.select_profile(&name) {
                dashboard.set_alert(e.to_string());
            }
        }
        DashboardCommand::Output(target) => dashboard.set_output(&target),
        DashboardCommand::Title(title) => dashboard.set_title(&title),
        DashboardCommand::Refresh => {
            spawn_status_check(api, tx);
            spawn_list_loaders(api, tx);
        }
        DashboardCommand::Quit => return ControlFlow::Break(()),
    }
    ControlFlow::Continue(())
}

fn submit_scan(dashboard: &mut Dashboard, api: &ScanFlowApi, tx: &mpsc::Sender<Event>) {
    let Some(request) = dashboard.begin_submit() else {
        return;
    };
    if let Err(e) = request.validate() {
        dashboard.scan_submitted(Err(e));
        return;
    }

    let api = api.clone();
    let tx = tx.clone();
    tokio::spawn(async move {
        let result = api.start_scan(&request).await;
        match &result {
            Ok(job) => tracing::info!(job_id = %job.id, profile = %job.profile, "Scan submitted"),
            Err(e) => tracing::warn!(error = %e, "Scan submission failed"),
        }
        let _ = tx.send(Event::Submitted(result)).await;
    });
}

fn spawn_status_ticker(
    api: &ScanFlowApi,
    period: Duration,
    tx: &mpsc::Sender<Event>,
    cancel: &CancellationToken,
) {
    let api = api.clone();
    let tx = tx.clone();
    let cancel = cancel.clone();
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period.max(MIN_STATUS_INTERVAL));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {}
            }
            if tx.send(Event::Status(api.status().await)).await.is_err() {
                break;
            }
        }
    });
}

fn spawn_status_check(api: &ScanFlowApi, tx: &mpsc::Sender<Event>) {
    let api = api.clone();
    let tx = tx.clone();
    tokio::spawn(async move {
        let _ = tx.send(Event::Status(api.status().await)).await;
    });
}

fn spawn_list_loaders(api: &ScanFlowApi, tx: &mpsc::Sender<Event>) {
    {
        let api = api.clone();
        let tx = tx.clone();
        tokio::spawn(async move {
            let _ = tx.send(Event::Devices(api.list_devices().await)).await;
        });
    }
    let api = api.clone();
    let tx = tx.clone();
    tokio::spawn(async move {
        let _ = tx.send(Event::Profiles(api.list_profiles().await)).await;
    });
}

/// Read stdin on a dedicated thread; tokio's stdin handle would keep the
/// runtime from shutting down while a read is pending.
fn spawn_input_reader(tx: mpsc::Sender<Event>) {
    std::thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else { break };
            if tx.blocking_send(Event::Input(line)).is_err() {
                return;
            }
        }
        let _ = tx.blocking_send(Event::InputClosed);
    });
}

fn redraw(dashboard: &Dashboard) {
    let mut stdout = std::io::stdout().lock();
    let _ = write!(stdout, "{CLEAR_SCREEN}{}> ", dashboard.render());
    let _ = stdout.flush();
}
