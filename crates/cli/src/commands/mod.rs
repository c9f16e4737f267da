//! Subcommand dispatch.

mod config_cmd;
mod devices;
mod jobs;
mod profiles;
pub mod scan;
mod status;

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use serde::Serialize;
use tokio_util::sync::CancellationToken;

use scanflow_client::api::ScanFlowApi;
use scanflow_client::ws::ScanFlowSocket;

use crate::args::{Cli, Command};
use crate::config::ClientConfig;
use crate::dashboard::{run_dashboard, DashboardOptions};

/// Everything a subcommand needs.
pub struct Context {
    /// Effective configuration: file, environment, then flags.
    pub config: ClientConfig,
    pub config_path: PathBuf,
    pub cancel: CancellationToken,
}

impl Context {
    /// REST client for the configured server.
    pub fn api(&self) -> anyhow::Result<ScanFlowApi> {
        ScanFlowApi::new(&self.config.server.url, self.config.api_key())
            .with_context(|| format!("Invalid server URL '{}'", self.config.server.url))
    }

    /// Push channel for the configured server. `None` when the URL cannot
    /// be turned into a WebSocket address; callers then poll.
    pub fn socket(&self, api: &ScanFlowApi) -> Option<ScanFlowSocket> {
        match ScanFlowSocket::for_api(api) {
            Ok(socket) => Some(socket),
            Err(e) => {
                tracing::debug!(error = %e, "Push channel unavailable");
                None
            }
        }
    }
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let config_path = match cli.config {
        Some(path) => path,
        None => ClientConfig::default_path()?,
    };
    let config = load_effective(&config_path, cli.server, cli.api_key)?;

    let cancel = CancellationToken::new();
    spawn_ctrl_c_handler(cancel.clone());

    let ctx = Context {
        config,
        config_path,
        cancel,
    };

    match cli.command {
        Command::Status { json } => status::run(&ctx, json).await,
        Command::Devices { json } => devices::run_devices(&ctx, json).await,
        Command::Outputs { json } => devices::run_outputs(&ctx, json).await,
        Command::Profiles(command) => profiles::run(&ctx, command).await,
        Command::Scan(args) => scan::run(&ctx, &args).await,
        Command::Job(command) => jobs::run(&ctx, command).await,
        Command::Config(command) => config_cmd::run(&ctx, command),
        Command::Version => status::run_version(&ctx).await,
        Command::Dashboard => {
            let options = DashboardOptions {
                status_interval: ctx.config.status_interval(),
                reconnect_delay: ctx.config.reconnect_delay(),
                profile: ctx.config.defaults.profile.clone(),
                output: ctx.config.defaults.output.clone(),
            };
            run_dashboard(ctx.api()?, options, ctx.cancel.clone()).await
        }
    }
}

/// Config file, then `SCANFLOW_*` variables, then command-line flags.
pub fn load_effective(
    path: &Path,
    server: Option<String>,
    api_key: Option<String>,
) -> anyhow::Result<ClientConfig> {
    let mut config = ClientConfig::load_from(path)?;
    config.apply_env();
    config.apply_overrides(server, api_key);
    Ok(config)
}

fn spawn_ctrl_c_handler(cancel: CancellationToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Interrupted, shutting down");
            cancel.cancel();
        }
    });
}

/// Pretty-print a record as JSON on stdout.
pub(crate) fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
