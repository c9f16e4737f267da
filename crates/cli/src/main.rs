//! `scanflow` -- command-line client for a ScanFlow scanning server.
//!
//! # Environment variables
//!
//! | Variable              | Description                              |
//! |-----------------------|------------------------------------------|
//! | `SCANFLOW_SERVER_URL` | Server URL, overrides `server.url`       |
//! | `SCANFLOW_API_KEY`    | API key, overrides `server.api_key`      |
//! | `RUST_LOG`            | Log filter, default `scanflow=info`      |

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use scanflow_cli::args::Cli;
use scanflow_cli::commands;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let default_filter = if cli.debug { "scanflow=debug" } else { "scanflow=info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    commands::run(cli).await
}
