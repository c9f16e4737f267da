//! Command-line arguments.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "scanflow")]
#[command(about = "Command-line client for a ScanFlow document scanning server")]
#[command(version)]
pub struct Cli {
    /// Path to the client config file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Server URL, overrides the config file and SCANFLOW_SERVER_URL
    #[arg(long, global = true)]
    pub server: Option<String>,

    /// API key, overrides the config file and SCANFLOW_API_KEY
    #[arg(long, global = true)]
    pub api_key: Option<String>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Show server status
    Status {
        #[arg(long)]
        json: bool,
    },

    /// List scanner devices
    Devices {
        #[arg(long)]
        json: bool,
    },

    /// List or inspect scan profiles
    #[command(subcommand)]
    Profiles(ProfilesCommand),

    /// List output targets
    Outputs {
        #[arg(long)]
        json: bool,
    },

    /// Start a scan
    Scan(ScanArgs),

    /// Inspect or control a scan job
    #[command(subcommand)]
    Job(JobCommand),

    /// Read or change the client config
    #[command(subcommand)]
    Config(ConfigCommand),

    /// Live dashboard: status, devices, profiles and job progress
    Dashboard,

    /// Print client and server versions
    Version,
}

#[derive(Subcommand, Debug)]
pub enum ProfilesCommand {
    /// List all profiles
    List {
        #[arg(long)]
        json: bool,
    },
    /// Show one profile
    Show { name: String },
}

#[derive(Subcommand, Debug)]
pub enum JobCommand {
    /// Show a job
    Get {
        id: String,
        #[arg(long)]
        json: bool,
    },
    /// Cancel a job
    Cancel { id: String },
    /// Wait for a job to finish
    Wait { id: String },
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Print the effective configuration
    Show,
    /// Print one value
    Get { key: String },
    /// Change one value and save the file
    Set { key: String, value: String },
}

#[derive(Args, Debug, Clone, Default)]
pub struct ScanArgs {
    /// Scan profile (defaults to `defaults.profile`)
    #[arg(short, long)]
    pub profile: Option<String>,

    /// Output target (defaults to `defaults.output`)
    #[arg(short, long)]
    pub output: Option<String>,

    /// Document title
    #[arg(short, long)]
    pub title: Option<String>,

    /// Output filename
    #[arg(long)]
    pub filename: Option<String>,

    /// Tag IDs, comma separated
    #[arg(long, value_delimiter = ',')]
    pub tags: Vec<u32>,

    /// Correspondent ID
    #[arg(long)]
    pub correspondent: Option<u32>,

    /// Document type ID
    #[arg(long)]
    pub document_type: Option<u32>,

    /// Scan several batches into one document
    #[arg(short, long)]
    pub interactive: bool,

    /// Return right after the job is accepted
    #[arg(long)]
    pub no_wait: bool,

    /// Print the job record as JSON
    #[arg(long)]
    pub json: bool,
}
