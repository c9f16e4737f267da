use anyhow::Context as _;

use scanflow_core::format::mask_key;

use crate::args::ConfigCommand;
use crate::commands::Context;
use crate::config::{ClientConfig, ENV_API_KEY, ENV_SERVER_URL};

pub fn run(ctx: &Context, command: ConfigCommand) -> anyhow::Result<()> {
    match command {
        ConfigCommand::Show => show(ctx),
        ConfigCommand::Get { key } => {
            let config = ClientConfig::load_from(&ctx.config_path)?;
            let value = config.get(&key)?;
            if key == "server.api_key" && !value.is_empty() {
                println!("{}", mask_key(&value));
            } else {
                println!("{value}");
            }
            Ok(())
        }
        ConfigCommand::Set { key, value } => {
            // Edit the file as written so env and flag overrides stay out of it.
            let mut config = ClientConfig::load_from(&ctx.config_path)?;
            config.set(&key, &value)?;
            config
                .save_to(&ctx.config_path)
                .with_context(|| format!("Failed to save {}", ctx.config_path.display()))?;
            println!("{key} updated in {}", ctx.config_path.display());
            Ok(())
        }
    }
}

fn show(ctx: &Context) -> anyhow::Result<()> {
    let config = &ctx.config;
    let api_key = match config.api_key() {
        Some(key) => mask_key(&key),
        None => "(not set)".to_string(),
    };

    println!("Config file: {}", ctx.config_path.display());
    println!();
    println!("[server]");
    println!("  url          = {}", config.server.url);
    println!("  api_key      = {api_key}");
    if !config.server.api_key_file.is_empty() {
        println!("  api_key_file = {}", config.server.api_key_file);
    }
    println!("[defaults]");
    println!("  profile      = {}", config.defaults.profile);
    println!("  output       = {}", config.defaults.output);
    println!("  interactive  = {}", config.defaults.interactive);
    println!("[dashboard]");
    println!("  status_interval_secs = {}", config.dashboard.status_interval_secs);
    println!("  reconnect_delay_secs = {}", config.dashboard.reconnect_delay_secs);
    println!();
    println!("Environment overrides: {ENV_SERVER_URL}, {ENV_API_KEY}");
    Ok(())
}
