use crate::commands::{print_json, Context};

pub async fn run(ctx: &Context, json: bool) -> anyhow::Result<()> {
    let status = ctx.api()?.status().await?;

    if json {
        return print_json(&status);
    }

    println!("Server:      {}", ctx.config.server.url);
    println!("Status:      {}", status.status);
    println!("Version:     {}", status.version);
    println!("Scanner:     {}", status.scanner);
    println!("Devices:     {}", status.devices);
    println!("Active jobs: {}", status.active_jobs);
    println!("Total jobs:  {}", status.total_jobs);
    Ok(())
}

pub async fn run_version(ctx: &Context) -> anyhow::Result<()> {
    println!("scanflow {}", env!("CARGO_PKG_VERSION"));
    match ctx.api()?.health().await {
        Ok(health) => println!("server   {}", health.version),
        Err(e) => println!("server   unreachable ({e})"),
    }
    Ok(())
}
