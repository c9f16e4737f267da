use crate::commands::{print_json, Context};
use crate::table::render_table;

pub async fn run_devices(ctx: &Context, json: bool) -> anyhow::Result<()> {
    let devices = ctx.api()?.list_devices().await?;

    if json {
        return print_json(&devices);
    }
    if devices.is_empty() {
        println!("No scanner found");
        return Ok(());
    }

    let rows: Vec<Vec<String>> = devices
        .iter()
        .map(|d| {
            vec![
                d.name.clone(),
                d.vendor.clone(),
                d.model.clone(),
                d.kind.clone(),
            ]
        })
        .collect();
    print!("{}", render_table(&["NAME", "VENDOR", "MODEL", "TYPE"], &rows));
    Ok(())
}

pub async fn run_outputs(ctx: &Context, json: bool) -> anyhow::Result<()> {
    let outputs = ctx.api()?.list_outputs().await?;

    if json {
        return print_json(&outputs);
    }

    let yes_no = |b: bool| if b { "yes" } else { "no" }.to_string();
    let rows: Vec<Vec<String>> = outputs
        .iter()
        .map(|o| {
            let default = if o.name == ctx.config.defaults.output { "*" } else { "" };
            vec![
                format!("{}{default}", o.name),
                o.kind.clone(),
                yes_no(o.enabled),
                yes_no(o.available),
            ]
        })
        .collect();
    print!("{}", render_table(&["NAME", "TYPE", "ENABLED", "AVAILABLE"], &rows));
    Ok(())
}
