use crate::args::ProfilesCommand;
use crate::commands::{print_json, Context};
use crate::table::render_table;

pub async fn run(ctx: &Context, command: ProfilesCommand) -> anyhow::Result<()> {
    let api = ctx.api()?;

    match command {
        ProfilesCommand::List { json } => {
            let profiles = api.list_profiles().await?;
            if json {
                return print_json(&profiles);
            }

            let rows: Vec<Vec<String>> = profiles
                .iter()
                .map(|p| {
                    let default = if p.name() == ctx.config.defaults.profile { "*" } else { "" };
                    vec![
                        format!("{}{default}", p.name()),
                        p.profile.description.clone(),
                        dpi(p.scanner.resolution),
                        p.scanner.mode.clone(),
                        p.scanner.source.clone(),
                    ]
                })
                .collect();
            print!(
                "{}",
                render_table(&["NAME", "DESCRIPTION", "DPI", "MODE", "SOURCE"], &rows)
            );
        }
        ProfilesCommand::Show { name } => {
            let profile = api.get_profile(&name).await?;
            print_json(&profile)?;
        }
    }
    Ok(())
}

fn dpi(resolution: u32) -> String {
    if resolution == 0 {
        "-".into()
    } else {
        resolution.to_string()
    }
}
