use scanflow_client::watch::DEFAULT_POLL_INTERVAL;
use scanflow_core::format::progress_bar;
use scanflow_core::job_status::{is_active, JOB_FAILED};

use crate::args::JobCommand;
use crate::commands::scan::{report_final, wait_with_progress};
use crate::commands::{print_json, Context};

pub async fn run(ctx: &Context, command: JobCommand) -> anyhow::Result<()> {
    let api = ctx.api()?;

    match command {
        JobCommand::Get { id, json } => {
            let job = api.get_job(&id).await?;
            if json {
                return print_json(&job);
            }

            println!("Job:      {}", job.id);
            println!("Status:   {}", job.status);
            println!("Profile:  {}", job.profile);
            println!("Pages:    {}", job.page_count());
            println!(
                "Progress: {} {}%",
                progress_bar(job.progress_percent(), 20),
                job.progress_percent()
            );
            if let Some(created) = job.created_at {
                println!("Created:  {}", created.format("%Y-%m-%d %H:%M:%S"));
            }
            if job.status == JOB_FAILED {
                if let Some(error) = &job.error {
                    println!("Error:    {error}");
                }
            }
            if is_active(&job.status) {
                println!("\nFollow with: scanflow job wait {}", job.id);
            }
        }
        JobCommand::Cancel { id } => {
            api.cancel_job(&id).await?;
            println!("Job {id} cancelled");
        }
        JobCommand::Wait { id } => {
            let socket = ctx.socket(&api);
            let job = wait_with_progress(&api, socket.as_ref(), &id, DEFAULT_POLL_INTERVAL, &ctx.cancel)
                .await?;
            report_final(&job)?;
        }
    }
    Ok(())
}
