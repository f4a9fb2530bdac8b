//! Local job history commands

use anyhow::{anyhow, Result};
use clap::Subcommand;
use mimi_asset_gen::JobStore;
use mimi_core::JobId;
use std::process::ExitCode;

#[derive(Subcommand)]
pub enum JobCommands {
    /// List jobs submitted from this directory, newest first
    List,

    /// Show a recorded job and the command that reattaches to it
    Show {
        /// Job ID
        id: String,
    },
}

pub fn run(cmd: JobCommands) -> Result<ExitCode> {
    let store = JobStore::default_store();

    match cmd {
        JobCommands::List => {
            let jobs = store.list()?;

            if jobs.is_empty() {
                println!("No jobs recorded.");
                return Ok(ExitCode::SUCCESS);
            }

            println!("{} job(s):\n", jobs.len());
            for job in &jobs {
                println!(
                    "  {}  {}  x{}  {}",
                    job.job_id, job.submitted_at, job.batch_size, job.target
                );
            }
            Ok(ExitCode::SUCCESS)
        }
        JobCommands::Show { id } => {
            let job_id =
                JobId::from_user_input(&id).ok_or_else(|| anyhow!("job id must not be empty"))?;
            let job = store.load(&job_id)?;

            println!("Job: {}", job.job_id);
            println!("  Target: {}", job.target);
            println!("  Batch size: {}", job.batch_size);
            println!("  Submitted: {}", job.submitted_at);
            println!("  Service: {}", job.api_url);
            if let Some(ref credits) = job.credits_remaining {
                println!("  Credits at submission: {}", credits);
            }
            if let Some(ref digest) = job.image_digest {
                println!("  Image: {}", digest);
            }
            println!("  Prompt: {}", job.prompt.trim());
            println!(
                "\nReattach with: {} generate --job-id {} --api-url {}",
                env!("CARGO_BIN_NAME"),
                job.job_id,
                job.api_url
            );
            Ok(ExitCode::SUCCESS)
        }
    }
}
