//! Start or reattach to a generation job

use anyhow::{anyhow, Result};
use clap::Args;
use mimi_asset_gen::{
    ApiClient, ImageInput, JobRequest, JobStart, JobStore, MimiConfig, Session, StreamOutcome,
    TerminalReporter,
};
use mimi_core::JobId;
use std::path::PathBuf;
use std::process::ExitCode;

/// Exit status when the stream ends without a success record
const EXIT_INCOMPLETE: u8 = 2;

#[derive(Args)]
pub struct GenerateArgs {
    /// Object to generate; replaces {TARGET} in the prompt (e.g. apple, tree)
    #[arg(long, required_unless_present = "job_id")]
    pub target: Option<String>,

    /// Prompt template (defaults to the configured or built-in template)
    #[arg(long)]
    pub prompt: Option<String>,

    /// Number of variations to generate
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
    pub batch_size: Option<u32>,

    /// Reference image to embed in the request ("none" to skip)
    #[arg(long)]
    pub image: Option<PathBuf>,

    /// API key for new jobs (defaults to MIMIAI_API_KEY, then config)
    #[arg(long)]
    pub api_key: Option<String>,

    /// Service base URL
    #[arg(long)]
    pub api_url: Option<String>,

    /// Reattach to an existing job instead of starting a new one
    #[arg(long, alias = "job_id")]
    pub job_id: Option<String>,

    /// End the session on the first error reported by the server
    #[arg(long)]
    pub stop_on_error: bool,

    /// Do not record the submitted job in .mimi/jobs
    #[arg(long)]
    pub no_history: bool,
}

pub fn run(args: GenerateArgs, color: bool) -> Result<ExitCode> {
    let config = MimiConfig::load()?;
    let client = ApiClient::from_config(&config, args.api_url.as_deref());
    let policy = config.error_policy(args.stop_on_error);

    let start = match args.job_id.as_deref() {
        Some(raw) => {
            let job_id = JobId::from_user_input(raw)
                .ok_or_else(|| anyhow!("--job-id must not be empty"))?;
            JobStart::Attach(job_id)
        }
        None => {
            // Checked before anything touches the network
            let api_key = config.require_api_key(args.api_key.as_deref())?;
            let target = args
                .target
                .ok_or_else(|| anyhow!("--target is required when starting a new job"))?;
            let image = ImageInput::from_path(args.image.as_deref())?;
            let request = JobRequest::new(
                config.prompt(args.prompt.as_deref()),
                target,
                config.batch_size(args.batch_size),
                image,
            )?;
            JobStart::Submit { api_key, request }
        }
    };

    let mut session = Session::new(&client, policy);
    if !args.no_history {
        session = session.with_store(JobStore::default_store());
    }

    let mut reporter = TerminalReporter::stdout(color).with_program(env!("CARGO_BIN_NAME"));
    let outcome = session.run(start, &mut reporter)?;

    Ok(match outcome {
        StreamOutcome::Completed { .. } => ExitCode::SUCCESS,
        StreamOutcome::Closed { server_errors } => {
            log::debug!("stream ended without success ({} server errors)", server_errors);
            ExitCode::from(EXIT_INCOMPLETE)
        }
    })
}
