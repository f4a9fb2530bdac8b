//! Mimi CLI - start asset generation jobs and follow their progress

mod commands;

use clap::{Parser, Subcommand};
use commands::{generate, job};
use mimi_core::MimiError;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "mimi")]
#[command(about = "Client for the Mimi end-to-end asset generation service", long_about = None)]
#[command(version)]
struct Cli {
    /// Enable debug logging (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Disable coloured output (NO_COLOR is honoured too)
    #[arg(long, global = true)]
    no_color: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start a generation job and stream its progress, or reattach with --job-id
    Generate(generate::GenerateArgs),

    /// Inspect jobs submitted from this directory
    #[command(subcommand)]
    Job(job::JobCommands),
}

fn init_logging(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format_timestamp(None)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    let color = !cli.no_color && std::env::var_os("NO_COLOR").is_none();

    let result = match cli.command {
        Commands::Generate(args) => generate::run(args, color),
        Commands::Job(cmd) => job::run(cmd),
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            if let Some(body) = e.downcast_ref::<MimiError>().and_then(|m| m.response_body()) {
                eprintln!("Server response: {}", body);
            }
            ExitCode::FAILURE
        }
    }
}
