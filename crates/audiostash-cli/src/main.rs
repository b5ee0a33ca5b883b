//! CLI entry point - the composition root.
//!
//! This is the ONLY place where infrastructure is wired together via bootstrap.
//! Command dispatch routes to handlers, which receive the composed
//! `CliContext` and never open the database themselves.

use std::process::ExitCode;

use clap::{CommandFactory, Parser};
use tracing_subscriber::EnvFilter;

use audiostash_cli::handlers::{self, download::DownloadArgs, play::PlayArgs};
use audiostash_cli::{Cli, CliConfig, CliError, Commands, bootstrap};

fn init_logging(verbose: bool) {
    let default = if verbose {
        "audiostash=debug,warn"
    } else {
        "warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    // No command provided - show help
    let Some(command) = cli.command.as_ref() else {
        Cli::command().print_help()?;
        return Ok(());
    };

    // Bootstrap the CLI context (composition root)
    let config = CliConfig::from_cli(&cli)?;
    let ctx = bootstrap(config).await?;

    match command {
        Commands::Download { urls, track_id } => {
            handlers::download::execute(
                &ctx,
                DownloadArgs {
                    urls: urls.clone(),
                    track_id: track_id.clone(),
                },
            )
            .await?;
        }
        Commands::Play {
            source,
            handle,
            download,
            output,
        } => {
            handlers::play::execute(
                &ctx,
                PlayArgs {
                    source: source.clone(),
                    handle: *handle,
                    download: *download,
                    output: output.clone(),
                },
            )
            .await?;
        }
        Commands::Check { sources } => {
            handlers::check::execute(&ctx, sources).await?;
        }
        Commands::Cache { command } => {
            handlers::cache::execute(&ctx, command.clone()).await?;
        }
        Commands::Paths => {
            handlers::paths::execute(&ctx)?;
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    // Load environment variables before clap reads its `env` fallbacks
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::from(CliError::exit_code_for(&e))
        }
    }
}
