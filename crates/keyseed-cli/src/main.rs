mod cli;
mod commands;
mod observability;
mod output;
mod settings;

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;

use cli::{Cli, Commands};
use output::print_error;
use settings::{Overrides, loader};

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        print_error(&format!("{e:#}"));
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // .env is optional; a broken one is reported since it may hold AZURE_CREDENTIALS.
    if let Err(e) = ignore_missing(dotenvy::dotenv()) {
        eprintln!("{} Failed to load .env file: {e}", "warning:".yellow());
    }
    let cli = Cli::parse();

    match &cli.command {
        Commands::Setup(args) => {
            let overrides = Overrides {
                dry_run: args.dry_run.then_some(true),
                log_level: cli.log_level.clone(),
                output_name: args.output_name.clone(),
            };
            let settings = loader::load_settings(&cli.config, &overrides)
                .with_context(|| format!("Failed to load {}", cli.config.display()))?;
            observability::init_tracing(&settings.logging.level);
            commands::setup::setup(&settings, args).await?;
        }
        Commands::Show(args) => {
            observability::init_tracing(cli.log_level.as_deref().unwrap_or("warn"));
            commands::show::show(&cli.config, args.format)?;
        }
    }

    Ok(())
}

fn ignore_missing<T>(
    result: std::result::Result<T, dotenvy::Error>,
) -> std::result::Result<(), dotenvy::Error> {
    match result {
        Ok(_) => Ok(()),
        Err(dotenvy::Error::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e),
    }
}
