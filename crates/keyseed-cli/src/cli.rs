use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(name = "keyseed")]
#[command(about = "Provision deployment credentials into Azure Key Vault")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Resource configuration file (TOML, JSON or YAML)
    #[arg(short, long, global = true, env = "KEYSEED_CONFIG", default_value = "keyseed.toml")]
    pub config: PathBuf,

    /// Log level (overrides logging.level; RUST_LOG wins over both)
    #[arg(long, global = true)]
    pub log_level: Option<String>,
}

#[derive(Clone, Copy, ValueEnum, Default)]
pub enum OutputFormat {
    #[default]
    Json,
    Toml,
    Table,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create missing service principals and store their credentials
    Setup(SetupArgs),
    /// Print the resource matrix without touching Azure
    Show(ShowArgs),
}

#[derive(clap::Args)]
pub struct SetupArgs {
    /// Log what would be done without calling Azure
    #[arg(long)]
    pub dry_run: bool,
    /// Name of the automation output that receives the matrix
    #[arg(long)]
    pub output_name: Option<String>,
    /// Skip exporting the matrix as an automation output
    #[arg(long)]
    pub no_export: bool,
}

#[derive(clap::Args)]
pub struct ShowArgs {
    /// Output format
    #[arg(short, long, default_value = "json")]
    pub format: OutputFormat,
}
