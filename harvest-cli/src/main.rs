//! Harvest CLI - Command line interface for GitHub Discussions harvesting
//!
//! Fetches discussions into raw JSON, prunes empty records and exports
//! delimited text rows.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use harvest_core::Config;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use commands::{ConvertArgs, ExportArgs, FetchArgs, PruneArgs};

/// Harvest GitHub Discussions into a labeled dataset
#[derive(Parser, Debug)]
#[command(name = "harvest")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Config file (defaults to ~/.config/harvest/config.toml)
    #[arg(long, global = true, env = "HARVEST_CONFIG")]
    config: Option<PathBuf>,

    /// Root folder of raw records (overrides config and env)
    #[arg(long, global = true)]
    raw_root: Option<PathBuf>,

    /// Repository list file (overrides config)
    #[arg(long, global = true)]
    repositories: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Show version information
    Version,

    /// Fetch discussions of one or more repositories
    #[command(visible_alias = "f")]
    Fetch(FetchArgs),

    /// Delete records with no answer and no comments
    Prune(PruneArgs),

    /// Export raw records as `,__,`-delimited rows
    Export(ExportArgs),

    /// Convert a `name;repo` CSV into a repository list
    ConvertRepos(ConvertArgs),

    /// Show current configuration
    Config,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();

    let config = Config::load_with_overrides(
        cli.config.as_deref(),
        cli.raw_root.clone(),
        cli.repositories.clone(),
    )?;

    if cli.verbose {
        tracing::debug!(
            api_url = %config.github.api_url,
            raw_root = %config.storage.raw_root.display(),
            flush_every_pages = config.harvest.flush_every_pages,
            "Configuration loaded"
        );
    }

    match cli.command {
        Some(Commands::Version) => {
            println!("harvest {}", env!("CARGO_PKG_VERSION"));
        }
        Some(Commands::Fetch(args)) => {
            args.execute(&config).await?;
        }
        Some(Commands::Prune(args)) => {
            args.execute(&config)?;
        }
        Some(Commands::Export(args)) => {
            args.execute(&config)?;
        }
        Some(Commands::ConvertRepos(args)) => {
            args.execute()?;
        }
        Some(Commands::Config) => {
            println!("Harvest Configuration");
            println!("=====================");
            println!();
            println!("GitHub:");
            println!("  api_url: {}", config.github.api_url);
            println!("  max_retries: {}", config.github.max_retries);
            println!(
                "  retry_base_delay: {}ms",
                config.github.retry_base_delay.as_millis()
            );
            println!();
            println!("Harvest:");
            println!("  flush_every_pages: {}", config.harvest.flush_every_pages);
            println!(
                "  repositories_file: {}",
                config.harvest.repositories_file.display()
            );
            println!();
            println!("Storage:");
            println!("  raw_root: {}", config.storage.raw_root.display());
            println!(
                "  transformed_root: {}",
                config.storage.transformed_root.display()
            );
            println!();
            if let Some(path) = Config::default_config_path() {
                println!("Config file: {}", path.display());
                if path.exists() {
                    println!("  (exists)");
                } else {
                    println!("  (not found - using defaults)");
                }
            }
        }
        None => {
            println!("Harvest - GitHub Discussions extraction");
            println!();
            println!("Use --help for usage information");
        }
    }

    Ok(())
}
