use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use tracelink::client::{RestClient, TrackerClient};
use tracelink::config::load_config;
use tracelink::importer::Importer;

/// Bulk CSV relationship importer for Jama Connect instances.
#[derive(Parser)]
#[command(name = "tracelink", about = "Import item relationships from CSV files")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run an import
    Run {
        /// Path to the TOML configuration file
        #[arg(short, long, default_value = "tracelink.toml")]
        config: PathBuf,
        /// Resolve and prepare rows without creating any relationships
        #[arg(long)]
        dry_run: bool,
    },
    /// Check the configuration and the connection to the instance
    Validate {
        /// Path to the TOML configuration file
        #[arg(short, long, default_value = "tracelink.toml")]
        config: PathBuf,
    },
    /// List the relationship types the instance defines
    Types {
        /// Path to the TOML configuration file
        #[arg(short, long, default_value = "tracelink.toml")]
        config: PathBuf,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .init();

    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn run(cli: Cli) -> tracelink::errors::Result<()> {
    match cli.command {
        Commands::Run { config, dry_run } => {
            let config = load_config(&config)?;
            let client = RestClient::new(&config.connection);
            let summary = Importer::new(&client, &config).run(dry_run)?;
            println!(
                "{} rows read across {} files",
                summary.rows_read, summary.files
            );
            println!("  posted:     {}", summary.posted);
            println!("  failed:     {}", summary.failed);
            println!("  unresolved: {}", summary.skipped_unresolved);
            println!("  self:       {}", summary.skipped_self);
            println!("  duplicate:  {}", summary.skipped_duplicate);
            println!("total execution time: {}ms", summary.duration_ms);
        }
        Commands::Validate { config } => {
            let config = load_config(&config)?;
            let client = RestClient::new(&config.connection);
            let types = client.list_relationship_types()?;
            println!(
                "ok: connected to {} ({} relationship types)",
                config.connection.base_url,
                types.len()
            );
        }
        Commands::Types { config } => {
            let config = load_config(&config)?;
            let client = RestClient::new(&config.connection);
            let mut types = client.list_relationship_types()?;
            types.sort_by_key(|t| t.id);
            for t in &types {
                println!("{:>6}  {}", t.id, t.name);
            }
        }
    }
    Ok(())
}
