use clap::{Parser, Subcommand};
use utils::app_config::AppConfig;

mod commands;

#[derive(Parser)]
#[command(name = "rust-replisync")]
#[command(version)]
#[command(about = "One-way directory mirroring on a timer", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Set the logging level (debug, info, warn, error)
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Additional configuration file merged over the defaults
    #[arg(short, long, global = true)]
    pub config: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run a single reconciliation pass
    Sync {
        /// Path to the source directory
        #[arg(short, long)]
        source: String,

        /// Path to the replica directory
        #[arg(short, long)]
        replica: String,

        /// Path to the action journal file
        #[arg(short, long)]
        logfile: String,

        /// Compare files by size and mtime instead of content digest
        #[arg(long)]
        quick: bool,
    },

    /// Mirror continuously at a fixed interval
    Run {
        /// Path to the source directory
        #[arg(short, long)]
        source: String,

        /// Path to the replica directory
        #[arg(short, long)]
        replica: String,

        /// Seconds between passes (defaults from configuration)
        #[arg(short, long)]
        interval: Option<u64>,

        /// Path to the action journal file
        #[arg(short, long)]
        logfile: String,

        /// Compare files by size and mtime instead of content digest
        #[arg(long)]
        quick: bool,
    },
}

pub async fn cli_match() -> utils::error::Result<()> {
    let cli = Cli::parse();

    AppConfig::merge_config(cli.config.as_deref())?;

    if let Some(level) = &cli.log_level {
        AppConfig::set("log.level", level)?;
    }

    // Execute the subcommand
    match &cli.command {
        Commands::Sync {
            source,
            replica,
            logfile,
            quick,
        } => commands::sync_cmd(source.clone(), replica.clone(), logfile.clone(), *quick).await?,
        Commands::Run {
            source,
            replica,
            interval,
            logfile,
            quick,
        } => {
            commands::run_cmd(
                source.clone(),
                replica.clone(),
                *interval,
                logfile.clone(),
                *quick,
            )
            .await?
        }
    }

    Ok(())
}
