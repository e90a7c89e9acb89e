use std::path::Path;
use std::time::Duration;

use app::sync::{mirror_once, ActionJournal, FingerprintMode, MirrorParams};
use tokio::time::{self, MissedTickBehavior};
use utils::app_config::AppConfig;
use utils::error::{Error, Result};

/// Resolve CLI arguments and configuration into pass parameters.
fn resolve_params(source: String, replica: String, quick: bool) -> Result<MirrorParams> {
    let config = AppConfig::fetch()?;

    let fingerprint = if quick || !config.mirror.checksum {
        FingerprintMode::Quick
    } else {
        FingerprintMode::Checksum
    };

    Ok(MirrorParams {
        source,
        replica,
        fingerprint,
    })
}

fn open_journal(logfile: &str) -> Result<ActionJournal> {
    ActionJournal::open(Path::new(logfile))
        .map_err(|e| Error::with_source("Failed to open action journal", Box::new(e)))
}

/// Run a single reconciliation pass.
pub async fn sync_cmd(source: String, replica: String, logfile: String, quick: bool) -> Result<()> {
    let params = resolve_params(source, replica, quick)?;
    let mut journal = open_journal(&logfile)?;

    let mut stats = mirror_once(&params, &mut journal)
        .await
        .map_err(|e| Error::with_source("Mirror pass failed", Box::new(e)))?;
    stats.log_path = logfile;

    println!("{}", stats);
    Ok(())
}

/// Mirror continuously until interrupted; one pass per tick, serialized.
pub async fn run_cmd(
    source: String,
    replica: String,
    interval: Option<u64>,
    logfile: String,
    quick: bool,
) -> Result<()> {
    let config = AppConfig::fetch()?;
    let params = resolve_params(source, replica, quick)?;
    let mut journal = open_journal(&logfile)?;

    let secs = interval.unwrap_or(config.mirror.interval).max(1);
    let mut ticker = time::interval(Duration::from_secs(secs));
    // A pass that overruns the interval delays the next tick instead of
    // stacking passes.
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    log::info!(
        "Mirroring {} -> {} every {}s (journal: {})",
        params.source,
        params.replica,
        secs,
        logfile
    );

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                match mirror_once(&params, &mut journal).await {
                    Ok(stats) => {
                        let now = chrono::Local::now();
                        println!(
                            "[{}] Pass complete: {} actions, {} unchanged, {} errors ({})",
                            now.format("%Y-%m-%d %H:%M:%S"),
                            stats.actions(),
                            stats.unchanged_files,
                            stats.errors,
                            stats.total_time
                        );
                    }
                    Err(e) => {
                        // A failed pass is retried on the next tick.
                        log::error!("Mirror pass failed: {}", e);
                    }
                }
            }
            _ = tokio::signal::ctrl_c() => {
                println!("Interrupt received, stopping");
                break;
            }
        }
    }

    Ok(())
}
