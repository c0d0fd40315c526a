use anyhow::{Context, Result};
use fs2::FileExt;
use tracing::info;
use tracing_subscriber::EnvFilter;

use reelwatch_common::Config;
use reelwatch_scout::run::Scout;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("Reelwatch scout starting...");

    // Load config
    let config = Config::from_env()?;

    // One run at a time: the ledger assumes exclusive ownership for the
    // duration of a cycle. The lock releases on process exit, clean or not.
    let lock_file = std::fs::OpenOptions::new()
        .create(true)
        .write(true)
        .open(&config.lock_path)
        .with_context(|| format!("Failed to open lock file {}", config.lock_path.display()))?;
    if lock_file.try_lock_exclusive().is_err() {
        info!("Another run is already in progress, exiting");
        return Ok(());
    }

    let scout = Scout::new(config);
    let stats = scout.run().await?;
    info!("{stats}");

    Ok(())
}
