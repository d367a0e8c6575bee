use sb_domain::config::Config;
use sb_sessions::Sweeper;

use crate::bootstrap;

/// One-shot store flush; prints the same line as `GET /clean_redis`.
pub async fn run(config: &Config) -> anyhow::Result<()> {
    let store = bootstrap::open_store(&config.store)?;
    let deleted = Sweeper::new(store)
        .flush_all()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to flush Redis: {e}"))?;
    println!("Deleted {deleted} Redis keys.");
    Ok(())
}
