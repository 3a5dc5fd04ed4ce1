use std::sync::Arc;

use anyhow::Context;

use newscast_core::config::Config;
use newscast_store::SqliteChatStore;

mod health;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    newscast_core::logging::init("newscast")?;

    let cfg = Arc::new(Config::load()?);

    let store = SqliteChatStore::open(&cfg.db_path)
        .await
        .with_context(|| format!("failed to open chat database {}", cfg.db_path.display()))?;

    if let Some(port) = cfg.health_port {
        tokio::spawn(async move {
            if let Err(e) = health::serve(port).await {
                tracing::error!(port, error = %e, "health check server stopped");
            }
        });
    }

    newscast_telegram::router::run_polling(cfg, store)
        .await
        .context("telegram bot failed")?;

    Ok(())
}
