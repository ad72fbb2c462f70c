use std::sync::Arc;

use anyhow::Result;
use tracing::info;
use tracing_subscriber::EnvFilter;

use lemmy_client::LemmyClient;
use lemmyvault_common::{Config, RunMode};
use lemmyvault_scraper::{Downloader, HttpFetcher, Scraper};
use lemmyvault_store::VaultStore;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("Lemmyvault starting...");

    let config = Config::from_env();
    config.log_redacted();

    let store = VaultStore::connect(&config.database_path).await?;
    store.migrate().await?;
    info!(path = config.database_path.as_str(), "Database ready");

    // Report and exit; no scraping.
    if std::env::args().any(|arg| arg == "--stats") {
        println!("{}", store.stats().await?);
        return Ok(());
    }

    let mut client = LemmyClient::new(&config.instance)?;
    client.login(&config.username, &config.password).await?;
    info!(instance = config.instance.as_str(), "Authenticated");

    let fetcher = Arc::new(HttpFetcher::new()?);
    let downloader = Downloader::new(store.clone(), fetcher, &config.media_dir);
    let scraper = Scraper::new(
        config.scraper.clone(),
        config.communities.clone(),
        Box::new(client),
        store,
        downloader,
    );

    match config.run_mode {
        RunMode::Once => {
            let stats = scraper.run().await;
            info!("Scrape run complete: {stats}");
        }
        RunMode::Continuous { interval } => {
            info!(interval_secs = interval.as_secs(), "Running on an interval");
            let mut ticker = tokio::time::interval(interval);
            loop {
                // Shutdown is only observed here, between runs; an in-flight
                // run always completes.
                tokio::select! {
                    _ = ticker.tick() => {
                        let stats = scraper.run().await;
                        info!("Scrape run complete: {stats}");
                    }
                    _ = tokio::signal::ctrl_c() => {
                        info!("Received shutdown signal, exiting");
                        break;
                    }
                }
            }
        }
    }

    Ok(())
}
