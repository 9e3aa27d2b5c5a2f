//! `banter status` — Show configuration and store summary.

use banter_config::AppConfig;
use banter_core::store::RecordStore;
use banter_store::SqliteStore;

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;

    println!("banter Status");
    println!("=============");
    println!("  Config dir: {}", AppConfig::config_dir().display());
    println!("  Store:      {}", config.db_path);
    println!("  API URL:    {}", config.api_url);
    println!(
        "  Dashboard:  {}:{}",
        config.dashboard.host, config.dashboard.port
    );
    println!("  Window:     {} turns", config.agent.history_window);
    println!(
        "  Lookup:     {}",
        if config.agent.lookup_enabled { "enabled" } else { "disabled" }
    );

    if !std::path::Path::new(&config.db_path).exists() {
        println!("\n  ⚠️  No record store — run `banter init` first");
        return Ok(());
    }

    let store = SqliteStore::new(&config.db_path)
        .await
        .map_err(|e| format!("Failed to open record store: {e}"))?;

    println!("\nRecord store");
    println!("------------");
    for (key, value) in store.config_entries().await? {
        let shown: String = value.chars().take(60).collect();
        println!("  {key}: {shown}");
    }
    println!("  filter rules:  {}", store.filter_rules().await?.len());
    println!("  admins:        {}", store.admins().await?.len());
    println!(
        "  log entries:   {}",
        store.recent_exchanges(10_000).await?.len()
    );

    Ok(())
}
