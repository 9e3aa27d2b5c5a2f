//! `banter init` — First-time setup.
//!
//! Creates `~/.banter/config.toml` if absent, opens (creating) the SQLite
//! record store, and seeds the runtime configuration keys from the config
//! file's `[seed]` section. Seeding uses insert-if-absent, so re-running
//! init never clobbers values an operator changed through the dashboard.

use banter_config::AppConfig;
use banter_core::store::keys;
use banter_store::SqliteStore;

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config_dir = AppConfig::config_dir();
    let config_path = config_dir.join("config.toml");

    println!("banter — First-Time Setup");
    println!("=========================\n");

    if !config_dir.exists() {
        std::fs::create_dir_all(&config_dir)?;
        println!("✅ Created config directory: {}", config_dir.display());
    } else {
        println!("  Config directory exists: {}", config_dir.display());
    }

    if !config_path.exists() {
        std::fs::write(&config_path, AppConfig::default_toml())?;
        println!("✅ Created config file: {}", config_path.display());
        println!("   Edit it to add your Discord token, API key, and admin password,");
        println!("   or set BANTER_DISCORD_TOKEN / BANTER_API_KEY / BANTER_ADMIN_PASSWORD.");
    } else {
        println!("  Config file exists: {}", config_path.display());
    }

    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;

    if let Some(parent) = std::path::Path::new(&config.db_path).parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let store = SqliteStore::new(&config.db_path)
        .await
        .map_err(|e| format!("Failed to open record store: {e}"))?;

    store
        .seed_config_value(keys::PERSONALITY, &config.seed.personality)
        .await?;
    store
        .seed_config_value(keys::REPLY_CHANCE, &config.seed.reply_chance.to_string())
        .await?;
    store
        .seed_config_value(keys::MODEL_ID, &config.seed.model_id)
        .await?;

    println!("✅ Record store seeded at {}", config.db_path);
    println!("\nNext: `banter run`");

    Ok(())
}
