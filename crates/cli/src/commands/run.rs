//! `banter run` — the full runtime.
//!
//! Wires the record store, provider, lookup, history cache, and pipeline
//! together, then runs channel intake and the admin dashboard as two
//! concurrent activities in one process. Either one exiting ends the
//! process; per-message faults never do.

use banter_agent::{HistoryCache, Pipeline, PipelineOptions, TriggerPolicy, run_intake};
use banter_channels::{DiscordChannel, DiscordConfig};
use banter_config::AppConfig;
use banter_core::channel::Channel;
use banter_core::lookup::Lookup;
use banter_core::provider::Provider;
use banter_core::store::{RecordStore, keys};
use banter_dashboard::DashboardState;
use banter_lookup::{DuckDuckGoLookup, NoopLookup};
use banter_providers::OpenAiCompatProvider;
use banter_store::SqliteStore;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;

    // Fail fast on missing credentials — there are no insecure defaults.
    config
        .validate_for_run()
        .map_err(|e| format!("Refusing to start: {e}"))?;

    let store = Arc::new(
        SqliteStore::new(&config.db_path)
            .await
            .map_err(|e| format!("Failed to open record store: {e}"))?,
    );

    // Required runtime keys must exist before serving traffic.
    for key in keys::REQUIRED {
        if store.config_value(key).await?.is_none() {
            return Err(format!(
                "required configuration key '{key}' missing from the record store — \
                 run `banter init` first"
            )
            .into());
        }
    }

    let api_key = config.api_key.clone().ok_or("provider API key missing")?;
    let provider: Arc<dyn Provider> = Arc::new(OpenAiCompatProvider::new(
        provider_name(&config.api_url),
        &config.api_url,
        api_key,
        config.agent.model_timeout_secs,
    )?);

    let lookup: Arc<dyn Lookup> = if config.agent.lookup_enabled {
        Arc::new(DuckDuckGoLookup::new(config.agent.lookup_timeout_secs)?)
    } else {
        Arc::new(NoopLookup)
    };

    let history = Arc::new(HistoryCache::new(config.agent.history_window));
    let options = PipelineOptions {
        temperature: config.agent.temperature,
        max_tokens: config.agent.max_tokens,
        model_timeout: Duration::from_secs(config.agent.model_timeout_secs),
        lookup_timeout: Duration::from_secs(config.agent.lookup_timeout_secs),
    };
    let pipeline = Arc::new(Pipeline::new(
        store.clone(),
        provider,
        lookup,
        history,
        TriggerPolicy::new(),
        options,
    ));

    let channel: Arc<dyn Channel> = Arc::new(DiscordChannel::new(DiscordConfig {
        bot_token: config.discord_token.clone().ok_or("discord token missing")?,
        channel_filter: vec![],
    }));

    let admin_password = config
        .dashboard
        .admin_password
        .clone()
        .ok_or("admin password missing")?;
    let dashboard_state = Arc::new(DashboardState::new(
        store.clone() as Arc<dyn RecordStore>,
        admin_password,
    ));

    println!("banter — starting runtime");
    println!("  Store:     {}", config.db_path);
    println!(
        "  Dashboard: http://{}:{}",
        config.dashboard.host, config.dashboard.port
    );
    println!("  Lookup:    {}", if config.agent.lookup_enabled { "duckduckgo" } else { "disabled" });

    // Channel intake and the dashboard run as independent concurrent
    // activities; a slow model call on one channel never stalls either.
    tokio::select! {
        result = run_intake(channel, pipeline) => {
            info!("Channel intake exited");
            result.map_err(|e| format!("channel intake failed: {e}"))?;
        }
        result = banter_dashboard::serve(
            &config.dashboard.host,
            config.dashboard.port,
            dashboard_state,
        ) => {
            info!("Dashboard exited");
            result.map_err(|e| format!("dashboard failed: {e}"))?;
        }
    }

    Ok(())
}

fn provider_name(api_url: &str) -> &'static str {
    if api_url.contains("groq.com") {
        "groq"
    } else if api_url.contains("openai.com") {
        "openai"
    } else {
        "openai-compat"
    }
}
