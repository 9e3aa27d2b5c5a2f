//! Admin HTTP dashboard for banter.
//!
//! A JSON API over the shared record store. Operators log in with the
//! admin password, receive a bearer token, and then mutate runtime
//! configuration, filter rules, admin identities, and memory facts while
//! live traffic keeps flowing. Every write lands in the store directly, so
//! the next message evaluation observes it.
//!
//! Endpoints:
//!
//! - `GET  /health`                — liveness (unauthenticated)
//! - `POST /login`                 — exchange the admin password for a token
//! - `GET  /api/config`            — list configuration entries
//! - `PUT  /api/config/{key}`      — replace a configuration value
//! - `GET  /api/filters`           — list filter rules
//! - `POST /api/filters`           — add a filter rule
//! - `DELETE /api/filters/{id}`    — remove a filter rule
//! - `GET  /api/admins`            — list admin identities
//! - `POST /api/admins`            — grant admin
//! - `DELETE /api/admins/{user_id}` — revoke admin
//! - `GET  /api/log?limit=N`       — most recent exchanges (default 10)
//! - `GET  /api/memory/user/{user_id}` — list a user's memory facts
//! - `POST /api/memory`            — record a memory fact
//! - `DELETE /api/memory/{id}`     — remove a memory fact
//!
//! Built on Axum, matching the rest of the process: handlers are
//! independently concurrent with each other and with message handling.

use axum::{
    Router,
    extract::{Path, Query, State},
    http::StatusCode,
    middleware::{self, Next},
    response::Json,
    routing::{delete, get, post, put},
};
use banter_core::error::StoreError;
use banter_core::message::{ExchangeRecord, FilterRule, MemoryFact};
use banter_core::store::{RecordStore, keys, parse_reply_chance};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{info, warn};

/// Maximum number of active bearer tokens before the oldest is evicted.
const MAX_TOKENS: usize = 100;

/// Maximum exchange-log page size.
const MAX_LOG_LIMIT: usize = 500;

/// Shared state for the dashboard.
pub struct DashboardState {
    pub store: Arc<dyn RecordStore>,
    pub admin_password: String,
    pub bearer_tokens: RwLock<Vec<String>>,
}

impl DashboardState {
    pub fn new(store: Arc<dyn RecordStore>, admin_password: impl Into<String>) -> Self {
        Self {
            store,
            admin_password: admin_password.into(),
            bearer_tokens: RwLock::new(Vec::new()),
        }
    }
}

pub type SharedState = Arc<DashboardState>;

/// Build the dashboard router.
pub fn build_router(state: SharedState) -> Router {
    let api = Router::new()
        .route("/config", get(list_config_handler))
        .route("/config/{key}", put(set_config_handler))
        .route("/filters", get(list_filters_handler))
        .route("/filters", post(add_filter_handler))
        .route("/filters/{id}", delete(delete_filter_handler))
        .route("/admins", get(list_admins_handler))
        .route("/admins", post(add_admin_handler))
        .route("/admins/{user_id}", delete(delete_admin_handler))
        .route("/log", get(recent_log_handler))
        .route("/memory/user/{user_id}", get(list_facts_handler))
        .route("/memory", post(add_fact_handler))
        .route("/memory/{id}", delete(delete_fact_handler))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
        .with_state(state.clone());

    Router::new()
        .route("/health", get(health_handler))
        .route("/login", post(login_handler))
        .with_state(state)
        .nest("/api", api)
        .layer(tower_http::trace::TraceLayer::new_for_http())
}

/// Start the dashboard HTTP server.
pub async fn serve(
    host: &str,
    port: u16,
    state: SharedState,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let addr = format!("{host}:{port}");
    let app = build_router(state);

    info!(addr = %addr, "Dashboard starting");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Authentication middleware — requires a bearer token issued by /login.
async fn auth_middleware(
    State(state): State<SharedState>,
    req: axum::extract::Request,
    next: Next,
) -> Result<axum::response::Response, StatusCode> {
    let tokens = state.bearer_tokens.read().await;

    let auth_header = req
        .headers()
        .get("Authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "));

    match auth_header {
        Some(token) if tokens.iter().any(|t| t == token) => {
            drop(tokens);
            Ok(next.run(req).await)
        }
        _ => {
            warn!("Unauthorized dashboard request — missing or invalid bearer token");
            Err(StatusCode::UNAUTHORIZED)
        }
    }
}

fn internal(e: StoreError) -> StatusCode {
    tracing::error!(error = %e, "Dashboard store operation failed");
    StatusCode::INTERNAL_SERVER_ERROR
}

// --- Handlers ---

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

#[derive(Deserialize)]
struct LoginRequest {
    password: String,
}

#[derive(Serialize)]
struct LoginResponse {
    token: String,
}

async fn login_handler(
    State(state): State<SharedState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, StatusCode> {
    if payload.password != state.admin_password {
        warn!("Dashboard login failed");
        return Err(StatusCode::UNAUTHORIZED);
    }

    let token = uuid::Uuid::new_v4().to_string();
    let mut tokens = state.bearer_tokens.write().await;

    // Limit active tokens — evict oldest when at capacity
    if tokens.len() >= MAX_TOKENS {
        tokens.remove(0);
    }
    tokens.push(token.clone());

    info!("Dashboard login succeeded");
    Ok(Json(LoginResponse { token }))
}

#[derive(Serialize)]
struct ConfigEntry {
    key: String,
    value: String,
}

async fn list_config_handler(
    State(state): State<SharedState>,
) -> Result<Json<Vec<ConfigEntry>>, StatusCode> {
    let entries = state.store.config_entries().await.map_err(internal)?;
    Ok(Json(
        entries
            .into_iter()
            .map(|(key, value)| ConfigEntry { key, value })
            .collect(),
    ))
}

#[derive(Deserialize)]
struct SetConfigRequest {
    value: String,
}

async fn set_config_handler(
    State(state): State<SharedState>,
    Path(key): Path<String>,
    Json(payload): Json<SetConfigRequest>,
) -> Result<StatusCode, (StatusCode, String)> {
    if !keys::ALL.contains(&key.as_str()) {
        return Err((
            StatusCode::BAD_REQUEST,
            format!("unknown configuration key '{key}'"),
        ));
    }

    // Hold the invariant at the write: reply_chance is always a probability.
    if key == keys::REPLY_CHANCE {
        if let Err(e) = parse_reply_chance(&payload.value) {
            return Err((StatusCode::BAD_REQUEST, e.to_string()));
        }
    }

    if payload.value.trim().is_empty() {
        return Err((StatusCode::BAD_REQUEST, "value must not be empty".into()));
    }

    state
        .store
        .set_config_value(&key, &payload.value)
        .await
        .map_err(|e| (internal(e), "store write failed".to_string()))?;

    info!(key = %key, "Configuration value replaced");
    Ok(StatusCode::NO_CONTENT)
}

async fn list_filters_handler(
    State(state): State<SharedState>,
) -> Result<Json<Vec<FilterRule>>, StatusCode> {
    let rules = state.store.filter_rules().await.map_err(internal)?;
    Ok(Json(rules))
}

#[derive(Deserialize)]
struct AddFilterRequest {
    pattern: String,
    direction: String,
}

async fn add_filter_handler(
    State(state): State<SharedState>,
    Json(payload): Json<AddFilterRequest>,
) -> Result<(StatusCode, Json<FilterRule>), (StatusCode, String)> {
    if payload.pattern.trim().is_empty() {
        return Err((StatusCode::BAD_REQUEST, "pattern must not be empty".into()));
    }

    let direction = payload
        .direction
        .parse()
        .map_err(|e: String| (StatusCode::BAD_REQUEST, e))?;

    let rule = FilterRule::new(payload.pattern.trim(), direction);
    state
        .store
        .add_filter_rule(rule.clone())
        .await
        .map_err(|e| (internal(e), "store write failed".to_string()))?;

    info!(direction = %rule.direction.as_str(), "Filter rule added");
    Ok((StatusCode::CREATED, Json(rule)))
}

async fn delete_filter_handler(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<StatusCode, StatusCode> {
    let removed = state
        .store
        .remove_filter_rule(&id)
        .await
        .map_err(internal)?;
    if removed {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(StatusCode::NOT_FOUND)
    }
}

async fn list_admins_handler(
    State(state): State<SharedState>,
) -> Result<Json<Vec<String>>, StatusCode> {
    let admins = state.store.admins().await.map_err(internal)?;
    Ok(Json(admins))
}

#[derive(Deserialize)]
struct AddAdminRequest {
    user_id: String,
}

async fn add_admin_handler(
    State(state): State<SharedState>,
    Json(payload): Json<AddAdminRequest>,
) -> Result<StatusCode, (StatusCode, String)> {
    if payload.user_id.trim().is_empty() {
        return Err((StatusCode::BAD_REQUEST, "user_id must not be empty".into()));
    }

    state
        .store
        .add_admin(payload.user_id.trim())
        .await
        .map_err(|e| (internal(e), "store write failed".to_string()))?;

    info!("Admin identity added");
    Ok(StatusCode::CREATED)
}

async fn delete_admin_handler(
    State(state): State<SharedState>,
    Path(user_id): Path<String>,
) -> Result<StatusCode, StatusCode> {
    let removed = state.store.remove_admin(&user_id).await.map_err(internal)?;
    if removed {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(StatusCode::NOT_FOUND)
    }
}

#[derive(Deserialize)]
struct LogQuery {
    limit: Option<usize>,
}

async fn recent_log_handler(
    State(state): State<SharedState>,
    Query(query): Query<LogQuery>,
) -> Result<Json<Vec<ExchangeRecord>>, StatusCode> {
    let limit = query.limit.unwrap_or(10).min(MAX_LOG_LIMIT);
    let records = state
        .store
        .recent_exchanges(limit)
        .await
        .map_err(internal)?;
    Ok(Json(records))
}

async fn list_facts_handler(
    State(state): State<SharedState>,
    Path(user_id): Path<String>,
) -> Result<Json<Vec<MemoryFact>>, StatusCode> {
    let facts = state.store.facts_for(&user_id).await.map_err(internal)?;
    Ok(Json(facts))
}

#[derive(Deserialize)]
struct AddFactRequest {
    user_id: String,
    fact: String,
}

async fn add_fact_handler(
    State(state): State<SharedState>,
    Json(payload): Json<AddFactRequest>,
) -> Result<(StatusCode, Json<MemoryFact>), (StatusCode, String)> {
    if payload.user_id.trim().is_empty() || payload.fact.trim().is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            "user_id and fact must not be empty".into(),
        ));
    }

    let fact = MemoryFact::new(payload.user_id.trim(), payload.fact.trim());
    state
        .store
        .add_fact(fact.clone())
        .await
        .map_err(|e| (internal(e), "store write failed".to_string()))?;

    Ok((StatusCode::CREATED, Json(fact)))
}

async fn delete_fact_handler(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<StatusCode, StatusCode> {
    let removed = state.store.remove_fact(&id).await.map_err(internal)?;
    if removed {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(StatusCode::NOT_FOUND)
    }
}
