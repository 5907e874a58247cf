//! Fitplan - nutrition targets and weekly meal/workout plans from a
//! biometric profile.
//!
//! # Configuration
//!
//! - `FITPLAN_PORT` - listen port (default 8000)
//! - `FITPLAN_DATABASE_URL` - SQLite URL (default `sqlite:fitplan.db?mode=rwc`)
//! - `FITPLAN_LLM_URL` - completion server base URL; unset runs without a model
//! - `FITPLAN_LLM_MODEL` - model identifier recorded in the request log
//! - `FITPLAN_LLM_TIMEOUT_SECS` - per-call HTTP timeout (default 120)
//! - `FITPLAN_CORS_ORIGIN` - allowed browser origin (default `http://localhost:5173`)
//!
//! # API Endpoints
//!
//! - `GET /ai/generate` - Macros plus a generated plan
//! - `POST /plans/calculate` - Macros plus a portion plan
//! - `GET /plans/template` - Template plan for a goal
//! - `POST /users`, `GET /users` - User profiles
//! - `GET /health` - Health check

use std::env;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use fitplan::api::{self, AppState};
use fitplan::generator::{DEFAULT_MODEL_NAME, LlamaServerClient, TextGenerator};
use fitplan::orchestrator::PlanOrchestrator;
use fitplan::request_log::RequestLogger;
use fitplan::storage::Storage;

/// Default port if not specified via environment variable.
const DEFAULT_PORT: u16 = 8000;

/// Default database path if not specified via environment variable.
const DEFAULT_DB_PATH: &str = "sqlite:fitplan.db?mode=rwc";

/// Default browser origin allowed by CORS.
const DEFAULT_CORS_ORIGIN: &str = "http://localhost:5173";

const DEFAULT_LLM_TIMEOUT_SECS: u64 = 120;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env().add_directive("fitplan=info".parse()?))
        .init();

    // Load configuration from environment
    let port: u16 = env::var("FITPLAN_PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(DEFAULT_PORT);

    let db_url = env::var("FITPLAN_DATABASE_URL").unwrap_or_else(|_| DEFAULT_DB_PATH.to_string());
    let cors_origin =
        env::var("FITPLAN_CORS_ORIGIN").unwrap_or_else(|_| DEFAULT_CORS_ORIGIN.to_string());

    info!(port, db_url = %db_url, "Starting Fitplan server");

    let storage = Storage::new(&db_url).await?;
    info!("Database initialized");

    let generator = load_generator().await;
    let orchestrator =
        PlanOrchestrator::new(generator).with_logger(RequestLogger::new(storage.clone()));
    info!(model = orchestrator.model_name(), "Plan orchestrator ready");

    let state = AppState {
        storage,
        orchestrator,
    };
    let app = api::router(state, &cors_origin)?;

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr).await?;

    info!(%addr, cors_origin = %cors_origin, "Fitplan is listening");

    axum::serve(listener, app).await?;

    Ok(())
}

/// Connect to the completion server if one is configured and reachable.
///
/// Any failure leaves the service running without a model.
async fn load_generator() -> Option<Arc<dyn TextGenerator>> {
    let Ok(base_url) = env::var("FITPLAN_LLM_URL") else {
        info!("FITPLAN_LLM_URL not set; plans will use the fallback path");
        return None;
    };
    let model = env::var("FITPLAN_LLM_MODEL").unwrap_or_else(|_| DEFAULT_MODEL_NAME.to_string());
    let timeout = env::var("FITPLAN_LLM_TIMEOUT_SECS")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(DEFAULT_LLM_TIMEOUT_SECS);

    let client = match LlamaServerClient::new(&base_url, &model, Duration::from_secs(timeout)) {
        Ok(client) => client,
        Err(e) => {
            warn!(error = %e, "Failed to build completion client; running without a model");
            return None;
        }
    };

    match client.probe().await {
        Ok(()) => {
            info!(base_url = %base_url, model = %model, "Completion server reachable");
            Some(Arc::new(client))
        }
        Err(e) => {
            warn!(base_url = %base_url, error = %e, "Completion server unreachable; running without a model");
            None
        }
    }
}
