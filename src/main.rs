//! Sector Market Report Service - Binary Entrypoint
//! Boots the Axum HTTP server, wiring settings, providers, and metrics.

use sector_report_service::{api, metrics::Metrics, AppState, Settings};
use shuttle_axum::ShuttleAxum;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Install a tracing subscriber unless the runtime already set one up.
/// `LOG_FORMAT=json` switches to JSON lines; filter comes from `RUST_LOG`.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("sector_report_service=info,warn"));

    let json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let res = if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().compact())
            .try_init()
    };
    if res.is_err() {
        tracing::debug!("tracing subscriber already installed");
    }
}

#[shuttle_runtime::main]
async fn axum() -> ShuttleAxum {
    // Load .env in local/dev; no-op in prod environments.
    let _ = dotenvy::dotenv();
    init_tracing();

    let settings = Settings::from_env()?;
    let metrics = Metrics::init(settings.rate_limit_per_min)?;
    let state = AppState::from_settings(&settings, Some(metrics.handle))?;
    let router = api::create_router(state);

    Ok(router.into())
}
