//! wxhub - weather station telemetry aggregation daemon
//!
//! Restores persisted state, opens the daily summary store, spawns the
//! bridge poller, and serves the query API until interrupted.

use clap::Parser;
use tracing::{info, warn};

use wxhub::app::App;
use wxhub::calendar::Calendar;
use wxhub::cli::Cli;
use wxhub::config::Config;
use wxhub::history::store::SummaryStore;
use wxhub::poller::PollerHandle;
use wxhub::state::snapshot::StatePersistence;
use wxhub::state::WeatherState;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("wxhub=info")),
        )
        .init();

    let cli = Cli::parse();
    let mut config = Config::load(&cli.config);
    if let Some(port) = cli.port {
        config.port = port;
    }
    if let Some(dir) = cli.data_dir {
        config.data_dir = Some(dir);
    }

    let calendar = Calendar::from_offset_hours(config.tz_offset);
    let now = chrono::Utc::now().timestamp();

    // A store that won't open is not fatal: history queries degrade to
    // empty results while ingestion keeps running.
    let store = match SummaryStore::open(&config.db_path()) {
        Ok(store) => Some(store),
        Err(e) => {
            warn!(error = %e, "summary store unavailable, history queries will be empty");
            None
        }
    };

    let persistence = StatePersistence::new(config.state_path());
    let weather = persistence.load().unwrap_or_else(|| {
        info!("no usable state snapshot, starting fresh");
        WeatherState::fresh(now, &calendar)
    });

    let port = config.port;
    let app = App::new(weather, store, persistence, calendar, config);

    let poller = PollerHandle::spawn(app.clone());

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", port)).await?;
    info!(port, "api listening");
    axum::serve(listener, wxhub::api::router(app))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    poller.shutdown().await;
    info!("shut down cleanly");
    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}
