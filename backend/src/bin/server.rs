//! AstroCalendar HTTP Server Binary
//!
//! Opens the city database, restores the user's settings and serves the
//! calendar API.
//!
//! # Usage
//!
//! ```bash
//! # SQLite city list at ./astrocal.db (default)
//! cargo run --bin astrocal-server
//!
//! # In-memory city list
//! REPOSITORY_TYPE=local cargo run --bin astrocal-server
//! ```
//!
//! # Environment Variables
//!
//! - `ASTROCAL_CONFIG`: Path to the configuration file
//! - `REPOSITORY_TYPE`: `sqlite` or `local`
//! - `SQLITE_PATH`: City database file
//! - `SETTINGS_PATH`: User preference file
//! - `HOST`: Server host (default: 0.0.0.0)
//! - `PORT`: Server port (default: 8080)
//! - `TZ`: Zone used while GPS is on
//! - `RUST_LOG`: Log level (default: info)

use std::env;
use std::net::SocketAddr;
use std::sync::Arc;

use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use astrocal::config::AppConfig;
use astrocal::db::RepositoryFactory;
use astrocal::http::{create_router, AppState};
use astrocal::models::Location;
use astrocal::services::{AstroCalendar, ReportService, Settings};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    FmtSubscriber::builder()
        .with_max_level(
            env::var("RUST_LOG")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(Level::INFO),
        )
        .with_target(true)
        .with_thread_ids(true)
        .init();

    info!("Starting AstroCalendar HTTP Server");

    let config = AppConfig::load()?;

    let repository = RepositoryFactory::from_repository_config(&config.repository_config()).await?;
    info!("City repository initialized");

    let settings = Arc::new(Settings::from_config(&config, Arc::clone(&repository)));
    settings.start()?;

    let calendar = AstroCalendar::new(config.default_timezone()?, Location::default());
    let reports = Arc::new(ReportService::with_calendar(Arc::clone(&settings), calendar));
    reports.act_on_location_update().await?;
    let _listener = reports.spawn_listener();

    let app = create_router(AppState::new(repository, reports));

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    info!("Server listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
