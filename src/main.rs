//! Location recording server.
//!
//! Run the server with
//! ```not_rust
//! cargo run
//! ```
//!
//! then post a report with
//! ```not_rust
//! curl -X POST localhost:3000/api/locations \
//!   -H 'content-type: application/json' \
//!   -d '{"latitude": 51.5007, "longitude": -0.1246}'
//! ```

use std::sync::Arc;

use axum::Server;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use location_csv_service::config::ServerConfig;
use location_csv_service::handlers::location_api::{router, AppState};
use location_csv_service::storage::csv_store::{CsvLocationStore, LocationStore};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "location_csv_service=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ServerConfig::init()?;

    let store = CsvLocationStore::new(config.locations_file.clone());
    store.ensure_initialized().await?;

    let app = router(AppState::new(Arc::new(store)), &config.static_dir);

    let addr = config.bind_addr();
    info!("Location server listening on http://{}", addr);
    info!("Map view at http://{}/map", addr);
    info!("Storage: {}", config.locations_file.display());

    Server::bind(&addr).serve(app.into_make_service()).await?;

    Ok(())
}
