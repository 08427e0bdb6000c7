//! Driveline dealership server binary.

use dealer_store::SqliteDealerStore;
use driveline_server::{Config, create_app, create_state, init_tracing};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = Config::from_env()?;
    init_tracing(&config.log_level);

    tracing::info!(database_url = %config.database_url, "Connecting to database");
    let store = SqliteDealerStore::connect(&config.database_url).await?;

    let addr = config.server_addr();
    let state = create_state(config, store);
    let app = create_app(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(%addr, "Driveline server listening");
    axum::serve(listener, app).await?;

    Ok(())
}
