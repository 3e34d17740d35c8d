//! Credentials server
//!
//! Reads `CREDENTIALS_*` environment variables (see `CredentialsConfig`),
//! opens the SQLite store and serves the REST API.

use anyhow::Context;
use credentials_core::api::create_router;
use credentials_core::logging::{setup_logging, LoggingConfig};
use credentials_core::CredentialsConfig;
use tokio::net::TcpListener;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = CredentialsConfig::from_env().context("loading configuration")?;

    setup_logging(LoggingConfig::from_settings(&config.logging)?)?;
    info!("Starting credentials-server v{}", env!("CARGO_PKG_VERSION"));

    let bind_address = config.api_bind_address.clone();
    let state = credentials_core::init_api(config)
        .await
        .context("initializing authentication service")?;

    let app = create_router(state);
    let listener = TcpListener::bind(&bind_address)
        .await
        .with_context(|| format!("binding {}", bind_address))?;

    info!("Listening on {}", listener.local_addr()?);
    axum::serve(listener, app).await?;

    Ok(())
}
