use anyhow::Context;
use dotenvy::dotenv;
use tracing::info;

use cosmos::router::init_router;
use cosmos::state::init_app_state;
use cosmos_observability::init_logging;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    init_logging();

    let state = init_app_state().await?;
    let bind_addr = state.server_config.bind_addr.clone();
    if state.server_config.maintenance {
        info!("starting in maintenance mode");
    }

    let app = init_router(state);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("could not bind {bind_addr}"))?;

    info!(addr = %bind_addr, "cosmos server listening");
    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}
