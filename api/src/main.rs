use anyhow::Result;
use dotenv::dotenv;

use binder_api::config::ServerConfig;
use binder_api::observability::Observability;
use binder_api::routes;
use binder_api::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables
    dotenv().ok();

    let obs = Observability::init()?;
    let config = ServerConfig::from_env();

    let state = AppState::new(&config, obs.registry.clone());
    let app = routes::app(state);

    let addr = config.addr();
    tracing::info!("API server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("API server stopped");
    obs.shutdown();

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
