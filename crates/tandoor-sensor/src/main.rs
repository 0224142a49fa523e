use std::path::Path;

mod config;
mod routes;
mod sensor;
mod setup;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().init();

    let config = config::read().await?;

    let app = routes::make_router(&config, Path::new(config::CONFIG_PATH)).await;

    let addr = (config.server.address, config.server.port);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    let addr = listener.local_addr()?;
    tracing::info!("starting server on http://{addr}");

    axum::serve::serve(listener, app).with_graceful_shutdown(async {
        _ = tokio::signal::ctrl_c().await;
    }).await?;

    Ok(())
}
