use portal_web::api::ApiClient;
use portal_web::cache::LocalCache;
use portal_web::{router, AppState, Config, Portal};
use std::net::SocketAddr;
use tokio::fs;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .init();

    let config = Config::from_env();
    if let Some(parent) = config.cache_path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).await?;
        }
    }

    let api = ApiClient::new(config.api_url.clone())?;
    let cache = LocalCache::open(config.cache_path.clone()).await;
    let mut portal = Portal::new(api, cache, config.repeat_award);
    portal.initialize().await;

    let app = router(AppState::new(portal));
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));

    info!(api = %config.api_url, "listening on http://{addr}");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    info!("shutting down");
}
