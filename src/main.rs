use std::net::SocketAddr;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use storefront_api::{
    config::AppConfig,
    routes::create_app,
    state::AppState,
    store::{DataStore, MemoryBackend},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,storefront_api=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::from_env()?;
    tracing::debug!(storage = ?config.storage, environment = ?config.environment, "configuration loaded");

    let seed_demo = !config.environment.is_production();
    let store = DataStore::connect_with(&config.storage, || {
        if seed_demo {
            MemoryBackend::with_demo_catalog()
        } else {
            MemoryBackend::new()
        }
    })
    .await?;
    tracing::info!(
        requested = %store.requested_mode(),
        serving = %store.mode(),
        backend = store.backend_name(),
        "storage ready"
    );

    let addr = SocketAddr::from((config.host.parse::<std::net::IpAddr>()?, config.port));
    let app = create_app(AppState::new(store, config));

    tracing::info!("listening on {}", addr);
    axum::serve(tokio::net::TcpListener::bind(addr).await?, app).await?;

    Ok(())
}
