use storefront_api::{
    config::StorageConfig,
    db::{create_pool, orm_from_pool, run_migrations},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let storage = StorageConfig::from_env();
    let url = match (storage.is_backend_configured(), storage.cloud_url.as_deref()) {
        (true, Some(url)) => url,
        _ => anyhow::bail!("CLOUD_DATABASE_URL and CLOUD_ANON_KEY must be set to run migrations"),
    };

    let pool = create_pool(url, storage.connection_key()).await?;
    run_migrations(&orm_from_pool(pool)).await?;
    println!("Migrations applied");
    Ok(())
}
