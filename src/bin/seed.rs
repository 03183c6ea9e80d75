use storefront_api::{
    config::{StorageConfig, StorageMode},
    models::{NewSetting, NewUser, Role, UserStatus},
    services::auth_service::{
        REGISTRATION_DAILY_LIMIT_KEY, REGISTRATION_ENABLED_KEY, hash_password,
    },
    store::{DataStore, memory::demo_catalog},
};
use uuid::Uuid;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let storage = StorageConfig {
        allow_memory_fallback: false,
        ..StorageConfig::from_env()
    };
    if storage.storage_mode() == StorageMode::Memory {
        tracing::warn!("cloud backend not configured; memory data is lost when this process exits");
    }
    let store = DataStore::connect(&storage).await?;

    let admin_id = ensure_user(&store, "admin@example.com", "admin12345", Role::Admin).await?;
    let user_id = ensure_user(&store, "user@example.com", "user12345", Role::User).await?;
    seed_products(&store).await?;
    seed_settings(&store).await?;

    println!("Seed completed. Admin ID: {admin_id}, User ID: {user_id}");
    Ok(())
}

async fn ensure_user(
    store: &DataStore,
    email: &str,
    password: &str,
    role: Role,
) -> anyhow::Result<Uuid> {
    if let Some(existing) = store.users().find_user_by_email(email).await? {
        println!("User {email} already present");
        return Ok(existing.id);
    }

    let password_hash = hash_password(password).map_err(|e| anyhow::anyhow!(e.to_string()))?;
    let user = store
        .users()
        .create_user(NewUser {
            email: email.to_string(),
            username: email.split('@').next().unwrap_or(email).to_string(),
            password_hash,
            role,
            status: UserStatus::Active,
        })
        .await?;

    println!("Ensured user {email} (role={})", role.as_str());
    Ok(user.id)
}

async fn seed_products(store: &DataStore) -> anyhow::Result<()> {
    let existing: Vec<String> = store
        .products()
        .list_products()
        .await?
        .into_iter()
        .map(|p| p.name)
        .collect();

    let mut created = 0;
    for product in demo_catalog() {
        if existing.contains(&product.name) {
            continue;
        }
        store.products().create_product(product).await?;
        created += 1;
    }

    println!("Seeded {created} products");
    Ok(())
}

async fn seed_settings(store: &DataStore) -> anyhow::Result<()> {
    let defaults = [
        ("site_name", "Storefront", "general", true),
        (REGISTRATION_ENABLED_KEY, "true", "registration", false),
        (REGISTRATION_DAILY_LIMIT_KEY, "0", "registration", false),
    ];
    for (key, value, category, is_public) in defaults {
        if store.settings().get_setting(key).await?.is_some() {
            continue;
        }
        store
            .settings()
            .upsert_setting(NewSetting {
                key: key.to_string(),
                value: value.to_string(),
                category: category.to_string(),
                is_public,
            })
            .await?;
    }

    println!("Seeded settings");
    Ok(())
}
