//! The same scenario run against every available backend. The cloud run
//! needs `TEST_DATABASE_URL` and is skipped otherwise.

use std::{collections::BTreeSet, sync::Arc};

use sea_orm::{ConnectionTrait, Statement};
use serde_json::Value;
use storefront_api::{
    config::StorageMode,
    db::{create_pool, run_migrations},
    models::{
        NewOrderItem, NewProduct, NewSetting, NewUser, OrderPatch, OrderStatus, Role, UserStatus,
    },
    store::{CloudBackend, DataStore, StoreError},
};

fn keys(value: &Value) -> BTreeSet<String> {
    value
        .as_object()
        .map(|o| o.keys().cloned().collect())
        .unwrap_or_default()
}

/// Runs the shared scenario and returns the serialized shapes it produced.
async fn exercise(store: &DataStore) -> anyhow::Result<Vec<BTreeSet<String>>> {
    let product = store
        .products()
        .create_product(NewProduct {
            name: "Contract Widget".into(),
            description: Some("shape check".into()),
            price: 700,
            image_url: None,
            category: "general".into(),
            stock: 4,
        })
        .await?;
    let fetched = store.products().get_product(product.id).await?.unwrap();
    assert_eq!((fetched.name.as_str(), fetched.price), ("Contract Widget", 700));

    let user = store
        .users()
        .create_user(NewUser {
            email: "contract@example.com".into(),
            username: "contract".into(),
            password_hash: "not-a-real-hash".into(),
            role: Role::User,
            status: UserStatus::Active,
        })
        .await?;
    let by_email = store.users().find_user_by_email("CONTRACT@example.com").await?;
    assert_eq!(by_email.map(|u| u.id), Some(user.id));

    store.cart().add_to_cart(user.id, product.id, 1).await?;
    let merged = store.cart().add_to_cart(user.id, product.id, 2).await?;
    assert_eq!(merged.quantity, 3);
    assert_eq!(store.cart().get_cart_items(user.id).await?.len(), 1);

    let short = store
        .orders()
        .create_order(
            user.id,
            vec![NewOrderItem {
                product_id: product.id,
                quantity: 5,
            }],
            None,
        )
        .await
        .unwrap_err();
    assert!(matches!(short, StoreError::InsufficientStock { available: 4, .. }));

    let order = store
        .orders()
        .create_order(
            user.id,
            vec![NewOrderItem {
                product_id: product.id,
                quantity: 3,
            }],
            Some("1 Contract Lane".into()),
        )
        .await?;
    assert_eq!(order.total_amount, 2100);
    assert_eq!(store.products().get_product(product.id).await?.unwrap().stock, 1);

    let patched = store
        .orders()
        .update_order(
            order.id,
            OrderPatch {
                status: Some(OrderStatus::Cancelled),
                shipping_address: None,
            },
        )
        .await?
        .unwrap();
    assert_eq!(patched.status, OrderStatus::Cancelled);
    assert_eq!(patched.shipping_address.as_deref(), Some("1 Contract Lane"));

    let setting = store
        .settings()
        .upsert_setting(NewSetting {
            key: "contract_key".into(),
            value: "v1".into(),
            category: "general".into(),
            is_public: true,
        })
        .await?;

    assert_eq!(store.cart().clear_cart(user.id).await?, 1);
    assert!(store.orders().delete_order(order.id).await?);
    assert!(!store.orders().delete_order(order.id).await?);

    // Deleting a user takes their cart and orders with them.
    store.cart().add_to_cart(user.id, product.id, 1).await?;
    store
        .orders()
        .create_order(
            user.id,
            vec![NewOrderItem {
                product_id: product.id,
                quantity: 1,
            }],
            None,
        )
        .await?;
    assert!(store.users().delete_user(user.id).await?);
    assert!(store.orders().list_orders_for_user(user.id).await?.is_empty());
    assert!(store.cart().get_cart_items(user.id).await?.is_empty());
    assert!(store.users().get_user(user.id).await?.is_none());

    Ok(vec![
        keys(&serde_json::to_value(&product)?),
        keys(&serde_json::to_value(&user)?),
        keys(&serde_json::to_value(&merged)?),
        keys(&serde_json::to_value(&order)?),
        keys(&serde_json::to_value(&order.items[0])?),
        keys(&serde_json::to_value(&setting)?),
    ])
}

/// Two simultaneous sign-ups with one email: exactly one wins, the other conflicts.
async fn racing_signups(store: &DataStore) {
    let fields = || NewUser {
        email: "race@example.com".into(),
        username: "race".into(),
        password_hash: "not-a-real-hash".into(),
        role: Role::User,
        status: UserStatus::Active,
    };
    let users = store.users();
    let (first, second) = tokio::join!(users.create_user(fields()), users.create_user(fields()));
    let (won, lost): (Vec<_>, Vec<_>) = [first, second].into_iter().partition(Result::is_ok);
    assert_eq!(won.len(), 1);
    assert!(matches!(lost[0], Err(StoreError::Conflict(_))));
}

#[tokio::test]
async fn memory_backend_honours_the_contract() -> anyhow::Result<()> {
    let memory = DataStore::memory();
    racing_signups(&memory).await;
    let shapes = exercise(&memory).await?;
    assert!(shapes.iter().all(|s| !s.is_empty()));
    Ok(())
}

#[tokio::test]
async fn cloud_backend_matches_memory_shapes() -> anyhow::Result<()> {
    let Ok(url) = std::env::var("TEST_DATABASE_URL") else {
        eprintln!("Skipping test: set TEST_DATABASE_URL to run the cloud contract test.");
        return Ok(());
    };

    let cloud = CloudBackend::from_pool(create_pool(&url, None).await?);
    run_migrations(cloud.orm()).await?;
    let backend = cloud.orm().get_database_backend();
    cloud
        .orm()
        .execute(Statement::from_string(
            backend,
            "TRUNCATE TABLE order_items, orders, cart_items, settings, products, profiles CASCADE",
        ))
        .await?;

    let cloud_store = DataStore::from_backend(StorageMode::Cloud, Arc::new(cloud));
    racing_signups(&cloud_store).await;
    let cloud_shapes = exercise(&cloud_store).await?;
    let memory_shapes = exercise(&DataStore::memory()).await?;
    assert_eq!(cloud_shapes, memory_shapes);
    Ok(())
}
