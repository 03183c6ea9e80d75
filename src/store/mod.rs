//! Data-access contract shared by the cloud and in-memory backends.
//!
//! Lookups that miss return `None` (or `false` for deletes). Every other
//! failure is a [`StoreError`].

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::models::{
    CartItem, NewOrderItem, NewProduct, NewSetting, NewUser, Order, OrderPatch, Product,
    ProductPatch, Setting, User, UserPatch,
};

pub mod cloud;
pub mod facade;
pub mod memory;

pub use cloud::CloudBackend;
pub use facade::DataStore;
pub use memory::MemoryBackend;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Storage backend unavailable: {0}")]
    Unavailable(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("{0}")]
    InvalidInput(String),

    #[error("Product {0} does not exist")]
    UnknownProduct(Uuid),

    #[error("Insufficient stock for product {product_id}: requested {requested}, available {available}")]
    InsufficientStock {
        product_id: Uuid,
        requested: i32,
        available: i32,
    },

    #[error("{0}")]
    Conflict(String),

    #[error("Stored record is malformed: {0}")]
    Corrupt(String),
}

impl From<sea_orm::DbErr> for StoreError {
    fn from(err: sea_orm::DbErr) -> Self {
        match err {
            sea_orm::DbErr::ConnectionAcquire(e) => StoreError::Unavailable(e.to_string()),
            sea_orm::DbErr::Conn(e) => StoreError::Unavailable(e.to_string()),
            other => StoreError::Database(other.to_string()),
        }
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
                StoreError::Unavailable(err.to_string())
            }
            other => StoreError::Database(other.to_string()),
        }
    }
}

impl From<crate::models::ParseEnumError> for StoreError {
    fn from(err: crate::models::ParseEnumError) -> Self {
        StoreError::Corrupt(err.to_string())
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

#[async_trait]
pub trait Backend: Send + Sync {
    fn name(&self) -> &'static str;

    /// Cheapest round-trip that proves the backend can serve requests.
    async fn ping(&self) -> StoreResult<()>;
}

#[async_trait]
pub trait ProductStore: Send + Sync {
    /// Newest first.
    async fn list_products(&self) -> StoreResult<Vec<Product>>;
    async fn get_product(&self, id: Uuid) -> StoreResult<Option<Product>>;
    async fn create_product(&self, fields: NewProduct) -> StoreResult<Product>;
    async fn update_product(&self, id: Uuid, patch: ProductPatch) -> StoreResult<Option<Product>>;
    async fn delete_product(&self, id: Uuid) -> StoreResult<bool>;
}

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn list_users(&self) -> StoreResult<Vec<User>>;
    async fn get_user(&self, id: Uuid) -> StoreResult<Option<User>>;
    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>>;
    async fn create_user(&self, fields: NewUser) -> StoreResult<User>;
    async fn update_user(&self, id: Uuid, patch: UserPatch) -> StoreResult<Option<User>>;
    async fn delete_user(&self, id: Uuid) -> StoreResult<bool>;
    async fn count_users(&self) -> StoreResult<u64>;
    async fn count_users_created_since(&self, since: DateTime<Utc>) -> StoreResult<u64>;
}

#[async_trait]
pub trait CartStore: Send + Sync {
    async fn get_cart_items(&self, user_id: Uuid) -> StoreResult<Vec<CartItem>>;
    async fn get_cart_item(&self, id: Uuid) -> StoreResult<Option<CartItem>>;
    /// Adds `quantity` to the caller's row for `product_id`, creating it if needed.
    async fn add_to_cart(&self, user_id: Uuid, product_id: Uuid, quantity: i32)
    -> StoreResult<CartItem>;
    async fn update_cart_item(&self, id: Uuid, quantity: i32) -> StoreResult<Option<CartItem>>;
    async fn remove_from_cart(&self, id: Uuid) -> StoreResult<bool>;
    async fn clear_cart(&self, user_id: Uuid) -> StoreResult<u64>;
}

#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Newest first.
    async fn list_orders(&self) -> StoreResult<Vec<Order>>;
    async fn list_orders_for_user(&self, user_id: Uuid) -> StoreResult<Vec<Order>>;
    async fn get_order(&self, id: Uuid) -> StoreResult<Option<Order>>;
    /// Snapshots prices, totals the order and decrements stock as one unit.
    /// Any line short on stock rejects the whole order.
    async fn create_order(
        &self,
        user_id: Uuid,
        items: Vec<NewOrderItem>,
        shipping_address: Option<String>,
    ) -> StoreResult<Order>;
    async fn update_order(&self, id: Uuid, patch: OrderPatch) -> StoreResult<Option<Order>>;
    async fn delete_order(&self, id: Uuid) -> StoreResult<bool>;
}

#[async_trait]
pub trait SettingStore: Send + Sync {
    async fn list_settings(&self) -> StoreResult<Vec<Setting>>;
    async fn get_setting(&self, key: &str) -> StoreResult<Option<Setting>>;
    async fn upsert_setting(&self, setting: NewSetting) -> StoreResult<Setting>;
}

/// Collapses repeated product lines and rejects empty or non-positive input.
/// First appearance decides the line order.
pub fn merge_order_lines(items: &[NewOrderItem]) -> StoreResult<Vec<NewOrderItem>> {
    if items.is_empty() {
        return Err(StoreError::InvalidInput("Order has no items".into()));
    }
    let mut merged: Vec<NewOrderItem> = Vec::with_capacity(items.len());
    for item in items {
        if item.quantity <= 0 {
            return Err(StoreError::InvalidInput(format!(
                "Quantity for product {} must be greater than 0",
                item.product_id
            )));
        }
        match merged.iter_mut().find(|m| m.product_id == item.product_id) {
            Some(existing) => {
                existing.quantity = existing.quantity.checked_add(item.quantity).ok_or_else(|| {
                    StoreError::InvalidInput("Quantity is too large".into())
                })?;
            }
            None => merged.push(*item),
        }
    }
    Ok(merged)
}

pub(crate) fn line_total(price: i64, quantity: i32) -> StoreResult<i64> {
    price
        .checked_mul(i64::from(quantity))
        .ok_or_else(|| StoreError::InvalidInput("Order total overflows".into()))
}
