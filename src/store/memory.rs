//! Process-local backend. Non-durable; each process owns its own copy.
//!
//! All tables live behind a single lock so every contract operation,
//! including order creation with its stock writes, is atomic in-process.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{
    Backend, CartStore, OrderStore, ProductStore, SettingStore, StoreError, StoreResult,
    UserStore, line_total, merge_order_lines,
};
use crate::models::{
    CartItem, NewOrderItem, NewProduct, NewSetting, NewUser, Order, OrderItem, OrderPatch,
    OrderStatus, Product, ProductPatch, Setting, User, UserPatch,
};

#[derive(Default)]
struct Tables {
    products: Vec<Product>,
    users: Vec<User>,
    cart_items: Vec<CartItem>,
    orders: Vec<Order>,
    settings: Vec<Setting>,
}

#[derive(Default)]
pub struct MemoryBackend {
    tables: RwLock<Tables>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// A backend preloaded with a small demo catalog.
    pub fn with_demo_catalog() -> Self {
        let now = Utc::now();
        let products = demo_catalog()
            .into_iter()
            .map(|fields| product_from_fields(fields, now))
            .collect();
        Self {
            tables: RwLock::new(Tables {
                products,
                ..Tables::default()
            }),
        }
    }
}

pub fn demo_catalog() -> Vec<NewProduct> {
    [
        ("Axum Hoodie", "Warm hoodie for Rustaceans", 550000, "apparel", 50),
        ("Ferris Mug", "Coffee tastes better with Ferris", 120000, "kitchen", 100),
        ("Rust Sticker Pack", "Decorate your laptop", 50000, "accessories", 200),
        ("E-book: Async Rust", "Learn async Rust patterns", 250000, "books", 75),
    ]
    .into_iter()
    .map(|(name, description, price, category, stock)| NewProduct {
        name: name.to_string(),
        description: Some(description.to_string()),
        price,
        image_url: None,
        category: category.to_string(),
        stock,
    })
    .collect()
}

fn product_from_fields(fields: NewProduct, now: DateTime<Utc>) -> Product {
    Product {
        id: Uuid::new_v4(),
        name: fields.name,
        description: fields.description,
        price: fields.price,
        image_url: fields.image_url,
        category: fields.category,
        stock: fields.stock,
        created_at: now,
        updated_at: now,
    }
}

#[async_trait]
impl Backend for MemoryBackend {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }
}

#[async_trait]
impl ProductStore for MemoryBackend {
    async fn list_products(&self) -> StoreResult<Vec<Product>> {
        let tables = self.tables.read().await;
        Ok(tables.products.iter().rev().cloned().collect())
    }

    async fn get_product(&self, id: Uuid) -> StoreResult<Option<Product>> {
        let tables = self.tables.read().await;
        Ok(tables.products.iter().find(|p| p.id == id).cloned())
    }

    async fn create_product(&self, fields: NewProduct) -> StoreResult<Product> {
        let product = product_from_fields(fields, Utc::now());
        self.tables.write().await.products.push(product.clone());
        Ok(product)
    }

    async fn update_product(&self, id: Uuid, patch: ProductPatch) -> StoreResult<Option<Product>> {
        let mut tables = self.tables.write().await;
        let Some(product) = tables.products.iter_mut().find(|p| p.id == id) else {
            return Ok(None);
        };
        if let Some(name) = patch.name {
            product.name = name;
        }
        if let Some(description) = patch.description {
            product.description = Some(description);
        }
        if let Some(price) = patch.price {
            product.price = price;
        }
        if let Some(image_url) = patch.image_url {
            product.image_url = Some(image_url);
        }
        if let Some(category) = patch.category {
            product.category = category;
        }
        if let Some(stock) = patch.stock {
            product.stock = stock;
        }
        product.updated_at = Utc::now();
        Ok(Some(product.clone()))
    }

    async fn delete_product(&self, id: Uuid) -> StoreResult<bool> {
        let mut tables = self.tables.write().await;
        let before = tables.products.len();
        tables.products.retain(|p| p.id != id);
        let removed = tables.products.len() != before;
        if removed {
            tables.cart_items.retain(|c| c.product_id != id);
        }
        Ok(removed)
    }
}

#[async_trait]
impl UserStore for MemoryBackend {
    async fn list_users(&self) -> StoreResult<Vec<User>> {
        let tables = self.tables.read().await;
        Ok(tables.users.iter().rev().cloned().collect())
    }

    async fn get_user(&self, id: Uuid) -> StoreResult<Option<User>> {
        let tables = self.tables.read().await;
        Ok(tables.users.iter().find(|u| u.id == id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let tables = self.tables.read().await;
        Ok(tables
            .users
            .iter()
            .find(|u| u.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn create_user(&self, fields: NewUser) -> StoreResult<User> {
        let mut tables = self.tables.write().await;
        if tables
            .users
            .iter()
            .any(|u| u.email.eq_ignore_ascii_case(&fields.email))
        {
            return Err(StoreError::Conflict("Email is already taken".into()));
        }
        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            email: fields.email,
            username: fields.username,
            password_hash: fields.password_hash,
            role: fields.role,
            status: fields.status,
            created_at: now,
            updated_at: now,
        };
        tables.users.push(user.clone());
        Ok(user)
    }

    async fn update_user(&self, id: Uuid, patch: UserPatch) -> StoreResult<Option<User>> {
        let mut tables = self.tables.write().await;
        let Some(user) = tables.users.iter_mut().find(|u| u.id == id) else {
            return Ok(None);
        };
        if let Some(username) = patch.username {
            user.username = username;
        }
        if let Some(password_hash) = patch.password_hash {
            user.password_hash = password_hash;
        }
        if let Some(role) = patch.role {
            user.role = role;
        }
        if let Some(status) = patch.status {
            user.status = status;
        }
        user.updated_at = Utc::now();
        Ok(Some(user.clone()))
    }

    async fn delete_user(&self, id: Uuid) -> StoreResult<bool> {
        let mut tables = self.tables.write().await;
        let before = tables.users.len();
        tables.users.retain(|u| u.id != id);
        let removed = tables.users.len() != before;
        if removed {
            tables.cart_items.retain(|c| c.user_id != id);
            tables.orders.retain(|o| o.user_id != id);
        }
        Ok(removed)
    }

    async fn count_users(&self) -> StoreResult<u64> {
        Ok(self.tables.read().await.users.len() as u64)
    }

    async fn count_users_created_since(&self, since: DateTime<Utc>) -> StoreResult<u64> {
        let tables = self.tables.read().await;
        Ok(tables.users.iter().filter(|u| u.created_at >= since).count() as u64)
    }
}

#[async_trait]
impl CartStore for MemoryBackend {
    async fn get_cart_items(&self, user_id: Uuid) -> StoreResult<Vec<CartItem>> {
        let tables = self.tables.read().await;
        Ok(tables
            .cart_items
            .iter()
            .filter(|c| c.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn get_cart_item(&self, id: Uuid) -> StoreResult<Option<CartItem>> {
        let tables = self.tables.read().await;
        Ok(tables.cart_items.iter().find(|c| c.id == id).cloned())
    }

    async fn add_to_cart(
        &self,
        user_id: Uuid,
        product_id: Uuid,
        quantity: i32,
    ) -> StoreResult<CartItem> {
        let mut tables = self.tables.write().await;
        if let Some(item) = tables
            .cart_items
            .iter_mut()
            .find(|c| c.user_id == user_id && c.product_id == product_id)
        {
            item.quantity = item
                .quantity
                .checked_add(quantity)
                .ok_or_else(|| StoreError::InvalidInput("Quantity is too large".into()))?;
            return Ok(item.clone());
        }
        let item = CartItem {
            id: Uuid::new_v4(),
            user_id,
            product_id,
            quantity,
            created_at: Utc::now(),
        };
        tables.cart_items.push(item.clone());
        Ok(item)
    }

    async fn update_cart_item(&self, id: Uuid, quantity: i32) -> StoreResult<Option<CartItem>> {
        let mut tables = self.tables.write().await;
        Ok(tables.cart_items.iter_mut().find(|c| c.id == id).map(|item| {
            item.quantity = quantity;
            item.clone()
        }))
    }

    async fn remove_from_cart(&self, id: Uuid) -> StoreResult<bool> {
        let mut tables = self.tables.write().await;
        let before = tables.cart_items.len();
        tables.cart_items.retain(|c| c.id != id);
        Ok(tables.cart_items.len() != before)
    }

    async fn clear_cart(&self, user_id: Uuid) -> StoreResult<u64> {
        let mut tables = self.tables.write().await;
        let before = tables.cart_items.len();
        tables.cart_items.retain(|c| c.user_id != user_id);
        Ok((before - tables.cart_items.len()) as u64)
    }
}

#[async_trait]
impl OrderStore for MemoryBackend {
    async fn list_orders(&self) -> StoreResult<Vec<Order>> {
        let tables = self.tables.read().await;
        Ok(tables.orders.iter().rev().cloned().collect())
    }

    async fn list_orders_for_user(&self, user_id: Uuid) -> StoreResult<Vec<Order>> {
        let tables = self.tables.read().await;
        Ok(tables
            .orders
            .iter()
            .rev()
            .filter(|o| o.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn get_order(&self, id: Uuid) -> StoreResult<Option<Order>> {
        let tables = self.tables.read().await;
        Ok(tables.orders.iter().find(|o| o.id == id).cloned())
    }

    async fn create_order(
        &self,
        user_id: Uuid,
        items: Vec<NewOrderItem>,
        shipping_address: Option<String>,
    ) -> StoreResult<Order> {
        let lines = merge_order_lines(&items)?;
        let mut tables = self.tables.write().await;

        // Validate every line before touching stock.
        let mut priced = Vec::with_capacity(lines.len());
        let mut total_amount: i64 = 0;
        for line in &lines {
            let product = tables
                .products
                .iter()
                .find(|p| p.id == line.product_id)
                .ok_or(StoreError::UnknownProduct(line.product_id))?;
            if product.stock < line.quantity {
                return Err(StoreError::InsufficientStock {
                    product_id: product.id,
                    requested: line.quantity,
                    available: product.stock,
                });
            }
            total_amount = total_amount
                .checked_add(line_total(product.price, line.quantity)?)
                .ok_or_else(|| StoreError::InvalidInput("Order total overflows".into()))?;
            priced.push((*line, product.price));
        }

        let now = Utc::now();
        let order_id = Uuid::new_v4();
        let mut order_items = Vec::with_capacity(priced.len());
        for (line, price) in priced {
            if let Some(product) = tables.products.iter_mut().find(|p| p.id == line.product_id) {
                product.stock -= line.quantity;
                product.updated_at = now;
            }
            order_items.push(OrderItem {
                id: Uuid::new_v4(),
                order_id,
                product_id: line.product_id,
                quantity: line.quantity,
                price,
            });
        }

        let order = Order {
            id: order_id,
            user_id,
            status: OrderStatus::Pending,
            total_amount,
            shipping_address,
            items: order_items,
            created_at: now,
            updated_at: now,
        };
        tables.orders.push(order.clone());
        Ok(order)
    }

    async fn update_order(&self, id: Uuid, patch: OrderPatch) -> StoreResult<Option<Order>> {
        let mut tables = self.tables.write().await;
        let Some(order) = tables.orders.iter_mut().find(|o| o.id == id) else {
            return Ok(None);
        };
        if let Some(status) = patch.status {
            order.status = status;
        }
        if let Some(address) = patch.shipping_address {
            order.shipping_address = Some(address);
        }
        order.updated_at = Utc::now();
        Ok(Some(order.clone()))
    }

    async fn delete_order(&self, id: Uuid) -> StoreResult<bool> {
        let mut tables = self.tables.write().await;
        let before = tables.orders.len();
        tables.orders.retain(|o| o.id != id);
        Ok(tables.orders.len() != before)
    }
}

#[async_trait]
impl SettingStore for MemoryBackend {
    async fn list_settings(&self) -> StoreResult<Vec<Setting>> {
        let tables = self.tables.read().await;
        let mut settings = tables.settings.clone();
        settings.sort_by(|a, b| a.category.cmp(&b.category).then_with(|| a.key.cmp(&b.key)));
        Ok(settings)
    }

    async fn get_setting(&self, key: &str) -> StoreResult<Option<Setting>> {
        let tables = self.tables.read().await;
        Ok(tables.settings.iter().find(|s| s.key == key).cloned())
    }

    async fn upsert_setting(&self, setting: NewSetting) -> StoreResult<Setting> {
        let mut tables = self.tables.write().await;
        let stored = Setting {
            key: setting.key,
            value: setting.value,
            category: setting.category,
            is_public: setting.is_public,
            updated_at: Utc::now(),
        };
        match tables.settings.iter_mut().find(|s| s.key == stored.key) {
            Some(existing) => *existing = stored.clone(),
            None => tables.settings.push(stored.clone()),
        }
        Ok(stored)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::models::{Role, UserStatus};

    fn widget(stock: i32) -> NewProduct {
        NewProduct {
            name: "Widget".into(),
            description: Some("A widget".into()),
            price: 1500,
            image_url: Some("/uploads/widget.png".into()),
            category: "tools".into(),
            stock,
        }
    }

    #[tokio::test]
    async fn create_then_get_returns_submitted_fields() {
        let store = MemoryBackend::new();
        let created = store.create_product(widget(5)).await.unwrap();
        let fetched = store.get_product(created.id).await.unwrap().unwrap();
        assert_eq!(fetched.name, "Widget");
        assert_eq!(fetched.description.as_deref(), Some("A widget"));
        assert_eq!(fetched.price, 1500);
        assert_eq!(fetched.image_url.as_deref(), Some("/uploads/widget.png"));
        assert_eq!(fetched.category, "tools");
        assert_eq!(fetched.stock, 5);
    }

    #[tokio::test]
    async fn missing_records_are_absent_not_errors() {
        let store = MemoryBackend::new();
        let id = Uuid::new_v4();
        assert!(!store.delete_product(id).await.unwrap());
        assert!(store.get_product(id).await.unwrap().is_none());
        assert!(
            store
                .update_product(id, ProductPatch::default())
                .await
                .unwrap()
                .is_none()
        );
        assert!(store.update_cart_item(id, 3).await.unwrap().is_none());
        assert!(!store.remove_from_cart(id).await.unwrap());
        assert!(!store.delete_order(id).await.unwrap());
    }

    #[tokio::test]
    async fn order_snapshots_price_and_decrements_stock() {
        let store = MemoryBackend::new();
        let product = store.create_product(widget(5)).await.unwrap();
        let user_id = Uuid::new_v4();

        let order = store
            .create_order(
                user_id,
                vec![NewOrderItem {
                    product_id: product.id,
                    quantity: 2,
                }],
                None,
            )
            .await
            .unwrap();

        assert_eq!(order.total_amount, 3000);
        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.items.len(), 1);
        assert_eq!(order.items[0].price, 1500);
        let after = store.get_product(product.id).await.unwrap().unwrap();
        assert_eq!(after.stock, 3);

        // Later price changes do not rewrite history.
        store
            .update_product(
                product.id,
                ProductPatch {
                    price: Some(9999),
                    ..ProductPatch::default()
                },
            )
            .await
            .unwrap();
        let stored = store.get_order(order.id).await.unwrap().unwrap();
        assert_eq!(stored.items[0].price, 1500);
    }

    #[tokio::test]
    async fn insufficient_stock_rejects_whole_order() {
        let store = MemoryBackend::new();
        let plenty = store.create_product(widget(10)).await.unwrap();
        let scarce = store.create_product(widget(1)).await.unwrap();

        let err = store
            .create_order(
                Uuid::new_v4(),
                vec![
                    NewOrderItem {
                        product_id: plenty.id,
                        quantity: 3,
                    },
                    NewOrderItem {
                        product_id: scarce.id,
                        quantity: 2,
                    },
                ],
                None,
            )
            .await
            .unwrap_err();

        assert!(matches!(err, StoreError::InsufficientStock { available: 1, .. }));
        assert_eq!(store.get_product(plenty.id).await.unwrap().unwrap().stock, 10);
        assert!(store.list_orders().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn concurrent_add_to_cart_merges_into_one_row() {
        let store = Arc::new(MemoryBackend::new());
        let product = store.create_product(widget(50)).await.unwrap();
        let user_id = Uuid::new_v4();
        let product_id = product.id;

        let mut handles = Vec::new();
        for _ in 0..20 {
            let store = Arc::clone(&store);
            handles.push(tokio::spawn(async move {
                store.add_to_cart(user_id, product_id, 1).await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let items = store.get_cart_items(user_id).await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].quantity, 20);
    }

    #[tokio::test]
    async fn duplicate_email_is_a_conflict() {
        let store = MemoryBackend::new();
        let fields = NewUser {
            email: "Ana@example.com".into(),
            username: "ana".into(),
            password_hash: "x".into(),
            role: Role::User,
            status: UserStatus::Active,
        };
        store.create_user(fields.clone()).await.unwrap();
        let err = store
            .create_user(NewUser {
                email: "ana@example.com".into(),
                ..fields
            })
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
        assert_eq!(store.count_users().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn upsert_setting_replaces_by_key() {
        let store = MemoryBackend::new();
        for value in ["Shop", "Ferris Shop"] {
            store
                .upsert_setting(NewSetting {
                    key: "site_name".into(),
                    value: value.into(),
                    category: "general".into(),
                    is_public: true,
                })
                .await
                .unwrap();
        }
        let settings = store.list_settings().await.unwrap();
        assert_eq!(settings.len(), 1);
        assert_eq!(settings[0].value, "Ferris Shop");
    }
}
