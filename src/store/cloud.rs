//! Postgres-backed implementation of the storage contract.
//!
//! SeaORM entities cover most operations. The cart merge is a raw sqlx
//! upsert so concurrent adds for one (user, product) pair cannot race.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Set, SqlErr, TransactionTrait,
    sea_query::{Expr, Func, LockType, OnConflict},
};
use sqlx::FromRow;
use uuid::Uuid;

use super::{
    Backend, CartStore, OrderStore, ProductStore, SettingStore, StoreError, StoreResult,
    UserStore, line_total, merge_order_lines,
};
use crate::{
    config::StorageConfig,
    db::{DbPool, OrmConn, create_pool, orm_from_pool},
    entity::{
        cart_items::{self, Entity as CartItems},
        order_items::{self, Entity as OrderItems},
        orders::{self, Entity as Orders},
        products::{self, Entity as Products},
        profiles::{self, Entity as Profiles},
        settings::{self, Entity as Settings},
    },
    models::{
        CartItem, NewOrderItem, NewProduct, NewSetting, NewUser, Order, OrderItem, OrderPatch,
        OrderStatus, Product, ProductPatch, Setting, User, UserPatch,
    },
};

#[derive(Clone)]
pub struct CloudBackend {
    pool: DbPool,
    orm: OrmConn,
}

impl CloudBackend {
    pub async fn connect(config: &StorageConfig) -> StoreResult<Self> {
        let url = config
            .cloud_url
            .as_deref()
            .ok_or_else(|| StoreError::Unavailable("CLOUD_DATABASE_URL is not set".into()))?;
        if config.service_key.is_none() {
            tracing::warn!("CLOUD_SERVICE_KEY not set, admin writes run with the public key");
        }
        let pool = create_pool(url, config.connection_key()).await?;
        Ok(Self::from_pool(pool))
    }

    pub fn from_pool(pool: DbPool) -> Self {
        let orm = orm_from_pool(pool.clone());
        Self { pool, orm }
    }

    pub fn orm(&self) -> &OrmConn {
        &self.orm
    }

    async fn load_items(
        conn: &OrmConn,
        order_ids: Vec<Uuid>,
    ) -> StoreResult<HashMap<Uuid, Vec<OrderItem>>> {
        let mut grouped: HashMap<Uuid, Vec<OrderItem>> = HashMap::new();
        if order_ids.is_empty() {
            return Ok(grouped);
        }
        let items = OrderItems::find()
            .filter(order_items::Column::OrderId.is_in(order_ids))
            .all(conn)
            .await?;
        for item in items {
            grouped
                .entry(item.order_id)
                .or_default()
                .push(order_item_from_entity(item));
        }
        Ok(grouped)
    }

    async fn with_items(&self, models: Vec<orders::Model>) -> StoreResult<Vec<Order>> {
        let ids = models.iter().map(|o| o.id).collect();
        let mut items = Self::load_items(&self.orm, ids).await?;
        models
            .into_iter()
            .map(|model| {
                let lines = items.remove(&model.id).unwrap_or_default();
                order_from_entity(model, lines)
            })
            .collect()
    }
}

#[async_trait]
impl Backend for CloudBackend {
    fn name(&self) -> &'static str {
        "cloud"
    }

    async fn ping(&self) -> StoreResult<()> {
        self.orm.ping().await?;
        Ok(())
    }
}

#[async_trait]
impl ProductStore for CloudBackend {
    async fn list_products(&self) -> StoreResult<Vec<Product>> {
        Ok(Products::find()
            .order_by_desc(products::Column::CreatedAt)
            .all(&self.orm)
            .await?
            .into_iter()
            .map(product_from_entity)
            .collect())
    }

    async fn get_product(&self, id: Uuid) -> StoreResult<Option<Product>> {
        Ok(Products::find_by_id(id)
            .one(&self.orm)
            .await?
            .map(product_from_entity))
    }

    async fn create_product(&self, fields: NewProduct) -> StoreResult<Product> {
        let now = Utc::now();
        let product = products::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(fields.name),
            description: Set(fields.description),
            price: Set(fields.price),
            image_url: Set(fields.image_url),
            category: Set(fields.category),
            stock: Set(fields.stock),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        }
        .insert(&self.orm)
        .await?;
        Ok(product_from_entity(product))
    }

    async fn update_product(&self, id: Uuid, patch: ProductPatch) -> StoreResult<Option<Product>> {
        let Some(existing) = Products::find_by_id(id).one(&self.orm).await? else {
            return Ok(None);
        };
        let mut active: products::ActiveModel = existing.into();
        if let Some(name) = patch.name {
            active.name = Set(name);
        }
        if let Some(description) = patch.description {
            active.description = Set(Some(description));
        }
        if let Some(price) = patch.price {
            active.price = Set(price);
        }
        if let Some(image_url) = patch.image_url {
            active.image_url = Set(Some(image_url));
        }
        if let Some(category) = patch.category {
            active.category = Set(category);
        }
        if let Some(stock) = patch.stock {
            active.stock = Set(stock);
        }
        active.updated_at = Set(Utc::now().into());
        let product = active.update(&self.orm).await?;
        Ok(Some(product_from_entity(product)))
    }

    async fn delete_product(&self, id: Uuid) -> StoreResult<bool> {
        let result = Products::delete_by_id(id).exec(&self.orm).await?;
        Ok(result.rows_affected > 0)
    }
}

#[async_trait]
impl UserStore for CloudBackend {
    async fn list_users(&self) -> StoreResult<Vec<User>> {
        Profiles::find()
            .order_by_desc(profiles::Column::CreatedAt)
            .all(&self.orm)
            .await?
            .into_iter()
            .map(user_from_entity)
            .collect()
    }

    async fn get_user(&self, id: Uuid) -> StoreResult<Option<User>> {
        Profiles::find_by_id(id)
            .one(&self.orm)
            .await?
            .map(user_from_entity)
            .transpose()
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        Profiles::find()
            .filter(
                Expr::expr(Func::lower(Expr::col(profiles::Column::Email)))
                    .eq(email.to_lowercase()),
            )
            .one(&self.orm)
            .await?
            .map(user_from_entity)
            .transpose()
    }

    async fn create_user(&self, fields: NewUser) -> StoreResult<User> {
        if self.find_user_by_email(&fields.email).await?.is_some() {
            return Err(email_taken());
        }
        let now = Utc::now();
        let profile = profiles::ActiveModel {
            id: Set(Uuid::new_v4()),
            email: Set(fields.email),
            username: Set(fields.username),
            password_hash: Set(fields.password_hash),
            role: Set(fields.role.as_str().to_string()),
            status: Set(fields.status.as_str().to_string()),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        }
        .insert(&self.orm)
        .await
        .map_err(|err| match err.sql_err() {
            // A concurrent registration won the race past the lookup above.
            Some(SqlErr::UniqueConstraintViolation(_)) => email_taken(),
            _ => StoreError::from(err),
        })?;
        user_from_entity(profile)
    }

    async fn update_user(&self, id: Uuid, patch: UserPatch) -> StoreResult<Option<User>> {
        let Some(existing) = Profiles::find_by_id(id).one(&self.orm).await? else {
            return Ok(None);
        };
        let mut active: profiles::ActiveModel = existing.into();
        if let Some(username) = patch.username {
            active.username = Set(username);
        }
        if let Some(password_hash) = patch.password_hash {
            active.password_hash = Set(password_hash);
        }
        if let Some(role) = patch.role {
            active.role = Set(role.as_str().to_string());
        }
        if let Some(status) = patch.status {
            active.status = Set(status.as_str().to_string());
        }
        active.updated_at = Set(Utc::now().into());
        let profile = active.update(&self.orm).await?;
        user_from_entity(profile).map(Some)
    }

    async fn delete_user(&self, id: Uuid) -> StoreResult<bool> {
        let result = Profiles::delete_by_id(id).exec(&self.orm).await?;
        Ok(result.rows_affected > 0)
    }

    async fn count_users(&self) -> StoreResult<u64> {
        Ok(Profiles::find().count(&self.orm).await?)
    }

    async fn count_users_created_since(&self, since: DateTime<Utc>) -> StoreResult<u64> {
        Ok(Profiles::find()
            .filter(profiles::Column::CreatedAt.gte(since))
            .count(&self.orm)
            .await?)
    }
}

fn email_taken() -> StoreError {
    StoreError::Conflict("Email is already taken".into())
}

#[derive(FromRow)]
struct CartRow {
    id: Uuid,
    user_id: Uuid,
    product_id: Uuid,
    quantity: i32,
    created_at: DateTime<Utc>,
}

impl From<CartRow> for CartItem {
    fn from(row: CartRow) -> Self {
        CartItem {
            id: row.id,
            user_id: row.user_id,
            product_id: row.product_id,
            quantity: row.quantity,
            created_at: row.created_at,
        }
    }
}

#[async_trait]
impl CartStore for CloudBackend {
    async fn get_cart_items(&self, user_id: Uuid) -> StoreResult<Vec<CartItem>> {
        Ok(CartItems::find()
            .filter(cart_items::Column::UserId.eq(user_id))
            .order_by_asc(cart_items::Column::CreatedAt)
            .all(&self.orm)
            .await?
            .into_iter()
            .map(cart_item_from_entity)
            .collect())
    }

    async fn get_cart_item(&self, id: Uuid) -> StoreResult<Option<CartItem>> {
        Ok(CartItems::find_by_id(id)
            .one(&self.orm)
            .await?
            .map(cart_item_from_entity))
    }

    async fn add_to_cart(
        &self,
        user_id: Uuid,
        product_id: Uuid,
        quantity: i32,
    ) -> StoreResult<CartItem> {
        let row = sqlx::query_as::<_, CartRow>(
            r#"
            INSERT INTO cart_items (id, user_id, product_id, quantity)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (user_id, product_id)
            DO UPDATE SET quantity = cart_items.quantity + EXCLUDED.quantity
            RETURNING id, user_id, product_id, quantity, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(product_id)
        .bind(quantity)
        .fetch_one(&self.pool)
        .await?;
        Ok(row.into())
    }

    async fn update_cart_item(&self, id: Uuid, quantity: i32) -> StoreResult<Option<CartItem>> {
        let row = sqlx::query_as::<_, CartRow>(
            r#"
            UPDATE cart_items SET quantity = $2
            WHERE id = $1
            RETURNING id, user_id, product_id, quantity, created_at
            "#,
        )
        .bind(id)
        .bind(quantity)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(CartItem::from))
    }

    async fn remove_from_cart(&self, id: Uuid) -> StoreResult<bool> {
        let result = CartItems::delete_by_id(id).exec(&self.orm).await?;
        Ok(result.rows_affected > 0)
    }

    async fn clear_cart(&self, user_id: Uuid) -> StoreResult<u64> {
        let result = CartItems::delete_many()
            .filter(cart_items::Column::UserId.eq(user_id))
            .exec(&self.orm)
            .await?;
        Ok(result.rows_affected)
    }
}

#[async_trait]
impl OrderStore for CloudBackend {
    async fn list_orders(&self) -> StoreResult<Vec<Order>> {
        let models = Orders::find()
            .order_by_desc(orders::Column::CreatedAt)
            .all(&self.orm)
            .await?;
        self.with_items(models).await
    }

    async fn list_orders_for_user(&self, user_id: Uuid) -> StoreResult<Vec<Order>> {
        let models = Orders::find()
            .filter(orders::Column::UserId.eq(user_id))
            .order_by_desc(orders::Column::CreatedAt)
            .all(&self.orm)
            .await?;
        self.with_items(models).await
    }

    async fn get_order(&self, id: Uuid) -> StoreResult<Option<Order>> {
        let Some(model) = Orders::find_by_id(id).one(&self.orm).await? else {
            return Ok(None);
        };
        let mut orders = self.with_items(vec![model]).await?;
        Ok(orders.pop())
    }

    async fn create_order(
        &self,
        user_id: Uuid,
        items: Vec<NewOrderItem>,
        shipping_address: Option<String>,
    ) -> StoreResult<Order> {
        let lines = merge_order_lines(&items)?;
        // Dropping the transaction on an early return rolls it back.
        let txn = self.orm.begin().await?;

        let mut priced = Vec::with_capacity(lines.len());
        let mut total_amount: i64 = 0;
        for line in &lines {
            let product = Products::find_by_id(line.product_id)
                .lock(LockType::Update)
                .one(&txn)
                .await?
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
        let order = orders::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(user_id),
            status: Set(OrderStatus::Pending.as_str().to_string()),
            total_amount: Set(total_amount),
            shipping_address: Set(shipping_address),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        }
        .insert(&txn)
        .await?;

        let mut order_lines = Vec::with_capacity(priced.len());
        for (line, price) in priced {
            let item = order_items::ActiveModel {
                id: Set(Uuid::new_v4()),
                order_id: Set(order.id),
                product_id: Set(line.product_id),
                quantity: Set(line.quantity),
                price: Set(price),
            }
            .insert(&txn)
            .await?;
            order_lines.push(order_item_from_entity(item));

            Products::update_many()
                .col_expr(
                    products::Column::Stock,
                    Expr::col(products::Column::Stock).sub(line.quantity),
                )
                .col_expr(products::Column::UpdatedAt, Expr::value(now))
                .filter(products::Column::Id.eq(line.product_id))
                .exec(&txn)
                .await?;
        }

        txn.commit().await?;
        order_from_entity(order, order_lines)
    }

    async fn update_order(&self, id: Uuid, patch: OrderPatch) -> StoreResult<Option<Order>> {
        let Some(existing) = Orders::find_by_id(id).one(&self.orm).await? else {
            return Ok(None);
        };
        let mut active: orders::ActiveModel = existing.into();
        if let Some(status) = patch.status {
            active.status = Set(status.as_str().to_string());
        }
        if let Some(address) = patch.shipping_address {
            active.shipping_address = Set(Some(address));
        }
        active.updated_at = Set(Utc::now().into());
        let model = active.update(&self.orm).await?;
        let mut orders = self.with_items(vec![model]).await?;
        Ok(orders.pop())
    }

    async fn delete_order(&self, id: Uuid) -> StoreResult<bool> {
        let result = Orders::delete_by_id(id).exec(&self.orm).await?;
        Ok(result.rows_affected > 0)
    }
}

#[async_trait]
impl SettingStore for CloudBackend {
    async fn list_settings(&self) -> StoreResult<Vec<Setting>> {
        Ok(Settings::find()
            .order_by_asc(settings::Column::Category)
            .order_by_asc(settings::Column::Key)
            .all(&self.orm)
            .await?
            .into_iter()
            .map(setting_from_entity)
            .collect())
    }

    async fn get_setting(&self, key: &str) -> StoreResult<Option<Setting>> {
        Ok(Settings::find_by_id(key.to_string())
            .one(&self.orm)
            .await?
            .map(setting_from_entity))
    }

    async fn upsert_setting(&self, setting: NewSetting) -> StoreResult<Setting> {
        let key = setting.key.clone();
        let active = settings::ActiveModel {
            key: Set(setting.key),
            value: Set(setting.value),
            category: Set(setting.category),
            is_public: Set(setting.is_public),
            updated_at: Set(Utc::now().into()),
        };
        Settings::insert(active)
            .on_conflict(
                OnConflict::column(settings::Column::Key)
                    .update_columns([
                        settings::Column::Value,
                        settings::Column::Category,
                        settings::Column::IsPublic,
                        settings::Column::UpdatedAt,
                    ])
                    .to_owned(),
            )
            .exec(&self.orm)
            .await?;
        self.get_setting(&key)
            .await?
            .ok_or_else(|| StoreError::Database(format!("setting '{key}' vanished after upsert")))
    }
}

fn product_from_entity(model: products::Model) -> Product {
    Product {
        id: model.id,
        name: model.name,
        description: model.description,
        price: model.price,
        image_url: model.image_url,
        category: model.category,
        stock: model.stock,
        created_at: model.created_at.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
    }
}

fn user_from_entity(model: profiles::Model) -> StoreResult<User> {
    Ok(User {
        id: model.id,
        email: model.email,
        username: model.username,
        password_hash: model.password_hash,
        role: model.role.parse()?,
        status: model.status.parse()?,
        created_at: model.created_at.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
    })
}

fn cart_item_from_entity(model: cart_items::Model) -> CartItem {
    CartItem {
        id: model.id,
        user_id: model.user_id,
        product_id: model.product_id,
        quantity: model.quantity,
        created_at: model.created_at.with_timezone(&Utc),
    }
}

fn order_from_entity(model: orders::Model, items: Vec<OrderItem>) -> StoreResult<Order> {
    Ok(Order {
        id: model.id,
        user_id: model.user_id,
        status: model.status.parse()?,
        total_amount: model.total_amount,
        shipping_address: model.shipping_address,
        items,
        created_at: model.created_at.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
    })
}

fn order_item_from_entity(model: order_items::Model) -> OrderItem {
    OrderItem {
        id: model.id,
        order_id: model.order_id,
        product_id: model.product_id,
        quantity: model.quantity,
        price: model.price,
    }
}

fn setting_from_entity(model: settings::Model) -> Setting {
    Setting {
        key: model.key,
        value: model.value,
        category: model.category,
        is_public: model.is_public,
        updated_at: model.updated_at.with_timezone(&Utc),
    }
}
