use uuid::Uuid;

use crate::{
    dto::products::{CreateProductRequest, ProductList, UpdateProductRequest},
    error::{AppError, AppResult},
    middleware::auth::{RequestContext, ensure_permission},
    models::{NewProduct, Permission, Product, ProductPatch},
    response::{ApiResponse, Meta, paginate},
    routes::params::ProductQuery,
    services::required,
    state::AppState,
};

pub const DEFAULT_CATEGORY: &str = "general";

pub async fn list_products(
    state: &AppState,
    query: ProductQuery,
) -> AppResult<ApiResponse<ProductList>> {
    let (page, per_page) = query.pagination().normalize();
    let mut products: Vec<Product> = state
        .store
        .products()
        .list_products()
        .await?
        .into_iter()
        .filter(|p| query.matches(p))
        .collect();
    query.sort(&mut products);

    let (items, meta) = paginate(products, page, per_page);
    Ok(ApiResponse::success("Products", ProductList { items }, Some(meta)))
}

pub async fn get_product(state: &AppState, id: Uuid) -> AppResult<ApiResponse<Product>> {
    let product = state
        .store
        .products()
        .get_product(id)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(ApiResponse::success("Product", product, None))
}

pub async fn create_product(
    state: &AppState,
    ctx: &RequestContext,
    payload: CreateProductRequest,
) -> AppResult<ApiResponse<Product>> {
    ensure_permission(ctx, Permission::ManageCatalog)?;
    let name = required(&payload.name, "name")?;
    validate_price(payload.price)?;
    validate_stock(payload.stock)?;

    let category = payload
        .category
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty())
        .unwrap_or_else(|| DEFAULT_CATEGORY.to_string());

    let product = state
        .store
        .products()
        .create_product(NewProduct {
            name,
            description: payload.description,
            price: payload.price,
            image_url: payload.image_url,
            category,
            stock: payload.stock,
        })
        .await?;

    tracing::info!(user_id = %ctx.user_id, product_id = %product.id, "product created");
    Ok(ApiResponse::success(
        "Product created",
        product,
        Some(Meta::empty()),
    ))
}

pub async fn update_product(
    state: &AppState,
    ctx: &RequestContext,
    id: Uuid,
    payload: UpdateProductRequest,
) -> AppResult<ApiResponse<Product>> {
    ensure_permission(ctx, Permission::ManageCatalog)?;
    let name = payload
        .name
        .as_deref()
        .map(|n| required(n, "name"))
        .transpose()?;
    if let Some(price) = payload.price {
        validate_price(price)?;
    }
    if let Some(stock) = payload.stock {
        validate_stock(stock)?;
    }

    let patch = ProductPatch {
        name,
        description: payload.description,
        price: payload.price,
        image_url: payload.image_url,
        category: payload.category,
        stock: payload.stock,
    };
    let product = state
        .store
        .products()
        .update_product(id, patch)
        .await?
        .ok_or(AppError::NotFound)?;

    tracing::info!(user_id = %ctx.user_id, product_id = %product.id, "product updated");
    Ok(ApiResponse::success("Updated", product, Some(Meta::empty())))
}

pub async fn delete_product(
    state: &AppState,
    ctx: &RequestContext,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    ensure_permission(ctx, Permission::ManageCatalog)?;
    if !state.store.products().delete_product(id).await? {
        return Err(AppError::NotFound);
    }

    tracing::info!(user_id = %ctx.user_id, product_id = %id, "product deleted");
    Ok(ApiResponse::success(
        "Deleted",
        serde_json::json!({ "id": id }),
        Some(Meta::empty()),
    ))
}

fn validate_price(price: i64) -> AppResult<()> {
    if price < 0 {
        return Err(AppError::BadRequest("price must not be negative".into()));
    }
    Ok(())
}

fn validate_stock(stock: i32) -> AppResult<()> {
    if stock < 0 {
        return Err(AppError::BadRequest("stock must not be negative".into()));
    }
    Ok(())
}
