use uuid::Uuid;

use crate::{
    dto::cart::{AddToCartRequest, CartLine, CartView, UpdateCartItemRequest},
    error::{AppError, AppResult},
    middleware::auth::RequestContext,
    models::CartItem,
    response::{ApiResponse, Meta},
    state::AppState,
    store::line_total,
};

pub async fn get_cart(state: &AppState, ctx: &RequestContext) -> AppResult<ApiResponse<CartView>> {
    let items = state.store.cart().get_cart_items(ctx.user_id).await?;
    let products = state.store.products();

    let mut lines = Vec::with_capacity(items.len());
    let mut total_amount: i64 = 0;
    for item in items {
        let product = products.get_product(item.product_id).await?;
        let amount = match &product {
            Some(product) => line_total(product.price, item.quantity)?,
            None => 0,
        };
        total_amount = total_amount
            .checked_add(amount)
            .ok_or_else(|| AppError::BadRequest("Cart total is too large".into()))?;
        lines.push(CartLine {
            item,
            product,
            line_total: amount,
        });
    }

    let meta = Meta::new(1, lines.len() as i64, lines.len() as i64);
    Ok(ApiResponse::success(
        "Cart",
        CartView {
            items: lines,
            total_amount,
        },
        Some(meta),
    ))
}

pub async fn add_to_cart(
    state: &AppState,
    ctx: &RequestContext,
    payload: AddToCartRequest,
) -> AppResult<ApiResponse<CartItem>> {
    validate_quantity(payload.quantity)?;
    if state
        .store
        .products()
        .get_product(payload.product_id)
        .await?
        .is_none()
    {
        return Err(AppError::NotFound);
    }

    let item = state
        .store
        .cart()
        .add_to_cart(ctx.user_id, payload.product_id, payload.quantity)
        .await?;

    tracing::info!(
        user_id = %ctx.user_id,
        product_id = %payload.product_id,
        quantity = item.quantity,
        "cart updated"
    );
    Ok(ApiResponse::success("Added to cart", item, None))
}

pub async fn update_cart_item(
    state: &AppState,
    ctx: &RequestContext,
    payload: UpdateCartItemRequest,
) -> AppResult<ApiResponse<CartItem>> {
    validate_quantity(payload.quantity)?;
    owned_item(state, ctx, payload.id).await?;

    let item = state
        .store
        .cart()
        .update_cart_item(payload.id, payload.quantity)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(ApiResponse::success("Updated", item, Some(Meta::empty())))
}

pub async fn remove_from_cart(
    state: &AppState,
    ctx: &RequestContext,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    owned_item(state, ctx, id).await?;
    if !state.store.cart().remove_from_cart(id).await? {
        return Err(AppError::NotFound);
    }

    tracing::info!(user_id = %ctx.user_id, cart_item_id = %id, "removed from cart");
    Ok(ApiResponse::success(
        "Removed from cart",
        serde_json::json!({ "id": id }),
        Some(Meta::empty()),
    ))
}

pub async fn clear_cart(
    state: &AppState,
    ctx: &RequestContext,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let removed = state.store.cart().clear_cart(ctx.user_id).await?;

    tracing::info!(user_id = %ctx.user_id, removed, "cart cleared");
    Ok(ApiResponse::success(
        "Cart cleared",
        serde_json::json!({ "removed": removed }),
        Some(Meta::empty()),
    ))
}

/// Another user's item is reported as missing, not forbidden.
async fn owned_item(state: &AppState, ctx: &RequestContext, id: Uuid) -> AppResult<CartItem> {
    state
        .store
        .cart()
        .get_cart_item(id)
        .await?
        .filter(|item| item.user_id == ctx.user_id)
        .ok_or(AppError::NotFound)
}

fn validate_quantity(quantity: i32) -> AppResult<()> {
    if quantity <= 0 {
        return Err(AppError::BadRequest(
            "quantity must be greater than 0".to_string(),
        ));
    }
    Ok(())
}
