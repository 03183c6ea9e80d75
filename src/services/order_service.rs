use uuid::Uuid;

use crate::{
    dto::orders::{CreateOrderRequest, OrderList, UpdateOrderRequest},
    error::{AppError, AppResult},
    middleware::auth::{RequestContext, ensure_permission},
    models::{CartItem, NewOrderItem, Order, OrderPatch, Permission},
    response::{ApiResponse, Meta, paginate},
    routes::params::{OrderListQuery, SortOrder},
    state::AppState,
    store::StoreResult,
};

/// Admins see every order; everyone else only their own.
pub async fn list_orders(
    state: &AppState,
    ctx: &RequestContext,
    query: OrderListQuery,
) -> AppResult<ApiResponse<OrderList>> {
    let (page, per_page) = query.pagination().normalize();
    let orders = if ctx.can(Permission::ManageOrders) {
        state.store.orders().list_orders().await?
    } else {
        state.store.orders().list_orders_for_user(ctx.user_id).await?
    };

    let mut orders: Vec<Order> = orders
        .into_iter()
        .filter(|o| query.status.is_none_or(|status| o.status == status))
        .collect();
    orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    if matches!(query.sort_order.unwrap_or_default(), SortOrder::Asc) {
        orders.reverse();
    }

    let (items, meta) = paginate(orders, page, per_page);
    Ok(ApiResponse::success("Orders", OrderList { items }, Some(meta)))
}

pub async fn create_order(
    state: &AppState,
    ctx: &RequestContext,
    payload: CreateOrderRequest,
) -> AppResult<ApiResponse<Order>> {
    let shipping_address = payload
        .shipping_address
        .map(|a| a.trim().to_string())
        .filter(|a| !a.is_empty());

    let (items, consumed) = match payload.items {
        Some(items) => (items, Vec::new()),
        None => {
            let cart = state.store.cart().get_cart_items(ctx.user_id).await?;
            if cart.is_empty() {
                return Err(AppError::BadRequest("Cart is empty".into()));
            }
            let items = cart
                .iter()
                .map(|c| NewOrderItem {
                    product_id: c.product_id,
                    quantity: c.quantity,
                })
                .collect();
            (items, cart)
        }
    };

    let order = state
        .store
        .orders()
        .create_order(ctx.user_id, items, shipping_address)
        .await?;

    // The order already stands; a stale cart is only cosmetic.
    if let Err(err) = release_cart_lines(state, &consumed).await {
        tracing::warn!(error = %err, user_id = %ctx.user_id, "failed to clear cart after checkout");
    }

    tracing::info!(
        user_id = %ctx.user_id,
        order_id = %order.id,
        total_amount = order.total_amount,
        lines = order.items.len(),
        "order created"
    );
    Ok(ApiResponse::success("Order created", order, Some(Meta::empty())))
}

/// Takes the checked-out quantities off the cart. Lines added or topped up
/// while the order was being placed stay behind.
pub async fn release_cart_lines(state: &AppState, consumed: &[CartItem]) -> StoreResult<()> {
    let cart = state.store.cart();
    for line in consumed {
        let Some(current) = cart.get_cart_item(line.id).await? else {
            continue;
        };
        let left = current.quantity - line.quantity;
        if left > 0 {
            cart.update_cart_item(line.id, left).await?;
        } else {
            cart.remove_from_cart(line.id).await?;
        }
    }
    Ok(())
}

pub async fn get_order(
    state: &AppState,
    ctx: &RequestContext,
    id: Uuid,
) -> AppResult<ApiResponse<Order>> {
    let order = state
        .store
        .orders()
        .get_order(id)
        .await?
        .filter(|o| ctx.can_access(o.user_id, Permission::ManageOrders))
        .ok_or(AppError::NotFound)?;
    Ok(ApiResponse::success("Order", order, None))
}

pub async fn update_order(
    state: &AppState,
    ctx: &RequestContext,
    id: Uuid,
    payload: UpdateOrderRequest,
) -> AppResult<ApiResponse<Order>> {
    ensure_permission(ctx, Permission::ManageOrders)?;
    let patch = OrderPatch {
        status: payload.status,
        shipping_address: payload.shipping_address,
    };
    let order = state
        .store
        .orders()
        .update_order(id, patch)
        .await?
        .ok_or(AppError::NotFound)?;

    tracing::info!(user_id = %ctx.user_id, order_id = %id, status = order.status.as_str(), "order updated");
    Ok(ApiResponse::success("Updated", order, Some(Meta::empty())))
}

pub async fn delete_order(
    state: &AppState,
    ctx: &RequestContext,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    ensure_permission(ctx, Permission::ManageOrders)?;
    if !state.store.orders().delete_order(id).await? {
        return Err(AppError::NotFound);
    }

    tracing::info!(user_id = %ctx.user_id, order_id = %id, "order deleted");
    Ok(ApiResponse::success(
        "Deleted",
        serde_json::json!({ "id": id }),
        Some(Meta::empty()),
    ))
}
