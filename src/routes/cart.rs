use axum::{
    Json, Router,
    extract::State,
    routing::get,
};

use crate::{
    dto::cart::{AddToCartRequest, CartView, RemoveCartQuery, UpdateCartItemRequest},
    error::AppResult,
    middleware::{auth::RequestContext, json::{AppJson, AppQuery}},
    models::CartItem,
    response::ApiResponse,
    services::cart_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new().route(
        "/",
        get(get_cart)
            .post(add_to_cart)
            .put(update_cart_item)
            .delete(remove_from_cart),
    )
}

#[utoipa::path(
    get,
    path = "/api/cart",
    responses(
        (status = 200, description = "Current user's cart with product details", body = ApiResponse<CartView>),
        (status = 401, description = "Unauthorized")
    ),
    tag = "Cart"
)]
pub async fn get_cart(
    State(state): State<AppState>,
    ctx: RequestContext,
) -> AppResult<Json<ApiResponse<CartView>>> {
    let resp = cart_service::get_cart(&state, &ctx).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/cart",
    request_body = AddToCartRequest,
    responses(
        (status = 200, description = "Added, or merged into an existing line", body = ApiResponse<CartItem>),
        (status = 400, description = "Invalid quantity"),
        (status = 404, description = "Product not found")
    ),
    tag = "Cart"
)]
pub async fn add_to_cart(
    State(state): State<AppState>,
    ctx: RequestContext,
    AppJson(payload): AppJson<AddToCartRequest>,
) -> AppResult<Json<ApiResponse<CartItem>>> {
    let resp = cart_service::add_to_cart(&state, &ctx, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    put,
    path = "/api/cart",
    request_body = UpdateCartItemRequest,
    responses(
        (status = 200, description = "Quantity replaced", body = ApiResponse<CartItem>),
        (status = 400, description = "Invalid quantity"),
        (status = 404, description = "Cart item not found")
    ),
    tag = "Cart"
)]
pub async fn update_cart_item(
    State(state): State<AppState>,
    ctx: RequestContext,
    AppJson(payload): AppJson<UpdateCartItemRequest>,
) -> AppResult<Json<ApiResponse<CartItem>>> {
    let resp = cart_service::update_cart_item(&state, &ctx, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/cart",
    params(RemoveCartQuery),
    responses(
        (status = 200, description = "Removed one item, or cleared the cart when no id is given"),
        (status = 404, description = "Cart item not found")
    ),
    tag = "Cart"
)]
pub async fn remove_from_cart(
    State(state): State<AppState>,
    ctx: RequestContext,
    AppQuery(query): AppQuery<RemoveCartQuery>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let resp = match query.id {
        Some(id) => cart_service::remove_from_cart(&state, &ctx, id).await?,
        None => cart_service::clear_cart(&state, &ctx).await?,
    };
    Ok(Json(resp))
}
