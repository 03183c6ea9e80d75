use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::{NewOrderItem, Order, OrderStatus};

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct CreateOrderRequest {
    /// Lines to order. When omitted the caller's cart is checked out.
    pub items: Option<Vec<NewOrderItem>>,
    pub shipping_address: Option<String>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateOrderRequest {
    pub status: Option<OrderStatus>,
    pub shipping_address: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(transparent)]
pub struct OrderList {
    #[schema(value_type = Vec<Order>)]
    pub items: Vec<Order>,
}
