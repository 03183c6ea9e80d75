use utoipa::{
    Modify, OpenApi,
    openapi::{
        self,
        OpenApi as OpenApiSpec,
        security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    },
};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    dto::{
        auth::{LoginRequest, LoginResponse, RegisterRequest},
        cart::{AddToCartRequest, CartLine, CartView, UpdateCartItemRequest},
        orders::{CreateOrderRequest, OrderList, UpdateOrderRequest},
        products::{CreateProductRequest, ProductList, UpdateProductRequest},
        settings::{BulkSettingsRequest, PublicSettings, SettingList, UpsertSettingRequest},
        upload::UploadedFile,
        users::{CreateUserRequest, UpdateUserRequest, UserList},
    },
    models::{
        CartItem, NewOrderItem, Order, OrderItem, OrderStatus, Product, Role, Setting, User,
        UserStatus,
    },
    response::{ApiResponse, Meta},
    routes::{auth, cart, health, orders, params, products, settings, upload, users},
};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        auth::register,
        auth::login,
        auth::me,
        products::list_products,
        products::create_product,
        products::get_product,
        products::update_product,
        products::delete_product,
        users::list_users,
        users::create_user,
        users::get_user,
        users::update_user,
        users::delete_user,
        cart::get_cart,
        cart::add_to_cart,
        cart::update_cart_item,
        cart::remove_from_cart,
        orders::list_orders,
        orders::create_order,
        orders::get_order,
        orders::update_order,
        orders::delete_order,
        settings::list_settings,
        settings::upsert_setting,
        settings::bulk_upsert_settings,
        settings::public_settings,
        upload::upload_image
    ),
    components(
        schemas(
            User,
            Role,
            UserStatus,
            Product,
            CartItem,
            Order,
            OrderItem,
            OrderStatus,
            NewOrderItem,
            Setting,
            RegisterRequest,
            LoginRequest,
            LoginResponse,
            CreateProductRequest,
            UpdateProductRequest,
            ProductList,
            CreateUserRequest,
            UpdateUserRequest,
            UserList,
            AddToCartRequest,
            UpdateCartItemRequest,
            CartLine,
            CartView,
            CreateOrderRequest,
            UpdateOrderRequest,
            OrderList,
            UpsertSettingRequest,
            BulkSettingsRequest,
            SettingList,
            PublicSettings,
            UploadedFile,
            params::SortOrder,
            params::ProductSortBy,
            Meta,
            health::HealthData,
            ApiResponse<Product>,
            ApiResponse<ProductList>,
            ApiResponse<User>,
            ApiResponse<UserList>,
            ApiResponse<CartView>,
            ApiResponse<Order>,
            ApiResponse<OrderList>,
            ApiResponse<SettingList>,
            ApiResponse<UploadedFile>
        )
    ),
    security(
        ("bearer_auth" = [])
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Liveness and storage backend status"),
        (name = "Auth", description = "Registration, login and the current profile"),
        (name = "Products", description = "Catalog browsing and admin management"),
        (name = "Users", description = "Profile management"),
        (name = "Cart", description = "Shopping cart of the caller"),
        (name = "Orders", description = "Order placement and back-office handling"),
        (name = "Settings", description = "Shop settings"),
        (name = "Upload", description = "Product image upload"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}
