#![allow(dead_code)]

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode, header},
};
use serde_json::Value;
use storefront_api::{
    config::{AppConfig, Environment, StorageConfig},
    dto::auth::RegisterRequest,
    middleware::auth::RequestContext,
    models::{NewProduct, Product, User},
    routes::create_app,
    services::auth_service,
    state::AppState,
    store::DataStore,
};
use tower::ServiceExt;
use uuid::Uuid;

pub const PASSWORD: &str = "correct horse battery";

pub fn test_config() -> AppConfig {
    AppConfig {
        host: "127.0.0.1".into(),
        port: 0,
        environment: Environment::Development,
        site_url: "http://localhost:3000".into(),
        jwt_secret: "test-secret".into(),
        upload_dir: std::env::temp_dir().join(format!("storefront-uploads-{}", Uuid::new_v4())),
        storage: StorageConfig::memory(),
    }
}

pub fn memory_state() -> AppState {
    AppState::new(DataStore::memory(), test_config())
}

pub async fn register(state: &AppState, email: &str) -> User {
    auth_service::register_user(
        state,
        RegisterRequest {
            email: email.to_string(),
            password: PASSWORD.to_string(),
            username: None,
        },
    )
    .await
    .expect("registration succeeds")
    .data
    .expect("user in response")
}

pub fn ctx(user: &User) -> RequestContext {
    RequestContext::from_user(user)
}

pub async fn product(state: &AppState, name: &str, price: i64, stock: i32) -> Product {
    state
        .store
        .products()
        .create_product(NewProduct {
            name: name.to_string(),
            description: None,
            price,
            image_url: None,
            category: "general".into(),
            stock,
        })
        .await
        .expect("product created")
}

/// Thin HTTP client over the full router.
pub struct TestApp {
    pub state: AppState,
    pub router: Router,
}

impl TestApp {
    pub fn new(state: AppState) -> Self {
        let router = create_app(state.clone());
        Self { state, router }
    }

    pub async fn request(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, token);
        }
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("valid request");
        self.send(request).await
    }

    pub async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible");
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("readable body");
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, json)
    }

    /// Registers through the API and returns the `Bearer ...` token from login.
    pub async fn sign_up(&self, email: &str) -> String {
        let (status, _) = self
            .request(
                "POST",
                "/api/auth/register",
                None,
                Some(serde_json::json!({ "email": email, "password": PASSWORD })),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "register {email}");

        let (status, body) = self
            .request(
                "POST",
                "/api/auth/login",
                None,
                Some(serde_json::json!({ "email": email, "password": PASSWORD })),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "login {email}");
        body["data"]["token"]
            .as_str()
            .expect("token in login response")
            .to_string()
    }
}
