mod common;

use axum::{
    body::Body,
    http::{Request, StatusCode, header},
};
use serde_json::json;
use tower::ServiceExt;
use uuid::Uuid;

use common::{TestApp, memory_state};
use storefront_api::routes::params::MAX_PAGE;

#[tokio::test]
async fn protected_routes_require_a_token() {
    let app = TestApp::new(memory_state());

    let (status, _) = app.request("GET", "/api/cart", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app
        .request("GET", "/api/orders", Some("Bearer not-a-jwt"), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // Catalog browsing stays public.
    let (status, _) = app.request("GET", "/api/products", None, None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn catalog_management_is_admin_only() {
    let app = TestApp::new(memory_state());
    let admin = app.sign_up("owner@example.com").await;
    let member = app.sign_up("member@example.com").await;
    let widget = json!({ "name": "Widget", "price": 1500, "stock": 3 });

    let (status, _) = app
        .request("POST", "/api/products", Some(&member), Some(widget.clone()))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = app
        .request("POST", "/api/products", Some(&admin), Some(widget))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["name"], "Widget");
    assert_eq!(body["data"]["category"], "general");

    let (status, body) = app
        .request(
            "POST",
            "/api/products",
            Some(&admin),
            Some(json!({ "price": 10 })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].is_string());

    let (status, _) = app
        .request(
            "POST",
            "/api/products",
            Some(&admin),
            Some(json!({ "name": "Broken", "price": -1 })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn missing_records_are_not_found() {
    let app = TestApp::new(memory_state());
    let admin = app.sign_up("owner@example.com").await;
    let missing = Uuid::new_v4();

    for uri in [
        format!("/api/products/{missing}"),
        format!("/api/orders/{missing}"),
        format!("/api/users/{missing}"),
    ] {
        let (status, _) = app.request("GET", &uri, Some(&admin), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{uri}");
    }

    let (status, _) = app
        .request(
            "PUT",
            &format!("/api/products/{missing}"),
            Some(&admin),
            Some(json!({ "price": 100 })),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn product_listing_filters_sorts_and_paginates() {
    let app = TestApp::new(memory_state());
    let admin = app.sign_up("owner@example.com").await;
    for (name, price, category) in [
        ("Red Mug", 300, "kitchen"),
        ("Blue Mug", 100, "kitchen"),
        ("Hoodie", 900, "apparel"),
    ] {
        let (status, _) = app
            .request(
                "POST",
                "/api/products",
                Some(&admin),
                Some(json!({ "name": name, "price": price, "category": category, "stock": 1 })),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
    }

    let (_, body) = app
        .request(
            "GET",
            "/api/products?category=kitchen&sort_by=price&sort_order=asc",
            None,
            None,
        )
        .await;
    let names: Vec<&str> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, ["Blue Mug", "Red Mug"]);

    let (_, body) = app
        .request("GET", "/api/products?q=mug&per_page=1&page=2", None, None)
        .await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
    assert_eq!(body["meta"]["total"], 2);
    assert_eq!(body["meta"]["page"], 2);
}

#[tokio::test]
async fn cart_checkout_reserves_stock_and_clears_cart() {
    let app = TestApp::new(memory_state());
    let admin = app.sign_up("owner@example.com").await;
    let member = app.sign_up("member@example.com").await;

    let (_, body) = app
        .request(
            "POST",
            "/api/products",
            Some(&admin),
            Some(json!({ "name": "Widget", "price": 1000, "stock": 5 })),
        )
        .await;
    let product_id = body["data"]["id"].as_str().unwrap().to_string();

    for _ in 0..2 {
        let (status, _) = app
            .request(
                "POST",
                "/api/cart",
                Some(&member),
                Some(json!({ "product_id": product_id, "quantity": 1 })),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
    }

    let (status, cart) = app.request("GET", "/api/cart", Some(&member), None).await;
    assert_eq!(status, StatusCode::OK);
    let lines = cart["data"]["items"].as_array().unwrap();
    assert_eq!(lines.len(), 1, "same product merges into one line");
    assert_eq!(lines[0]["quantity"], 2);
    assert_eq!(lines[0]["product"]["name"], "Widget");
    assert_eq!(cart["data"]["total_amount"], 2000);

    let (status, order) = app
        .request(
            "POST",
            "/api/orders",
            Some(&member),
            Some(json!({ "shipping_address": "1 Ferris Way" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(order["data"]["total_amount"], 2000);
    assert_eq!(order["data"]["status"], "pending");
    assert_eq!(order["data"]["items"][0]["price"], 1000);

    let (_, product) = app
        .request("GET", &format!("/api/products/{product_id}"), None, None)
        .await;
    assert_eq!(product["data"]["stock"], 3);

    let (_, cart) = app.request("GET", "/api/cart", Some(&member), None).await;
    assert!(cart["data"]["items"].as_array().unwrap().is_empty());

    let (status, _) = app
        .request("POST", "/api/orders", Some(&member), Some(json!({})))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "empty cart cannot be checked out");
}

#[tokio::test]
async fn cart_items_of_other_users_are_invisible() {
    let app = TestApp::new(memory_state());
    let admin = app.sign_up("owner@example.com").await;
    let alice = app.sign_up("alice@example.com").await;
    let bob = app.sign_up("bob@example.com").await;

    let (_, body) = app
        .request(
            "POST",
            "/api/products",
            Some(&admin),
            Some(json!({ "name": "Widget", "price": 10, "stock": 5 })),
        )
        .await;
    let product_id = body["data"]["id"].as_str().unwrap().to_string();

    let (_, item) = app
        .request(
            "POST",
            "/api/cart",
            Some(&alice),
            Some(json!({ "product_id": product_id })),
        )
        .await;
    let item_id = item["data"]["id"].as_str().unwrap().to_string();
    assert_eq!(item["data"]["quantity"], 1);

    let (status, _) = app
        .request(
            "PUT",
            "/api/cart",
            Some(&bob),
            Some(json!({ "id": item_id, "quantity": 4 })),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app
        .request("DELETE", &format!("/api/cart?id={item_id}"), Some(&bob), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app
        .request(
            "PUT",
            "/api/cart",
            Some(&alice),
            Some(json!({ "id": item_id, "quantity": 0 })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .request("DELETE", &format!("/api/cart?id={item_id}"), Some(&alice), None)
        .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn members_only_see_their_own_orders() {
    let app = TestApp::new(memory_state());
    let admin = app.sign_up("owner@example.com").await;
    let alice = app.sign_up("alice@example.com").await;
    let bob = app.sign_up("bob@example.com").await;

    let (_, body) = app
        .request(
            "POST",
            "/api/products",
            Some(&admin),
            Some(json!({ "name": "Widget", "price": 250, "stock": 10 })),
        )
        .await;
    let product_id = body["data"]["id"].as_str().unwrap().to_string();

    let (status, order) = app
        .request(
            "POST",
            "/api/orders",
            Some(&alice),
            Some(json!({ "items": [{ "product_id": product_id, "quantity": 2 }] })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let order_id = order["data"]["id"].as_str().unwrap().to_string();

    let (_, listed) = app.request("GET", "/api/orders", Some(&bob), None).await;
    assert!(listed["data"].as_array().unwrap().is_empty());

    let (status, _) = app
        .request("GET", &format!("/api/orders/{order_id}"), Some(&bob), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app
        .request(
            "PUT",
            &format!("/api/orders/{order_id}"),
            Some(&alice),
            Some(json!({ "status": "cancelled" })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (_, listed) = app.request("GET", "/api/orders", Some(&admin), None).await;
    assert_eq!(listed["data"].as_array().unwrap().len(), 1);

    let (status, updated) = app
        .request(
            "PUT",
            &format!("/api/orders/{order_id}"),
            Some(&admin),
            Some(json!({ "status": "delivered" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["data"]["status"], "completed");

    let (_, filtered) = app
        .request("GET", "/api/orders?status=pending", Some(&admin), None)
        .await;
    assert!(filtered["data"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn user_management_is_admin_only_except_own_profile() {
    let app = TestApp::new(memory_state());
    let admin = app.sign_up("owner@example.com").await;
    let member = app.sign_up("member@example.com").await;

    let (_, me) = app.request("GET", "/api/auth/me", Some(&member), None).await;
    assert_eq!(me["data"]["role"], "user");
    assert!(me["data"].get("password_hash").is_none());
    let member_id = me["data"]["id"].as_str().unwrap().to_string();

    let (status, _) = app
        .request("GET", &format!("/api/users/{member_id}"), Some(&member), None)
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app.request("GET", "/api/users", Some(&member), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, users) = app.request("GET", "/api/users", Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(users["meta"]["total"], 2);

    let (status, _) = app
        .request(
            "PUT",
            &format!("/api/users/{member_id}"),
            Some(&admin),
            Some(json!({ "status": "inactive" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    // Deactivated accounts keep a valid token but lose access.
    let (status, _) = app.request("GET", "/api/auth/me", Some(&member), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn only_public_settings_are_exposed() {
    let app = TestApp::new(memory_state());
    let admin = app.sign_up("owner@example.com").await;

    let (status, saved) = app
        .request(
            "PUT",
            "/api/admin/settings",
            Some(&admin),
            Some(json!({ "settings": [
                { "key": "site_name", "value": "Ferris Shop", "is_public": true },
                { "key": "smtp_password", "value": "hunter2", "category": "mail" }
            ] })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(saved["data"].as_array().unwrap().len(), 2);

    let (status, public) = app.request("GET", "/api/settings", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(public["data"]["site_name"], "Ferris Shop");
    assert!(public["data"].get("smtp_password").is_none());

    let (_, mail) = app
        .request("GET", "/api/admin/settings?category=mail", Some(&admin), None)
        .await;
    assert_eq!(mail["data"].as_array().unwrap().len(), 1);
}

fn multipart(boundary: &str, content_type: &str, filename: &str, bytes: &[u8]) -> Vec<u8> {
    let mut body = format!(
        "--{boundary}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{filename}\"\r\nContent-Type: {content_type}\r\n\r\n"
    )
    .into_bytes();
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());
    body
}

fn upload_request(token: &str, content_type: &str, filename: &str, bytes: &[u8]) -> Request<Body> {
    let boundary = "storefront-test-boundary";
    Request::builder()
        .method("POST")
        .uri("/api/upload")
        .header(header::AUTHORIZATION, token)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={boundary}"),
        )
        .body(Body::from(multipart(boundary, content_type, filename, bytes)))
        .unwrap()
}

#[tokio::test]
async fn admins_upload_images_that_are_served_back() {
    let app = TestApp::new(memory_state());
    let admin = app.sign_up("owner@example.com").await;
    let member = app.sign_up("member@example.com").await;
    let png = b"\x89PNG\r\n\x1a\nnot really a png";

    let (status, _) = app.send(upload_request(&member, "image/png", "a.png", png)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app
        .send(upload_request(&admin, "text/plain", "notes.txt", b"hello"))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = app.send(upload_request(&admin, "image/png", "a.png", png)).await;
    assert_eq!(status, StatusCode::OK);
    let url = body["data"]["url"].as_str().unwrap().to_string();
    assert!(url.starts_with("/uploads/") && url.ends_with(".png"));

    let filename = body["data"]["filename"].as_str().unwrap();
    let stored = std::fs::read(app.state.config.upload_dir.join(filename)).unwrap();
    assert_eq!(stored, png);

    let served = app
        .router
        .clone()
        .oneshot(Request::builder().uri(url.as_str()).body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(served.status(), StatusCode::OK);
    assert_eq!(served.headers()[header::X_CONTENT_TYPE_OPTIONS], "nosniff");
    assert!(
        served.headers()[header::CONTENT_SECURITY_POLICY]
            .to_str()
            .unwrap()
            .starts_with("sandbox")
    );

    let _ = std::fs::remove_dir_all(&app.state.config.upload_dir);
}

#[tokio::test]
async fn oversized_upload_is_rejected() {
    let app = TestApp::new(memory_state());
    let admin = app.sign_up("owner@example.com").await;
    let big = vec![0u8; 2 * 1024 * 1024 + 1];

    let (status, _) = app.send(upload_request(&admin, "image/png", "big.png", &big)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn scriptable_images_are_refused() {
    let app = TestApp::new(memory_state());
    let admin = app.sign_up("owner@example.com").await;
    let svg = b"<svg xmlns=\"http://www.w3.org/2000/svg\"><script>alert(document.cookie)</script></svg>";

    let (status, body) = app
        .send(upload_request(&admin, "image/svg+xml", "logo.svg", svg))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["data"]["error"].is_string());

    // An unknown image type cannot smuggle in an extension through its filename.
    let (status, _) = app
        .send(upload_request(&admin, "image/x-made-up", "page.html", b"<script></script>"))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let stored = std::fs::read_dir(&app.state.config.upload_dir)
        .map(|entries| entries.count())
        .unwrap_or(0);
    assert_eq!(stored, 0);
}

#[tokio::test]
async fn malformed_path_and_query_use_the_error_body() {
    let app = TestApp::new(memory_state());
    let admin = app.sign_up("owner@example.com").await;

    for uri in ["/api/products/not-a-uuid", "/api/users/not-a-uuid", "/api/orders/not-a-uuid"] {
        let (status, body) = app.request("GET", uri, Some(&admin), None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
        assert!(body["message"].is_string(), "{uri}");
        assert!(body["data"]["error"].is_string(), "{uri}");
    }

    let (status, body) = app
        .request("GET", "/api/products?sort_by=colour", None, None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["data"]["error"].is_string());

    let (status, body) = app
        .request("GET", "/api/orders?page=first", Some(&admin), None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["data"]["error"].is_string());
}

#[tokio::test]
async fn far_away_pages_are_empty_not_errors() {
    let app = TestApp::new(memory_state());
    let admin = app.sign_up("owner@example.com").await;
    let max = i64::MAX;

    for uri in [
        format!("/api/products?page={max}"),
        format!("/api/products?page={max}&per_page={max}"),
        format!("/api/orders?page={max}"),
        format!("/api/users?page={max}&per_page=100"),
    ] {
        let (status, body) = app.request("GET", &uri, Some(&admin), None).await;
        assert_eq!(status, StatusCode::OK, "{uri}");
        assert!(body["data"].as_array().unwrap().is_empty(), "{uri}");
        assert_eq!(body["meta"]["page"], MAX_PAGE, "{uri}");
    }
}
