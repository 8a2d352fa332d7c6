//! Integration tests for the API server.

use std::sync::{Arc, OnceLock};

use api::AppState;
use api::config::{Config, DEVELOPMENT_SECRET};
use application::Mediator;
use application::requests::seed_admin;
use application::services::{JwtTokenService, TokenService};
use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use domain::{Role, UserId};
use metrics_exporter_prometheus::PrometheusHandle;
use persistence::InMemoryDocumentStore;
use serde_json::{Value, json};
use tower::ServiceExt;

static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

fn get_metrics_handle() -> PrometheusHandle {
    METRICS_HANDLE
        .get_or_init(|| {
            let builder = metrics_exporter_prometheus::PrometheusBuilder::new();
            builder
                .install_recorder()
                .expect("failed to install Prometheus recorder")
        })
        .clone()
}

async fn setup() -> Router {
    let config = Config {
        password_iterations: 2,
        ..Config::default()
    };
    let context = api::create_context(&config, Arc::new(InMemoryDocumentStore::new())).unwrap();
    let mediator = Mediator::new(context);
    seed_admin(&mediator, "Admin", "admin@shop.test", "admin-password")
        .await
        .unwrap();
    api::create_app(AppState::new(mediator), get_metrics_handle())
}

async fn call(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, json)
}

async fn login(app: &Router, email: &str, password: &str) -> String {
    let (status, body) = call(
        app,
        "POST",
        "/api/auth/login",
        None,
        Some(json!({ "email": email, "password": password })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "login failed: {body}");
    body["access_token"].as_str().unwrap().to_string()
}

async fn register_customer(app: &Router) -> String {
    let (status, _) = call(
        app,
        "POST",
        "/api/auth/register",
        None,
        Some(json!({
            "name": "Jane",
            "email": "jane@shop.test",
            "password": "jane-password"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    login(app, "jane@shop.test", "jane-password").await
}

fn id_of(body: &Value) -> String {
    body["id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_health_check() {
    let app = setup().await;

    let (status, body) = call(&app, "GET", "/health", None, None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_metrics_endpoint() {
    let app = setup().await;

    let response = app
        .oneshot(
            Request::builder()
                .uri("/metrics")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response.headers()["content-type"].to_str().unwrap();
    assert!(content_type.starts_with("text/plain"));
}

#[tokio::test]
async fn register_login_and_read_profile() {
    let app = setup().await;
    let token = register_customer(&app).await;

    let (status, body) = call(&app, "GET", "/api/users/me", Some(&token), None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["email"], "jane@shop.test");
    assert_eq!(body["role"], "Customer");
    assert!(body.get("password_hash").is_none());
}

#[tokio::test]
async fn wrong_password_is_unauthorized() {
    let app = setup().await;
    register_customer(&app).await;

    let (status, body) = call(
        &app,
        "POST",
        "/api/auth/login",
        None,
        Some(json!({ "email": "jane@shop.test", "password": "not-the-password" })),
    )
    .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn missing_or_invalid_tokens_are_unauthorized() {
    let app = setup().await;

    let (status, _) = call(&app, "GET", "/api/users/me", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = call(&app, "GET", "/api/users/me", Some("garbage"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn tokens_signed_with_the_raw_secret_are_rejected() {
    let app = setup().await;
    let forged = JwtTokenService::new(
        DEVELOPMENT_SECRET.as_bytes(),
        "storefront",
        chrono::Duration::minutes(5),
    )
    .issue(UserId::new(), Role::Admin)
    .unwrap();

    let (status, _) = call(&app, "GET", "/api/users", Some(&forged.token), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn customers_cannot_manage_the_catalog() {
    let app = setup().await;
    let token = register_customer(&app).await;

    let (status, _) = call(
        &app,
        "POST",
        "/api/categories",
        Some(&token),
        Some(json!({ "name": "Widgets" })),
    )
    .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn validation_failures_report_every_field() {
    let app = setup().await;

    let (status, body) = call(
        &app,
        "POST",
        "/api/auth/register",
        None,
        Some(json!({ "name": "", "email": "not-an-email", "password": "short" })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Validation failed");
    assert!(body["details"]["name"].is_array());
    assert!(body["details"]["email"].is_array());
    assert!(body["details"]["password"].is_array());
}

#[tokio::test]
async fn unreadable_requests_are_bad_requests() {
    let app = setup().await;
    let token = login(&app, "admin@shop.test", "admin-password").await;

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/categories")
                .header("authorization", format!("Bearer {token}"))
                .header("content-type", "application/json")
                .body(Body::from("{not json"))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let (status, body) = call(&app, "GET", "/api/orders/not-a-uuid", Some(&token), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("Invalid ID"));
}

#[tokio::test]
async fn unknown_products_are_not_found() {
    let app = setup().await;

    let uri = format!("/api/products/{}", uuid::Uuid::new_v4());
    let (status, _) = call(&app, "GET", &uri, None, None).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
}

/// An admin-built catalog: one product at 50.00 with 10 in stock and an
/// active 10.00 shipping method. Returns `(admin token, product id, method id)`.
async fn stock_the_store(app: &Router) -> (String, String, String) {
    let admin = login(app, "admin@shop.test", "admin-password").await;

    let (status, product) = call(
        app,
        "POST",
        "/api/products",
        Some(&admin),
        Some(json!({
            "name": "Widget",
            "sku": "wid-001",
            "price_cents": 5000,
            "stock": 10
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{product}");
    assert_eq!(product["sku"], "WID-001");

    let (status, carrier) = call(
        app,
        "POST",
        "/api/carriers",
        Some(&admin),
        Some(json!({
            "name": "FastShip",
            "contact_email": "ops@fastship.test",
            "tracking_url_template": "https://fastship.test/track/{tracking_number}"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{carrier}");

    let (status, method) = call(
        app,
        "POST",
        "/api/shipping-methods",
        Some(&admin),
        Some(json!({
            "carrier_id": id_of(&carrier),
            "name": "Standard",
            "price_cents": 1000,
            "estimated_days": 5
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{method}");

    (admin, id_of(&product), id_of(&method))
}

fn order_body(product_id: &str, method_id: &str, payment_method: &str) -> Value {
    json!({
        "lines": [{ "product_id": product_id, "quantity": 2 }],
        "shipping_method_id": method_id,
        "shipping_address": {
            "street": "1 Main St",
            "city": "Springfield",
            "state": "IL",
            "postal_code": "62701",
            "country": "US"
        },
        "payment_method": payment_method
    })
}

#[tokio::test]
async fn checkout_over_http() {
    let app = setup().await;
    let (admin, product_id, method_id) = stock_the_store(&app).await;
    let customer = register_customer(&app).await;

    let (status, order) = call(
        &app,
        "POST",
        "/api/orders",
        Some(&customer),
        Some(order_body(&product_id, &method_id, "CreditCard")),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{order}");
    assert_eq!(order["status"], "Pending");
    assert_eq!(order["total_cents"], 11000);
    let order_id = id_of(&order);

    let (status, payment) = call(
        &app,
        "GET",
        &format!("/api/orders/{order_id}/payment"),
        Some(&customer),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(payment["status"], "Pending");
    assert_eq!(payment["amount_cents"], 11000);

    let (status, payment) = call(
        &app,
        "POST",
        &format!("/api/payments/{}/process", id_of(&payment)),
        Some(&customer),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(payment["status"], "Approved");

    let (_, order) = call(
        &app,
        "GET",
        &format!("/api/orders/{order_id}"),
        Some(&customer),
        None,
    )
    .await;
    assert_eq!(order["status"], "Paid");

    let (status, shipment) = call(
        &app,
        "GET",
        &format!("/api/orders/{order_id}/shipment"),
        Some(&customer),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(shipment["status"], "Pending");
    assert!(shipment["tracking_url"].is_null());
    let shipment_id = id_of(&shipment);

    let (status, _) = call(
        &app,
        "POST",
        &format!("/api/shipments/{shipment_id}/ship"),
        Some(&customer),
        Some(json!({ "tracking_number": "TRK1" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, shipment) = call(
        &app,
        "POST",
        &format!("/api/shipments/{shipment_id}/ship"),
        Some(&admin),
        Some(json!({ "tracking_number": "TRK1" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(shipment["status"], "Shipped");
    assert_eq!(shipment["tracking_url"], "https://fastship.test/track/TRK1");

    let (status, shipment) = call(
        &app,
        "POST",
        &format!("/api/shipments/{shipment_id}/deliver"),
        Some(&admin),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(shipment["status"], "Delivered");

    let (_, order) = call(
        &app,
        "GET",
        &format!("/api/orders/{order_id}"),
        Some(&customer),
        None,
    )
    .await;
    assert_eq!(order["status"], "Delivered");

    let (status, cancel) = call(
        &app,
        "POST",
        &format!("/api/orders/{order_id}/cancel"),
        Some(&customer),
        Some(json!({ "reason": "too late" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT, "{cancel}");

    let (status, events) = call(
        &app,
        "GET",
        &format!("/api/orders/{order_id}/events"),
        Some(&customer),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let types: Vec<&str> = events
        .as_array()
        .unwrap()
        .iter()
        .map(|event| event["event_type"].as_str().unwrap())
        .collect();
    assert_eq!(types.first(), Some(&"OrderCreated"));
    assert!(types.contains(&"PaymentApproved"));
    assert!(types.contains(&"ShipmentDelivered"));
    assert!(types.contains(&"OrderDelivered"));

    let (_, product) = call(&app, "GET", &format!("/api/products/{product_id}"), None, None).await;
    assert_eq!(product["stock"], 8);
}

#[tokio::test]
async fn unknown_payment_method_is_a_validation_error() {
    let app = setup().await;
    let (_, product_id, method_id) = stock_the_store(&app).await;
    let customer = register_customer(&app).await;

    let (status, body) = call(
        &app,
        "POST",
        "/api/orders",
        Some(&customer),
        Some(order_body(&product_id, &method_id, "Cash")),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["details"]["payment_method"].is_array());
}

#[tokio::test]
async fn ordering_more_than_stock_is_unprocessable() {
    let app = setup().await;
    let (_, product_id, method_id) = stock_the_store(&app).await;
    let customer = register_customer(&app).await;

    let mut body = order_body(&product_id, &method_id, "Pix");
    body["lines"][0]["quantity"] = json!(11);
    let (status, _) = call(&app, "POST", "/api/orders", Some(&customer), Some(body)).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn customers_only_see_their_own_orders() {
    let app = setup().await;
    let (admin, product_id, method_id) = stock_the_store(&app).await;
    let customer = register_customer(&app).await;

    let (_, order) = call(
        &app,
        "POST",
        "/api/orders",
        Some(&customer),
        Some(order_body(&product_id, &method_id, "Pix")),
    )
    .await;

    let (status, _) = call(
        &app,
        "POST",
        "/api/auth/register",
        None,
        Some(json!({
            "name": "Joe",
            "email": "joe@shop.test",
            "password": "joe-password"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let other = login(&app, "joe@shop.test", "joe-password").await;

    let (status, _) = call(
        &app,
        "GET",
        &format!("/api/orders/{}", id_of(&order)),
        Some(&other),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (_, listing) = call(&app, "GET", "/api/orders", Some(&other), None).await;
    assert_eq!(listing["total"], 0);

    let (_, listing) = call(&app, "GET", "/api/orders?status=Pending", Some(&admin), None).await;
    assert_eq!(listing["total"], 1);
}
