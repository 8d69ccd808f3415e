//! End-to-end tests of the HTTP surface over the in-memory repository.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode},
};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

use atm_hex::{AtmService, RateLimiterState, inbound::HttpServer};
use atm_repo::InMemoryRepo;
use atm_types::{CashPolicy, RegisterRequest};

const ADMIN: &str = "9000000000";
const CUSTOMER: &str = "9876543210";

async fn create_test_app() -> Router {
    create_test_app_with_limit(RateLimiterState::default()).await
}

async fn create_test_app_with_limit(limiter: RateLimiterState) -> Router {
    let repo = Arc::new(InMemoryRepo::new());
    let service = AtmService::new(repo, CashPolicy::default())
        .await
        .unwrap()
        .with_login_limiter(limiter);
    service
        .ensure_admin(RegisterRequest {
            name: "Root".into(),
            email: "root@example.com".into(),
            mobile: ADMIN.into(),
            pin: "0000".into(),
        })
        .await
        .unwrap();
    HttpServer::new(service).router()
}

fn json_request(method: Method, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("Content-Type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body).unwrap()
    };
    (status, json)
}

async fn register_customer(app: &Router) -> Value {
    let (status, body) = send(
        app,
        json_request(
            Method::POST,
            "/api/auth/register",
            json!({"name": "Asha", "email": "asha@example.com", "mobile": CUSTOMER, "pin": "1234"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    body
}

#[tokio::test]
async fn test_health() {
    let app = create_test_app().await;

    let (status, body) = send(&app, get("/health")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn test_register_and_login_as_customer() {
    let app = create_test_app().await;
    let account = register_customer(&app).await;
    assert_eq!(account["balance"], 0);
    assert_eq!(account["role"], "customer");

    let (status, body) = send(
        &app,
        json_request(
            Method::POST,
            "/api/auth/login",
            json!({"mobile": CUSTOMER, "pin": "1234"}),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["role"], "customer");
    assert_eq!(body["name"], "Asha");
}

#[tokio::test]
async fn test_login_as_admin_is_tagged() {
    let app = create_test_app().await;

    let (status, body) = send(
        &app,
        json_request(
            Method::POST,
            "/api/auth/login",
            json!({"mobile": ADMIN, "pin": "0000"}),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["role"], "admin");
}

#[tokio::test]
async fn test_duplicate_registration_conflicts() {
    let app = create_test_app().await;
    register_customer(&app).await;

    let (status, body) = send(
        &app,
        json_request(
            Method::POST,
            "/api/auth/register",
            json!({"name": "Ravi", "email": "ravi@example.com", "mobile": CUSTOMER, "pin": "1234"}),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["kind"], "conflict");
}

#[tokio::test]
async fn test_deposit_and_withdraw() {
    let app = create_test_app().await;
    register_customer(&app).await;

    let (status, body) = send(
        &app,
        json_request(
            Method::POST,
            &format!("/api/auth/{CUSTOMER}/deposit"),
            json!({"amount": 1200, "denominations": {"500": 2, "100": 2}}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["balance"], 1200);

    let (status, body) = send(
        &app,
        json_request(
            Method::POST,
            &format!("/api/auth/{CUSTOMER}/withdraw"),
            json!({"amount": 700}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["balance"], 500);
    assert_eq!(body["dispensed"], json!({"500": 1, "100": 2}));

    let (status, body) = send(&app, get(&format!("/api/auth/{CUSTOMER}/balance"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["balance"], 500);

    let (status, body) = send(&app, get(&format!("/api/auth/{CUSTOMER}/transactions"))).await;
    assert_eq!(status, StatusCode::OK);
    let history = body.as_array().unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0]["kind"], "withdraw");
}

#[tokio::test]
async fn test_deposit_sum_mismatch_is_validation_error() {
    let app = create_test_app().await;
    register_customer(&app).await;

    let (status, body) = send(
        &app,
        json_request(
            Method::POST,
            &format!("/api/auth/{CUSTOMER}/deposit"),
            json!({"amount": 1000, "denominations": {"500": 1}}),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["kind"], "validation_error");
    assert_eq!(body["code"], 422);
}

#[tokio::test]
async fn test_withdraw_errors_are_distinct() {
    let app = create_test_app().await;
    register_customer(&app).await;

    let (status, body) = send(
        &app,
        json_request(
            Method::POST,
            &format!("/api/auth/{CUSTOMER}/withdraw"),
            json!({"amount": 100}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["kind"], "insufficient_funds");

    send(
        &app,
        json_request(
            Method::POST,
            &format!("/api/auth/{CUSTOMER}/deposit"),
            json!({"amount": 500, "denominations": {"500": 1}}),
        ),
    )
    .await;

    let (status, body) = send(
        &app,
        json_request(
            Method::POST,
            &format!("/api/auth/{CUSTOMER}/withdraw"),
            json!({"amount": 200}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["kind"], "insufficient_cash");
}

#[tokio::test]
async fn test_unknown_mobile_is_not_found() {
    let app = create_test_app().await;

    let (status, body) = send(&app, get("/api/auth/9111111111/balance")).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["kind"], "not_found");
}

#[tokio::test]
async fn test_admin_guard() {
    let app = create_test_app().await;
    register_customer(&app).await;

    let (status, _) = send(&app, get("/api/admin/atm-balance")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = send(
        &app,
        get(&format!("/api/admin/atm-balance?adminMobile={CUSTOMER}")),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["kind"], "forbidden");

    let (status, body) = send(
        &app,
        get(&format!("/api/admin/atm-balance?adminMobile={ADMIN}")),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["atm_balance"], 0);
}

#[tokio::test]
async fn test_admin_cash_load_inventory_and_reconcile() {
    let app = create_test_app().await;

    let (status, body) = send(
        &app,
        json_request(
            Method::POST,
            &format!("/api/admin/deposit?adminMobile={ADMIN}"),
            json!({"amount": 1450, "denominations": {"500": 2, "200": 2, "50": 1}}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["atm_balance"], 1450);

    let (status, body) = send(
        &app,
        get(&format!("/api/admin/atm-inventory?adminMobile={ADMIN}")),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 1450);
    assert_eq!(body["denominations"]["500"], 2);
    assert_eq!(body["denominations"]["100"], 0);

    let (status, body) = send(
        &app,
        get(&format!("/api/admin/reconcile?adminMobile={ADMIN}")),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["consistent"], true);
    assert_eq!(body["computed_total"], 1450);
}

#[tokio::test]
async fn test_admin_user_management() {
    let app = create_test_app().await;

    let (status, created) = send(
        &app,
        json_request(
            Method::POST,
            &format!("/api/admin/add-user?adminMobile={ADMIN}"),
            json!({"name": "Ravi", "email": "ravi@example.com", "mobile": "9123456789", "pin": "4321"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let id = created["id"].as_str().unwrap().to_string();

    let (status, body) = send(&app, get(&format!("/api/admin/users?adminMobile={ADMIN}"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 2);

    let (status, body) = send(
        &app,
        get(&format!("/api/admin/user/{id}/transactions?adminMobile={ADMIN}")),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.as_array().unwrap().is_empty());

    let delete = Request::builder()
        .method(Method::DELETE)
        .uri(format!("/api/admin/delete-user/{id}?adminMobile={ADMIN}"))
        .body(Body::empty())
        .unwrap();
    let (status, _) = send(&app, delete).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, body) = send(
        &app,
        get(&format!("/api/admin/user/not-a-uuid/transactions?adminMobile={ADMIN}")),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["kind"], "bad_request");
}

#[tokio::test]
async fn test_change_pin() {
    let app = create_test_app().await;
    register_customer(&app).await;

    let (status, body) = send(
        &app,
        json_request(
            Method::POST,
            &format!("/api/auth/{CUSTOMER}/changepin"),
            json!({"old_pin": "1234", "new_pin": "8765"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "PIN changed successfully");

    let (status, _) = send(
        &app,
        json_request(
            Method::POST,
            "/api/auth/login",
            json!({"mobile": CUSTOMER, "pin": "8765"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_login_throttling_returns_429() {
    let app = create_test_app_with_limit(RateLimiterState::new(2, Duration::from_secs(60))).await;
    register_customer(&app).await;
    let wrong = || {
        json_request(
            Method::POST,
            "/api/auth/login",
            json!({"mobile": CUSTOMER, "pin": "9999"}),
        )
    };

    let (status, _) = send(&app, wrong()).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (status, _) = send(&app, wrong()).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = send(&app, wrong()).await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(body["kind"], "too_many_requests");
}

#[tokio::test]
async fn test_openapi_document_served() {
    let app = create_test_app().await;

    let (status, body) = send(&app, get("/api-docs/openapi.json")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["info"]["title"], "ATM Service API");
    assert!(body["paths"]["/api/auth/login"].is_object());
}
