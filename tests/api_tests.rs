mod common;

use axum_test::TestServer;
use common::{create_test_app, create_test_app_state};
use http::StatusCode;
use serde_json::json;
use serial_test::serial;
use uuid::Uuid;

#[tokio::test]
#[serial]
async fn test_webhook_without_transaction_id_is_acknowledged() {
    let server = TestServer::new(create_test_app(create_test_app_state())).unwrap();

    let response = server
        .post("/webhooks/sentoo")
        .json(&json!({ "event": "payment.updated" }))
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["success"], true);
}

#[tokio::test]
#[serial]
async fn test_webhook_with_empty_form_body_is_acknowledged() {
    let server = TestServer::new(create_test_app(create_test_app_state())).unwrap();

    let response = server
        .post("/webhooks/sentoo")
        .content_type("application/x-www-form-urlencoded")
        .text("other_field=1")
        .await;

    response.assert_status_ok();
}

#[tokio::test]
#[serial]
async fn test_admin_routes_require_token() {
    let server = TestServer::new(create_test_app(create_test_app_state())).unwrap();

    let response = server.get("/api/admin/orders").await;
    response.assert_status(StatusCode::UNAUTHORIZED);

    let response = server
        .post("/api/admin/cleanup-reserved")
        .authorization_bearer("not.a.jwt")
        .await;
    response.assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
#[serial]
async fn test_cron_endpoint_requires_shared_secret() {
    let server = TestServer::new(create_test_app(create_test_app_state())).unwrap();

    let response = server.get("/cron/revert-reserved").await;
    response.assert_status(StatusCode::UNAUTHORIZED);

    let response = server
        .get("/cron/revert-reserved")
        .authorization_bearer("wrong-secret")
        .await;
    response.assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
#[serial]
async fn test_admin_login_rejects_unknown_email() {
    let server = TestServer::new(create_test_app(create_test_app_state())).unwrap();

    let response = server
        .post("/api/admin/login")
        .json(&json!({
            "email": "someone-else@example.com",
            "password": "CorrectHorse1!"
        }))
        .await;

    response.assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
#[serial]
async fn test_admin_login_rejects_wrong_password() {
    let server = TestServer::new(create_test_app(create_test_app_state())).unwrap();

    let response = server
        .post("/api/admin/login")
        .json(&json!({
            "email": "admin@example.com",
            "password": "WrongPassword1!"
        }))
        .await;

    response.assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
#[serial]
async fn test_admin_login_returns_token() {
    let state = create_test_app_state();
    let server = TestServer::new(create_test_app(state)).unwrap();

    let response = server
        .post("/api/admin/login")
        .json(&json!({
            "email": "admin@example.com",
            "password": "CorrectHorse1!"
        }))
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert!(body["token"].is_string());
}

#[tokio::test]
#[serial]
async fn test_admin_login_validates_payload() {
    let server = TestServer::new(create_test_app(create_test_app_state())).unwrap();

    let response = server
        .post("/api/admin/login")
        .json(&json!({
            "email": "not-an-email",
            "password": "CorrectHorse1!"
        }))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
#[serial]
async fn test_payment_create_requires_delivery_address() {
    let server = TestServer::new(create_test_app(create_test_app_state())).unwrap();

    let response = server
        .post("/api/payment/create")
        .json(&json!({
            "phone_id": Uuid::new_v4(),
            "buyer_name": "Jane Buyer",
            "buyer_email": "jane@example.com",
            "buyer_phone": "+5999 555 1234",
            "fulfillment_type": "delivery",
            "delivery_address": null
        }))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
#[serial]
async fn test_payment_create_rejects_malformed_email() {
    let server = TestServer::new(create_test_app(create_test_app_state())).unwrap();

    let response = server
        .post("/api/payment/create")
        .json(&json!({
            "phone_id": Uuid::new_v4(),
            "buyer_name": "Jane Buyer",
            "buyer_email": "nope",
            "buyer_phone": "+5999 555 1234",
            "fulfillment_type": "pickup"
        }))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
}
