mod common;

use axum_test::TestServer;
use chrono::{Duration, Utc};
use common::{create_test_app, create_test_harness};
use diesel::prelude::*;
use hso_store::clients::sentoo::GatewayStatus;
use hso_store::models::models::{AppState, NewPhone, Order, Phone};
use hso_store::schema::{orders, phones};
use hso_store::services::sweep::{sweep_stale_reservations, SweepPolicy};
use http::StatusCode;
use serde_json::json;
use serial_test::serial;
use std::sync::atomic::Ordering;
use uuid::Uuid;

fn prepare_db(state: &AppState) {
    let mut conn = state.db.get().expect("Failed to get DB connection");
    common::run_test_migrations(&mut conn);
    common::cleanup_test_db(&mut conn);
}

fn insert_phone(state: &AppState, status: &str) -> Phone {
    let mut conn = state.db.get().expect("Failed to get DB connection");
    diesel::insert_into(phones::table)
        .values(NewPhone {
            brand: "Apple".to_string(),
            model: "iPhone 13".to_string(),
            price_cents: 10000,
            color: Some("Black".to_string()),
            battery_pct: Some(90),
            storage_gb: Some(128),
            grade: Some("A".to_string()),
            reference: None,
            description: None,
            images: vec![],
            warranty_months: Some(3),
            status: status.to_string(),
        })
        .get_result(&mut conn)
        .expect("Failed to insert phone")
}

fn reload_phone(state: &AppState, id: Uuid) -> Phone {
    let mut conn = state.db.get().expect("Failed to get DB connection");
    phones::table
        .find(id)
        .select(Phone::as_select())
        .first(&mut conn)
        .expect("Failed to reload phone")
}

fn orders_for_phone(state: &AppState, id: Uuid) -> Vec<Order> {
    let mut conn = state.db.get().expect("Failed to get DB connection");
    orders::table
        .filter(orders::phone_id.eq(id))
        .select(Order::as_select())
        .load(&mut conn)
        .expect("Failed to load orders")
}

fn checkout_body(phone_id: Uuid) -> serde_json::Value {
    json!({
        "phone_id": phone_id,
        "buyer_name": "Jane Buyer",
        "buyer_email": "jane@example.com",
        "buyer_phone": "+5999 555 1234",
        "fulfillment_type": "pickup"
    })
}

#[tokio::test]
#[serial]
async fn test_reservation_on_unavailable_phone_creates_no_order() {
    let (state, _, _) = create_test_harness("pending");
    prepare_db(&state);
    let phone = insert_phone(&state, "reserved");

    let server = TestServer::new(create_test_app(state.clone())).unwrap();
    let response = server
        .post("/api/payment/create")
        .json(&checkout_body(phone.id))
        .await;

    response.assert_status(StatusCode::CONFLICT);
    assert!(orders_for_phone(&state, phone.id).is_empty());
    assert_eq!(reload_phone(&state, phone.id).status, "reserved");
}

#[tokio::test]
#[serial]
async fn test_conditional_reservation_has_exactly_one_winner() {
    let (state, _, _) = create_test_harness("pending");
    prepare_db(&state);
    let phone = insert_phone(&state, "available");

    let mut conn = state.db.get().expect("Failed to get DB connection");
    let claim = || {
        diesel::update(
            phones::table
                .find(phone.id)
                .filter(phones::status.eq("available")),
        )
        .set(phones::status.eq("reserved"))
    };

    let first = claim().execute(&mut conn).unwrap();
    let second = claim().execute(&mut conn).unwrap();

    assert_eq!(first, 1);
    assert_eq!(second, 0);
}

#[tokio::test]
#[serial]
async fn test_gateway_create_failure_rolls_reservation_back() {
    let (state, gateway, _) = create_test_harness("pending");
    prepare_db(&state);
    let phone = insert_phone(&state, "available");
    gateway.fail_create.store(true, Ordering::SeqCst);

    let server = TestServer::new(create_test_app(state.clone())).unwrap();
    let response = server
        .post("/api/payment/create")
        .json(&checkout_body(phone.id))
        .await;

    response.assert_status(StatusCode::BAD_GATEWAY);
    assert_eq!(reload_phone(&state, phone.id).status, "available");
    assert!(orders_for_phone(&state, phone.id).is_empty());
}

#[tokio::test]
#[serial]
async fn test_webhook_success_marks_sold_and_dispatches_once() {
    let (state, gateway, notifier) = create_test_harness("issued");
    prepare_db(&state);
    let phone = insert_phone(&state, "available");

    let server = TestServer::new(create_test_app(state.clone())).unwrap();

    let response = server
        .post("/api/payment/create")
        .json(&checkout_body(phone.id))
        .await;
    response.assert_status_ok();
    assert_eq!(reload_phone(&state, phone.id).status, "reserved");

    *gateway.status.lock().unwrap() = GatewayStatus {
        status: "success".to_string(),
        attempts: vec![],
    };

    let response = server
        .post("/webhooks/sentoo")
        .json(&json!({ "transaction_id": "tx-test-1" }))
        .await;
    response.assert_status_ok();

    assert_eq!(reload_phone(&state, phone.id).status, "sold");
    let order = &orders_for_phone(&state, phone.id)[0];
    assert_eq!(order.payment_status, "success");
    assert!(order.notifications_sent);
    assert_eq!(notifier.sent.load(Ordering::SeqCst), 1);

    // Redelivery of the same notification is a no-op: no extra dispatch
    let response = server
        .post("/webhooks/sentoo")
        .json(&json!({ "transaction_id": "tx-test-1" }))
        .await;
    response.assert_status_ok();
    assert_eq!(notifier.sent.load(Ordering::SeqCst), 1);
}

#[tokio::test]
#[serial]
async fn test_verify_failure_reverts_reservation() {
    let (state, gateway, notifier) = create_test_harness("issued");
    prepare_db(&state);
    let phone = insert_phone(&state, "available");

    let server = TestServer::new(create_test_app(state.clone())).unwrap();
    server
        .post("/api/payment/create")
        .json(&checkout_body(phone.id))
        .await
        .assert_status_ok();

    *gateway.status.lock().unwrap() = GatewayStatus {
        status: "cancelled".to_string(),
        attempts: vec![],
    };

    let response = server
        .get("/api/payment/verify")
        .add_query_param("phone_id", phone.id)
        .await;
    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["status"], "cancelled");

    assert_eq!(reload_phone(&state, phone.id).status, "available");
    assert_eq!(orders_for_phone(&state, phone.id)[0].payment_status, "cancelled");
    assert_eq!(notifier.sent.load(Ordering::SeqCst), 0);
}

#[tokio::test]
#[serial]
async fn test_cron_sweep_respects_staleness_boundary() {
    let (state, _, _) = create_test_harness("pending");
    prepare_db(&state);
    let stale = insert_phone(&state, "reserved");
    let fresh = insert_phone(&state, "reserved");

    {
        let mut conn = state.db.get().expect("Failed to get DB connection");
        // Explicit updated_at survives the diesel_manage_updated_at trigger
        diesel::update(phones::table.find(stale.id))
            .set(phones::updated_at.eq(Utc::now() - Duration::minutes(35)))
            .execute(&mut conn)
            .unwrap();
        diesel::update(phones::table.find(fresh.id))
            .set(phones::updated_at.eq(Utc::now() - Duration::minutes(25)))
            .execute(&mut conn)
            .unwrap();
    }

    let report = sweep_stale_reservations(&state, SweepPolicy::Cron)
        .await
        .unwrap();

    assert_eq!(report.reverted, 1);
    assert_eq!(report.details.len(), 1);
    assert_eq!(report.details[0].phone_id, stale.id);
    assert_eq!(report.details[0].action, "reverted");

    assert_eq!(reload_phone(&state, stale.id).status, "available");
    assert_eq!(reload_phone(&state, fresh.id).status, "reserved");
}

#[tokio::test]
#[serial]
async fn test_sweep_marks_late_success_sold() {
    let (state, gateway, notifier) = create_test_harness("issued");
    prepare_db(&state);
    let phone = insert_phone(&state, "available");

    let server = TestServer::new(create_test_app(state.clone())).unwrap();
    server
        .post("/api/payment/create")
        .json(&checkout_body(phone.id))
        .await
        .assert_status_ok();

    {
        let mut conn = state.db.get().expect("Failed to get DB connection");
        diesel::update(phones::table.find(phone.id))
            .set(phones::updated_at.eq(Utc::now() - Duration::minutes(35)))
            .execute(&mut conn)
            .unwrap();
    }

    *gateway.status.lock().unwrap() = GatewayStatus {
        status: "success".to_string(),
        attempts: vec![],
    };

    let report = sweep_stale_reservations(&state, SweepPolicy::Cron)
        .await
        .unwrap();

    assert_eq!(report.reverted, 0);
    assert_eq!(report.details[0].action, "marked_sold");
    assert_eq!(reload_phone(&state, phone.id).status, "sold");
    assert_eq!(orders_for_phone(&state, phone.id)[0].payment_status, "success");
    assert_eq!(notifier.sent.load(Ordering::SeqCst), 1);
}
