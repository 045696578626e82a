use crate::error::ApiError;
use crate::models::models::{AppState, Order, Phone};
use crate::models::status::PaymentStatus;
use crate::schema::{orders, phones};
use crate::services::reconcile::{
    finalize_order_status, plan_reconciliation, run_terminal_side_effects, ReconcileAction,
};
use axum::body::Bytes;
use axum::{extract::State, http::StatusCode, Json};
use diesel::prelude::*;
use http::HeaderMap;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{error, info, warn};

/// Pull the transaction id out of a form-encoded or JSON webhook body.
/// Sentoo sometimes sends the id as a quoted string.
fn extract_transaction_id(headers: &HeaderMap, body: &Bytes) -> Option<String> {
    let content_type = headers
        .get(http::header::CONTENT_TYPE)
        .and_then(|h| h.to_str().ok())
        .unwrap_or("");

    let raw = if content_type.contains("application/x-www-form-urlencoded") {
        url::form_urlencoded::parse(body)
            .find(|(k, _)| k == "transaction_id")
            .map(|(_, v)| v.into_owned())
    } else {
        serde_json::from_slice::<Value>(body)
            .ok()
            .and_then(|v| v["transaction_id"].as_str().map(str::to_string))
    };

    raw.map(|t| t.trim_matches('"').to_string())
        .filter(|t| !t.is_empty())
}

#[utoipa::path(
    post,
    path = "/webhooks/sentoo",
    responses(
        (status = 200, description = "Webhook acknowledged"),
        (status = 500, description = "Authoritative status fetch failed, provider should retry")
    ),
    tag = "Webhook"
)]
pub async fn sentoo_webhook(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<Value>, (StatusCode, String)> {
    let Some(tx_id) = extract_transaction_id(&headers, &body) else {
        warn!("Webhook without transaction_id, acknowledging");
        return Ok(Json(json!({ "success": true })));
    };

    match process_notification(&state, &tx_id).await {
        Ok(()) => Ok(Json(json!({ "success": true }))),
        // A failed authoritative fetch is the one case worth a provider
        // retry; everything else is acknowledged to stop retry storms.
        Err(ApiError::Upstream(e)) => {
            error!("Webhook: status fetch for {} failed: {}", tx_id, e);
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                "Status fetch failed".to_string(),
            ))
        }
        Err(e) => {
            error!("Webhook processing for {} failed: {}", tx_id, e);
            Ok(Json(json!({ "success": true })))
        }
    }
}

async fn process_notification(state: &AppState, tx_id: &str) -> Result<(), ApiError> {
    let conn = &mut state.db.get().map_err(|e| {
        error!("Database connection failed: {}", e);
        ApiError::DatabaseConnection(e.to_string())
    })?;

    let order: Option<Order> = orders::table
        .filter(orders::sentoo_tx_id.eq(tx_id))
        .select(Order::as_select())
        .first(conn)
        .optional()
        .map_err(|e| {
            error!("Order lookup by transaction failed: {}", e);
            ApiError::Database(e)
        })?;

    let Some(order) = order else {
        warn!("Webhook: unknown transaction {}", tx_id);
        return Ok(());
    };

    // Never trust the inbound payload's status claim
    let gateway_status = state.gateway.fetch_status(tx_id).await?;

    match plan_reconciliation(&order.payment_status, &gateway_status) {
        ReconcileAction::NoChange => Ok(()),
        // The webhook has no display channel; a failed attempt under an
        // open transaction just keeps (or moves) the order at `issued`.
        ReconcileAction::MoveToIssued | ReconcileAction::AdvisoryRetry { .. } => {
            let issued = PaymentStatus::Issued.as_str();
            if order.payment_status != issued {
                finalize_order_status(conn, order.id, issued)?;
            }
            Ok(())
        }
        ReconcileAction::Apply { status } => {
            if PaymentStatus::parse(&status).is_none() {
                warn!(
                    "Webhook: gateway returned unrecognized status '{}' for order {}",
                    status, order.id
                );
            }
            finalize_order_status(conn, order.id, &status)?;

            let phone: Phone = phones::table
                .find(order.phone_id)
                .select(Phone::as_select())
                .first(conn)
                .map_err(|e| {
                    error!("Phone lookup for order {} failed: {}", order.id, e);
                    ApiError::Database(e)
                })?;

            run_terminal_side_effects(state, conn, &order, &phone, &status).await?;
            info!(
                "Webhook: order {} reconciled to '{}' via {}",
                order.id, status, tx_id
            );
            Ok(())
        }
    }
}
