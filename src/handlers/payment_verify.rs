use crate::error::ApiError;
use crate::models::models::{AppState, Order, Phone, VerifyResponse};
use crate::models::status::{is_terminal_status, PaymentStatus};
use crate::schema::{orders, phones};
use crate::services::reconcile::{
    finalize_order_status, latest_attempt_message, plan_reconciliation, run_terminal_side_effects,
    ReconcileAction,
};
use axum::extract::Query;
use axum::{extract::State, http::StatusCode, Json};
use diesel::prelude::*;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{error, warn};
use utoipa::IntoParams;
use uuid::Uuid;

#[derive(Deserialize, IntoParams)]
pub struct VerifyParams {
    pub phone_id: Uuid,
}

/// The checkout return page includes the payment URL so a buyer whose
/// attempt failed can retry, but never for an already-successful payment.
fn payment_url_for(status: &str, order: &Order) -> Option<String> {
    if status == PaymentStatus::Success.as_str() {
        None
    } else {
        order.sentoo_payment_url.clone()
    }
}

#[utoipa::path(
    get,
    path = "/api/payment/verify",
    params(VerifyParams),
    responses(
        (status = 200, description = "Current payment status", body = VerifyResponse),
        (status = 404, description = "Order not found"),
        (status = 500, description = "Internal server error")
    ),
    tag = "Payment"
)]
pub async fn verify_payment(
    State(state): State<Arc<AppState>>,
    Query(params): Query<VerifyParams>,
) -> Result<Json<VerifyResponse>, (StatusCode, String)> {
    let conn = &mut state.db.get().map_err(|e| {
        error!("Database connection failed: {}", e);
        ApiError::DatabaseConnection(e.to_string())
    })?;

    // Most recent order for this phone
    let order: Option<Order> = orders::table
        .filter(orders::phone_id.eq(params.phone_id))
        .order(orders::created_at.desc())
        .select(Order::as_select())
        .first(conn)
        .optional()
        .map_err(|e| {
            error!("Order lookup failed: {}", e);
            ApiError::Database(e)
        })?;

    let order = match order {
        Some(o) => o,
        None => return Err(ApiError::NotFound("Order not found".to_string()).into()),
    };
    let Some(tx_id) = order.sentoo_tx_id.as_deref() else {
        return Err(ApiError::NotFound("Order not found".to_string()).into());
    };

    // Finalized orders answer from the stored status without polling
    if is_terminal_status(&order.payment_status) {
        return Ok(Json(VerifyResponse {
            status: order.payment_status.clone(),
            processor_message: None,
            sentoo_payment_url: None,
            retryable: None,
        }));
    }

    let gateway_status = match state.gateway.fetch_status(tx_id).await {
        Ok(gs) => gs,
        Err(e) => {
            // Stale-but-safe: report the last known status instead of
            // failing the poll.
            error!("Verify: gateway status fetch failed: {}", e);
            return Ok(Json(VerifyResponse {
                status: order.payment_status.clone(),
                processor_message: None,
                sentoo_payment_url: None,
                retryable: None,
            }));
        }
    };

    let processor_message = latest_attempt_message(&gateway_status);

    match plan_reconciliation(&order.payment_status, &gateway_status) {
        ReconcileAction::AdvisoryRetry { display_status } => {
            // Transaction still open; the failed attempt is display-only
            Ok(Json(VerifyResponse {
                status: display_status,
                processor_message,
                sentoo_payment_url: order.sentoo_payment_url.clone(),
                retryable: Some(true),
            }))
        }
        ReconcileAction::NoChange => Ok(Json(VerifyResponse {
            status: order.payment_status.clone(),
            processor_message,
            sentoo_payment_url: payment_url_for(&order.payment_status, &order),
            retryable: None,
        })),
        ReconcileAction::MoveToIssued => {
            let issued = PaymentStatus::Issued.as_str();
            finalize_order_status(conn, order.id, issued)?;
            Ok(Json(VerifyResponse {
                status: issued.to_string(),
                processor_message,
                sentoo_payment_url: payment_url_for(issued, &order),
                retryable: None,
            }))
        }
        ReconcileAction::Apply { status } => {
            if PaymentStatus::parse(&status).is_none() {
                warn!(
                    "Verify: gateway returned unrecognized status '{}' for order {}",
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

            run_terminal_side_effects(&state, conn, &order, &phone, &status).await?;

            Ok(Json(VerifyResponse {
                status: status.clone(),
                processor_message,
                sentoo_payment_url: payment_url_for(&status, &order),
                retryable: None,
            }))
        }
    }
}
