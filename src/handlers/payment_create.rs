use crate::clients::sentoo::CreateTransactionRequest;
use crate::error::ApiError;
use crate::models::models::{AppState, CreatePaymentRequest, CreatePaymentResponse, NewOrder, Phone};
use crate::models::status::{FulfillmentType, PaymentStatus, PhoneStatus};
use crate::schema::{orders, phones};
use crate::services::reconcile::revert_phone_if_reserved;
use axum::{extract::State, http::StatusCode, Json};
use diesel::prelude::*;
use std::sync::Arc;
use tracing::{error, info, warn};
use validator::Validate;

#[utoipa::path(
    post,
    path = "/api/payment/create",
    request_body = CreatePaymentRequest,
    responses(
        (status = 200, description = "Payment initiated", body = CreatePaymentResponse),
        (status = 400, description = "Invalid input"),
        (status = 404, description = "Phone not found"),
        (status = 409, description = "Phone is no longer available"),
        (status = 502, description = "Payment service unavailable"),
        (status = 500, description = "Internal server error")
    ),
    tag = "Payment"
)]
pub async fn create_payment(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreatePaymentRequest>,
) -> Result<Json<CreatePaymentResponse>, (StatusCode, String)> {
    // Reject before any state change
    req.validate().map_err(|e| {
        warn!("Payment create validation error: {}", e);
        ApiError::Validation(e)
    })?;

    let conn = &mut state.db.get().map_err(|e| {
        error!("Database connection failed: {}", e);
        ApiError::DatabaseConnection(e.to_string())
    })?;

    let phone: Phone = phones::table
        .find(req.phone_id)
        .select(Phone::as_select())
        .first(conn)
        .optional()
        .map_err(|e| {
            error!("Phone lookup failed: {}", e);
            ApiError::Database(e)
        })?
        .ok_or_else(|| {
            warn!("Payment create for unknown phone {}", req.phone_id);
            ApiError::NotFound("Phone not found".to_string())
        })?;

    if phone.status != PhoneStatus::Available.as_str() {
        return Err(ApiError::Conflict("Phone is no longer available".to_string()).into());
    }

    // Optimistic reservation: the update only wins if the row is still
    // available at write time.
    let reserved = diesel::update(
        phones::table
            .find(req.phone_id)
            .filter(phones::status.eq(PhoneStatus::Available.as_str())),
    )
    .set(phones::status.eq(PhoneStatus::Reserved.as_str()))
    .execute(conn)
    .map_err(|e| {
        error!("Phone reservation failed: {}", e);
        ApiError::Database(e)
    })?;

    if reserved == 0 {
        info!("Lost reservation race for phone {}", req.phone_id);
        return Err(ApiError::Conflict("Phone is no longer available".to_string()).into());
    }

    let delivery_fee_cents = if req.fulfillment_type == FulfillmentType::Delivery {
        state.delivery_fee_cents
    } else {
        0
    };
    let total_cents = phone.price_cents + delivery_fee_cents;

    let tx = match state
        .gateway
        .create_transaction(CreateTransactionRequest {
            amount_cents: total_cents,
            description: format!("HSO - {} {}", phone.brand, phone.model),
            customer_ref: req.buyer_email.clone(),
            return_url: format!(
                "{}/payment/return?phone_id={}&status=",
                state.site_url, req.phone_id
            ),
        })
        .await
    {
        Ok(tx) => tx,
        Err(e) => {
            error!("Gateway transaction creation failed: {}", e);
            // Compensating rollback; if this write also fails the sweep
            // recovers the phone later.
            if let Err(revert_err) = revert_phone_if_reserved(conn, req.phone_id) {
                error!(
                    "Rollback of reservation for phone {} failed: {}",
                    req.phone_id, revert_err
                );
            }
            return Err(ApiError::Upstream("Payment service unavailable".to_string()).into());
        }
    };

    let inserted = diesel::insert_into(orders::table)
        .values(NewOrder {
            phone_id: req.phone_id,
            buyer_name: req.buyer_name.clone(),
            buyer_email: req.buyer_email.clone(),
            buyer_phone: req.buyer_phone.clone(),
            amount_cents: total_cents,
            delivery_fee_cents,
            fulfillment_type: req.fulfillment_type.as_str().to_string(),
            delivery_address: req
                .delivery_address
                .as_deref()
                .map(str::trim)
                .filter(|a| !a.is_empty())
                .map(str::to_string),
            sentoo_tx_id: Some(tx.tx_id.clone()),
            sentoo_payment_url: Some(tx.payment_url.clone()),
            sentoo_qr_url: Some(tx.qr_code.clone()),
            payment_status: PaymentStatus::Created.as_str().to_string(),
        })
        .execute(conn);

    if let Err(e) = inserted {
        error!("Order creation failed: {}", e);
        if let Err(revert_err) = revert_phone_if_reserved(conn, req.phone_id) {
            error!(
                "Rollback of reservation for phone {} failed: {}",
                req.phone_id, revert_err
            );
        }
        return Err(ApiError::Internal("Failed to create order".to_string()).into());
    }

    info!(
        "Order created for phone {} ({} cents, tx {})",
        req.phone_id, total_cents, tx.tx_id
    );

    Ok(Json(CreatePaymentResponse {
        payment_url: tx.payment_url,
        qr_code: tx.qr_code,
    }))
}
