//! Shared payment-status reconciliation: the status map from gateway
//! transaction statuses to the order's `payment_status`, the pure decision
//! over what a reconciliation trigger should do, and the side effects that
//! fire exactly once per terminal transition. Used by the verify poll, the
//! webhook and the stale-reservation sweep.

use crate::clients::sentoo::GatewayStatus;
use crate::error::ApiError;
use crate::models::models::{AppState, Order, Phone};
use crate::models::status::{PaymentStatus, PhoneStatus};
use crate::schema::{orders, phones};
use crate::services::invoice;
use diesel::prelude::*;
use diesel::PgConnection;
use tracing::{error, info, warn};
use uuid::Uuid;

/// Signed invoice URLs stay valid for 7 days.
const INVOICE_URL_TTL_SECS: u32 = 60 * 60 * 24 * 7;

/// Map a gateway transaction status to the internal `payment_status`.
/// `rejected` folds into `failed`; unrecognized values pass through
/// unchanged for forward compatibility (callers log them as anomalies).
pub fn map_gateway_status(raw: &str) -> String {
    match raw {
        "success" => "success".to_string(),
        "pending" => "pending".to_string(),
        "issued" => "issued".to_string(),
        "failed" => "failed".to_string(),
        "cancelled" => "cancelled".to_string(),
        "expired" => "expired".to_string(),
        "rejected" => "failed".to_string(),
        other => other.to_string(),
    }
}

/// The latest attempt's sub-status when it failed under a still-open
/// `issued` transaction. Advisory display information only; an attempt
/// failure never forces the order terminal while the transaction is open.
pub fn failed_attempt_status(gateway: &GatewayStatus) -> Option<String> {
    if gateway.status != "issued" {
        return None;
    }
    let last = gateway.attempts.last()?;
    let s = last.status.as_deref()?.to_lowercase();
    match s.as_str() {
        "cancelled" | "rejected" | "failed" => Some(s),
        _ => None,
    }
}

pub fn latest_attempt_message(gateway: &GatewayStatus) -> Option<String> {
    gateway.attempts.last().and_then(|a| a.message.clone())
}

/// What a reconciliation trigger should do for an order, given the live
/// gateway status. Pure; the callers apply the writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileAction {
    /// Stored status already matches the mapped status; no write.
    NoChange,
    /// Transaction open (`issued`) but the latest attempt failed: surface
    /// the attempt status with a retryable flag, write nothing.
    AdvisoryRetry { display_status: String },
    /// Move the order to `issued`; no terminal side effects.
    MoveToIssued,
    /// Write the mapped status and run its side effects.
    Apply { status: String },
}

pub fn plan_reconciliation(current_status: &str, gateway: &GatewayStatus) -> ReconcileAction {
    let mapped = map_gateway_status(&gateway.status);

    if let Some(attempt) = failed_attempt_status(gateway) {
        let display_status = if attempt == "rejected" {
            "failed".to_string()
        } else {
            attempt
        };
        return ReconcileAction::AdvisoryRetry { display_status };
    }

    if mapped == current_status {
        return ReconcileAction::NoChange;
    }
    if mapped == PaymentStatus::Issued.as_str() {
        return ReconcileAction::MoveToIssued;
    }
    ReconcileAction::Apply { status: mapped }
}

pub fn finalize_order_status(
    conn: &mut PgConnection,
    order_id: Uuid,
    status: &str,
) -> Result<(), ApiError> {
    if PaymentStatus::parse(status).is_none() {
        warn!(
            "Storing unrecognized gateway status '{}' on order {} verbatim",
            status, order_id
        );
    }
    diesel::update(orders::table.find(order_id))
        .set(orders::payment_status.eq(status))
        .execute(conn)
        .map_err(|e| {
            error!("Order {} status update failed: {}", order_id, e);
            ApiError::Database(e)
        })?;
    Ok(())
}

/// Revert a reservation, conditional on the phone still being reserved.
/// Returns the affected-row count (0 means someone else moved it first).
pub fn revert_phone_if_reserved(
    conn: &mut PgConnection,
    phone_id: Uuid,
) -> Result<usize, ApiError> {
    diesel::update(
        phones::table
            .find(phone_id)
            .filter(phones::status.eq(PhoneStatus::Reserved.as_str())),
    )
    .set(phones::status.eq(PhoneStatus::Available.as_str()))
    .execute(conn)
    .map_err(|e| {
        error!("Phone {} revert failed: {}", phone_id, e);
        ApiError::Database(e)
    })
}

/// Success side effects: mark the phone sold, claim the one-shot
/// notification dispatch, then best-effort invoice + notifications.
/// Runs on the caller's connection; no second pool checkout.
///
/// The claim is a conditional update on `notifications_sent`, so exactly
/// one of several concurrent reconciliation triggers dispatches.
pub async fn apply_success_side_effects(
    state: &AppState,
    conn: &mut PgConnection,
    order: &Order,
    phone: &Phone,
) -> Result<(), ApiError> {
    diesel::update(phones::table.find(order.phone_id))
        .set(phones::status.eq(PhoneStatus::Sold.as_str()))
        .execute(conn)
        .map_err(|e| {
            error!("Phone {} sold update failed: {}", order.phone_id, e);
            ApiError::Database(e)
        })?;

    let claimed = diesel::update(
        orders::table
            .find(order.id)
            .filter(orders::notifications_sent.eq(false)),
    )
    .set(orders::notifications_sent.eq(true))
    .execute(conn)
    .map_err(|e| {
        error!("Notification claim for order {} failed: {}", order.id, e);
        ApiError::Database(e)
    })?;

    if claimed == 0 {
        info!(
            "Notifications for order {} already dispatched, skipping",
            order.id
        );
        return Ok(());
    }

    // Invoice generation, upload and signing are best effort: a missing
    // invoice must not block the confirmation email.
    let invoice_url = match invoice::render_invoice_pdf(order, phone) {
        Ok(bytes) => {
            let path = format!("invoices/{}.pdf", order.id);
            match state.storage.upload(&path, bytes, "application/pdf").await {
                Ok(()) => match state.storage.signed_url(&path, INVOICE_URL_TTL_SECS).await {
                    Ok(url) => Some(url),
                    Err(e) => {
                        error!("Invoice signed URL for order {} failed: {}", order.id, e);
                        None
                    }
                },
                Err(e) => {
                    error!("Invoice upload for order {} failed: {}", order.id, e);
                    None
                }
            }
        }
        Err(e) => {
            error!("Invoice generation for order {} failed: {}", order.id, e);
            None
        }
    };

    state
        .notifier
        .order_confirmation(order, phone, invoice_url.as_deref())
        .await;

    Ok(())
}

/// Apply the side effects of a status written by [`finalize_order_status`],
/// on the caller's connection.
pub async fn run_terminal_side_effects(
    state: &AppState,
    conn: &mut PgConnection,
    order: &Order,
    phone: &Phone,
    status: &str,
) -> Result<(), ApiError> {
    match PaymentStatus::parse(status) {
        Some(PaymentStatus::Success) => {
            apply_success_side_effects(state, conn, order, phone).await
        }
        Some(PaymentStatus::Failed)
        | Some(PaymentStatus::Cancelled)
        | Some(PaymentStatus::Expired) => {
            revert_phone_if_reserved(conn, order.phone_id)?;
            Ok(())
        }
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::sentoo::GatewayAttempt;

    fn status(s: &str) -> GatewayStatus {
        GatewayStatus {
            status: s.to_string(),
            attempts: vec![],
        }
    }

    fn status_with_attempt(s: &str, attempt: &str) -> GatewayStatus {
        GatewayStatus {
            status: s.to_string(),
            attempts: vec![GatewayAttempt {
                status: Some(attempt.to_string()),
                message: Some("processor declined".to_string()),
            }],
        }
    }

    #[test]
    fn status_map_is_total_over_gateway_values() {
        assert_eq!(map_gateway_status("success"), "success");
        assert_eq!(map_gateway_status("pending"), "pending");
        assert_eq!(map_gateway_status("issued"), "issued");
        assert_eq!(map_gateway_status("failed"), "failed");
        assert_eq!(map_gateway_status("cancelled"), "cancelled");
        assert_eq!(map_gateway_status("expired"), "expired");
        assert_eq!(map_gateway_status("rejected"), "failed");
    }

    #[test]
    fn unknown_statuses_pass_through() {
        assert_eq!(map_gateway_status("chargeback"), "chargeback");
        assert_eq!(map_gateway_status(""), "");
    }

    #[test]
    fn unchanged_status_is_a_no_op() {
        assert_eq!(
            plan_reconciliation("pending", &status("pending")),
            ReconcileAction::NoChange
        );
        assert_eq!(
            plan_reconciliation("issued", &status("issued")),
            ReconcileAction::NoChange
        );
    }

    #[test]
    fn open_transaction_moves_to_issued_without_side_effects() {
        assert_eq!(
            plan_reconciliation("created", &status("issued")),
            ReconcileAction::MoveToIssued
        );
    }

    #[test]
    fn terminal_statuses_apply() {
        assert_eq!(
            plan_reconciliation("pending", &status("success")),
            ReconcileAction::Apply {
                status: "success".to_string()
            }
        );
        assert_eq!(
            plan_reconciliation("issued", &status("rejected")),
            ReconcileAction::Apply {
                status: "failed".to_string()
            }
        );
    }

    #[test]
    fn failed_attempt_under_issued_stays_open_and_retryable() {
        for attempt in ["cancelled", "failed"] {
            assert_eq!(
                plan_reconciliation("issued", &status_with_attempt("issued", attempt)),
                ReconcileAction::AdvisoryRetry {
                    display_status: attempt.to_string()
                }
            );
        }
        // rejected attempts display as failed
        assert_eq!(
            plan_reconciliation("issued", &status_with_attempt("issued", "rejected")),
            ReconcileAction::AdvisoryRetry {
                display_status: "failed".to_string()
            }
        );
    }

    #[test]
    fn successful_attempt_history_does_not_trigger_advisory() {
        assert_eq!(
            plan_reconciliation("issued", &status_with_attempt("issued", "pending")),
            ReconcileAction::NoChange
        );
    }

    #[test]
    fn attempts_are_ignored_once_transaction_is_terminal() {
        // A failed attempt recorded under a transaction that later
        // succeeded must not shadow the success.
        assert_eq!(
            plan_reconciliation("pending", &status_with_attempt("success", "failed")),
            ReconcileAction::Apply {
                status: "success".to_string()
            }
        );
    }

    #[test]
    fn unknown_status_applies_verbatim() {
        assert_eq!(
            plan_reconciliation("pending", &status("chargeback")),
            ReconcileAction::Apply {
                status: "chargeback".to_string()
            }
        );
    }
}
