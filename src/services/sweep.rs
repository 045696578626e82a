//! Stale reservation sweep: revert phones stuck in `reserved` whose
//! checkout never completed. Two callers share this service with different
//! staleness thresholds and different handling of inconclusive gateway
//! statuses (the asymmetry is deliberate; see DESIGN.md).

use crate::error::ApiError;
use crate::models::models::{AppState, Order, Phone};
use crate::models::status::{PaymentStatus, PhoneStatus};
use crate::schema::{orders, phones};
use crate::services::reconcile::{
    apply_success_side_effects, finalize_order_status, map_gateway_status,
    revert_phone_if_reserved,
};
use chrono::{Duration, Utc};
use diesel::prelude::*;
use serde::Serialize;
use tracing::{error, info};
use utoipa::ToSchema;
use uuid::Uuid;

const MANUAL_STALE_MINUTES: i64 = 10;
const CRON_STALE_MINUTES: i64 = 30;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SweepPolicy {
    /// Admin-triggered cleanup: short threshold, fails closed toward
    /// availability when the gateway is inconclusive.
    Manual,
    /// Scheduled sweep: longer threshold, leaves actively pending/issued
    /// transactions alone for another cycle.
    Cron,
}

impl SweepPolicy {
    pub fn stale_after(&self) -> Duration {
        match self {
            SweepPolicy::Manual => Duration::minutes(MANUAL_STALE_MINUTES),
            SweepPolicy::Cron => Duration::minutes(CRON_STALE_MINUTES),
        }
    }
}

/// What the sweep learned about a stale phone's most recent open order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayOutcome {
    /// No open order, or the order never reached the gateway.
    NoTransaction,
    /// Live status fetch failed; we cannot verify.
    Unreachable,
    /// Mapped live status.
    Status(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SweepAction {
    Revert,
    MarkSold,
    SkipStillPending,
}

impl SweepAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            SweepAction::Revert => "reverted",
            SweepAction::MarkSold => "marked_sold",
            SweepAction::SkipStillPending => "skipped_still_pending",
        }
    }
}

/// Per-phone decision. A payment that succeeded after the staleness window
/// is never reverted. Still-pending transactions are skipped only by the
/// cron policy; the manual path reverts them.
pub fn decide_action(policy: SweepPolicy, outcome: &GatewayOutcome) -> SweepAction {
    match outcome {
        GatewayOutcome::Status(s) if s == PaymentStatus::Success.as_str() => SweepAction::MarkSold,
        GatewayOutcome::Status(s)
            if policy == SweepPolicy::Cron
                && (s == PaymentStatus::Pending.as_str()
                    || s == PaymentStatus::Issued.as_str()) =>
        {
            SweepAction::SkipStillPending
        }
        _ => SweepAction::Revert,
    }
}

#[derive(Serialize, ToSchema, Debug)]
pub struct SweepItem {
    pub phone_id: Uuid,
    pub model: String,
    pub action: String,
}

#[derive(Serialize, ToSchema, Debug)]
pub struct SweepReport {
    pub reverted: usize,
    pub details: Vec<SweepItem>,
}

pub async fn sweep_stale_reservations(
    state: &AppState,
    policy: SweepPolicy,
) -> Result<SweepReport, ApiError> {
    let cutoff = Utc::now() - policy.stale_after();

    let stale: Vec<Phone> = {
        let conn = &mut state.db.get().map_err(|e| {
            error!("Database connection failed: {}", e);
            ApiError::DatabaseConnection(e.to_string())
        })?;
        phones::table
            .filter(phones::status.eq(PhoneStatus::Reserved.as_str()))
            .filter(phones::updated_at.lt(cutoff))
            .select(Phone::as_select())
            .load(conn)
            .map_err(|e| {
                error!("Stale phone query failed: {}", e);
                ApiError::Database(e)
            })?
    };

    let mut details = Vec::with_capacity(stale.len());

    for phone in stale {
        let order: Option<Order> = {
            let conn = &mut state.db.get().map_err(|e| {
                error!("Database connection failed: {}", e);
                ApiError::DatabaseConnection(e.to_string())
            })?;
            orders::table
                .filter(orders::phone_id.eq(phone.id))
                .filter(orders::payment_status.eq_any([
                    PaymentStatus::Created.as_str(),
                    PaymentStatus::Issued.as_str(),
                    PaymentStatus::Pending.as_str(),
                ]))
                .order(orders::created_at.desc())
                .select(Order::as_select())
                .first(conn)
                .optional()
                .map_err(|e| {
                    error!("Open order lookup for phone {} failed: {}", phone.id, e);
                    ApiError::Database(e)
                })?
        };

        let outcome = match order.as_ref().and_then(|o| o.sentoo_tx_id.as_deref()) {
            None => GatewayOutcome::NoTransaction,
            Some(tx_id) => match state.gateway.fetch_status(tx_id).await {
                Ok(gs) => GatewayOutcome::Status(map_gateway_status(&gs.status)),
                Err(e) => {
                    error!("Sweep: status check for {} failed: {}", tx_id, e);
                    GatewayOutcome::Unreachable
                }
            },
        };

        let action = decide_action(policy, &outcome);
        match action {
            SweepAction::MarkSold => {
                if let Some(order) = &order {
                    let conn = &mut state.db.get().map_err(|e| {
                        error!("Database connection failed: {}", e);
                        ApiError::DatabaseConnection(e.to_string())
                    })?;
                    finalize_order_status(conn, order.id, PaymentStatus::Success.as_str())?;
                    apply_success_side_effects(state, conn, order, &phone).await?;
                    info!(
                        "Sweep: phone {} payment succeeded late, marked sold",
                        phone.id
                    );
                }
            }
            SweepAction::SkipStillPending => {
                info!("Sweep: phone {} still actively pending, skipped", phone.id);
            }
            SweepAction::Revert => {
                let conn = &mut state.db.get().map_err(|e| {
                    error!("Database connection failed: {}", e);
                    ApiError::DatabaseConnection(e.to_string())
                })?;
                revert_phone_if_reserved(conn, phone.id)?;
                if let Some(order) = &order {
                    finalize_order_status(conn, order.id, PaymentStatus::Expired.as_str())?;
                }
                info!("Sweep: phone {} reverted to available", phone.id);
            }
        }

        details.push(SweepItem {
            phone_id: phone.id,
            model: phone.model.clone(),
            action: action.as_str().to_string(),
        });
    }

    let reverted = details
        .iter()
        .filter(|d| d.action == SweepAction::Revert.as_str())
        .count();

    Ok(SweepReport { reverted, details })
}
