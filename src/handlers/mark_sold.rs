use crate::error::ApiError;
use crate::models::models::{AppState, MarkSoldRequest};
use crate::models::status::{PaymentStatus, PhoneStatus};
use crate::schema::phones;
use crate::services::reconcile::finalize_order_status;
use axum::extract::{Path, State};
use axum::{http::StatusCode, Json};
use diesel::prelude::*;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{error, info};
use uuid::Uuid;

/// Manual sale recorded by an admin (cash sale, walk-in). An optional
/// order id moves that order to `manual` so it stops reconciling.
#[utoipa::path(
    post,
    path = "/api/admin/phones/{id}/sold",
    params(("id" = Uuid, Path, description = "Phone id")),
    request_body(content = MarkSoldRequest, description = "Optional order to mark manual"),
    responses(
        (status = 200, description = "Phone marked sold"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Phone not found"),
        (status = 500, description = "Internal server error")
    ),
    security(("bearerAuth" = [])),
    tag = "Admin"
)]
pub async fn mark_phone_sold(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    body: Option<Json<MarkSoldRequest>>,
) -> Result<Json<Value>, (StatusCode, String)> {
    let conn = &mut state.db.get().map_err(|e| {
        error!("Database connection failed: {}", e);
        ApiError::DatabaseConnection(e.to_string())
    })?;

    let updated = diesel::update(phones::table.find(id))
        .set(phones::status.eq(PhoneStatus::Sold.as_str()))
        .execute(conn)
        .map_err(|e| {
            error!("Phone sold update failed: {}", e);
            ApiError::Database(e)
        })?;

    if updated == 0 {
        return Err(ApiError::NotFound("Phone not found".to_string()).into());
    }

    if let Some(order_id) = body.and_then(|Json(b)| b.order_id) {
        finalize_order_status(conn, order_id, PaymentStatus::Manual.as_str())?;
        info!("Phone {} manually sold, order {} marked manual", id, order_id);
    } else {
        info!("Phone {} manually sold", id);
    }

    Ok(Json(json!({ "success": true })))
}
