use crate::error::ApiError;
use crate::models::models::{AppState, Order};
use crate::schema::orders;
use axum::extract::{Query, State};
use axum::{http::StatusCode, Json};
use diesel::prelude::*;
use serde::Deserialize;
use std::sync::Arc;
use tracing::error;
use utoipa::IntoParams;

#[derive(Deserialize, IntoParams)]
pub struct OrderListParams {
    pub payment_status: Option<String>,
}

#[utoipa::path(
    get,
    path = "/api/admin/orders",
    params(OrderListParams),
    responses(
        (status = 200, description = "Orders, newest first", body = Vec<Order>),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Internal server error")
    ),
    security(("bearerAuth" = [])),
    tag = "Admin"
)]
pub async fn list_orders(
    State(state): State<Arc<AppState>>,
    Query(params): Query<OrderListParams>,
) -> Result<Json<Vec<Order>>, (StatusCode, String)> {
    let conn = &mut state.db.get().map_err(|e| {
        error!("Database connection failed: {}", e);
        ApiError::DatabaseConnection(e.to_string())
    })?;

    let mut query = orders::table.into_boxed();
    if let Some(status) = params.payment_status {
        query = query.filter(orders::payment_status.eq(status));
    }

    let rows = query
        .order(orders::created_at.desc())
        .select(Order::as_select())
        .load(conn)
        .map_err(|e| {
            error!("Order list query failed: {}", e);
            ApiError::Database(e)
        })?;

    Ok(Json(rows))
}
