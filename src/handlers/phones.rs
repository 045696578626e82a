use crate::error::ApiError;
use crate::models::models::{AppState, CreatePhoneRequest, NewPhone, Phone, PhoneChanges};
use crate::models::status::PhoneStatus;
use crate::schema::phones;
use axum::extract::{Path, Query, State};
use axum::{http::StatusCode, Json};
use diesel::prelude::*;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{error, info, warn};
use utoipa::IntoParams;
use uuid::Uuid;
use validator::Validate;

#[derive(Deserialize, IntoParams)]
pub struct PhoneListParams {
    pub status: Option<String>,
    pub brand: Option<String>,
}

#[utoipa::path(
    get,
    path = "/api/phones",
    params(PhoneListParams),
    responses(
        (status = 200, description = "Phone listings, newest first", body = Vec<Phone>),
        (status = 500, description = "Internal server error")
    ),
    tag = "Catalog"
)]
pub async fn list_phones(
    State(state): State<Arc<AppState>>,
    Query(params): Query<PhoneListParams>,
) -> Result<Json<Vec<Phone>>, (StatusCode, String)> {
    let conn = &mut state.db.get().map_err(|e| {
        error!("Database connection failed: {}", e);
        ApiError::DatabaseConnection(e.to_string())
    })?;

    let mut query = phones::table.into_boxed();
    if let Some(status) = params.status {
        query = query.filter(phones::status.eq(status));
    }
    if let Some(brand) = params.brand {
        query = query.filter(phones::brand.eq(brand));
    }

    let listings = query
        .order(phones::created_at.desc())
        .select(Phone::as_select())
        .load(conn)
        .map_err(|e| {
            error!("Phone list query failed: {}", e);
            ApiError::Database(e)
        })?;

    Ok(Json(listings))
}

#[utoipa::path(
    get,
    path = "/api/phones/{id}",
    params(("id" = Uuid, Path, description = "Phone id")),
    responses(
        (status = 200, description = "Phone detail", body = Phone),
        (status = 404, description = "Phone not found"),
        (status = 500, description = "Internal server error")
    ),
    tag = "Catalog"
)]
pub async fn get_phone(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Phone>, (StatusCode, String)> {
    let conn = &mut state.db.get().map_err(|e| {
        error!("Database connection failed: {}", e);
        ApiError::DatabaseConnection(e.to_string())
    })?;

    let phone: Phone = phones::table
        .find(id)
        .select(Phone::as_select())
        .first(conn)
        .optional()
        .map_err(|e| {
            error!("Phone lookup failed: {}", e);
            ApiError::Database(e)
        })?
        .ok_or_else(|| ApiError::NotFound("Phone not found".to_string()))?;

    Ok(Json(phone))
}

#[utoipa::path(
    post,
    path = "/api/admin/phones",
    request_body = CreatePhoneRequest,
    responses(
        (status = 200, description = "Listing created", body = Phone),
        (status = 400, description = "Invalid input"),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Internal server error")
    ),
    security(("bearerAuth" = [])),
    tag = "Admin"
)]
pub async fn create_phone(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreatePhoneRequest>,
) -> Result<Json<Phone>, (StatusCode, String)> {
    req.validate().map_err(|e| {
        warn!("Phone create validation error: {}", e);
        ApiError::Validation(e)
    })?;

    let conn = &mut state.db.get().map_err(|e| {
        error!("Database connection failed: {}", e);
        ApiError::DatabaseConnection(e.to_string())
    })?;

    let phone: Phone = diesel::insert_into(phones::table)
        .values(NewPhone {
            brand: req.brand,
            model: req.model,
            price_cents: req.price_cents,
            color: req.color,
            battery_pct: req.battery_pct,
            storage_gb: req.storage_gb,
            grade: req.grade,
            reference: req.reference,
            description: req.description,
            images: req.images,
            warranty_months: req.warranty_months,
            status: PhoneStatus::Available.as_str().to_string(),
        })
        .get_result(conn)
        .map_err(|e| {
            error!("Phone insert failed: {}", e);
            ApiError::Database(e)
        })?;

    info!("Listing created: {} {} ({})", phone.brand, phone.model, phone.id);
    Ok(Json(phone))
}

#[utoipa::path(
    put,
    path = "/api/admin/phones/{id}",
    params(("id" = Uuid, Path, description = "Phone id")),
    request_body = PhoneChanges,
    responses(
        (status = 200, description = "Listing updated", body = Phone),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Phone not found"),
        (status = 500, description = "Internal server error")
    ),
    security(("bearerAuth" = [])),
    tag = "Admin"
)]
pub async fn update_phone(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(changes): Json<PhoneChanges>,
) -> Result<Json<Phone>, (StatusCode, String)> {
    let conn = &mut state.db.get().map_err(|e| {
        error!("Database connection failed: {}", e);
        ApiError::DatabaseConnection(e.to_string())
    })?;

    let phone: Phone = diesel::update(phones::table.find(id))
        .set(&changes)
        .get_result(conn)
        .map_err(|e| match e {
            diesel::result::Error::NotFound => {
                ApiError::NotFound("Phone not found".to_string())
            }
            other => {
                error!("Phone update failed: {}", other);
                ApiError::Database(other)
            }
        })?;

    Ok(Json(phone))
}

#[utoipa::path(
    delete,
    path = "/api/admin/phones/{id}",
    params(("id" = Uuid, Path, description = "Phone id")),
    responses(
        (status = 204, description = "Listing deleted"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Phone not found"),
        (status = 500, description = "Internal server error")
    ),
    security(("bearerAuth" = [])),
    tag = "Admin"
)]
pub async fn delete_phone(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, (StatusCode, String)> {
    let conn = &mut state.db.get().map_err(|e| {
        error!("Database connection failed: {}", e);
        ApiError::DatabaseConnection(e.to_string())
    })?;

    let deleted = diesel::delete(phones::table.find(id))
        .execute(conn)
        .map_err(|e| {
            error!("Phone delete failed: {}", e);
            ApiError::Database(e)
        })?;

    if deleted == 0 {
        return Err(ApiError::NotFound("Phone not found".to_string()).into());
    }

    info!("Listing {} deleted", id);
    Ok(StatusCode::NO_CONTENT)
}
