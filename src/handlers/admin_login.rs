use crate::config::security_config::create_token;
use crate::error::ApiError;
use crate::models::models::{AdminLoginRequest, AdminLoginResponse, AppState};
use axum::{extract::State, http::StatusCode, Json};
use bcrypt::verify;
use std::sync::Arc;
use tracing::{info, warn};
use validator::Validate;

const DUMMY_HASH: &str = "$2b$12$dummyhashdummyhashdummyhashdummyhashdummyhashdummyha";

#[utoipa::path(
    post,
    path = "/api/admin/login",
    request_body = AdminLoginRequest,
    responses(
        (status = 200, description = "Login successful", body = AdminLoginResponse),
        (status = 400, description = "Invalid input"),
        (status = 401, description = "Invalid email or password"),
        (status = 500, description = "Internal server error")
    ),
    tag = "Auth"
)]
pub async fn admin_login(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<AdminLoginRequest>,
) -> Result<Json<AdminLoginResponse>, (StatusCode, String)> {
    payload.validate().map_err(|e| {
        warn!("Login validation error: {}", e);
        ApiError::Validation(e)
    })?;

    info!("Admin login attempt for {}", payload.email);

    if payload.email != state.admin_email {
        // Dummy verification to level timing against unknown emails
        let _ = verify(&payload.password, DUMMY_HASH);
        warn!("Login attempt with unknown email: {}", payload.email);
        return Err(ApiError::Auth("Invalid email or password".to_string()).into());
    }

    if !verify(&payload.password, &state.admin_password_hash).map_err(|e| {
        tracing::error!("Password verification error: {}", e);
        ApiError::from(e)
    })? {
        warn!("Invalid password for admin {}", payload.email);
        return Err(ApiError::Auth("Invalid email or password".to_string()).into());
    }

    let token = create_token(&state, &payload.email)?;
    Ok(Json(AdminLoginResponse { token }))
}
