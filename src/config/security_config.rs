use crate::error::ApiError;
use crate::models::models::AppState;
use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;
use chrono::{Duration, Utc};
use http::{HeaderMap, StatusCode};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::env;
use std::sync::Arc;
use tracing::{error, warn};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // admin identity (email)
    pub exp: usize,  // expiration time
    pub iat: usize,  // issued at
}

pub struct JWTSecret {
    pub jwt_secret: String,
}

impl JWTSecret {
    pub fn new() -> Self {
        let jwt_secret =
            env::var("JWT_SECRET").expect("JWT_SECRET must be set in environment variables");

        if jwt_secret.len() < 32 {
            panic!("JWT_SECRET must be at least 32 characters long");
        }

        Self { jwt_secret }
    }
}

pub fn create_token(state: &AppState, subject: &str) -> Result<String, ApiError> {
    let secret = state.jwt_secret.as_bytes();

    let now = Utc::now();
    let expiration_hours: i64 = env::var("JWT_EXPIRATION_HOURS")
        .unwrap_or_else(|_| "8".to_string())
        .parse()
        .map_err(|e| {
            error!("JWT expiration config error: {}", e);
            ApiError::Token(format!("Invalid JWT expiration configuration: {}", e))
        })?;

    let claims = Claims {
        sub: subject.to_string(),
        exp: (now + Duration::hours(expiration_hours)).timestamp() as usize,
        iat: now.timestamp() as usize,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret),
    )
    .map_err(|e| {
        error!("JWT encoding error: {}", e);
        ApiError::Token(format!("Token creation failed: {}", e))
    })
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(http::header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
}

/// Admin JWT guard for the back-office routes.
pub async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    req: Request,
    next: Next,
) -> Result<Response, (StatusCode, String)> {
    let token = bearer_token(req.headers()).ok_or_else(|| {
        warn!("Missing or malformed Authorization header");
        (
            StatusCode::UNAUTHORIZED,
            "Authorization header required".to_string(),
        )
    })?;

    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(state.jwt_secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|e| {
        warn!("Invalid admin token: {}", e);
        (StatusCode::UNAUTHORIZED, format!("Invalid token: {}", e))
    })?;

    let mut req = req;
    req.extensions_mut().insert(token_data.claims);
    Ok(next.run(req).await)
}

/// Shared-secret guard for the scheduled sweep endpoint. The external cron
/// runner sends `Authorization: Bearer <CRON_SECRET>`.
pub fn require_cron_secret(state: &AppState, headers: &HeaderMap) -> Result<(), ApiError> {
    if state.cron_secret.is_empty() {
        error!("CRON_SECRET not configured, rejecting cron request");
        return Err(ApiError::Auth("Unauthorized".to_string()));
    }
    match bearer_token(headers) {
        Some(token) if token == state.cron_secret => Ok(()),
        _ => {
            warn!("Cron request with missing or invalid bearer secret");
            Err(ApiError::Auth("Unauthorized".to_string()))
        }
    }
}
