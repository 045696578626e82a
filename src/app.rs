use axum::{middleware, Router};
use std::sync::Arc;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::config::security_config::auth_middleware;
use crate::config::swagger_config::ApiDoc;
use crate::handlers::{
    admin_cleanup::admin_cleanup_reserved, admin_login::admin_login,
    cron_revert::cron_revert_reserved, health::health_check, mark_sold::mark_phone_sold,
    orders::list_orders, payment_create::create_payment, payment_verify::verify_payment,
    phones::create_phone, phones::delete_phone, phones::get_phone, phones::list_phones,
    phones::update_phone, sentoo_webhook::sentoo_webhook,
};
use crate::models::models::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    // Public routes (no authentication)
    let public_router = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .route("/api/health", axum::routing::get(health_check))
        .route("/api/phones", axum::routing::get(list_phones))
        .route("/api/phones/{id}", axum::routing::get(get_phone))
        .route("/api/payment/create", axum::routing::post(create_payment))
        .route("/api/payment/verify", axum::routing::get(verify_payment))
        .route("/webhooks/sentoo", axum::routing::post(sentoo_webhook))
        .route(
            "/cron/revert-reserved",
            axum::routing::get(cron_revert_reserved),
        )
        .route("/api/admin/login", axum::routing::post(admin_login));

    // Protected routes (require JWT authentication)
    let protected_router = Router::new()
        .route("/api/admin/phones", axum::routing::post(create_phone))
        .route(
            "/api/admin/phones/{id}",
            axum::routing::put(update_phone).delete(delete_phone),
        )
        .route(
            "/api/admin/phones/{id}/sold",
            axum::routing::post(mark_phone_sold),
        )
        .route("/api/admin/orders", axum::routing::get(list_orders))
        .route(
            "/api/admin/cleanup-reserved",
            axum::routing::post(admin_cleanup_reserved),
        )
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    Router::new()
        .merge(public_router)
        .merge(protected_router)
        .with_state(state)
}
