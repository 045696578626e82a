use crate::handlers::{
    admin_cleanup::__path_admin_cleanup_reserved, admin_login::__path_admin_login,
    cron_revert::__path_cron_revert_reserved, health::__path_health_check,
    mark_sold::__path_mark_phone_sold, orders::__path_list_orders,
    payment_create::__path_create_payment, payment_verify::__path_verify_payment,
    phones::__path_create_phone, phones::__path_delete_phone, phones::__path_get_phone,
    phones::__path_list_phones, phones::__path_update_phone,
    sentoo_webhook::__path_sentoo_webhook,
};
use crate::models::models::{
    AdminLoginRequest, AdminLoginResponse, CreatePaymentRequest, CreatePaymentResponse,
    CreatePhoneRequest, MarkSoldRequest, Order, Phone, PhoneChanges, VerifyResponse,
};
use crate::services::sweep::{SweepItem, SweepReport};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

#[derive(OpenApi)]
#[openapi(
    paths(
        health_check, list_phones, get_phone, create_payment, verify_payment,
        sentoo_webhook, cron_revert_reserved, admin_login, create_phone,
        update_phone, delete_phone, mark_phone_sold, list_orders,
        admin_cleanup_reserved
    ),
    components(schemas(
        Phone, PhoneChanges, Order, CreatePaymentRequest, CreatePaymentResponse,
        VerifyResponse, AdminLoginRequest, AdminLoginResponse, CreatePhoneRequest,
        MarkSoldRequest, SweepItem, SweepReport
    )),
    modifiers(&SecurityAddon),
    tags(
        (name = "Catalog", description = "Public phone catalog"),
        (name = "Payment", description = "Checkout and payment verification"),
        (name = "Webhook", description = "Payment gateway notifications"),
        (name = "Sweep", description = "Stale reservation cleanup"),
        (name = "Auth", description = "Admin authentication"),
        (name = "Admin", description = "Back-office management")
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        // Define the security scheme in components.securitySchemes
        if let Some(components) = openapi.components.as_mut() {
            components.security_schemes.insert(
                "bearerAuth".to_string(),
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}
