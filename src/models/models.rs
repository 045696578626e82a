use crate::clients::notifications::Notifier;
use crate::clients::sentoo::PaymentGateway;
use crate::clients::storage::BlobStorage;
use crate::models::status::FulfillmentType;
use crate::schema::{orders, phones};
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel::r2d2::{self, ConnectionManager};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationError};

#[derive(Queryable, Selectable, Identifiable, Serialize, Clone, Debug, ToSchema)]
#[diesel(check_for_backend(diesel::pg::Pg))]
#[diesel(table_name = phones)]
pub struct Phone {
    pub id: Uuid,
    pub brand: String,
    pub model: String,
    pub price_cents: i64, // minor currency units (XCG cents)
    pub color: Option<String>,
    pub battery_pct: Option<i32>,
    pub storage_gb: Option<i32>,
    pub grade: Option<String>,
    pub reference: Option<String>,
    pub description: Option<String>,
    pub images: Vec<String>,
    pub warranty_months: Option<i32>,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = phones)]
pub struct NewPhone {
    pub brand: String,
    pub model: String,
    pub price_cents: i64,
    pub color: Option<String>,
    pub battery_pct: Option<i32>,
    pub storage_gb: Option<i32>,
    pub grade: Option<String>,
    pub reference: Option<String>,
    pub description: Option<String>,
    pub images: Vec<String>,
    pub warranty_months: Option<i32>,
    pub status: String,
}

/// Partial update for a listing; `None` fields are left untouched.
#[derive(AsChangeset, Deserialize, Debug, Default, ToSchema)]
#[diesel(table_name = phones)]
pub struct PhoneChanges {
    pub brand: Option<String>,
    pub model: Option<String>,
    pub price_cents: Option<i64>,
    pub color: Option<String>,
    pub battery_pct: Option<i32>,
    pub storage_gb: Option<i32>,
    pub grade: Option<String>,
    pub reference: Option<String>,
    pub description: Option<String>,
    pub images: Option<Vec<String>>,
    pub warranty_months: Option<i32>,
}

#[derive(Queryable, Selectable, Identifiable, Serialize, Clone, Debug, ToSchema)]
#[diesel(check_for_backend(diesel::pg::Pg))]
#[diesel(table_name = orders)]
pub struct Order {
    pub id: Uuid,
    pub phone_id: Uuid,
    pub buyer_name: String,
    pub buyer_email: String,
    pub buyer_phone: String,
    pub amount_cents: i64,
    pub delivery_fee_cents: i64,
    pub fulfillment_type: String,
    pub delivery_address: Option<String>,
    pub sentoo_tx_id: Option<String>,
    pub sentoo_payment_url: Option<String>,
    pub sentoo_qr_url: Option<String>,
    pub payment_status: String,
    pub notifications_sent: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = orders)]
pub struct NewOrder {
    pub phone_id: Uuid,
    pub buyer_name: String,
    pub buyer_email: String,
    pub buyer_phone: String,
    pub amount_cents: i64,
    pub delivery_fee_cents: i64,
    pub fulfillment_type: String,
    pub delivery_address: Option<String>,
    pub sentoo_tx_id: Option<String>,
    pub sentoo_payment_url: Option<String>,
    pub sentoo_qr_url: Option<String>,
    pub payment_status: String,
}

pub type DbPool = r2d2::Pool<ConnectionManager<PgConnection>>;

/// Shared application state. The gateway, blob storage and notifier are
/// injected collaborators so tests can substitute fakes.
#[derive(Clone)]
pub struct AppState {
    pub db: DbPool,
    pub gateway: Arc<dyn PaymentGateway>,
    pub storage: Arc<dyn BlobStorage>,
    pub notifier: Arc<dyn Notifier>,
    pub jwt_secret: String,
    pub cron_secret: String,
    pub site_url: String,
    pub admin_email: String,
    pub admin_password_hash: String,
    pub delivery_fee_cents: i64,
}

#[derive(Deserialize, ToSchema, Validate)]
#[validate(schema(function = "validate_delivery_address"))]
pub struct CreatePaymentRequest {
    pub phone_id: Uuid,
    #[validate(length(min = 1, max = 100, message = "Name must be between 1 and 100 characters"))]
    pub buyer_name: String,
    #[validate(email(message = "Invalid email format"))]
    pub buyer_email: String,
    #[validate(length(min = 5, max = 20, message = "Phone number must be between 5 and 20 characters"))]
    pub buyer_phone: String,
    #[serde(default)]
    pub fulfillment_type: FulfillmentType,
    #[validate(length(max = 500, message = "Delivery address too long"))]
    pub delivery_address: Option<String>,
}

fn validate_delivery_address(req: &CreatePaymentRequest) -> Result<(), ValidationError> {
    if req.fulfillment_type == FulfillmentType::Delivery
        && req
            .delivery_address
            .as_deref()
            .map(|a| a.trim().is_empty())
            .unwrap_or(true)
    {
        return Err(ValidationError::new(
            "delivery_address_required",
        ));
    }
    Ok(())
}

#[derive(Serialize, ToSchema)]
pub struct CreatePaymentResponse {
    pub payment_url: String,
    pub qr_code: String,
}

#[derive(Serialize, ToSchema, Debug)]
pub struct VerifyResponse {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub processor_message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sentoo_payment_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retryable: Option<bool>,
}

#[derive(Deserialize, ToSchema, Validate)]
pub struct AdminLoginRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,
}

#[derive(Serialize, ToSchema)]
pub struct AdminLoginResponse {
    pub token: String,
}

#[derive(Deserialize, ToSchema, Validate)]
pub struct CreatePhoneRequest {
    #[validate(length(min = 1, max = 100))]
    pub brand: String,
    #[validate(length(min = 1, max = 100))]
    pub model: String,
    #[validate(range(min = 0))]
    pub price_cents: i64,
    pub color: Option<String>,
    #[validate(range(min = 0, max = 100))]
    pub battery_pct: Option<i32>,
    pub storage_gb: Option<i32>,
    pub grade: Option<String>,
    pub reference: Option<String>,
    pub description: Option<String>,
    #[serde(default)]
    pub images: Vec<String>,
    pub warranty_months: Option<i32>,
}

#[derive(Deserialize, ToSchema, Default)]
pub struct MarkSoldRequest {
    pub order_id: Option<Uuid>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_request() -> CreatePaymentRequest {
        CreatePaymentRequest {
            phone_id: Uuid::new_v4(),
            buyer_name: "Jane Buyer".to_string(),
            buyer_email: "jane@example.com".to_string(),
            buyer_phone: "+5999 555 1234".to_string(),
            fulfillment_type: FulfillmentType::Pickup,
            delivery_address: None,
        }
    }

    #[test]
    fn pickup_without_address_is_valid() {
        assert!(base_request().validate().is_ok());
    }

    #[test]
    fn delivery_requires_address() {
        let mut req = base_request();
        req.fulfillment_type = FulfillmentType::Delivery;
        assert!(req.validate().is_err());

        req.delivery_address = Some("   ".to_string());
        assert!(req.validate().is_err());

        req.delivery_address = Some("Kaya Grandi 12, Willemstad".to_string());
        assert!(req.validate().is_ok());
    }

    #[test]
    fn malformed_email_is_rejected() {
        let mut req = base_request();
        req.buyer_email = "not-an-email".to_string();
        assert!(req.validate().is_err());
    }

    #[test]
    fn short_phone_number_is_rejected() {
        let mut req = base_request();
        req.buyer_phone = "123".to_string();
        assert!(req.validate().is_err());
    }
}
