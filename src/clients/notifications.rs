use crate::models::models::{Order, Phone};
use crate::models::status::FulfillmentType;
use crate::utility::format_currency;
use async_trait::async_trait;
use tracing::{error, info, warn};

/// Best-effort notification dispatch after a confirmed payment. Failures
/// are logged, never propagated.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn order_confirmation(&self, order: &Order, phone: &Phone, invoice_url: Option<&str>);
}

/// Resend-style transactional email client. Unconfigured (empty API key)
/// means every send is skipped with a warning, matching the storefront's
/// staging environments.
pub struct EmailNotifier {
    http: reqwest::Client,
    api_url: String,
    api_key: String,
    from: String,
}

impl EmailNotifier {
    pub fn new(api_url: String, api_key: String, from: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_url,
            api_key,
            from,
        }
    }

    fn confirmation_html(order: &Order, phone: &Phone, invoice_url: Option<&str>) -> String {
        let storage = phone
            .storage_gb
            .map(|gb| {
                if gb >= 1024 {
                    format!(" {}TB", gb / 1024)
                } else {
                    format!(" {}GB", gb)
                }
            })
            .unwrap_or_default();

        let invoice_button = invoice_url
            .map(|url| {
                format!(
                    r#"<a href="{}" style="display: inline-block; background: #1a1a1a; color: #ffffff; padding: 12px 24px; border-radius: 6px; text-decoration: none; margin-top: 16px;">Download Invoice</a>"#,
                    url
                )
            })
            .unwrap_or_default();

        let fulfillment_note = if order.fulfillment_type == FulfillmentType::Delivery.as_str() {
            "We will arrange delivery to your provided address."
        } else {
            "Please visit our store to pick up your phone. Bring this email as your receipt."
        };

        format!(
            r#"<div style="font-family: sans-serif; max-width: 600px; margin: 0 auto;">
  <h1 style="color: #1a1a1a;">Order Confirmed</h1>
  <p>Hi {name},</p>
  <p>Your purchase has been confirmed!</p>
  <div style="background: #f5f5f5; padding: 20px; border-radius: 8px; margin: 20px 0;">
    <p style="margin: 0 0 8px;"><strong>Phone:</strong> {model}{storage}</p>
    <p style="margin: 0 0 8px;"><strong>Color:</strong> {color}</p>
    <p style="margin: 0 0 8px;"><strong>Grade:</strong> {grade}</p>
    <p style="margin: 0 0 8px;"><strong>Amount:</strong> {amount}</p>
    <p style="margin: 0;"><strong>Order ID:</strong> {order_ref}</p>
  </div>
  {invoice_button}
  <p>{fulfillment_note}</p>
  <p>Thank you for shopping with HSO!</p>
</div>"#,
            name = order.buyer_name,
            model = phone.model,
            storage = storage,
            color = phone.color.as_deref().unwrap_or("N/A"),
            grade = phone.grade.as_deref().unwrap_or("N/A"),
            amount = format_currency(order.amount_cents),
            order_ref = &order.id.to_string()[..8],
            invoice_button = invoice_button,
            fulfillment_note = fulfillment_note,
        )
    }
}

#[async_trait]
impl Notifier for EmailNotifier {
    async fn order_confirmation(&self, order: &Order, phone: &Phone, invoice_url: Option<&str>) {
        if self.api_key.is_empty() {
            warn!("Email notifier not configured, skipping confirmation for order {}", order.id);
            return;
        }

        let payload = serde_json::json!({
            "from": self.from,
            "to": [order.buyer_email],
            "subject": format!("Order Confirmed - {}", phone.model),
            "html": Self::confirmation_html(order, phone, invoice_url),
        });

        let result = self
            .http
            .post(format!("{}/emails", self.api_url))
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await;

        match result {
            Ok(resp) if resp.status().is_success() => {
                info!("Confirmation email sent for order {}", order.id);
            }
            Ok(resp) => {
                let status = resp.status();
                let text = resp.text().await.unwrap_or_default();
                error!(
                    "Confirmation email for order {} rejected: status {}, body {}",
                    order.id, status, text
                );
            }
            Err(e) => {
                error!("Confirmation email for order {} failed: {}", order.id, e);
            }
        }
    }
}
