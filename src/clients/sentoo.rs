use crate::error::ApiError;
use async_trait::async_trait;
use serde::Deserialize;
use tracing::error;

/// Outbound interface to the payment gateway. Injected into `AppState` so
/// the reconciliation logic can be exercised against a fake.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn create_transaction(
        &self,
        req: CreateTransactionRequest,
    ) -> Result<GatewayTransaction, ApiError>;

    async fn fetch_status(&self, tx_id: &str) -> Result<GatewayStatus, ApiError>;
}

#[derive(Debug, Clone)]
pub struct CreateTransactionRequest {
    pub amount_cents: i64,
    pub description: String,
    pub customer_ref: String,
    pub return_url: String,
}

#[derive(Debug, Clone)]
pub struct GatewayTransaction {
    pub tx_id: String,
    pub payment_url: String,
    pub qr_code: String,
}

/// Transaction-level status plus the per-attempt history. An attempt can
/// fail while the transaction itself stays open (`issued`).
#[derive(Debug, Clone)]
pub struct GatewayStatus {
    pub status: String,
    pub attempts: Vec<GatewayAttempt>,
}

#[derive(Debug, Clone)]
pub struct GatewayAttempt {
    pub status: Option<String>,
    pub message: Option<String>,
}

// Sentoo wire format. The create response carries the transaction id in
// `success.message`; the status response carries the status string there.

#[derive(Deserialize, Debug)]
pub struct SentooCreateResponse {
    pub success: SentooCreateBody,
}

#[derive(Deserialize, Debug)]
pub struct SentooCreateBody {
    pub message: String,
    pub data: SentooCreateData,
}

#[derive(Deserialize, Debug)]
pub struct SentooCreateData {
    pub url: String,
    pub qr_code: String,
}

#[derive(Deserialize, Debug)]
pub struct SentooStatusResponse {
    pub success: SentooStatusBody,
}

#[derive(Deserialize, Debug)]
pub struct SentooStatusBody {
    pub message: String,
    pub data: Option<SentooStatusData>,
}

#[derive(Deserialize, Debug)]
pub struct SentooStatusData {
    pub responses: Option<Vec<SentooAttempt>>,
}

#[derive(Deserialize, Debug)]
pub struct SentooAttempt {
    pub status: Option<String>,
    pub message: Option<String>,
}

pub struct SentooClient {
    http: reqwest::Client,
    api_url: String,
    merchant_id: String,
    secret: String,
}

impl SentooClient {
    pub fn new(api_url: String, merchant_id: String, secret: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_url,
            merchant_id,
            secret,
        }
    }
}

#[async_trait]
impl PaymentGateway for SentooClient {
    async fn create_transaction(
        &self,
        req: CreateTransactionRequest,
    ) -> Result<GatewayTransaction, ApiError> {
        // Sentoo caps the description at 50 characters
        let description: String = req.description.chars().take(50).collect();

        let form = [
            ("sentoo_merchant", self.merchant_id.as_str()),
            ("sentoo_amount", &req.amount_cents.to_string()),
            ("sentoo_description", &description),
            ("sentoo_currency", "XCG"),
            ("sentoo_return_url", &req.return_url),
            ("sentoo_customer", &req.customer_ref),
        ];

        let resp = self
            .http
            .post(format!("{}/v1/payment/new", self.api_url))
            .header("X-SENTOO-SECRET", &self.secret)
            .form(&form)
            .send()
            .await
            .map_err(|e| {
                error!("Sentoo create request failed: {}", e);
                ApiError::Upstream(format!("Sentoo create failed: {}", e))
            })?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            error!("Sentoo create error: status {}, body {}", status, text);
            return Err(ApiError::Upstream(format!(
                "Sentoo create failed ({}): {}",
                status, text
            )));
        }

        let body = resp.json::<SentooCreateResponse>().await.map_err(|e| {
            error!("Sentoo create response parsing failed: {}", e);
            ApiError::Upstream(format!("Invalid Sentoo create response: {}", e))
        })?;

        Ok(GatewayTransaction {
            tx_id: body.success.message,
            payment_url: body.success.data.url,
            qr_code: body.success.data.qr_code,
        })
    }

    async fn fetch_status(&self, tx_id: &str) -> Result<GatewayStatus, ApiError> {
        let resp = self
            .http
            .get(format!(
                "{}/v1/payment/status/{}/{}",
                self.api_url, self.merchant_id, tx_id
            ))
            .header("X-SENTOO-SECRET", &self.secret)
            .send()
            .await
            .map_err(|e| {
                error!("Sentoo status request failed: {}", e);
                ApiError::Upstream(format!("Sentoo status fetch failed: {}", e))
            })?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            error!("Sentoo status error: status {}, body {}", status, text);
            return Err(ApiError::Upstream(format!(
                "Sentoo status fetch failed ({}): {}",
                status, text
            )));
        }

        let body = resp.json::<SentooStatusResponse>().await.map_err(|e| {
            error!("Sentoo status response parsing failed: {}", e);
            ApiError::Upstream(format!("Invalid Sentoo status response: {}", e))
        })?;

        let attempts = body
            .success
            .data
            .and_then(|d| d.responses)
            .unwrap_or_default()
            .into_iter()
            .map(|a| GatewayAttempt {
                status: a.status,
                message: a.message,
            })
            .collect();

        Ok(GatewayStatus {
            status: body.success.message,
            attempts,
        })
    }
}
