use crate::error::ApiError;
use async_trait::async_trait;
use tracing::error;

/// Blob storage for invoice artifacts: upload an object, mint a
/// time-limited signed download URL.
#[async_trait]
pub trait BlobStorage: Send + Sync {
    async fn upload(&self, path: &str, bytes: Vec<u8>, content_type: &str)
        -> Result<(), ApiError>;

    async fn signed_url(&self, path: &str, expires_secs: u32) -> Result<String, ApiError>;
}

/// Supabase storage REST client.
pub struct SupabaseStorage {
    http: reqwest::Client,
    base_url: String,
    service_key: String,
    bucket: String,
}

impl SupabaseStorage {
    pub fn new(base_url: String, service_key: String, bucket: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url,
            service_key,
            bucket,
        }
    }
}

#[async_trait]
impl BlobStorage for SupabaseStorage {
    async fn upload(
        &self,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<(), ApiError> {
        let resp = self
            .http
            .post(format!(
                "{}/storage/v1/object/{}/{}",
                self.base_url, self.bucket, path
            ))
            .bearer_auth(&self.service_key)
            .header("Content-Type", content_type.to_string())
            .header("x-upsert", "true")
            .body(bytes)
            .send()
            .await
            .map_err(|e| {
                error!("Storage upload request failed: {}", e);
                ApiError::Upstream(format!("Storage upload failed: {}", e))
            })?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            error!("Storage upload error: status {}, body {}", status, text);
            return Err(ApiError::Upstream(format!(
                "Storage upload failed ({}): {}",
                status, text
            )));
        }
        Ok(())
    }

    async fn signed_url(&self, path: &str, expires_secs: u32) -> Result<String, ApiError> {
        let resp = self
            .http
            .post(format!(
                "{}/storage/v1/object/sign/{}/{}",
                self.base_url, self.bucket, path
            ))
            .bearer_auth(&self.service_key)
            .json(&serde_json::json!({ "expiresIn": expires_secs }))
            .send()
            .await
            .map_err(|e| {
                error!("Signed URL request failed: {}", e);
                ApiError::Upstream(format!("Signed URL request failed: {}", e))
            })?;

        let status = resp.status();
        let body = resp.json::<serde_json::Value>().await.map_err(|e| {
            error!("Signed URL response parsing failed: {}", e);
            ApiError::Upstream(format!("Invalid signed URL response: {}", e))
        })?;

        if !status.is_success() {
            error!("Signed URL error: status {}, body {:?}", status, body);
            return Err(ApiError::Upstream(format!(
                "Signed URL request failed ({})",
                status
            )));
        }

        let signed_path = body["signedURL"].as_str().ok_or_else(|| {
            error!("Signed URL response missing signedURL: {:?}", body);
            ApiError::Upstream("Invalid signed URL response".to_string())
        })?;

        Ok(format!("{}/storage/v1{}", self.base_url, signed_path))
    }
}
