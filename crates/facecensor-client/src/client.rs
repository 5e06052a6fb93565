//! FaceCensor HTTP client implementation.

use std::time::Duration;

use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;

use crate::error::ClientError;
use crate::types::{Account, ApiErrorResponse, Balance, ImageJob, TransactionPage};

/// FaceCensor API client acting for one user.
///
/// Every call authenticates with the user's bearer token.
#[derive(Debug, Clone)]
pub struct FaceCensorClient {
    client: Client,
    base_url: String,
    token: String,
}

impl FaceCensorClient {
    /// Create a new client.
    ///
    /// # Arguments
    ///
    /// * `base_url` - Base URL of the service (e.g., `"http://facecensor:8080"`)
    /// * `token` - The user's HS256 bearer token
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Configuration` if the HTTP client cannot be built.
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Result<Self, ClientError> {
        Self::with_options(base_url, token, ClientOptions::default())
    }

    /// Create a new client with custom options.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Configuration` if the HTTP client cannot be built.
    pub fn with_options(
        base_url: impl Into<String>,
        token: impl Into<String>,
        options: ClientOptions,
    ) -> Result<Self, ClientError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(options.timeout_seconds))
            .build()
            .map_err(|e| ClientError::Configuration(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: token.into(),
        })
    }

    fn get(&self, path: &str) -> RequestBuilder {
        self.client
            .get(format!("{}{path}", self.base_url))
            .bearer_auth(&self.token)
    }

    fn post(&self, path: &str) -> RequestBuilder {
        self.client
            .post(format!("{}{path}", self.base_url))
            .bearer_auth(&self.token)
    }

    /// Provision the caller's account, granting the welcome bonus.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Api` with status 409 if the account exists.
    pub async fn create_account(&self) -> Result<Account, ClientError> {
        let response = self.post("/v1/accounts").send().await?;
        json(response).await
    }

    /// Get the caller's account.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::NotFound` if the account was never created.
    pub async fn get_account(&self) -> Result<Account, ClientError> {
        let response = self.get("/v1/accounts/me").send().await?;
        json(response).await
    }

    /// Get the balance and the 20 most recent transactions.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server returns an error.
    pub async fn get_balance(&self) -> Result<Balance, ClientError> {
        let response = self.get("/v1/credits/balance").send().await?;
        json(response).await
    }

    /// List transactions, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server returns an error.
    pub async fn list_transactions(
        &self,
        limit: usize,
        offset: usize,
    ) -> Result<TransactionPage, ClientError> {
        let response = self
            .get("/v1/credits/transactions")
            .query(&[("limit", limit), ("offset", offset)])
            .send()
            .await?;
        json(response).await
    }

    /// Upload an image, spending one credit.
    ///
    /// A returned job may still be `failed` if the image could not be
    /// processed; the credit is spent either way.
    ///
    /// # Errors
    ///
    /// - `ClientError::InsufficientCredits` if the balance is zero.
    /// - `ClientError::UnsupportedMediaType` for types other than JPEG, PNG, WebP.
    /// - `ClientError::PayloadTooLarge` above the server's size limit.
    pub async fn upload_image(
        &self,
        filename: impl Into<String>,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> Result<ImageJob, ClientError> {
        let filename = filename.into();
        tracing::debug!(filename = %filename, size = bytes.len(), "Uploading image");

        let part = Part::bytes(bytes)
            .file_name(filename)
            .mime_str(content_type)
            .map_err(|_| ClientError::UnsupportedMediaType {
                content_type: content_type.to_string(),
            })?;
        let form = Form::new().part("file", part);

        let response = self.post("/v1/images/upload").multipart(form).send().await?;
        json(response).await
    }

    /// List image jobs, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server returns an error.
    pub async fn list_images(&self, limit: usize, offset: usize) -> Result<Vec<ImageJob>, ClientError> {
        let response = self
            .get("/v1/images")
            .query(&[("limit", limit), ("offset", offset)])
            .send()
            .await?;
        json(response).await
    }

    /// Get one image job.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::NotFound` for unknown or foreign jobs.
    pub async fn get_image(&self, image_id: &str) -> Result<ImageJob, ClientError> {
        let response = self.get(&format!("/v1/images/{image_id}")).send().await?;
        json(response).await
    }

    /// Download the original upload.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::NotFound` for unknown or foreign jobs.
    pub async fn download_original(&self, image_id: &str) -> Result<Vec<u8>, ClientError> {
        let response = self
            .get(&format!("/v1/images/{image_id}/original"))
            .send()
            .await?;
        bytes(response).await
    }

    /// Download the censored image.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::NotFound` if the job failed or is not the caller's.
    pub async fn download_processed(&self, image_id: &str) -> Result<Vec<u8>, ClientError> {
        let response = self
            .get(&format!("/v1/images/{image_id}/processed"))
            .send()
            .await?;
        bytes(response).await
    }
}

async fn json<T: DeserializeOwned>(response: Response) -> Result<T, ClientError> {
    let body = success(response).await?.bytes().await?;
    Ok(serde_json::from_slice(&body)?)
}

async fn bytes(response: Response) -> Result<Vec<u8>, ClientError> {
    Ok(success(response).await?.bytes().await?.to_vec())
}

/// Pass successful responses through; map error bodies to typed errors.
async fn success(response: Response) -> Result<Response, ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.bytes().await?;
    let Ok(ApiErrorResponse { error }) = serde_json::from_slice::<ApiErrorResponse>(&body) else {
        return Err(ClientError::Api {
            code: "unknown".to_string(),
            message: format!("HTTP {status}"),
            status: status.as_u16(),
        });
    };

    tracing::debug!(status = status.as_u16(), code = %error.code, "API error");

    Err(match error.code.as_str() {
        "insufficient_credits" => ClientError::InsufficientCredits {
            balance: error.detail_i64("balance").unwrap_or(0),
            required: error.detail_i64("required").unwrap_or(0),
        },
        "not_found" => ClientError::NotFound {
            message: error.message,
        },
        "unsupported_media_type" => ClientError::UnsupportedMediaType {
            content_type: error.detail_str("content_type").unwrap_or_default().to_string(),
        },
        "payload_too_large" => ClientError::PayloadTooLarge {
            limit: error
                .detail_i64("limit")
                .and_then(|l| u64::try_from(l).ok())
                .unwrap_or(0),
        },
        _ => ClientError::Api {
            code: error.code.clone(),
            message: error.message,
            status: status.as_u16(),
        },
    })
}

/// Client options for customization.
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// Request timeout in seconds (default: 60, uploads are censored inline).
    pub timeout_seconds: u64,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self { timeout_seconds: 60 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_creation() {
        let client = FaceCensorClient::new("http://localhost:8080", "token").unwrap();
        assert_eq!(client.base_url, "http://localhost:8080");
    }

    #[test]
    fn client_trims_trailing_slash() {
        let client = FaceCensorClient::new("http://localhost:8080/", "token").unwrap();
        assert_eq!(client.base_url, "http://localhost:8080");
    }
}
