//! Edit Service Client
//!
//! Thin HTTP adapter over the service's three endpoints. Status probes
//! swallow transport errors and return `Option`; callers treat `None` as
//! "not ready". Edit calls use a generous timeout sized for long-running
//! transformations.

use std::time::Duration;

use image::DynamicImage;
use image_codec::CodecError;
use protocol::{
    EditImageRequest, EditImageResponse, ErrorBody, HealthResponse, ModelInfoResponse,
};
use thiserror::Error;
use tracing::debug;

/// Timeout for health and info probes
pub const STATUS_TIMEOUT: Duration = Duration::from_secs(5);

/// Timeout for edit requests; transformations can run for minutes
pub const EDIT_TIMEOUT: Duration = Duration::from_secs(300);

/// Errors from the client adapter
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    Codec(#[from] CodecError),

    /// The server answered with a non-success status
    #[error("server error ({status}): {detail}")]
    Server { status: u16, detail: String },
}

/// Client for the image-edit service
pub struct EditClient {
    http: reqwest::Client,
    base_url: String,
}

impl EditClient {
    /// Create a client for the service at `base_url`
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            http: reqwest::Client::new(),
            base_url,
        }
    }

    /// Service base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Fetch the health snapshot; `None` on any transport or status error
    pub async fn health(&self) -> Option<HealthResponse> {
        let response = self
            .http
            .get(format!("{}/health", self.base_url))
            .timeout(STATUS_TIMEOUT)
            .send()
            .await
            .map_err(|e| debug!("health check failed: {e}"))
            .ok()?;
        if !response.status().is_success() {
            return None;
        }
        response.json().await.ok()
    }

    /// Whether the service reports itself ready
    pub async fn is_ready(&self) -> bool {
        self.health().await.map(|h| h.ready).unwrap_or(false)
    }

    /// Fetch model info; `None` on any transport or status error
    pub async fn model_info(&self) -> Option<ModelInfoResponse> {
        let response = self
            .http
            .get(format!("{}/model_info", self.base_url))
            .timeout(STATUS_TIMEOUT)
            .send()
            .await
            .ok()?;
        if !response.status().is_success() {
            return None;
        }
        response.json().await.ok()
    }

    /// Submit an edit with the image already in wire form
    pub async fn edit_image_base64(
        &self,
        image_base64: &str,
        prompt: &str,
        guidance_scale: f32,
    ) -> Result<String, ClientError> {
        let request = EditImageRequest {
            image_base64: image_base64.to_string(),
            prompt: prompt.to_string(),
            guidance_scale,
        };

        let response = self
            .http
            .post(format!("{}/edit_image", self.base_url))
            .timeout(EDIT_TIMEOUT)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let detail = response
                .json::<ErrorBody>()
                .await
                .map(|body| body.detail)
                .unwrap_or_else(|_| status.to_string());
            return Err(ClientError::Server {
                status: status.as_u16(),
                detail,
            });
        }

        Ok(response.json::<EditImageResponse>().await?.result)
    }

    /// Submit an edit and decode the result back into an image
    pub async fn edit_image(
        &self,
        image: &DynamicImage,
        prompt: &str,
        guidance_scale: f32,
    ) -> Result<DynamicImage, ClientError> {
        let encoded = image_codec::encode_png_base64(image)?;
        let result = self
            .edit_image_base64(&encoded, prompt, guidance_scale)
            .await?;
        Ok(image_codec::decode_png_base64(&result)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_trailing_slash_is_trimmed() {
        let client = EditClient::new("http://localhost:8888/");
        assert_eq!(client.base_url(), "http://localhost:8888");
    }

    #[tokio::test]
    async fn test_health_is_none_when_unreachable() {
        // Port 1 is never listening
        let client = EditClient::new("http://127.0.0.1:1");
        assert!(client.health().await.is_none());
        assert!(!client.is_ready().await);
    }

    #[tokio::test]
    async fn test_edit_surfaces_transport_errors() {
        let client = EditClient::new("http://127.0.0.1:1");
        let err = client
            .edit_image_base64("aGk=", "add a hat", 2.5)
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::Http(_)));
    }
}
