//! Campaign sending abstraction.
//!
//! `CampaignSender` is the seam between the composer and the SMS endpoint.
//! `HttpCampaignSender` posts to the configured endpoint; tests use
//! `FakeCampaignSender`. The trait is object-safe so callers can hold
//! `Arc<dyn CampaignSender>`.

use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::types::{SendReceipt, SendRequest, SendResponse};

const GENERIC_FAILURE: &str = "Failed to send SMS";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SendError {
    /// The endpoint answered with `success: false`
    #[error("{message}")]
    Failed { message: String },

    #[error("network error: {0}")]
    Network(String),

    #[error("request timed out after {0}s")]
    Timeout(u64),

    #[error("invalid response from SMS service: {0}")]
    InvalidResponse(String),
}

// =============================================================================
// Core trait
// =============================================================================

#[async_trait]
pub trait CampaignSender: Send + Sync {
    async fn send(&self, request: &SendRequest) -> Result<SendReceipt, SendError>;
}

// =============================================================================
// HttpCampaignSender
// =============================================================================

pub struct HttpCampaignSender {
    client: reqwest::Client,
    endpoint: String,
    timeout: Duration,
}

impl HttpCampaignSender {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
            timeout,
        })
    }

    fn map_transport_error(&self, e: reqwest::Error) -> SendError {
        if e.is_timeout() {
            SendError::Timeout(self.timeout.as_secs())
        } else if e.is_decode() {
            SendError::InvalidResponse(e.to_string())
        } else {
            SendError::Network(e.to_string())
        }
    }
}

#[async_trait]
impl CampaignSender for HttpCampaignSender {
    async fn send(&self, request: &SendRequest) -> Result<SendReceipt, SendError> {
        debug!(endpoint = %self.endpoint, "Posting campaign to SMS endpoint");

        let response = self
            .client
            .post(&self.endpoint)
            .json(request)
            .send()
            .await
            .map_err(|e| self.map_transport_error(e))?;

        // Failures carry a JSON body with the error text, so the body is
        // read whatever the status.
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| self.map_transport_error(e))?;

        let parsed: SendResponse = serde_json::from_str(&body).map_err(|e| {
            warn!(%status, "Unparseable response from SMS endpoint: {}", e);
            SendError::InvalidResponse(format!("HTTP {}: {}", status, e))
        })?;

        if !parsed.success {
            let message = parsed
                .error
                .filter(|e| !e.trim().is_empty())
                .unwrap_or_else(|| GENERIC_FAILURE.to_string());
            warn!(%status, "SMS endpoint reported failure: {}", message);
            return Err(SendError::Failed { message });
        }

        let campaign = parsed
            .campaign
            .ok_or_else(|| SendError::InvalidResponse("missing campaign".to_string()))?;
        let message_length = parsed
            .message_length
            .unwrap_or_else(|| request.message.chars().count());

        info!(
            campaign_id = %campaign.id,
            successful = campaign.successful_sends,
            failed = campaign.failed_sends,
            "Campaign sent"
        );
        Ok(SendReceipt {
            campaign,
            message_length,
        })
    }
}

// =============================================================================
// FakeCampaignSender (tests)
// =============================================================================

#[cfg(test)]
pub use fake::FakeCampaignSender;


#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn campaign_json() -> serde_json::Value {
        json!({
            "id": "20240501_123000",
            "message": "Hello",
            "total_recipients": 2,
            "valid_numbers": 2,
            "invalid_numbers": 0,
            "successful_sends": 2,
            "failed_sends": 0,
            "total_cost": 1.6,
            "created_at": "2024-05-01T12:30:00.123456",
            "details": []
        })
    }

    async fn sender_for(server: &MockServer, timeout: Duration) -> HttpCampaignSender {
        HttpCampaignSender::new(format!("{}/send_sms", server.uri()), timeout).unwrap()
    }

    fn request() -> SendRequest {
        SendRequest::new(
            "Hello",
            vec!["0241234567".to_string(), "0551234567".to_string()],
        )
    }

    #[tokio::test]
    async fn test_successful_send_returns_receipt() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/send_sms"))
            .and(body_json(json!({
                "message": "Hello",
                "phone_numbers": ["0241234567", "0551234567"]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "campaign": campaign_json(),
                "message_length": 5
            })))
            .expect(1)
            .mount(&server)
            .await;

        let sender = sender_for(&server, Duration::from_secs(5)).await;
        let receipt = sender.send(&request()).await.unwrap();

        assert_eq!(receipt.campaign.id, "20240501_123000");
        assert_eq!(receipt.campaign.successful_sends, 2);
        assert_eq!(receipt.message_length, 5);
    }

    #[tokio::test]
    async fn test_failure_body_error_is_surfaced_on_http_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/send_sms"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "success": false,
                "error": "No valid phone numbers found"
            })))
            .mount(&server)
            .await;

        let sender = sender_for(&server, Duration::from_secs(5)).await;
        let err = sender.send(&request()).await.unwrap_err();
        assert_eq!(
            err,
            SendError::Failed {
                message: "No valid phone numbers found".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_failure_without_error_text_uses_generic_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_json(json!({ "success": false })))
            .mount(&server)
            .await;

        let sender = sender_for(&server, Duration::from_secs(5)).await;
        let err = sender.send(&request()).await.unwrap_err();
        assert_eq!(err.to_string(), "Failed to send SMS");
    }

    #[tokio::test]
    async fn test_non_json_body_is_invalid_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(502).set_body_string("<html>Bad Gateway</html>"))
            .mount(&server)
            .await;

        let sender = sender_for(&server, Duration::from_secs(5)).await;
        let err = sender.send(&request()).await.unwrap_err();
        assert!(matches!(err, SendError::InvalidResponse(_)));
    }

    #[tokio::test]
    async fn test_success_without_campaign_is_invalid_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": true })))
            .mount(&server)
            .await;

        let sender = sender_for(&server, Duration::from_secs(5)).await;
        let err = sender.send(&request()).await.unwrap_err();
        assert!(matches!(err, SendError::InvalidResponse(_)));
    }

    #[tokio::test]
    async fn test_slow_endpoint_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "success": true, "campaign": campaign_json() }))
                    .set_delay(Duration::from_secs(3)),
            )
            .mount(&server)
            .await;

        let sender = sender_for(&server, Duration::from_secs(1)).await;
        let err = sender.send(&request()).await.unwrap_err();
        assert_eq!(err, SendError::Timeout(1));
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_network_error() {
        let sender =
            HttpCampaignSender::new("http://127.0.0.1:9/send_sms", Duration::from_secs(2)).unwrap();
        let err = sender.send(&request()).await.unwrap_err();
        assert!(matches!(err, SendError::Network(_) | SendError::Timeout(_)));
    }

    #[tokio::test]
    async fn test_missing_message_length_falls_back_to_char_count() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "success": true, "campaign": campaign_json() })),
            )
            .mount(&server)
            .await;

        let sender = sender_for(&server, Duration::from_secs(5)).await;
        let receipt = sender.send(&request()).await.unwrap();
        assert_eq!(receipt.message_length, 5);
    }
}
