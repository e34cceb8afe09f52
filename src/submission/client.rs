use std::time::Duration;

use async_trait::async_trait;

use super::payload::BookingPayload;
use super::SubmissionError;
use crate::config::BookingConfig;

/// Status and body of a completed HTTP exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawReply {
    pub status: u16,
    pub body: String,
}

/// Delivers a booking payload to the booking service.
///
/// `Err` means the exchange never completed. Any response that arrived,
/// whatever its status, is an `Ok(RawReply)` for the envelope adapter to
/// judge.
#[async_trait]
pub trait BookingTransport: Send + Sync {
    async fn send(&self, payload: &BookingPayload) -> Result<RawReply, SubmissionError>;
}

/// reqwest-backed transport posting JSON to the fixed booking path.
pub struct HttpBookingClient {
    endpoint: String,
    client: reqwest::Client,
    timeout_secs: u64,
}

impl HttpBookingClient {
    pub fn new(config: &BookingConfig) -> Result<Self, SubmissionError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .build()
            .map_err(|e| SubmissionError::ClientBuild(e.to_string()))?;

        Ok(Self {
            endpoint: config.endpoint_url(),
            client,
            timeout_secs: config.request_timeout_secs,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl BookingTransport for HttpBookingClient {
    async fn send(&self, payload: &BookingPayload) -> Result<RawReply, SubmissionError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(payload)
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        let status = response.status().as_u16();
        let body = response.text().await.map_err(|e| self.classify(e))?;

        Ok(RawReply { status, body })
    }
}

impl HttpBookingClient {
    fn classify(&self, e: reqwest::Error) -> SubmissionError {
        if e.is_timeout() {
            SubmissionError::Timeout(self.timeout_secs)
        } else if e.is_connect() {
            SubmissionError::Connection(self.endpoint.clone())
        } else {
            SubmissionError::Transport(e.to_string())
        }
    }
}

// ═══════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════
