//! One-shot delivery of a composed payload to the remote endpoint.
//!
//! A transport performs exactly one HTTP POST per payload and reports the
//! outcome. It never retries and never re-enqueues: a rejected or failed
//! batch is permanently lost from the pipeline. The shipper wraps each
//! send in a spawned task, so a slow response never blocks the cycle
//! loop; the bounded request timeout only caps how long the outcome
//! observer can stay in flight.

use async_trait::async_trait;
use reqwest::StatusCode;
use thiserror::Error;

use crate::batch::BatchPayload;
use crate::config::ShipperConfig;
use crate::constants;

/// Terminal per-batch delivery failure.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Connection failure or timeout before a status was received.
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The endpoint answered with a non-success status.
    #[error("endpoint rejected batch with status {status}")]
    Rejected { status: StatusCode },
}

impl TransportError {
    /// Whether the endpoint refused the batch for exceeding its rate
    /// limit. The endpoint locks callers out for 30 seconds after a 429,
    /// so this outcome is logged distinctly.
    #[must_use]
    pub fn is_rate_limited(&self) -> bool {
        matches!(
            self,
            TransportError::Rejected {
                status: StatusCode::TOO_MANY_REQUESTS
            }
        )
    }
}

/// Delivery seam between the shipper and the network.
///
/// Object-safe so tests can substitute recording or failing fakes.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Delivers one payload. Success means the endpoint acknowledged the
    /// batch with a 2xx status; any error is terminal for the batch.
    async fn send(&self, payload: BatchPayload) -> Result<(), TransportError>;
}

/// HTTP transport POSTing JSON payloads with bearer authentication.
pub struct HttpTransport {
    client: reqwest::Client,
    endpoint_url: String,
    auth_token: String,
}

impl HttpTransport {
    #[must_use]
    pub fn new(config: &ShipperConfig) -> Self {
        HttpTransport {
            client: build_client(),
            endpoint_url: config.endpoint_url.clone(),
            auth_token: config.auth_token.clone(),
        }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, payload: BatchPayload) -> Result<(), TransportError> {
        let response = self
            .client
            .post(&self.endpoint_url)
            .header("Authorization", format!("Bearer {}", self.auth_token))
            .header("Content-Type", "application/json")
            .body(payload.to_body())
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            // The response body is not parsed for data; only the status
            // determines the outcome.
            Err(TransportError::Rejected { status })
        }
    }
}

/// Builds the HTTP client used for all sends.
///
/// Falls back to reqwest defaults if the configured builder fails, so a
/// TLS backend hiccup degrades the transport rather than the host
/// application.
fn build_client() -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(constants::SEND_TIMEOUT)
        .pool_idle_timeout(Some(std::time::Duration::from_secs(270)))
        .tcp_keepalive(Some(std::time::Duration::from_secs(120)))
        .build()
        .unwrap_or_else(|e| {
            tracing::error!("Failed to build HTTP client: {e}, using reqwest defaults");
            reqwest::Client::new()
        })
}
