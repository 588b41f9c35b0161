//! Webhook delivery of withdrawal lifecycle events.
//!
//! Posts each [`WithdrawalEvent`] as JSON to a configured endpoint. Delivery
//! is best effort; the caller logs and swallows failures so a flaky endpoint
//! can never block or roll back a ledger operation.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;

use crate::domain::ports::{LedgerNotifier, NotifierError};
use crate::domain::WithdrawalEvent;

const DELIVERY_TIMEOUT: Duration = Duration::from_secs(5);

/// Notifier that posts events to an HTTP endpoint.
#[derive(Debug, Clone)]
pub struct WebhookNotifier {
    client: Client,
    endpoint: String,
}

impl WebhookNotifier {
    /// Create a notifier targeting the given endpoint URL.
    pub fn new(endpoint: impl Into<String>) -> Result<Self, NotifierError> {
        let client = Client::builder()
            .timeout(DELIVERY_TIMEOUT)
            .build()
            .map_err(|err| NotifierError::delivery(err.to_string()))?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }
}

#[async_trait]
impl LedgerNotifier for WebhookNotifier {
    async fn notify(&self, event: WithdrawalEvent) -> Result<(), NotifierError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(&event)
            .send()
            .await
            .map_err(|err| NotifierError::delivery(err.to_string()))?;
        response
            .error_for_status()
            .map_err(|err| NotifierError::delivery(err.to_string()))?;
        Ok(())
    }
}
