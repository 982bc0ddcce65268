//! HTTP client for the NER service
//!
//! Endpoints (under the configured prefix, `/api/v1` by default):
//! - `POST /predict`
//! - `GET /history?skip=&limit=`
//! - `GET /health`
//!
//! No retries and no timeouts: a failure is reported once and the
//! caller decides whether to resubmit.

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use kner_core::{
    ApiConfig, AppConfig, HealthStatus, HistoryRecord, KnerError, PredictionResult, Result,
};

use crate::payload::{self, PredictRequest, RawPredictResponse};
use crate::NerBackend;

/// reqwest-based NER service client
#[derive(Debug, Clone)]
pub struct HttpNerClient {
    client: Client,
    api: ApiConfig,
}

impl HttpNerClient {
    /// Create a client for the given service settings
    pub fn new(api: ApiConfig) -> Self {
        Self {
            client: Client::new(),
            api,
        }
    }

    /// Create from config
    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(config.api.clone())
    }

    /// Service settings in use
    pub fn api(&self) -> &ApiConfig {
        &self.api
    }

    /// Decode a successful JSON body, mapping everything else to errors
    async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T> {
        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(KnerError::Backend {
                status: status.as_u16(),
                message,
            });
        }

        response
            .json()
            .await
            .map_err(|e| KnerError::InvalidPayload(format!("Failed to parse response: {e}")))
    }
}

#[async_trait]
impl NerBackend for HttpNerClient {
    async fn predict(&self, text: &str) -> Result<PredictionResult> {
        if text.trim().is_empty() {
            return Err(KnerError::Validation("text must not be blank".to_string()));
        }

        let url = self.api.endpoint("predict");
        debug!(%url, chars = text.chars().count(), "Requesting prediction");

        let response = self
            .client
            .post(&url)
            .json(&PredictRequest { text })
            .send()
            .await
            .map_err(|e| KnerError::Network(format!("Request failed: {e}")))?;

        let raw: RawPredictResponse = Self::read_json(response).await?;
        let result = payload::validate_prediction(raw)?;

        debug!(
            tokens = result.tokens.len(),
            processing_time = result.processing_time,
            "Prediction received"
        );
        Ok(result)
    }

    async fn get_history(&self, skip: u32, limit: u32) -> Result<Vec<HistoryRecord>> {
        let url = self.api.endpoint("history");
        debug!(%url, skip, limit, "Requesting history");

        let response = self
            .client
            .get(&url)
            .query(&[("skip", skip), ("limit", limit)])
            .send()
            .await
            .map_err(|e| KnerError::Network(format!("Request failed: {e}")))?;

        let items: Vec<Value> = Self::read_json(response).await?;
        let records = payload::validate_history(items);

        debug!(records = records.len(), "History received");
        Ok(records)
    }

    async fn health(&self) -> Result<HealthStatus> {
        let url = self.api.endpoint("health");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| KnerError::Network(format!("Request failed: {e}")))?;

        Self::read_json(response).await
    }
}

// ============================================================================
// Tests
// ============================================================================
