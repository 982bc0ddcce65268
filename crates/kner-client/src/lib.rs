//! KNER Client - NER service access
//!
//! Talks to the tagging service and turns its loosely-typed payloads
//! into canonical records:
//! - `payload`: raw wire shapes and boundary validation
//! - `http`: reqwest-based client for the REST endpoints
//!
//! Author: hephaex@gmail.com

use async_trait::async_trait;
use kner_core::{HealthStatus, HistoryRecord, PredictionResult, Result};

pub mod http;
pub mod payload;

pub use http::HttpNerClient;
pub use payload::PayloadError;

/// Trait for NER service backends
#[async_trait]
pub trait NerBackend: Send + Sync {
    /// Tag `text`; callers must not pass blank text
    async fn predict(&self, text: &str) -> Result<PredictionResult>;

    /// Fetch one page of past predictions, newest state of the backend each call
    async fn get_history(&self, skip: u32, limit: u32) -> Result<Vec<HistoryRecord>>;

    /// Service health
    async fn health(&self) -> Result<HealthStatus>;
}
