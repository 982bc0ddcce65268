//! Wire payloads and boundary validation
//!
//! The service is loose about field names and optional attributes.
//! Raw shapes are decoded with serde, then validated into canonical
//! records. Documented gaps (missing text, offsets, confidence) are
//! filled with defaults; anything else is a [`PayloadError`].

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::warn;

use kner_core::{HistoryRecord, KnerError, PredictionResult, Tag, Token};

/// Confidence assumed when the service omits it
pub const DEFAULT_CONFIDENCE: f32 = 1.0;

// ============================================================================
// Errors
// ============================================================================

/// Reasons a payload fails boundary validation
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PayloadError {
    #[error("token {index}: unknown label {label:?}")]
    UnknownLabel { index: usize, label: String },

    #[error("token {index}: confidence {value} outside 0..=1")]
    ConfidenceOutOfRange { index: usize, value: f32 },

    #[error("invalid processing time: {0}")]
    InvalidProcessingTime(f64),

    #[error("invalid timestamp: {0:?}")]
    InvalidTimestamp(String),

    #[error("empty record id")]
    EmptyId,

    #[error("malformed payload: {0}")]
    Malformed(String),
}

impl From<PayloadError> for KnerError {
    fn from(err: PayloadError) -> Self {
        KnerError::InvalidPayload(err.to_string())
    }
}

// ============================================================================
// Raw Wire Shapes
// ============================================================================

/// Request body for `POST /predict`
#[derive(Debug, Serialize)]
pub struct PredictRequest<'a> {
    pub text: &'a str,
}

/// Response of `POST /predict`
#[derive(Debug, Deserialize)]
pub struct RawPredictResponse {
    pub entities: Vec<RawPredictedToken>,
    pub processing_time: f64,
    #[serde(default)]
    pub word_count: Option<usize>,
}

/// One tagged token in a prediction response
#[derive(Debug, Deserialize)]
pub struct RawPredictedToken {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub word: Option<String>,
    pub label: String,
    #[serde(default)]
    pub start: Option<usize>,
    #[serde(default)]
    pub end: Option<usize>,
    #[serde(default)]
    pub confidence: Option<f32>,
}

/// One element of the `GET /history` array
#[derive(Debug, Deserialize)]
pub struct RawHistoryItem {
    pub id: RawId,
    pub input_text: String,
    #[serde(default)]
    pub predictions: Vec<RawHistoryPrediction>,
    pub processing_time: f64,
    pub created_at: String,
}

/// Record ids arrive as numbers or strings
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum RawId {
    Number(i64),
    Text(String),
}

/// One tagged token stored with a history record
#[derive(Debug, Deserialize)]
pub struct RawHistoryPrediction {
    #[serde(default)]
    pub word: Option<String>,
    pub label: String,
    #[serde(default)]
    pub start: Option<usize>,
    #[serde(default)]
    pub end: Option<usize>,
}

// ============================================================================
// Validation
// ============================================================================

/// Validate a prediction response into a canonical result
pub fn validate_prediction(raw: RawPredictResponse) -> Result<PredictionResult, PayloadError> {
    let processing_time = validate_processing_time(raw.processing_time)?;

    let tokens = raw
        .entities
        .into_iter()
        .enumerate()
        .map(|(index, item)| {
            let tag = parse_label(index, &item.label)?;
            let confidence = item.confidence.unwrap_or(DEFAULT_CONFIDENCE);
            if !(0.0..=1.0).contains(&confidence) {
                return Err(PayloadError::ConfidenceOutOfRange {
                    index,
                    value: confidence,
                });
            }

            Ok(Token {
                text: canonical_text(item.text, item.word),
                tag,
                start: item.start.unwrap_or(0),
                end: item.end.unwrap_or(0),
                confidence,
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(PredictionResult {
        tokens,
        processing_time,
        word_count: raw.word_count,
    })
}

/// Validate one history record
///
/// History predictions carry no confidence, so every token gets the default.
pub fn validate_history_item(raw: RawHistoryItem) -> Result<HistoryRecord, PayloadError> {
    let id = match raw.id {
        RawId::Number(n) => n.to_string(),
        RawId::Text(s) if s.trim().is_empty() => return Err(PayloadError::EmptyId),
        RawId::Text(s) => s,
    };

    let tokens = raw
        .predictions
        .into_iter()
        .enumerate()
        .map(|(index, p)| {
            Ok(Token {
                text: p.word.unwrap_or_default(),
                tag: parse_label(index, &p.label)?,
                start: p.start.unwrap_or(0),
                end: p.end.unwrap_or(0),
                confidence: DEFAULT_CONFIDENCE,
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(HistoryRecord {
        id,
        input_text: raw.input_text,
        tokens,
        processing_time: validate_processing_time(raw.processing_time)?,
        created_at: parse_created_at(&raw.created_at)?,
    })
}

/// Validate a history page, dropping records that fail validation
pub fn validate_history(items: Vec<Value>) -> Vec<HistoryRecord> {
    items
        .into_iter()
        .enumerate()
        .filter_map(|(position, value)| {
            let result = serde_json::from_value::<RawHistoryItem>(value)
                .map_err(|e| PayloadError::Malformed(e.to_string()))
                .and_then(validate_history_item);

            match result {
                Ok(record) => Some(record),
                Err(e) => {
                    warn!(position, error = %e, "Dropping invalid history record");
                    None
                }
            }
        })
        .collect()
}

/// Pick the token text: `text` if non-blank, else `word` if non-blank, else empty
pub fn canonical_text(text: Option<String>, word: Option<String>) -> String {
    [text, word]
        .into_iter()
        .flatten()
        .find(|s| !s.trim().is_empty())
        .unwrap_or_default()
}

fn parse_label(index: usize, label: &str) -> Result<Tag, PayloadError> {
    label.parse().map_err(|_| PayloadError::UnknownLabel {
        index,
        label: label.to_string(),
    })
}

fn validate_processing_time(value: f64) -> Result<f64, PayloadError> {
    if value.is_finite() && value >= 0.0 {
        Ok(value)
    } else {
        Err(PayloadError::InvalidProcessingTime(value))
    }
}

/// Parse RFC 3339, or a naive ISO-8601 timestamp taken as UTC
fn parse_created_at(value: &str) -> Result<DateTime<Utc>, PayloadError> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(dt.with_timezone(&Utc));
    }

    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
        .map(|naive| naive.and_utc())
        .ok_or_else(|| PayloadError::InvalidTimestamp(value.to_string()))
}

// ============================================================================
// Tests
// ============================================================================
