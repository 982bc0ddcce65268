//! KNER Core - Domain models, errors and shared types
//!
//! This crate defines the core abstractions used throughout KNER:
//! - BIO tag vocabulary and entity kinds
//! - Canonical token, entity and history records
//! - Common error types
//! - Configuration management

pub mod config;

pub use config::{ApiConfig, AppConfig, ConfigError, LoggingConfig};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

// ============================================================================
// Error Types
// ============================================================================

/// Core error types for KNER operations
#[derive(Error, Debug)]
pub enum KnerError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Unsupported file type: {0}")]
    UnsupportedFileType(String),

    #[error("Invalid tag: {0}")]
    InvalidTag(String),

    #[error("Backend error (HTTP {status}): {message}")]
    Backend { status: u16, message: String },

    #[error("Invalid backend payload: {0}")]
    InvalidPayload(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl KnerError {
    /// Whether the error came from talking to the NER service
    pub fn is_backend_failure(&self) -> bool {
        matches!(
            self,
            Self::Backend { .. } | Self::InvalidPayload(_) | Self::Network(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, KnerError>;

// ============================================================================
// Tag Vocabulary
// ============================================================================

/// Entity categories produced by the tagging model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    #[serde(rename = "PER")]
    Person,
    #[serde(rename = "LOC")]
    Location,
}

impl EntityKind {
    /// Get the string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Person => "PER",
            Self::Location => "LOC",
        }
    }
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// BIO tag attached to a single token
///
/// The vocabulary is closed: `B-PER`, `I-PER`, `B-LOC`, `I-LOC` and `O`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Tag {
    /// First token of an entity
    Begin(EntityKind),
    /// Continuation token of an entity
    Inside(EntityKind),
    /// Token outside any entity
    Outside,
}

impl Tag {
    /// Get the wire label
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Begin(EntityKind::Person) => "B-PER",
            Self::Inside(EntityKind::Person) => "I-PER",
            Self::Begin(EntityKind::Location) => "B-LOC",
            Self::Inside(EntityKind::Location) => "I-LOC",
            Self::Outside => "O",
        }
    }

    /// Entity kind carried by the tag, `None` for `O`
    pub fn kind(&self) -> Option<EntityKind> {
        match self {
            Self::Begin(kind) | Self::Inside(kind) => Some(*kind),
            Self::Outside => None,
        }
    }

    pub fn is_outside(&self) -> bool {
        matches!(self, Self::Outside)
    }
}

impl std::fmt::Display for Tag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Tag {
    type Err = KnerError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim() {
            "B-PER" => Ok(Self::Begin(EntityKind::Person)),
            "I-PER" => Ok(Self::Inside(EntityKind::Person)),
            "B-LOC" => Ok(Self::Begin(EntityKind::Location)),
            "I-LOC" => Ok(Self::Inside(EntityKind::Location)),
            "O" => Ok(Self::Outside),
            other => Err(KnerError::InvalidTag(other.to_string())),
        }
    }
}

impl TryFrom<String> for Tag {
    type Error = KnerError;

    fn try_from(value: String) -> std::result::Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Tag> for String {
    fn from(tag: Tag) -> Self {
        tag.as_str().to_string()
    }
}

// ============================================================================
// Canonical Records
// ============================================================================

/// A single tagged token as returned by the model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Token {
    pub text: String,
    pub tag: Tag,
    /// Character offset of the first character
    pub start: usize,
    /// Character offset one past the last character
    pub end: usize,
    /// Model confidence in 0.0..=1.0
    pub confidence: f32,
}

impl Token {
    /// Create a token with full confidence
    pub fn new(text: impl Into<String>, tag: Tag, start: usize, end: usize) -> Self {
        Self {
            text: text.into(),
            tag,
            start,
            end,
            confidence: 1.0,
        }
    }

    /// Set the confidence
    pub fn with_confidence(mut self, confidence: f32) -> Self {
        self.confidence = confidence;
        self
    }
}

/// An entity span decoded from a run of BIO-tagged tokens
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    /// `<KIND>-<index of the opening token>`, unique within one decode
    pub id: String,
    pub kind: EntityKind,
    /// Space-joined texts of the constituent tokens
    pub full_text: String,
    pub start: usize,
    pub end: usize,
    /// Weakest confidence among the constituent tokens
    pub confidence: f32,
    pub is_beginning: bool,
}

/// Canonical result of one prediction call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    /// Tagged tokens in input order
    pub tokens: Vec<Token>,
    /// Server-side processing time in milliseconds
    pub processing_time: f64,
    pub word_count: Option<usize>,
}

/// A past prediction stored by the backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryRecord {
    pub id: String,
    pub input_text: String,
    pub tokens: Vec<Token>,
    pub processing_time: f64,
    pub created_at: DateTime<Utc>,
}

/// Service health as reported by the backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    #[serde(default)]
    pub models_loaded: Option<bool>,
    #[serde(default)]
    pub device: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

impl HealthStatus {
    pub fn is_healthy(&self) -> bool {
        self.status.eq_ignore_ascii_case("healthy")
    }
}

// ============================================================================
// Tests
// ============================================================================
