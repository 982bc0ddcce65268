//! Result summaries
//!
//! Counts and confidence figures shown next to a prediction or
//! a history record.

use serde::{Deserialize, Serialize};

use kner_core::{Entity, EntityKind, Token};

/// Aggregate figures over decoded entities
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EntityStats {
    /// Total number of entities
    pub total: usize,
    /// Person entities
    pub per: usize,
    /// Location entities
    pub loc: usize,
    /// Mean entity confidence, 0.0 when there are none
    pub avg_confidence: f32,
}

impl EntityStats {
    pub fn from_entities(entities: &[Entity]) -> Self {
        let total = entities.len();
        let per = entities
            .iter()
            .filter(|e| e.kind == EntityKind::Person)
            .count();
        let avg_confidence = if total == 0 {
            0.0
        } else {
            entities.iter().map(|e| e.confidence).sum::<f32>() / total as f32
        };

        Self {
            total,
            per,
            loc: total - per,
            avg_confidence,
        }
    }
}

/// Format a confidence as a percentage with one decimal, e.g. `87.5%`
pub fn format_confidence(confidence: f32) -> String {
    format!("{:.1}%", confidence * 100.0)
}

/// Number of non-`O` tokens of the given kind
pub fn count_tokens(tokens: &[Token], kind: EntityKind) -> usize {
    tokens
        .iter()
        .filter(|t| t.tag.kind() == Some(kind))
        .count()
}

/// Number of non-`O` tokens
pub fn tagged_token_count(tokens: &[Token]) -> usize {
    tokens.iter().filter(|t| !t.tag.is_outside()).count()
}

/// Number of whitespace-delimited words, 0 for blank text
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}
