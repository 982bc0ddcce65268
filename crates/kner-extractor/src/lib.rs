//! KNER Extractor - Entity span decoding
//!
//! Turns the flat, per-token BIO stream produced by the tagging model
//! into grouped entity spans, and summarises the result for display.

pub mod bio;
pub mod stats;

pub use bio::decode;
pub use stats::{count_tokens, format_confidence, tagged_token_count, word_count, EntityStats};
