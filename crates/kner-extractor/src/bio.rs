//! BIO decoding
//!
//! A single left-to-right scan that holds at most one open entity:
//! - `B-X` closes the open entity (if any) and opens a new `X` span
//! - `I-X` extends an open `X` span; any other `I-X` is dropped
//! - `O` closes the open entity
//!
//! Entities are emitted in token order and never share a token.

use kner_core::{Entity, EntityKind, Tag, Token};
use tracing::trace;

/// Decode an ordered token sequence into entity spans
pub fn decode(tokens: &[Token]) -> Vec<Entity> {
    let mut entities = Vec::new();
    let mut open: Option<Entity> = None;

    for (index, token) in tokens.iter().enumerate() {
        match token.tag {
            Tag::Begin(kind) => {
                if let Some(entity) = open.take() {
                    entities.push(entity);
                }
                open = Some(open_entity(index, kind, token));
            }
            Tag::Inside(kind) => match open.as_mut() {
                Some(entity) if entity.kind == kind => extend_entity(entity, token),
                Some(entity) => {
                    trace!(
                        index,
                        tag = %token.tag,
                        open = %entity.kind,
                        "Dropping continuation token of a different kind"
                    );
                }
                None => {
                    trace!(index, tag = %token.tag, "Dropping continuation token with no open entity");
                }
            },
            Tag::Outside => {
                if let Some(entity) = open.take() {
                    entities.push(entity);
                }
            }
        }
    }

    entities.extend(open);
    entities
}

fn open_entity(index: usize, kind: EntityKind, token: &Token) -> Entity {
    Entity {
        id: format!("{kind}-{index}"),
        kind,
        full_text: token.text.clone(),
        start: token.start,
        end: token.end,
        confidence: token.confidence,
        is_beginning: true,
    }
}

fn extend_entity(entity: &mut Entity, token: &Token) {
    entity.full_text.push(' ');
    entity.full_text.push_str(&token.text);
    entity.end = token.end;
    // A span is only as confident as its weakest token
    entity.confidence = entity.confidence.min(token.confidence);
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const B_PER: Tag = Tag::Begin(EntityKind::Person);
    const I_PER: Tag = Tag::Inside(EntityKind::Person);
    const B_LOC: Tag = Tag::Begin(EntityKind::Location);
    const I_LOC: Tag = Tag::Inside(EntityKind::Location);
    const O: Tag = Tag::Outside;

    /// Build tokens laid out one character apart, as a whitespace tokenizer would
    fn tokens(items: &[(&str, Tag)]) -> Vec<Token> {
        let mut offset = 0;
        items
            .iter()
            .map(|(text, tag)| {
                let len = text.chars().count();
                let token = Token::new(*text, *tag, offset, offset + len);
                offset += len + 1;
                token
            })
            .collect()
    }

    #[test]
    fn test_empty_input() {
        assert!(decode(&[]).is_empty());
    }

    #[test]
    fn test_only_outside() {
        let input = tokens(&[("នៅ", O)]);
        assert!(decode(&input).is_empty());
    }

    #[test]
    fn test_two_entities_in_order() {
        let input = tokens(&[
            ("ហ៊ុន", B_PER),
            ("សែន", I_PER),
            ("នៅ", O),
            ("ភ្នំ", B_LOC),
            ("ពេញ", I_LOC),
        ]);
        let entities = decode(&input);

        assert_eq!(entities.len(), 2);
        assert_eq!(entities[0].kind, EntityKind::Person);
        assert_eq!(entities[1].kind, EntityKind::Location);
        assert_eq!(entities[0].full_text, "ហ៊ុន សែន");
        assert_eq!(entities[1].full_text, "ភ្នំ ពេញ");
        assert_eq!(entities[0].start, input[0].start);
        assert_eq!(entities[0].end, input[1].end);
        assert_eq!(entities[1].start, input[3].start);
        assert_eq!(entities[1].end, input[4].end);
    }

    #[test]
    fn test_orphan_inside_dropped() {
        let input = tokens(&[("សែន", I_PER)]);
        assert!(decode(&input).is_empty());
    }

    #[test]
    fn test_mismatched_inside_leaves_open_entity() {
        let input = tokens(&[("ហ៊ុន", B_PER), ("ភ្នំ", I_LOC), ("សែន", I_PER)]);
        let entities = decode(&input);

        assert_eq!(entities.len(), 1);
        assert_eq!(entities[0].full_text, "ហ៊ុន សែន");
        assert_eq!(entities[0].end, input[2].end);
    }

    #[test]
    fn test_confidence_is_minimum() {
        let mut input = tokens(&[("ហ៊ុន", B_PER), ("សែន", I_PER)]);
        input[0].confidence = 0.9;
        input[1].confidence = 0.6;

        let entities = decode(&input);
        assert_eq!(entities.len(), 1);
        assert!((entities[0].confidence - 0.6).abs() < f32::EPSILON);
    }

    #[test]
    fn test_begin_closes_previous() {
        let input = tokens(&[("ក", B_PER), ("ខ", B_PER), ("គ", I_PER)]);
        let entities = decode(&input);

        assert_eq!(entities.len(), 2);
        assert_eq!(entities[0].full_text, "ក");
        assert_eq!(entities[1].full_text, "ខ គ");
        assert_eq!(entities[0].id, "PER-0");
        assert_eq!(entities[1].id, "PER-1");
        assert!(entities.iter().all(|e| e.is_beginning));
    }

    #[test]
    fn test_outside_closes_entity() {
        let input = tokens(&[("ក", B_LOC), ("ខ", O), ("គ", I_LOC)]);
        let entities = decode(&input);

        assert_eq!(entities.len(), 1);
        assert_eq!(entities[0].full_text, "ក");
    }

    fn arb_tag() -> impl Strategy<Value = Tag> {
        prop_oneof![Just(B_PER), Just(I_PER), Just(B_LOC), Just(I_LOC), Just(O)]
    }

    proptest! {
        #[test]
        fn prop_spans_ordered_and_disjoint(
            items in proptest::collection::vec((arb_tag(), 0.0f32..=1.0), 0..64)
        ) {
            let input: Vec<Token> = items
                .iter()
                .enumerate()
                .map(|(i, (tag, confidence))| {
                    Token::new(format!("w{i}"), *tag, i * 10, i * 10 + 5)
                        .with_confidence(*confidence)
                })
                .collect();
            let entities = decode(&input);

            // Every B- token opens exactly one emitted entity
            let begins = input.iter().filter(|t| matches!(t.tag, Tag::Begin(_))).count();
            prop_assert_eq!(entities.len(), begins);

            for pair in entities.windows(2) {
                prop_assert!(pair[0].end <= pair[1].start);
            }

            for entity in &entities {
                let first = entity.start / 10;
                let last = (entity.end - 5) / 10;
                let weakest = input[first..=last]
                    .iter()
                    .filter(|t| t.tag == Tag::Begin(entity.kind) || t.tag == Tag::Inside(entity.kind))
                    .map(|t| t.confidence)
                    .fold(1.0f32, f32::min);
                prop_assert!(entity.confidence <= input[first].confidence);
                prop_assert!((entity.confidence - weakest).abs() < 1e-6);
            }
        }
    }
}
