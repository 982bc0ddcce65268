//! Plain-text rendering of results

use kner_core::{Entity, EntityKind, HistoryRecord};
use kner_extractor::{count_tokens, format_confidence, EntityStats};
use kner_session::{ResultSource, ResultView};

pub fn print_entities(entities: &[Entity]) {
    if entities.is_empty() {
        println!("No entities found");
        return;
    }

    for entity in entities {
        println!(
            "[{}] {}  ({}..{}, {})",
            entity.kind,
            entity.full_text,
            entity.start,
            entity.end,
            format_confidence(entity.confidence)
        );
    }
}

pub fn print_summary(entities: &[Entity], processing_time: f64) {
    let stats = EntityStats::from_entities(entities);
    println!(
        "{} entities ({} PER, {} LOC), avg confidence {}, {:.0} ms",
        stats.total,
        stats.per,
        stats.loc,
        format_confidence(stats.avg_confidence),
        processing_time
    );
}

pub fn print_history(records: &[HistoryRecord]) {
    if records.is_empty() {
        println!("No previous analyses found");
        return;
    }

    for record in records {
        println!(
            "{:>6}  {}  {} PER  {} LOC  {}",
            record.id,
            record.created_at.format("%Y-%m-%d %H:%M:%S"),
            count_tokens(&record.tokens, EntityKind::Person),
            count_tokens(&record.tokens, EntityKind::Location),
            preview(&record.input_text, 60)
        );
    }
}

pub fn print_view(view: &ResultView<'_>) {
    match &view.source {
        ResultSource::Live(request) => println!("-- live result {request} --"),
        ResultSource::History(id) => println!("-- history record {id} --"),
    }
    println!("{}", preview(view.text, 120));
    print_entities(&view.entities);
    println!(
        "{} words, {} tagged tokens",
        view.word_count,
        view.tagged_tokens()
    );
    print_summary(&view.entities, view.processing_time);
}

/// First `max` characters of a single-line rendering of `text`
fn preview(text: &str, max: usize) -> String {
    let line = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if line.chars().count() <= max {
        line
    } else {
        let cut: String = line.chars().take(max).collect();
        format!("{cut}…")
    }
}
