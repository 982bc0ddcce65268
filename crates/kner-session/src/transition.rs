//! Pure session transitions
//!
//! `transition` never performs I/O. Network work is returned as
//! [`Effect`]s and its outcome comes back as another [`Event`].

use tracing::{debug, warn};

use kner_extractor::{decode, word_count};

use crate::event::{Alert, Effect, Event, RequestId};
use crate::file;
use crate::state::{LiveResult, Mode, PendingPrediction, SessionState, Tab};

/// New state plus the effects to run
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub state: SessionState,
    pub effects: Vec<Effect>,
}

impl Transition {
    fn unchanged(state: SessionState) -> Self {
        Self {
            state,
            effects: Vec::new(),
        }
    }

    fn with(state: SessionState, effect: Effect) -> Self {
        Self {
            state,
            effects: vec![effect],
        }
    }
}

/// Apply one event to the session
pub fn transition(mut state: SessionState, event: Event) -> Transition {
    match event {
        Event::InputEdited(text) => {
            state.word_count = word_count(&text);
            state.input_text = text;
            Transition::unchanged(state)
        }

        Event::SubmitRequested => submit(state),

        Event::PredictionSucceeded { request, result } => {
            let Some(pending) = take_pending(&mut state, request) else {
                return Transition::unchanged(state);
            };

            let entities = decode(&result.tokens);
            debug!(%request, entities = entities.len(), "Applying prediction");

            state.live = Some(LiveResult {
                request,
                word_count: result
                    .word_count
                    .unwrap_or_else(|| word_count(&pending.text)),
                text: pending.text,
                tokens: result.tokens,
                entities,
                processing_time: result.processing_time,
            });
            state.selected_history = None;
            state.last_error = None;
            state.mode = Mode::DisplayingLive;

            // The backend stores every prediction, so the list is now stale
            let effect = fetch_history(&mut state);
            Transition::with(state, effect)
        }

        Event::PredictionFailed { request, error } => {
            if take_pending(&mut state, request).is_none() {
                return Transition::unchanged(state);
            }

            warn!(%request, %error, "Prediction failed");
            state.mode = Mode::Error;
            state.last_error = Some(error.clone());
            Transition::with(state, Effect::Alert(Alert::PredictionFailed(error)))
        }

        Event::TabOpened(tab) => {
            state.active_tab = tab;
            match tab {
                Tab::History => {
                    let effect = fetch_history(&mut state);
                    Transition::with(state, effect)
                }
                Tab::Input => Transition::unchanged(state),
            }
        }

        Event::HistoryLoaded(records) => {
            debug!(records = records.len(), "History replaced");
            state.history = records;
            state.history_in_flight = state.history_in_flight.saturating_sub(1);
            Transition::unchanged(state)
        }

        Event::HistoryFailed(error) => {
            warn!(%error, "History fetch failed, showing empty history");
            state.history.clear();
            state.history_in_flight = state.history_in_flight.saturating_sub(1);
            Transition::unchanged(state)
        }

        Event::HistorySelected(id) => {
            match state.history.iter().find(|r| r.id == id) {
                Some(record) => {
                    state.selected_history = Some(record.clone());
                    state.mode = Mode::DisplayingHistorySelection;
                }
                None => debug!(%id, "Ignoring selection of unknown history record"),
            }
            Transition::unchanged(state)
        }

        Event::InputCleared => {
            if let Some(pending) = state.pending.take() {
                debug!(request = %pending.request, "Discarding outstanding prediction");
            }
            state.input_text.clear();
            state.word_count = 0;
            state.live = None;
            state.selected_history = None;
            state.last_error = None;
            state.mode = Mode::Idle;
            Transition::unchanged(state)
        }

        Event::FileLoaded(file) => {
            if !file::is_accepted(&file.name, file.media_type.as_deref()) {
                return Transition::with(
                    state,
                    Effect::Alert(Alert::UnsupportedFileType(file.name)),
                );
            }

            let edited = transition(state, Event::InputEdited(file.contents));
            let mut submitted = transition(edited.state, Event::SubmitRequested);
            let mut effects = edited.effects;
            effects.append(&mut submitted.effects);
            Transition {
                state: submitted.state,
                effects,
            }
        }
    }
}

fn submit(mut state: SessionState) -> Transition {
    if state.input_text.trim().is_empty() {
        debug!("Ignoring blank submission");
        return Transition::unchanged(state);
    }

    let request = RequestId(state.next_request);
    state.next_request += 1;

    if let Some(previous) = state.pending.replace(PendingPrediction {
        request,
        text: state.input_text.clone(),
    }) {
        debug!(previous = %previous.request, %request, "Superseding outstanding prediction");
    }

    state.selected_history = None;
    state.last_error = None;
    state.mode = Mode::Predicting;

    let text = state.input_text.clone();
    Transition::with(state, Effect::Predict { request, text })
}

/// Take the pending prediction if `request` is the latest issued one
fn take_pending(state: &mut SessionState, request: RequestId) -> Option<PendingPrediction> {
    match &state.pending {
        Some(pending) if pending.request == request => state.pending.take(),
        _ => {
            debug!(%request, "Ignoring stale prediction response");
            None
        }
    }
}

fn fetch_history(state: &mut SessionState) -> Effect {
    state.history_in_flight += 1;
    Effect::FetchHistory {
        skip: 0,
        limit: state.history_page_size,
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::TextFile;
    use crate::state::ResultSource;
    use chrono::{TimeZone, Utc};
    use kner_core::{EntityKind, HistoryRecord, PredictionResult, Tag, Token};

    fn run(state: SessionState, events: Vec<Event>) -> Transition {
        events
            .into_iter()
            .fold(Transition::unchanged(state), |mut acc, event| {
                let mut next = transition(acc.state, event);
                acc.effects.append(&mut next.effects);
                Transition {
                    state: next.state,
                    effects: acc.effects,
                }
            })
    }

    fn khmer_result() -> PredictionResult {
        PredictionResult {
            tokens: vec![
                Token::new("ហ៊ុន", Tag::Begin(EntityKind::Person), 0, 4),
                Token::new("សែន", Tag::Inside(EntityKind::Person), 5, 8),
            ],
            processing_time: 42.0,
            word_count: None,
        }
    }

    fn record(id: &str, text: &str) -> HistoryRecord {
        HistoryRecord {
            id: id.to_string(),
            input_text: text.to_string(),
            tokens: vec![Token::new(text, Tag::Begin(EntityKind::Location), 0, 0)],
            processing_time: 10.0,
            created_at: Utc.with_ymd_and_hms(2024, 5, 1, 10, 30, 0).unwrap(),
        }
    }

    fn submitted(text: &str) -> (SessionState, RequestId) {
        let t = run(
            SessionState::default(),
            vec![Event::InputEdited(text.to_string()), Event::SubmitRequested],
        );
        let request = t.state.latest_request().unwrap();
        (t.state, request)
    }

    #[test]
    fn test_initial_state() {
        let state = SessionState::default();
        assert_eq!(state.mode, Mode::Idle);
        assert!(state.input_text.is_empty());
        assert_eq!(state.active_tab, Tab::Input);
        assert!(state.display().is_none());
        assert!(!state.history_loading());
    }

    #[test]
    fn test_edit_updates_word_count_only() {
        let t = transition(
            SessionState::default(),
            Event::InputEdited("ហ៊ុន សែន  នៅ".to_string()),
        );
        assert_eq!(t.state.word_count, 3);
        assert_eq!(t.state.mode, Mode::Idle);
        assert!(t.effects.is_empty());
    }

    #[test]
    fn test_blank_submit_ignored() {
        let state = transition(SessionState::default(), Event::InputEdited("  \n ".into())).state;
        let t = transition(state.clone(), Event::SubmitRequested);
        assert_eq!(t.state, state);
        assert!(t.effects.is_empty());
    }

    #[test]
    fn test_submit_issues_prediction() {
        let t = run(
            SessionState::default(),
            vec![Event::InputEdited("ហ៊ុន សែន".into()), Event::SubmitRequested],
        );

        assert_eq!(t.state.mode, Mode::Predicting);
        assert!(t.state.is_predicting());
        assert_eq!(
            t.effects,
            vec![Effect::Predict {
                request: RequestId(1),
                text: "ហ៊ុន សែន".to_string()
            }]
        );
    }

    #[test]
    fn test_success_displays_live_entities() {
        let (state, request) = submitted("ហ៊ុន សែន");
        let t = transition(
            state,
            Event::PredictionSucceeded {
                request,
                result: khmer_result(),
            },
        );

        assert_eq!(t.state.mode, Mode::DisplayingLive);
        assert!(!t.state.is_predicting());
        let entities = t.state.live_entities();
        assert_eq!(entities.len(), 1);
        assert_eq!(entities[0].kind, EntityKind::Person);
        assert_eq!(entities[0].full_text, "ហ៊ុន សែន");

        let live = t.state.live.as_ref().unwrap();
        assert_eq!(live.word_count, 2);
        assert_eq!(live.processing_time, 42.0);

        // Background refresh of the history list
        assert_eq!(t.effects, vec![Effect::FetchHistory { skip: 0, limit: 50 }]);
        assert!(t.state.history_loading());
    }

    #[test]
    fn test_failure_keeps_input_and_previous_result() {
        let (state, request) = submitted("ហ៊ុន សែន");
        let state = transition(
            state,
            Event::PredictionSucceeded {
                request,
                result: khmer_result(),
            },
        )
        .state;

        let state = transition(state, Event::SubmitRequested).state;
        let request = state.latest_request().unwrap();
        let t = transition(
            state,
            Event::PredictionFailed {
                request,
                error: "HTTP 500".to_string(),
            },
        );

        assert_eq!(t.state.mode, Mode::Error);
        assert_eq!(t.state.input_text, "ហ៊ុន សែន");
        assert_eq!(t.state.last_error.as_deref(), Some("HTTP 500"));
        assert_eq!(t.state.live_entities().len(), 1);
        assert_eq!(
            t.effects,
            vec![Effect::Alert(Alert::PredictionFailed("HTTP 500".to_string()))]
        );

        // The user may resubmit
        let t = transition(t.state, Event::SubmitRequested);
        assert_eq!(t.state.mode, Mode::Predicting);
    }

    #[test]
    fn test_only_latest_request_applies() {
        let (state, first) = submitted("ក");
        let state = transition(state, Event::InputEdited("ខ".into())).state;
        let state = transition(state, Event::SubmitRequested).state;
        let second = state.latest_request().unwrap();
        assert!(second > first);

        // The older response arrives last but must not win
        let state = transition(
            state,
            Event::PredictionSucceeded {
                request: second,
                result: khmer_result(),
            },
        )
        .state;
        let before = state.clone();
        let t = transition(
            state,
            Event::PredictionFailed {
                request: first,
                error: "late".to_string(),
            },
        );

        assert_eq!(t.state, before);
        assert!(t.effects.is_empty());
        assert_eq!(t.state.mode, Mode::DisplayingLive);
        assert_eq!(t.state.live.as_ref().unwrap().text, "ខ");
    }

    #[test]
    fn test_stale_response_ignored_while_waiting() {
        let (state, first) = submitted("ក");
        let state = transition(state, Event::SubmitRequested).state;

        let t = transition(
            state,
            Event::PredictionSucceeded {
                request: first,
                result: khmer_result(),
            },
        );
        assert_eq!(t.state.mode, Mode::Predicting);
        assert!(t.state.live.is_none());
    }

    #[test]
    fn test_history_tab_loads_and_replaces() {
        let t = transition(SessionState::default(), Event::TabOpened(Tab::History));
        assert_eq!(t.state.active_tab, Tab::History);
        assert!(t.state.history_loading());
        assert_eq!(t.effects, vec![Effect::FetchHistory { skip: 0, limit: 50 }]);

        let state = transition(
            t.state,
            Event::HistoryLoaded(vec![record("1", "a"), record("2", "b")]),
        )
        .state;
        assert!(!state.history_loading());
        assert_eq!(state.history.len(), 2);

        let state = transition(state, Event::TabOpened(Tab::History)).state;
        let state = transition(state, Event::HistoryLoaded(vec![record("3", "c")])).state;
        assert_eq!(state.history.len(), 1);
        assert_eq!(state.history[0].id, "3");

        let state = transition(state, Event::TabOpened(Tab::History)).state;
        let state = transition(state, Event::HistoryLoaded(Vec::new())).state;
        assert!(state.history.is_empty());
        assert_eq!(state.mode, Mode::Idle);
    }

    #[test]
    fn test_history_failure_degrades_to_empty() {
        let state = transition(SessionState::default(), Event::TabOpened(Tab::History)).state;
        let state = transition(state, Event::HistoryLoaded(vec![record("1", "a")])).state;
        let state = transition(state, Event::TabOpened(Tab::History)).state;
        let t = transition(state, Event::HistoryFailed("connection refused".into()));

        assert!(t.state.history.is_empty());
        assert!(!t.state.history_loading());
        assert_eq!(t.state.mode, Mode::Idle);
        assert!(t.effects.is_empty());
    }

    #[test]
    fn test_selection_takes_precedence_over_live() {
        let (state, request) = submitted("ហ៊ុន សែន");
        let state = transition(
            state,
            Event::PredictionSucceeded {
                request,
                result: khmer_result(),
            },
        )
        .state;
        let state = transition(state, Event::HistoryLoaded(vec![record("9", "ភ្នំពេញ")])).state;
        let state = transition(state, Event::HistorySelected("9".into())).state;

        assert_eq!(state.mode, Mode::DisplayingHistorySelection);
        let view = state.display().unwrap();
        assert_eq!(view.source, ResultSource::History("9".to_string()));
        assert_eq!(view.text, "ភ្នំពេញ");
        assert_eq!(view.entities.len(), 1);
        assert_eq!(view.entities[0].kind, EntityKind::Location);
    }

    #[test]
    fn test_new_prediction_supersedes_selection() {
        let state = transition(SessionState::default(), Event::HistoryLoaded(vec![record("9", "x")])).state;
        let state = transition(state, Event::HistorySelected("9".into())).state;
        assert!(state.selected_history.is_some());

        let state = transition(state, Event::InputEdited("ហ៊ុន សែន".into())).state;
        let state = transition(state, Event::SubmitRequested).state;
        assert!(state.selected_history.is_none());

        let request = state.latest_request().unwrap();
        let state = transition(
            state,
            Event::PredictionSucceeded {
                request,
                result: khmer_result(),
            },
        )
        .state;

        assert_eq!(state.mode, Mode::DisplayingLive);
        let view = state.display().unwrap();
        assert_eq!(view.source, ResultSource::Live(request));
        assert_eq!(view.entities[0].full_text, "ហ៊ុន សែន");
    }

    #[test]
    fn test_completion_overrides_selection_made_while_waiting() {
        let (state, request) = submitted("ហ៊ុន សែន");
        let state = transition(state, Event::HistoryLoaded(vec![record("9", "x")])).state;
        let state = transition(state, Event::HistorySelected("9".into())).state;
        assert_eq!(state.mode, Mode::DisplayingHistorySelection);

        let state = transition(
            state,
            Event::PredictionSucceeded {
                request,
                result: khmer_result(),
            },
        )
        .state;
        assert_eq!(state.mode, Mode::DisplayingLive);
        assert!(state.selected_history.is_none());
    }

    #[test]
    fn test_unknown_selection_ignored() {
        let state = SessionState::default();
        let t = transition(state.clone(), Event::HistorySelected("missing".into()));
        assert_eq!(t.state, state);
    }

    #[test]
    fn test_clear_returns_to_idle() {
        let (state, request) = submitted("ហ៊ុន សែន");
        let t = transition(state, Event::InputCleared);

        assert_eq!(t.state.mode, Mode::Idle);
        assert!(t.state.input_text.is_empty());
        assert_eq!(t.state.word_count, 0);
        assert!(t.state.display().is_none());

        // The outstanding response no longer applies
        let t = transition(
            t.state,
            Event::PredictionSucceeded {
                request,
                result: khmer_result(),
            },
        );
        assert_eq!(t.state.mode, Mode::Idle);
        assert!(t.state.live.is_none());
    }

    #[test]
    fn test_unsupported_file_alerts_without_mutation() {
        let state = transition(SessionState::default(), Event::InputEdited("keep".into())).state;
        let t = transition(
            state.clone(),
            Event::FileLoaded(TextFile {
                name: "report.pdf".into(),
                media_type: Some("application/pdf".into()),
                contents: String::new(),
            }),
        );

        assert_eq!(t.state, state);
        assert_eq!(
            t.effects,
            vec![Effect::Alert(Alert::UnsupportedFileType("report.pdf".into()))]
        );
    }

    #[test]
    fn test_text_file_populates_and_submits() {
        let t = transition(
            SessionState::default(),
            Event::FileLoaded(TextFile {
                name: "notes".into(),
                media_type: Some("text/plain".into()),
                contents: "ហ៊ុន សែន\n".into(),
            }),
        );

        assert_eq!(t.state.input_text, "ហ៊ុន សែន\n");
        assert_eq!(t.state.word_count, 2);
        assert_eq!(t.state.mode, Mode::Predicting);
        assert!(matches!(
            t.effects.as_slice(),
            [Effect::Predict { text, .. }] if text == "ហ៊ុន សែន\n"
        ));
    }

    #[test]
    fn test_blank_text_file_only_populates() {
        let t = transition(
            SessionState::default(),
            Event::FileLoaded(TextFile {
                name: "empty.txt".into(),
                media_type: None,
                contents: "   ".into(),
            }),
        );
        assert_eq!(t.state.input_text, "   ");
        assert_eq!(t.state.mode, Mode::Idle);
        assert!(t.effects.is_empty());
    }
}
