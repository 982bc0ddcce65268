//! Session state record

use serde::{Deserialize, Serialize};

use kner_core::{Entity, HistoryRecord, Token};
use kner_extractor::{decode, tagged_token_count, word_count};

use crate::event::RequestId;

/// History page size used when none is configured
pub const DEFAULT_HISTORY_PAGE_SIZE: u32 = 50;

/// What the session is currently doing or showing
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    #[default]
    Idle,
    Predicting,
    DisplayingLive,
    DisplayingHistorySelection,
    Error,
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Predicting => write!(f, "predicting"),
            Self::DisplayingLive => write!(f, "displaying_live"),
            Self::DisplayingHistorySelection => write!(f, "displaying_history_selection"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// Left-hand panel
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tab {
    #[default]
    Input,
    History,
}

/// Outcome of the most recent applied prediction
#[derive(Debug, Clone, PartialEq)]
pub struct LiveResult {
    pub request: RequestId,
    /// Input text the prediction was issued for
    pub text: String,
    pub tokens: Vec<Token>,
    pub entities: Vec<Entity>,
    pub processing_time: f64,
    pub word_count: usize,
}

/// A prediction that has been issued and not yet answered
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingPrediction {
    pub request: RequestId,
    pub text: String,
}

/// Single source of truth for a session
#[derive(Debug, Clone, PartialEq)]
pub struct SessionState {
    pub mode: Mode,
    pub input_text: String,
    pub word_count: usize,
    pub live: Option<LiveResult>,
    pub selected_history: Option<HistoryRecord>,
    pub history: Vec<HistoryRecord>,
    pub active_tab: Tab,
    pub last_error: Option<String>,
    pub history_page_size: u32,
    pub(crate) pending: Option<PendingPrediction>,
    pub(crate) history_in_flight: usize,
    pub(crate) next_request: u64,
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_PAGE_SIZE)
    }
}

impl SessionState {
    /// Idle session with empty input
    pub fn new(history_page_size: u32) -> Self {
        Self {
            mode: Mode::Idle,
            input_text: String::new(),
            word_count: 0,
            live: None,
            selected_history: None,
            history: Vec::new(),
            active_tab: Tab::Input,
            last_error: None,
            history_page_size,
            pending: None,
            history_in_flight: 0,
            next_request: 1,
        }
    }

    /// Whether a history fetch is outstanding
    pub fn history_loading(&self) -> bool {
        self.history_in_flight > 0
    }

    /// Whether a prediction is outstanding
    pub fn is_predicting(&self) -> bool {
        self.pending.is_some()
    }

    /// Id of the prediction whose response will be applied, if any
    pub fn latest_request(&self) -> Option<RequestId> {
        self.pending.as_ref().map(|p| p.request)
    }

    /// Decoded entities of the live result
    pub fn live_entities(&self) -> &[Entity] {
        self.live
            .as_ref()
            .map(|live| live.entities.as_slice())
            .unwrap_or_default()
    }

    /// The result a display surface should show
    ///
    /// A selected history record wins while the session is displaying it;
    /// otherwise the live result is shown.
    pub fn display(&self) -> Option<ResultView<'_>> {
        if self.mode == Mode::DisplayingHistorySelection {
            if let Some(record) = &self.selected_history {
                return Some(ResultView {
                    source: ResultSource::History(record.id.clone()),
                    text: &record.input_text,
                    tokens: &record.tokens,
                    entities: decode(&record.tokens),
                    processing_time: record.processing_time,
                    word_count: word_count(&record.input_text),
                });
            }
        }

        self.live.as_ref().map(|live| ResultView {
            source: ResultSource::Live(live.request),
            text: &live.text,
            tokens: &live.tokens,
            entities: live.entities.clone(),
            processing_time: live.processing_time,
            word_count: live.word_count,
        })
    }
}

/// Where a displayed result comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResultSource {
    Live(RequestId),
    History(String),
}

/// Read-only projection of the result being shown
#[derive(Debug, Clone, PartialEq)]
pub struct ResultView<'a> {
    pub source: ResultSource,
    pub text: &'a str,
    pub tokens: &'a [Token],
    pub entities: Vec<Entity>,
    pub processing_time: f64,
    pub word_count: usize,
}

impl ResultView<'_> {
    /// Number of non-`O` tokens
    pub fn tagged_tokens(&self) -> usize {
        tagged_token_count(self.tokens)
    }
}
