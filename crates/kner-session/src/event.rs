//! Session events and effects

use kner_core::{HistoryRecord, PredictionResult};

use crate::state::Tab;

/// Monotonic identifier attached to every issued prediction
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestId(pub u64);

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A text file handed to the session, fully read into memory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextFile {
    pub name: String,
    /// Declared media type, if the source knows one
    pub media_type: Option<String>,
    pub contents: String,
}

/// Everything that can happen to a session
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// The input text was replaced
    InputEdited(String),
    /// The user asked for a prediction of the current input
    SubmitRequested,
    PredictionSucceeded {
        request: RequestId,
        result: PredictionResult,
    },
    PredictionFailed {
        request: RequestId,
        error: String,
    },
    TabOpened(Tab),
    HistoryLoaded(Vec<HistoryRecord>),
    HistoryFailed(String),
    /// A history record was picked by id
    HistorySelected(String),
    InputCleared,
    /// A file was dropped or chosen; accepted files replace the input and submit it
    FileLoaded(TextFile),
}

/// Work the session asks its driver to perform
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    Predict { request: RequestId, text: String },
    FetchHistory { skip: u32, limit: u32 },
    Alert(Alert),
}

/// User-visible notices
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Alert {
    PredictionFailed(String),
    UnsupportedFileType(String),
}

impl std::fmt::Display for Alert {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::PredictionFailed(reason) => {
                write!(f, "Prediction failed, please check the backend ({reason})")
            }
            Self::UnsupportedFileType(name) => {
                write!(f, "Please upload a text file (.txt): {name}")
            }
        }
    }
}
