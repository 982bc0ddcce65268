//! Session driver
//!
//! Owns the state, feeds events through [`transition`] and runs the
//! resulting effects on tokio. Backend calls run as spawned tasks and
//! report back through a channel, so editing never waits on the network.
//! Every event is applied on the caller's task, one at a time.

use std::path::Path;
use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, warn};

use kner_client::NerBackend;
use kner_core::Result;

use crate::event::{Alert, Effect, Event};
use crate::file::read_text_file;
use crate::state::{SessionState, Tab};
use crate::transition::{transition, Transition};

/// Interactive prediction session bound to a backend
pub struct Session<B> {
    backend: Arc<B>,
    state: SessionState,
    events_tx: mpsc::UnboundedSender<Event>,
    events_rx: mpsc::UnboundedReceiver<Event>,
    outstanding: usize,
    alerts: Vec<Alert>,
}

impl<B> Session<B>
where
    B: NerBackend + 'static,
{
    /// Create an idle session
    pub fn new(backend: Arc<B>, history_page_size: u32) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Self {
            backend,
            state: SessionState::new(history_page_size),
            events_tx,
            events_rx,
            outstanding: 0,
            alerts: Vec::new(),
        }
    }

    /// Current state snapshot
    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Number of backend calls still running
    pub fn outstanding(&self) -> usize {
        self.outstanding
    }

    /// Alerts raised since the last call
    pub fn take_alerts(&mut self) -> Vec<Alert> {
        std::mem::take(&mut self.alerts)
    }

    /// Apply an event and start any work it requests
    pub fn dispatch(&mut self, event: Event) {
        let state = std::mem::take(&mut self.state);
        let Transition { state, effects } = transition(state, event);
        self.state = state;

        for effect in effects {
            self.run_effect(effect);
        }
    }

    pub fn edit_input(&mut self, text: impl Into<String>) {
        self.dispatch(Event::InputEdited(text.into()));
    }

    pub fn submit(&mut self) {
        self.dispatch(Event::SubmitRequested);
    }

    pub fn clear_input(&mut self) {
        self.dispatch(Event::InputCleared);
    }

    pub fn open_tab(&mut self, tab: Tab) {
        self.dispatch(Event::TabOpened(tab));
    }

    pub fn select_history(&mut self, id: impl Into<String>) {
        self.dispatch(Event::HistorySelected(id.into()));
    }

    /// Load a file from disk; accepted files replace the input and are submitted
    pub async fn open_file(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let file = read_text_file(path).await?;
        self.dispatch(Event::FileLoaded(file));
        Ok(())
    }

    /// Wait for one backend call to finish and apply its outcome
    ///
    /// Returns `false` when nothing is outstanding.
    pub async fn process_next(&mut self) -> bool {
        if self.outstanding == 0 {
            return false;
        }

        match self.events_rx.recv().await {
            Some(event) => {
                self.outstanding -= 1;
                self.dispatch(event);
                true
            }
            None => false,
        }
    }

    /// Apply outcomes until no backend call is outstanding
    pub async fn settle(&mut self) {
        while self.process_next().await {}
    }

    fn run_effect(&mut self, effect: Effect) {
        match effect {
            Effect::Predict { request, text } => {
                debug!(%request, "Starting prediction");
                self.outstanding += 1;
                let backend = Arc::clone(&self.backend);
                let completion = Completion::new(
                    self.events_tx.clone(),
                    Event::PredictionFailed {
                        request,
                        error: ABORTED.to_string(),
                    },
                );
                tokio::spawn(async move {
                    let event = match backend.predict(&text).await {
                        Ok(result) => Event::PredictionSucceeded { request, result },
                        Err(e) => Event::PredictionFailed {
                            request,
                            error: e.to_string(),
                        },
                    };
                    completion.send(event);
                });
            }
            Effect::FetchHistory { skip, limit } => {
                debug!(skip, limit, "Starting history fetch");
                self.outstanding += 1;
                let backend = Arc::clone(&self.backend);
                let completion = Completion::new(
                    self.events_tx.clone(),
                    Event::HistoryFailed(ABORTED.to_string()),
                );
                tokio::spawn(async move {
                    let event = match backend.get_history(skip, limit).await {
                        Ok(records) => Event::HistoryLoaded(records),
                        Err(e) => Event::HistoryFailed(e.to_string()),
                    };
                    completion.send(event);
                });
            }
            Effect::Alert(alert) => {
                warn!(%alert, "Alert");
                self.alerts.push(alert);
            }
        }
    }
}

const ABORTED: &str = "backend call aborted";

/// Reports the outcome of one spawned backend call
///
/// Every spawned call delivers exactly one event. If the task unwinds or is
/// cancelled before [`Completion::send`], the fallback event is sent on drop
/// so the session's outstanding count still reaches zero.
struct Completion {
    tx: mpsc::UnboundedSender<Event>,
    fallback: Option<Event>,
}

impl Completion {
    fn new(tx: mpsc::UnboundedSender<Event>, fallback: Event) -> Self {
        Self {
            tx,
            fallback: Some(fallback),
        }
    }

    fn send(mut self, event: Event) {
        self.fallback = None;
        // The receiver lives as long as the session
        let _ = self.tx.send(event);
    }
}

impl Drop for Completion {
    fn drop(&mut self) {
        if let Some(event) = self.fallback.take() {
            warn!("Backend call ended without a result");
            let _ = self.tx.send(event);
        }
    }
}
