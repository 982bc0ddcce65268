//! KNER Session - Interactive prediction session
//!
//! The session is one state record transitioned by a pure function:
//! - `state`: the record and the result view derived from it
//! - `event`: inputs to the machine and the effects it asks for
//! - `transition`: `(state, event) -> (state, effects)`
//! - `file`: text-file input contract
//! - `driver`: runs effects against a [`kner_client::NerBackend`]

pub mod driver;
pub mod event;
pub mod file;
pub mod state;
pub mod transition;

pub use driver::Session;
pub use event::{Alert, Effect, Event, RequestId, TextFile};
pub use state::{LiveResult, Mode, ResultSource, ResultView, SessionState, Tab};
pub use transition::{transition, Transition};
