//! Application state
//!
//! Immutable state tree. All transitions go through the reducer, which
//! builds the next tree with the named per-slice updates below instead of
//! mutating the previous one.

use serde::Serialize;

use crate::types::{Filter, Record, RecordError, Thing};

/// Root application state
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AppState {
    pub thing: ThingState,
    pub error: ErrorState,
}

/// The bookable thing and its records
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ThingState {
    /// A thing fetch is in flight
    pub is_fetching: bool,

    /// Last fetched thing
    pub instance: Option<Thing>,

    pub records: RecordsState,
}

/// Record list of the current thing
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RecordsState {
    /// A records fetch or a submission is in flight
    pub is_fetching: bool,

    pub filter: Filter,

    /// Insertion order: a fetch replaces the list, a submission appends
    pub items: Vec<Record>,

    /// Sequence number of the newest records fetch started
    #[serde(skip)]
    pub latest_request: u64,
}

/// Errors surfaced to the view
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ErrorState {
    /// Errors of the last record submission; empty when it succeeded
    pub record: RecordError,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the thing slice, keeping everything else
    pub fn update_thing(self, update: impl FnOnce(ThingState) -> ThingState) -> Self {
        AppState {
            thing: update(self.thing),
            ..self
        }
    }

    /// Replace the records slice, keeping everything else
    pub fn update_records(self, update: impl FnOnce(RecordsState) -> RecordsState) -> Self {
        self.update_thing(|thing| ThingState {
            records: update(thing.records),
            ..thing
        })
    }

    /// Replace the error slice, keeping everything else
    pub fn update_error(self, update: impl FnOnce(ErrorState) -> ErrorState) -> Self {
        AppState {
            error: update(self.error),
            ..self
        }
    }

    /// Any request is in flight
    pub fn is_busy(&self) -> bool {
        self.thing.is_fetching || self.thing.records.is_fetching
    }
}
