//! Actions for the reducer pattern
//!
//! Every state transition is described by one `Action`. Remote operations
//! go through Request → Receive (success) or a failure variant; the
//! asynchronous work itself lives in the action creators (`thunks.rs`).

use crate::types::{Filter, Record, RecordError, Thing};

/// Actions that trigger state transitions
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    // === Thing ===
    /// A thing fetch started
    RequestThing,

    /// A thing was received; replaces the current one
    ReceiveThing(Thing),

    /// A thing fetch failed; only clears the fetching flag
    ThingFailed,

    // === Record list ===
    /// A records fetch started; `seq` orders overlapping fetches
    RequestRecords { seq: u64 },

    /// The full record list for fetch `seq`
    ReceiveRecords { seq: u64, records: Vec<Record> },

    /// Records fetch `seq` failed; only clears the fetching flag
    RecordsFailed { seq: u64 },

    // === Record submission ===
    /// A record submission started
    RequestRecord,

    /// The server-confirmed copy of a submitted record
    ReceiveRecord(Record),

    /// A submission was rejected
    ReceiveRecordError(RecordError),

    // === Filter ===
    /// Replace the records filter (does not fetch)
    SetFilter(Filter),
}

impl Action {
    /// Stable name used in logs and store events
    pub fn name(&self) -> &'static str {
        match self {
            Action::RequestThing => "REQUEST_THING",
            Action::ReceiveThing(_) => "RECEIVE_THING",
            Action::ThingFailed => "THING_FAILED",
            Action::RequestRecords { .. } => "REQUEST_RECORDS",
            Action::ReceiveRecords { .. } => "RECEIVE_RECORDS",
            Action::RecordsFailed { .. } => "RECORDS_FAILED",
            Action::RequestRecord => "REQUEST_RECORD",
            Action::ReceiveRecord(_) => "RECEIVE_RECORD",
            Action::ReceiveRecordError(_) => "RECEIVE_RECORD_ERROR",
            Action::SetFilter(_) => "SET_FILTER",
        }
    }
}
