//! Pure reducer function for state transitions
//!
//! `(State, Action) -> State` with no I/O. Each action touches only the
//! slice it owns; everything else carries over from the previous state.
//!
//! | Action               | Effect                                              |
//! |----------------------|-----------------------------------------------------|
//! | `RequestThing`       | thing fetching                                      |
//! | `ReceiveThing`       | thing settled, instance replaced                    |
//! | `ThingFailed`        | thing settled                                       |
//! | `RequestRecords`     | records fetching, newest sequence remembered        |
//! | `ReceiveRecords`     | records settled, items replaced (newest fetch only) |
//! | `RecordsFailed`      | records settled (newest fetch only)                 |
//! | `RequestRecord`      | records fetching                                    |
//! | `ReceiveRecord`      | records settled, item appended, record errors empty |
//! | `ReceiveRecordError` | records settled, record errors replaced             |
//! | `SetFilter`          | filter replaced                                     |

use super::actions::Action;
use super::state::{AppState, ErrorState, RecordsState, ThingState};
use crate::types::RecordError;

/// Pure reducer function
pub fn reduce(state: AppState, action: Action) -> AppState {
    match action {
        // === Thing ===
        Action::RequestThing => state.update_thing(|thing| ThingState {
            is_fetching: true,
            ..thing
        }),

        Action::ReceiveThing(instance) => state.update_thing(|thing| ThingState {
            is_fetching: false,
            instance: Some(instance),
            ..thing
        }),

        Action::ThingFailed => state.update_thing(|thing| ThingState {
            is_fetching: false,
            ..thing
        }),

        // === Record list ===
        Action::RequestRecords { seq } => state.update_records(|records| RecordsState {
            is_fetching: true,
            latest_request: records.latest_request.max(seq),
            ..records
        }),

        Action::ReceiveRecords { seq, records: items } => {
            if is_stale(&state, seq) {
                return state;
            }
            state.update_records(|records| RecordsState {
                is_fetching: false,
                items,
                ..records
            })
        }

        Action::RecordsFailed { seq } => {
            if is_stale(&state, seq) {
                return state;
            }
            state.update_records(|records| RecordsState {
                is_fetching: false,
                ..records
            })
        }

        // === Record submission ===
        Action::RequestRecord => state.update_records(|records| RecordsState {
            is_fetching: true,
            ..records
        }),

        Action::ReceiveRecord(record) => state
            .update_records(|records| {
                let mut items = records.items;
                items.push(record);
                RecordsState {
                    is_fetching: false,
                    items,
                    ..records
                }
            })
            .update_error(|_| ErrorState {
                record: RecordError::default(),
            }),

        Action::ReceiveRecordError(record) => state
            .update_records(|records| RecordsState {
                is_fetching: false,
                ..records
            })
            .update_error(|_| ErrorState { record }),

        // === Filter ===
        Action::SetFilter(filter) => state.update_records(|records| RecordsState {
            filter,
            ..records
        }),
    }
}

/// A response to a records fetch older than the newest one started
pub fn is_stale(state: &AppState, seq: u64) -> bool {
    seq < state.thing.records.latest_request
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Filter, Record, Thing, User};
    use chrono::DateTime;

    fn thing(id: &str) -> Thing {
        Thing {
            id: id.to_string(),
            name: "Room A".to_string(),
            remarks: String::new(),
            thumbnail: None,
            owner: User {
                username: "bob".to_string(),
                email: "bob@example.com".to_string(),
            },
        }
    }

    fn record(id: &str) -> Record {
        Record {
            id: id.to_string(),
            name: "Alice".to_string(),
            contact: "alice@example.com".to_string(),
            remarks: String::new(),
            start_at: DateTime::parse_from_rfc3339("2017-04-01T09:00:00+09:00").unwrap(),
            end_at: DateTime::parse_from_rfc3339("2017-04-01T10:00:00+09:00").unwrap(),
            credential: None,
        }
    }

    fn name_required() -> RecordError {
        RecordError {
            name: vec!["required".to_string()],
            ..RecordError::default()
        }
    }

    #[test]
    fn test_reducer_is_pure() {
        let state = AppState::new();
        let before = state.clone();

        let new_state = reduce(state.clone(), Action::RequestThing);

        assert_eq!(state, before);
        assert!(new_state.thing.is_fetching);
    }

    #[test]
    fn test_thing_fetch_flow() {
        let state = reduce(AppState::new(), Action::RequestThing);
        assert!(state.thing.is_fetching);
        assert!(state.thing.instance.is_none());

        let state = reduce(state, Action::ReceiveThing(thing("t1")));
        assert!(!state.thing.is_fetching);
        assert_eq!(state.thing.instance.as_ref().map(|t| t.id.as_str()), Some("t1"));
    }

    #[test]
    fn test_thing_refetch_replaces_instance() {
        let state = reduce(AppState::new(), Action::ReceiveThing(thing("t1")));
        let state = reduce(state, Action::ReceiveThing(thing("t2")));
        assert_eq!(state.thing.instance.unwrap().id, "t2");
    }

    #[test]
    fn test_thing_failure_clears_flag_and_keeps_instance() {
        let state = reduce(AppState::new(), Action::ReceiveThing(thing("t1")));
        let state = reduce(state, Action::RequestThing);
        let state = reduce(state, Action::ThingFailed);

        assert!(!state.thing.is_fetching);
        assert_eq!(state.thing.instance.unwrap().id, "t1");
    }

    #[test]
    fn test_receive_records_replaces_not_appends() {
        let payload = vec![record("r1"), record("r2")];

        let state = reduce(AppState::new(), Action::RequestRecords { seq: 1 });
        let state = reduce(state, Action::ReceiveRecords { seq: 1, records: payload.clone() });
        assert_eq!(state.thing.records.items, payload);

        let state = reduce(state, Action::ReceiveRecords { seq: 1, records: payload.clone() });
        assert_eq!(state.thing.records.items, payload);
        assert!(!state.thing.records.is_fetching);
    }

    #[test]
    fn test_receive_record_appends_exactly_one() {
        let state = reduce(
            AppState::new(),
            Action::ReceiveRecords { seq: 0, records: vec![record("r1")] },
        );
        let before = state.thing.records.items.len();

        let state = reduce(state, Action::RequestRecord);
        assert!(state.thing.records.is_fetching);

        let state = reduce(state, Action::ReceiveRecord(record("r2")));
        assert_eq!(state.thing.records.items.len(), before + 1);
        assert_eq!(state.thing.records.items.last().unwrap().id, "r2");
        assert!(!state.thing.records.is_fetching);
    }

    #[test]
    fn test_record_error_then_success_clears_errors() {
        let state = reduce(AppState::new(), Action::RequestRecord);
        let state = reduce(state, Action::ReceiveRecordError(name_required()));
        assert_eq!(state.error.record.name, vec!["required"]);
        assert!(!state.thing.records.is_fetching);

        let state = reduce(state, Action::ReceiveRecord(record("r1")));
        assert!(state.error.record.is_empty());
    }

    #[test]
    fn test_record_error_replaces_previous_errors() {
        let state = reduce(AppState::new(), Action::ReceiveRecordError(name_required()));
        let contact_only = RecordError {
            contact: vec!["Enter a valid contact.".to_string()],
            ..RecordError::default()
        };
        let state = reduce(state, Action::ReceiveRecordError(contact_only.clone()));

        assert_eq!(state.error.record, contact_only);
        assert!(state.error.record.name.is_empty());
    }

    #[test]
    fn test_set_filter_only_touches_filter() {
        let state = reduce(
            AppState::new(),
            Action::ReceiveRecords { seq: 0, records: vec![record("r1")] },
        );
        let state = reduce(state, Action::SetFilter(Filter::for_month(2017, 4)));

        assert_eq!(state.thing.records.filter, Filter::for_month(2017, 4));
        assert_eq!(state.thing.records.items.len(), 1);
        assert!(!state.thing.records.is_fetching);
    }

    #[test]
    fn test_stale_records_response_is_ignored() {
        let state = reduce(AppState::new(), Action::RequestRecords { seq: 1 });
        let state = reduce(state, Action::RequestRecords { seq: 2 });

        let state = reduce(state, Action::ReceiveRecords { seq: 2, records: vec![record("fresh")] });
        let state = reduce(state, Action::ReceiveRecords { seq: 1, records: vec![record("stale")] });

        assert_eq!(state.thing.records.items[0].id, "fresh");
        assert_eq!(state.thing.records.latest_request, 2);
    }

    #[test]
    fn test_only_newest_fetch_settles_flag() {
        let state = reduce(AppState::new(), Action::RequestRecords { seq: 1 });
        let state = reduce(state, Action::RequestRecords { seq: 2 });

        let state = reduce(state, Action::RecordsFailed { seq: 1 });
        assert!(state.thing.records.is_fetching);

        let state = reduce(state, Action::ReceiveRecords { seq: 1, records: Vec::new() });
        assert!(state.thing.records.is_fetching);

        let state = reduce(state, Action::RecordsFailed { seq: 2 });
        assert!(!state.thing.records.is_fetching);
    }
}
