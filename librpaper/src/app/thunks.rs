//! Action creators performing the remote operations
//!
//! Each operation dispatches its Request action, awaits the transport and
//! then dispatches exactly one settling action. The outcome is also
//! returned to the caller so a CLI can pick an exit code, but the store is
//! already consistent by the time the future resolves.

use std::sync::Arc;

use super::actions::Action;
use super::store::Store;
use crate::error::{Result, RpaperError, TransportError};
use crate::filter::build_filter_param;
use crate::http::{encode_component, Transport};
use crate::types::{Filter, Record, RecordError, RecordForm, Thing};

#[derive(Clone)]
pub struct ActionCreators {
    store: Arc<Store>,
    transport: Transport,
}

impl ActionCreators {
    pub fn new(store: Arc<Store>, transport: Transport) -> Self {
        Self { store, transport }
    }

    pub fn store(&self) -> &Arc<Store> {
        &self.store
    }

    /// Fetch a thing and make it the current instance
    pub async fn fetch_thing(&self, id: &str) -> Result<Thing> {
        self.store.dispatch(Action::RequestThing);

        let result = self
            .transport
            .get_json::<Thing>(&thing_path(id), Default::default())
            .await;

        match result {
            Ok(thing) => {
                tracing::info!(thing = %thing.id, "Fetched thing");
                self.store.dispatch(Action::ReceiveThing(thing.clone()));
                Ok(thing)
            }
            Err(e) => {
                tracing::error!(thing = %id, error = %e, "Failed to fetch thing");
                self.store.dispatch(Action::ThingFailed);
                Err(e.into())
            }
        }
    }

    /// Fetch the records of a thing within `filter`
    ///
    /// Returns what the server sent for this filter. The store only keeps it
    /// when no newer fetch was started while this one was in flight.
    pub async fn fetch_records(&self, id: &str, filter: Filter) -> Result<Vec<Record>> {
        let seq = self.store.next_request_seq();
        self.store.dispatch(Action::RequestRecords { seq });

        let params = match build_filter_param(&filter) {
            Ok(params) => params,
            Err(e) => {
                tracing::error!(thing = %id, error = %e, "Invalid records filter");
                self.store.dispatch(Action::RecordsFailed { seq });
                return Err(e.into());
            }
        };

        let result = self
            .transport
            .get_json::<Vec<Record>>(&records_path(id), params)
            .await;

        match result {
            Ok(records) => {
                tracing::info!(thing = %id, count = records.len(), "Fetched records");
                self.store.dispatch(Action::ReceiveRecords {
                    seq,
                    records: records.clone(),
                });
                Ok(records)
            }
            Err(e) => {
                tracing::error!(thing = %id, error = %e, "Failed to fetch records");
                self.store.dispatch(Action::RecordsFailed { seq });
                Err(e.into())
            }
        }
    }

    /// Submit a new record
    ///
    /// On rejection the field errors from the response body become the
    /// current record errors. Failures without a parseable body are
    /// reported as a single non-field message.
    pub async fn post_record(&self, id: &str, form: &RecordForm) -> Result<Record> {
        self.store.dispatch(Action::RequestRecord);

        match self
            .transport
            .post_json::<_, Record>(&records_path(id), form)
            .await
        {
            Ok(record) => {
                tracing::info!(thing = %id, record = %record.id, "Created record");
                self.store.dispatch(Action::ReceiveRecord(record.clone()));
                Ok(record)
            }
            Err(e) => {
                let errors = record_errors(&e);
                tracing::warn!(thing = %id, error = %e, "Record submission rejected");
                self.store.dispatch(Action::ReceiveRecordError(errors));
                Err(RpaperError::Transport(e))
            }
        }
    }

    /// Replace the records filter; does not fetch
    pub fn set_filter(&self, filter: Filter) {
        self.store.dispatch(Action::SetFilter(filter));
    }
}

fn thing_path(id: &str) -> String {
    format!("/api/{}/", encode_component(id))
}

fn records_path(id: &str) -> String {
    format!("/api/{}/records/", encode_component(id))
}

fn record_errors(error: &TransportError) -> RecordError {
    error
        .response()
        .and_then(RecordError::from_response)
        .unwrap_or_else(|| RecordError::from_message(error.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::state::AppState;
    use crate::error::HttpError;
    use crate::http::{HttpResponse, MockClient, MockResponse};
    use serde_json::json;

    fn creators(client: &MockClient) -> ActionCreators {
        let transport = Transport::new(Arc::new(client.clone()), "http://testserver");
        ActionCreators::new(Arc::new(Store::with_state(AppState::new())), transport)
    }

    #[test]
    fn test_paths_encode_id() {
        assert_eq!(thing_path("abc12345"), "/api/abc12345/");
        assert_eq!(records_path("a/b c"), "/api/a%2Fb%20c/records/");
    }

    #[test]
    fn test_record_errors_from_body() {
        let response = HttpResponse {
            status: 400,
            status_text: "Bad Request".to_string(),
            headers: Vec::new(),
            body: json!({"name": ["required"]}).to_string().into_bytes(),
        };
        let error = TransportError::Http(HttpError::new(response));
        let errors = record_errors(&error);
        assert_eq!(errors.name, vec!["required"]);
    }

    #[test]
    fn test_record_errors_fallback_message() {
        let error = TransportError::Network("connection refused".to_string());
        let errors = record_errors(&error);
        assert_eq!(errors.non_field_errors.len(), 1);
        assert!(errors.non_field_errors[0].contains("connection refused"));
    }

    #[tokio::test]
    async fn test_fetch_thing_failure_clears_flag() {
        let client = MockClient::new();
        client.push_response(MockResponse::json(404, json!({"detail": "Not found."})));
        let creators = creators(&client);

        let result = creators.fetch_thing("missing").await;

        assert!(result.is_err());
        let state = creators.store().state();
        assert!(!state.thing.is_fetching);
        assert!(state.thing.instance.is_none());
    }

    #[tokio::test]
    async fn test_set_filter_does_not_fetch() {
        let client = MockClient::new();
        let creators = creators(&client);

        creators.set_filter(Filter::for_date(2017, 4, 1));

        assert!(client.requests().is_empty());
        assert_eq!(
            creators.store().state().thing.records.filter,
            Filter::for_date(2017, 4, 1)
        );
    }

    #[tokio::test]
    async fn test_invalid_filter_settles_without_request() {
        let client = MockClient::new();
        let creators = creators(&client);

        let result = creators
            .fetch_records("t1", Filter::for_date(2017, 2, 30))
            .await;

        assert!(matches!(result, Err(RpaperError::Filter(_))));
        assert!(client.requests().is_empty());
        assert!(!creators.store().state().thing.records.is_fetching);
    }
}
