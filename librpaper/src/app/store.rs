//! State container
//!
//! One `Store` is constructed at startup and shared by reference (usually
//! in an `Arc`) with whoever dispatches or renders. Dispatch runs the
//! reducer synchronously, so each action fully produces the next state
//! before the following one is processed. The previous state tree is never
//! mutated; it is swapped for the new one.
//!
//! # Example
//!
//! ```
//! use librpaper::app::{Action, Store};
//!
//! let store = Store::new();
//! let mut events = store.subscribe();
//!
//! store.dispatch(Action::RequestThing);
//! assert!(store.state().thing.is_fetching);
//!
//! let event = events.try_recv().unwrap();
//! assert_eq!(event.action, "REQUEST_THING");
//! ```

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::broadcast;

use super::actions::Action;
use super::middleware::{LoggerMiddleware, Middleware};
use super::reducer::reduce;
use super::state::AppState;

/// Buffered events per subscriber before the oldest are dropped
const EVENT_CAPACITY: usize = 100;

/// Event receiver type alias
pub type StoreReceiver = broadcast::Receiver<StoreEvent>;

/// Emitted to subscribers after every dispatch
#[derive(Debug, Clone)]
pub struct StoreEvent {
    /// Name of the dispatched action
    pub action: &'static str,
    /// State after the action was applied
    pub state: Arc<AppState>,
}

pub struct Store {
    state: Mutex<Arc<AppState>>,
    middleware: Vec<Box<dyn Middleware>>,
    events: broadcast::Sender<StoreEvent>,
    request_seq: AtomicU64,
}

impl Store {
    /// Store with the initial state and the logging middleware
    pub fn new() -> Self {
        Self::with_state(AppState::new()).with_middleware(LoggerMiddleware)
    }

    /// Store starting from `initial`, without middleware
    pub fn with_state(initial: AppState) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            state: Mutex::new(Arc::new(initial)),
            middleware: Vec::new(),
            events,
            request_seq: AtomicU64::new(0),
        }
    }

    /// Append a middleware; they run in the order added
    pub fn with_middleware(mut self, middleware: impl Middleware + 'static) -> Self {
        self.middleware.push(Box::new(middleware));
        self
    }

    /// Snapshot of the current state
    pub fn state(&self) -> Arc<AppState> {
        let current = self.lock();
        Arc::clone(&*current)
    }

    /// Apply an action and notify middleware and subscribers
    pub fn dispatch(&self, action: Action) {
        let next = {
            let mut current = self.lock();
            let next = Arc::new(reduce(AppState::clone(&**current), action.clone()));
            for middleware in &self.middleware {
                middleware.handle(&action, &current, &next);
            }
            *current = Arc::clone(&next);
            next
        };

        // Err only means nobody is subscribed
        let _ = self.events.send(StoreEvent {
            action: action.name(),
            state: next,
        });
    }

    /// Receive a `StoreEvent` for every dispatch from now on
    pub fn subscribe(&self) -> StoreReceiver {
        self.events.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.events.receiver_count()
    }

    /// Next sequence number for a records fetch (starts at 1)
    pub fn next_request_seq(&self) -> u64 {
        self.request_seq.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Arc<AppState>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for Store {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Filter;
    use std::sync::atomic::AtomicUsize;

    struct CountingMiddleware(Arc<AtomicUsize>);

    impl Middleware for CountingMiddleware {
        fn handle(&self, _action: &Action, _prev: &AppState, _next: &AppState) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn test_dispatch_updates_state() {
        let store = Store::new();
        store.dispatch(Action::SetFilter(Filter::for_year(2017)));
        assert_eq!(store.state().thing.records.filter, Filter::for_year(2017));
    }

    #[test]
    fn test_old_snapshot_is_not_mutated() {
        let store = Store::new();
        let before = store.state();

        store.dispatch(Action::RequestThing);

        assert!(!before.thing.is_fetching);
        assert!(store.state().thing.is_fetching);
    }

    #[test]
    fn test_middleware_sees_every_dispatch() {
        let count = Arc::new(AtomicUsize::new(0));
        let store = Store::with_state(AppState::new())
            .with_middleware(CountingMiddleware(Arc::clone(&count)));

        store.dispatch(Action::RequestThing);
        store.dispatch(Action::ThingFailed);

        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_subscribers_receive_events_in_order() {
        let store = Store::new();
        let mut events = store.subscribe();
        assert_eq!(store.subscriber_count(), 1);

        store.dispatch(Action::RequestRecord);
        store.dispatch(Action::SetFilter(Filter::for_year(2017)));

        let first = events.try_recv().unwrap();
        assert_eq!(first.action, "REQUEST_RECORD");
        assert!(first.state.thing.records.is_fetching);

        let second = events.try_recv().unwrap();
        assert_eq!(second.action, "SET_FILTER");
        assert_eq!(second.state.thing.records.filter, Filter::for_year(2017));
    }

    #[test]
    fn test_dispatch_without_subscribers() {
        let store = Store::new();
        store.dispatch(Action::RequestThing);
        assert_eq!(store.subscriber_count(), 0);
    }

    #[test]
    fn test_request_seq_is_monotonic() {
        let store = Store::new();
        assert_eq!(store.next_request_seq(), 1);
        assert_eq!(store.next_request_seq(), 2);
        assert_eq!(store.next_request_seq(), 3);
    }
}
