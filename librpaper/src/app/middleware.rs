//! Store middleware
//!
//! Middleware observe every dispatch after the reducer has produced the
//! next state. They cannot alter or swallow actions.

use super::actions::Action;
use super::state::AppState;

pub trait Middleware: Send + Sync {
    fn handle(&self, action: &Action, prev: &AppState, next: &AppState);
}

/// Logs each dispatched action with a summary of what changed
#[derive(Debug, Default)]
pub struct LoggerMiddleware;

impl Middleware for LoggerMiddleware {
    fn handle(&self, action: &Action, prev: &AppState, next: &AppState) {
        tracing::debug!(
            action = action.name(),
            thing_fetching = next.thing.is_fetching,
            records_fetching = next.thing.records.is_fetching,
            busy = next.is_busy(),
            items_before = prev.thing.records.items.len(),
            items_after = next.thing.records.items.len(),
            record_errors = !next.error.record.is_empty(),
            "dispatch"
        );
        if prev == next {
            tracing::debug!(action = action.name(), "dispatch left state unchanged");
        }
    }
}
