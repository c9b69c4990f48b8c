//! Unidirectional state management
//!
//! Views call the action creators in `thunks`, which dispatch plain
//! `Action`s into the `Store`. The store runs the pure `reduce` function,
//! passes the result through its middleware and notifies subscribers.

pub mod actions;
pub mod middleware;
pub mod reducer;
pub mod state;
pub mod store;
pub mod thunks;

pub use actions::Action;
pub use middleware::{LoggerMiddleware, Middleware};
pub use reducer::reduce;
pub use state::{AppState, ErrorState, RecordsState, ThingState};
pub use store::{Store, StoreEvent, StoreReceiver};
pub use thunks::ActionCreators;
