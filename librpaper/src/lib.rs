//! rpaper - client state for a reservation booking service
//!
//! This library fetches a bookable thing, lists and filters its
//! reservation records by year, month or date, and submits new records,
//! keeping everything in a single reducer-driven state tree.

pub mod app;
pub mod config;
pub mod error;
pub mod filter;
pub mod http;
pub mod logging;
pub mod types;

// Re-export commonly used types
pub use app::{reduce, Action, ActionCreators, AppState, Store};
pub use config::Config;
pub use error::{Result, RpaperError};
pub use filter::{build_filter_param, classify, FilterKind};
pub use http::Transport;
pub use types::{Filter, Record, RecordError, RecordForm, Thing, User};
