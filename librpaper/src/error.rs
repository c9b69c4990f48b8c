//! Error types for rpaper

use thiserror::Error;

use crate::http::HttpResponse;

pub type Result<T> = std::result::Result<T, RpaperError>;

#[derive(Error, Debug)]
pub enum RpaperError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Invalid filter: {0}")]
    Filter(#[from] FilterError),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl RpaperError {
    /// Returns the appropriate exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            RpaperError::InvalidInput(_) => 3,
            RpaperError::Filter(_) => 3,
            RpaperError::Transport(_) => 1,
            RpaperError::Config(_) => 1,
        }
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid base URL '{0}'")]
    InvalidUrl(String),
}

/// A response whose status was not 2xx.
///
/// Displays as the response's status text and keeps the whole response so
/// callers can inspect the status or decode the body.
#[derive(Error, Debug, Clone)]
#[error("{}", .response.status_text)]
pub struct HttpError {
    pub response: HttpResponse,
}

impl HttpError {
    pub fn new(response: HttpResponse) -> Self {
        Self { response }
    }

    pub fn status(&self) -> u16 {
        self.response.status
    }
}

#[derive(Error, Debug)]
pub enum TransportError {
    #[error("HTTP error: {0}")]
    Http(#[from] HttpError),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Failed to decode response body: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Invalid request URL: {0}")]
    InvalidUrl(String),
}

impl TransportError {
    /// The failed response, when the server answered with a non-2xx status
    pub fn response(&self) -> Option<&HttpResponse> {
        match self {
            TransportError::Http(err) => Some(&err.response),
            _ => None,
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FilterError {
    #[error("{year:04}-{month:02}-{date:02} is not a calendar date")]
    InvalidDate { year: i32, month: u32, date: u32 },

    #[error("local time {0} does not exist in the current time zone")]
    NonexistentLocalTime(String),
}
