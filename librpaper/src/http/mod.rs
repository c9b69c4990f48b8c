//! HTTP transport for the reservation API
//!
//! `Transport::request` is a single-shot pass-through over an `HttpClient`
//! with two enrichments and one normalization:
//!
//! - `params` are encoded into the URL query string (see `build_query_param`)
//! - unsafe methods on same-origin requests carry the CSRF token read from
//!   the client's cookie jar
//! - any non-2xx response is turned into an `HttpError` carrying the response
//!
//! There is no retry, no timeout and no caching.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use librpaper::http::{ReqwestClient, RequestInit, Transport};
//!
//! # async fn example() -> Result<(), librpaper::error::TransportError> {
//! let client = ReqwestClient::new("https://rpaper.example.com")?;
//! let transport = Transport::new(Arc::new(client), "https://rpaper.example.com");
//!
//! let response = transport.request("/api/abc12345/", RequestInit::get()).await?;
//! println!("{}", response.text());
//! # Ok(())
//! # }
//! ```

use async_trait::async_trait;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::config::ApiConfig;
use crate::error::{HttpError, TransportError};

pub mod client;
pub mod mock;

pub use client::ReqwestClient;
pub use mock::{MockClient, MockResponse};

/// Query parameters, enumerated in key order
pub type QueryParams = BTreeMap<String, String>;

/// Characters left alone by `encodeURIComponent`
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Percent-encode a single URL component
pub fn encode_component(value: &str) -> String {
    utf8_percent_encode(value, COMPONENT).to_string()
}

/// Encode a mapping into a query string
///
/// Keys and values are encoded independently, joined as `key=value` pairs
/// separated by `&`, and encoded spaces are written as `+`.
pub fn build_query_param(query: &QueryParams) -> String {
    query
        .iter()
        .map(|(key, value)| format!("{}={}", encode_component(key), encode_component(value)))
        .collect::<Vec<_>>()
        .join("&")
        .replace("%20", "+")
}

/// HTTP request method
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Head,
    Options,
    Trace,
    Post,
    Put,
    Patch,
    Delete,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Head => "HEAD",
            Method::Options => "OPTIONS",
            Method::Trace => "TRACE",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
        }
    }

    /// Methods that do not require CSRF protection
    pub fn is_safe(&self) -> bool {
        matches!(self, Method::Get | Method::Head | Method::Options | Method::Trace)
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether a request goes to the API's own origin
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RequestMode {
    #[default]
    SameOrigin,
    Cors,
}

impl RequestMode {
    /// `cross_origin = true` makes every request CORS
    pub fn from_config(config: &ApiConfig) -> Self {
        if config.cross_origin {
            RequestMode::Cors
        } else {
            RequestMode::SameOrigin
        }
    }
}

/// Options for `Transport::request`
#[derive(Debug, Clone, Default)]
pub struct RequestInit {
    pub method: Option<Method>,
    pub headers: Vec<(String, String)>,
    pub body: Option<Vec<u8>>,
    pub params: Option<QueryParams>,
    pub mode: RequestMode,
}

impl RequestInit {
    pub fn get() -> Self {
        Self::default()
    }

    /// A POST carrying `body` serialized as JSON
    pub fn post_json<T: Serialize>(body: &T) -> Result<Self, TransportError> {
        Ok(Self {
            method: Some(Method::Post),
            headers: vec![("Content-Type".to_string(), "application/json".to_string())],
            body: Some(serde_json::to_vec(body)?),
            ..Self::default()
        })
    }

    pub fn with_params(mut self, params: QueryParams) -> Self {
        self.params = Some(params);
        self
    }

    pub fn with_mode(mut self, mode: RequestMode) -> Self {
        self.mode = mode;
        self
    }
}

/// A fully resolved request handed to an `HttpClient`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: Method,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<Vec<u8>>,
}

impl HttpRequest {
    /// First header value with the given name (case-insensitive)
    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }
}

/// A response with its body fully read
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub status_text: String,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }

    /// Decode the body as JSON
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, TransportError> {
        Ok(serde_json::from_slice(&self.body)?)
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

fn find_header<'a>(headers: &'a [(String, String)], name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(key, _)| key.eq_ignore_ascii_case(name))
        .map(|(_, value)| value.as_str())
}

/// Network seam beneath `Transport`
///
/// Implementations perform exactly one exchange and report every status
/// as a response; only failures to get a response at all are errors.
#[async_trait]
pub trait HttpClient: Send + Sync {
    /// Perform the request and read the whole response body
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError>;

    /// Current value of a cookie the client would send to the API
    fn cookie(&self, name: &str) -> Option<String>;
}

pub const DEFAULT_CSRF_COOKIE: &str = "csrftoken";
pub const DEFAULT_CSRF_HEADER: &str = "X-CSRFToken";

/// Request wrapper adding query strings, CSRF headers and error
/// normalization on top of an `HttpClient`
#[derive(Clone)]
pub struct Transport {
    client: Arc<dyn HttpClient>,
    base_url: String,
    csrf_cookie: String,
    csrf_header: String,
    mode: RequestMode,
}

impl Transport {
    /// Create a transport rooted at `base_url`
    ///
    /// Paths passed to `request` are appended to the base URL.
    pub fn new(client: Arc<dyn HttpClient>, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            csrf_cookie: DEFAULT_CSRF_COOKIE.to_string(),
            csrf_header: DEFAULT_CSRF_HEADER.to_string(),
            mode: RequestMode::SameOrigin,
        }
    }

    /// Build a reqwest-backed transport from configuration
    ///
    /// A configured `csrf_token` is seeded into the cookie jar so the first
    /// unsafe request can carry it.
    pub fn from_config(config: &ApiConfig) -> Result<Self, TransportError> {
        let client = ReqwestClient::new(&config.base_url)?;
        if let Some(token) = &config.csrf_token {
            client.set_cookie(&config.csrf_cookie, token);
        }

        Ok(Self::new(Arc::new(client), config.base_url.clone())
            .with_csrf(config.csrf_cookie.clone(), config.csrf_header.clone())
            .with_mode(RequestMode::from_config(config)))
    }

    /// Override the cookie the token is read from and the header it is sent in
    pub fn with_csrf(mut self, cookie: impl Into<String>, header: impl Into<String>) -> Self {
        self.csrf_cookie = cookie.into();
        self.csrf_header = header.into();
        self
    }

    /// Default mode for requests that do not ask for CORS themselves
    pub fn with_mode(mut self, mode: RequestMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Token unsafe requests would carry, read from the client's cookies
    pub fn csrf_token(&self) -> Option<String> {
        self.client.cookie(&self.csrf_cookie)
    }

    /// Perform a request against `path`
    ///
    /// Resolves with the response when its status is 2xx. Any other status
    /// fails with `TransportError::Http` carrying the response.
    pub async fn request(
        &self,
        path: &str,
        mut init: RequestInit,
    ) -> Result<HttpResponse, TransportError> {
        let mut url = format!("{}{}", self.base_url, path);

        if let Some(params) = init.params.take() {
            if !params.is_empty() {
                let separator = if url.contains('?') { '&' } else { '?' };
                url = format!("{}{}{}", url, separator, build_query_param(&params));
            }
        }

        let method = init.method.unwrap_or(Method::Get);
        let cross_origin = init.mode == RequestMode::Cors || self.mode == RequestMode::Cors;
        if !method.is_safe() && !cross_origin {
            match self.csrf_token() {
                Some(token) => init.headers.push((self.csrf_header.clone(), token)),
                None => tracing::debug!(
                    "No '{}' cookie available for {} {}",
                    self.csrf_cookie,
                    method,
                    url
                ),
            }
        }

        tracing::debug!(method = %method, url = %url, "http.request");

        let request = HttpRequest {
            method,
            url,
            headers: init.headers,
            body: init.body,
        };

        let response = self.client.send(request).await?;
        if response.is_success() {
            Ok(response)
        } else {
            tracing::debug!(status = response.status, "http.request failed");
            Err(HttpError::new(response).into())
        }
    }

    /// GET `path` and decode the JSON body
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        params: QueryParams,
    ) -> Result<T, TransportError> {
        self.request(path, RequestInit::get().with_params(params))
            .await?
            .json()
    }

    /// POST `body` as JSON to `path` and decode the JSON response
    pub async fn post_json<B: Serialize + Sync, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, TransportError> {
        self.request(path, RequestInit::post_json(body)?)
            .await?
            .json()
    }
}
