//! HTTP client configuration, building, and the request/response transport.
//!
//! Everything above this module talks to the network through
//! [`HttpTransport`], a single `send` call taking an [`HttpRequest`] and
//! returning an [`HttpResponse`]. [`ReqwestTransport`] is the production
//! implementation; tests substitute their own.

use crate::error::{HttpError, HttpResult};
use async_trait::async_trait;
use reqwest::header::{ACCEPT, HeaderMap};
use reqwest::{Client, ClientBuilder, Method};
use serde_json::Value;
use std::fmt;
use std::time::Duration;
use tracing::{debug, instrument, warn};
use url::Url;

/// HTTP client configuration.
///
/// Certificate verification is always on and cannot be configured away.
#[derive(Debug, Clone)]
pub struct HttpConfig {
    /// Connection timeout (default: 10s)
    pub connect_timeout: Duration,
    /// Overall request timeout (default: none, transport defaults apply)
    pub timeout: Option<Duration>,
    /// Maximum idle connections kept per host (default: 0, no reuse)
    pub pool_max_idle_per_host: usize,
    /// User agent string
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            timeout: None,
            pool_max_idle_per_host: 0,
            user_agent: concat!("keyvault-lookup/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl HttpConfig {
    /// Set a custom connect timeout.
    #[must_use]
    pub const fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Set an overall request timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Set a custom user agent.
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }
}

/// Build a configured HTTP client.
///
/// Creates a reqwest client with rustls TLS and the specified configuration.
///
/// # Errors
///
/// Returns an error if the client cannot be built (e.g., TLS initialization fails).
pub fn build_http_client(config: &HttpConfig) -> Result<Client, reqwest::Error> {
    let mut builder = ClientBuilder::new()
        .connect_timeout(config.connect_timeout)
        .pool_max_idle_per_host(config.pool_max_idle_per_host)
        .user_agent(&config.user_agent)
        .use_rustls_tls();

    if let Some(timeout) = config.timeout {
        builder = builder.timeout(timeout);
    }

    builder.build()
}

/// A single outbound request.
#[derive(Clone)]
pub struct HttpRequest {
    /// HTTP method
    pub method: Method,
    /// Unencoded URL; encoded by the transport before dispatch
    pub url: String,
    /// Extra request headers
    pub headers: Vec<(String, String)>,
    /// Form-encoded body fields, in order
    pub form: Option<Vec<(String, String)>>,
    /// Ask for a JSON body and parse it
    pub accept_json: bool,
}

impl HttpRequest {
    /// Create a GET request.
    #[must_use]
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            method: Method::GET,
            url: url.into(),
            headers: Vec::new(),
            form: None,
            accept_json: false,
        }
    }

    /// Create a POST request.
    #[must_use]
    pub fn post(url: impl Into<String>) -> Self {
        Self {
            method: Method::POST,
            ..Self::get(url)
        }
    }

    /// Add a header.
    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Set a form-encoded body.
    #[must_use]
    pub fn form<K, V>(mut self, fields: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.form = Some(
            fields
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        );
        self
    }

    /// Request and parse a JSON body.
    #[must_use]
    pub const fn json(mut self) -> Self {
        self.accept_json = true;
        self
    }

    /// Look up a header value by case-insensitive name.
    #[must_use]
    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Look up a form field by name.
    #[must_use]
    pub fn form_value(&self, name: &str) -> Option<&str> {
        self.form
            .as_ref()?
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }
}

// Header and form values routinely carry credentials.
impl fmt::Debug for HttpRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let headers: Vec<&str> = self.headers.iter().map(|(k, _)| k.as_str()).collect();
        let form: Option<Vec<&str>> = self
            .form
            .as_ref()
            .map(|fields| fields.iter().map(|(k, _)| k.as_str()).collect());
        f.debug_struct("HttpRequest")
            .field("method", &self.method)
            .field("url", &self.url)
            .field("headers", &headers)
            .field("form", &form)
            .field("accept_json", &self.accept_json)
            .finish()
    }
}

/// A successful (2xx) response.
#[derive(Clone)]
pub struct HttpResponse {
    /// HTTP status code
    pub status: u16,
    /// Raw body
    pub body: String,
    /// Parsed body when JSON was requested and the body was not empty
    pub json: Option<Value>,
}

impl HttpResponse {
    /// Build a response from a raw body, parsing it as JSON when asked to.
    ///
    /// # Errors
    ///
    /// Returns [`HttpError::Decode`] when `parse_json` is set and the
    /// non-empty body is not valid JSON.
    pub fn from_body(status: u16, body: impl Into<String>, parse_json: bool) -> HttpResult<Self> {
        let body = body.into();
        let json = if parse_json && !body.trim().is_empty() {
            Some(serde_json::from_str(&body)?)
        } else {
            None
        };
        Ok(Self { status, body, json })
    }
}

impl fmt::Debug for HttpResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpResponse")
            .field("status", &self.status)
            .field("body_len", &self.body.len())
            .finish_non_exhaustive()
    }
}

/// One request in, one response out.
///
/// Implementations perform exactly one round trip per call and never retry.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Send a request.
    ///
    /// Non-2xx responses are returned as [`HttpError::Status`].
    async fn send(&self, request: HttpRequest) -> HttpResult<HttpResponse>;
}

/// Production transport backed by reqwest.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    /// Create a transport from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying client cannot be built.
    pub fn new(config: &HttpConfig) -> HttpResult<Self> {
        Ok(Self {
            client: build_http_client(config)?,
        })
    }

    /// Wrap an existing client.
    #[must_use]
    pub const fn from_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    #[instrument(skip(self, request), fields(method = %request.method, url = %request.url))]
    async fn send(&self, request: HttpRequest) -> HttpResult<HttpResponse> {
        let url = encode_url(&request.url)?;

        let mut builder = self.client.request(request.method.clone(), url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if request.accept_json {
            builder = builder.header(ACCEPT, "application/json");
        }
        if let Some(fields) = &request.form {
            builder = builder.form(fields);
        }

        let response = builder.send().await?;
        let status = response.status();

        if !status.is_success() {
            let headers = header_pairs(response.headers());
            let body = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), "Request failed");
            return Err(HttpError::status(status.as_u16(), headers, body));
        }

        let body = response.text().await?;
        debug!(status = status.as_u16(), body_len = body.len(), "Request succeeded");
        HttpResponse::from_body(status.as_u16(), body, request.accept_json)
    }
}

/// Parse and percent-encode a URL.
///
/// Characters outside the URL grammar are escaped and existing escapes are
/// kept. Reserved characters such as `#` and `?` keep their URL meaning, so
/// path segments must already be encoded by the caller.
///
/// # Errors
///
/// Returns [`HttpError::InvalidUrl`] if the string is not an absolute URL.
pub fn encode_url(raw: &str) -> HttpResult<Url> {
    Url::parse(raw).map_err(|e| HttpError::invalid_url(raw, e.to_string()))
}

fn header_pairs(headers: &HeaderMap) -> Vec<(String, String)> {
    headers
        .iter()
        .map(|(name, value)| {
            (
                name.as_str().to_string(),
                value.to_str().unwrap_or("<binary>").to_string(),
            )
        })
        .collect()
}
