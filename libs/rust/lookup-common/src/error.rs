//! Centralized HTTP error types.
//!
//! Every failure of a single request/response exchange maps to [`HttpError`].
//! Callers use [`HttpError::is_not_found`] to tell a missing resource apart
//! from every other failure.

use thiserror::Error;

/// Error type for HTTP transport operations.
#[derive(Error, Debug)]
pub enum HttpError {
    /// The request never produced a response (connect, TLS, timeout, body read).
    #[error("Request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The server answered with a non-2xx status.
    #[error("Request failed with status {status} - {headers:?}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Response headers as name/value pairs
        headers: Vec<(String, String)>,
        /// Response body, empty when unreadable
        body: String,
    },

    /// The URL could not be parsed or encoded.
    #[error("Invalid URL {url}: {reason}")]
    InvalidUrl {
        /// The offending URL
        url: String,
        /// Parser message
        reason: String,
    },

    /// A JSON body was requested but could not be parsed.
    #[error("Invalid JSON response: {0}")]
    Decode(#[from] serde_json::Error),

    /// Transport failure reported by a non-reqwest transport.
    #[error("Request failed: {0}")]
    Other(String),
}

/// Result type for HTTP operations.
pub type HttpResult<T> = Result<T, HttpError>;

impl HttpError {
    /// Create a status error.
    #[must_use]
    pub fn status(status: u16, headers: Vec<(String, String)>, body: impl Into<String>) -> Self {
        Self::Status {
            status,
            headers,
            body: body.into(),
        }
    }

    /// Create an invalid URL error.
    #[must_use]
    pub fn invalid_url(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidUrl {
            url: url.into(),
            reason: reason.into(),
        }
    }

    /// Create a generic transport failure.
    #[must_use]
    pub fn other(msg: impl Into<String>) -> Self {
        Self::Other(msg.into())
    }

    /// HTTP status carried by the error, if the server answered at all.
    #[must_use]
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Check if the server reported the resource as missing (HTTP 404).
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        self.status_code() == Some(404)
    }
}
