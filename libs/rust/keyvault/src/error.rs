//! Key Vault lookup error types using thiserror 2.0.
//!
//! Only fatal outcomes are errors. A missing secret is not an error; it is
//! reported as [`crate::Lookup::NotFound`].

use lookup_common::HttpError;
use thiserror::Error;

/// Fatal error categories, for hosts that classify failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The `vaults` option is missing or unusable
    Configuration,
    /// A bearer token could not be obtained
    Authentication,
    /// The secret fetch failed for a reason other than 404
    Transport,
    /// The HTTP client or async runtime could not be created
    Setup,
}

/// Key Vault lookup errors. Every variant aborts the whole lookup.
#[derive(Error, Debug)]
pub enum KeyVaultError {
    /// Invalid or missing vault configuration
    #[error("Invalid configuration: {0}")]
    Configuration(String),

    /// Credentials were missing before contacting the auth server
    #[error("Cannot connect to auth server, missing credentials for vault {vault}")]
    MissingCredentials {
        /// Vault name from the options map
        vault: String,
    },

    /// The token request failed
    #[error("Authentication failed for vault {vault} - {source}")]
    Authentication {
        /// Vault name from the options map
        vault: String,
        /// Underlying HTTP failure
        #[source]
        source: HttpError,
    },

    /// The token response did not carry an access token
    #[error("Authentication failed for vault {vault}: {reason}")]
    InvalidTokenResponse {
        /// Vault name from the options map
        vault: String,
        /// What was wrong with the response
        reason: String,
    },

    /// The secret fetch failed with something other than a 404
    #[error("Keyvault search failed for vault {vault} - {source}")]
    Transport {
        /// Vault name from the options map
        vault: String,
        /// Underlying HTTP failure
        #[source]
        source: HttpError,
    },

    /// The secret response could not be interpreted
    #[error("Keyvault search failed for vault {vault}: malformed response ({reason})")]
    MalformedResponse {
        /// Vault name from the options map
        vault: String,
        /// What was wrong with the response
        reason: String,
    },

    /// The HTTP client could not be built
    #[error("HTTP client setup failed: {0}")]
    HttpClient(#[source] HttpError),

    /// The async runtime for a blocking lookup could not be created
    #[error("Runtime error: {0}")]
    Runtime(#[from] std::io::Error),
}

/// Result type for Key Vault lookups.
pub type KeyVaultResult<T> = Result<T, KeyVaultError>;

impl KeyVaultError {
    /// Create a configuration error.
    #[must_use]
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Fatal category of this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Configuration(_) => ErrorKind::Configuration,
            Self::MissingCredentials { .. }
            | Self::Authentication { .. }
            | Self::InvalidTokenResponse { .. } => ErrorKind::Authentication,
            Self::Transport { .. } | Self::MalformedResponse { .. } => ErrorKind::Transport,
            Self::HttpClient(_) | Self::Runtime(_) => ErrorKind::Setup,
        }
    }
}
