//! Secret types, key naming, and value coercion.
//!
//! Everything here is pure: no I/O, no logging.

use crate::error::{KeyVaultError, KeyVaultResult};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use url::Url;

/// Prefix that marks a lookup key as a Key Vault secret.
pub const KEY_PREFIX: &str = "keyvault::";

/// DNS suffix of Azure Key Vault hosts.
pub const VAULT_DOMAIN_SUFFIX: &str = ".vault.azure.net";

/// Key Vault REST API version used for secret reads.
pub const API_VERSION: &str = "2016-10-01";

static INTEGER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\A[-+]?[0-9]+\z").expect("integer pattern is valid"));

/// A lookup key as supplied by the host: a string, or a number in its
/// string form.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LookupKey(String);

impl LookupKey {
    /// Key text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the key is in the `keyvault::` namespace.
    #[must_use]
    pub fn is_keyvault_key(&self) -> bool {
        self.0.starts_with(KEY_PREFIX)
    }

    /// Vault-side secret name, or `None` for keys outside the namespace.
    #[must_use]
    pub fn secret_name(&self) -> Option<String> {
        secret_name(&self.0)
    }
}

impl fmt::Display for LookupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for LookupKey {
    fn from(key: &str) -> Self {
        Self(key.to_string())
    }
}

impl From<String> for LookupKey {
    fn from(key: String) -> Self {
        Self(key)
    }
}

impl From<i64> for LookupKey {
    fn from(key: i64) -> Self {
        Self(key.to_string())
    }
}

impl From<u64> for LookupKey {
    fn from(key: u64) -> Self {
        Self(key.to_string())
    }
}

impl From<f64> for LookupKey {
    fn from(key: f64) -> Self {
        Self(key.to_string())
    }
}

/// Derive the vault-side secret name from a lookup key.
///
/// Strips [`KEY_PREFIX`] and replaces the first `::` with `-`. Later `::`
/// separators are kept literally. Returns `None` when the prefix is absent.
#[must_use]
pub fn secret_name(key: &str) -> Option<String> {
    key.strip_prefix(KEY_PREFIX)
        .map(|rest| rest.replacen("::", "-", 1))
}

/// Strip a trailing [`VAULT_DOMAIN_SUFFIX`] from a configured vault.
#[must_use]
pub fn normalize_vault_host(vault: &str) -> &str {
    vault.strip_suffix(VAULT_DOMAIN_SUFFIX).unwrap_or(vault)
}

/// URL of a secret in a vault.
///
/// The secret name is percent-encoded as a single path segment, so `#`,
/// `?`, `%` and spaces stay part of the name.
///
/// # Errors
///
/// Returns [`KeyVaultError::Configuration`] if the vault host does not
/// form a valid URL.
pub fn secret_url(vault_host: &str, secret_name: &str) -> KeyVaultResult<String> {
    let base = format!("https://{vault_host}{VAULT_DOMAIN_SUFFIX}/secrets");
    let mut url = Url::parse(&base).map_err(|e| {
        KeyVaultError::configuration(format!("invalid vault host {vault_host}: {e}"))
    })?;

    url.path_segments_mut()
        .map_err(|()| {
            KeyVaultError::configuration(format!("vault host {vault_host} cannot carry a path"))
        })?
        .push(secret_name);
    url.query_pairs_mut().append_pair("api-version", API_VERSION);

    Ok(url.into())
}

/// Secret bundle returned by `GET /secrets/{name}`.
#[derive(Debug, Clone, Deserialize)]
pub struct SecretResponse {
    /// Secret value as a wire string
    pub value: Option<String>,
    /// Secret attributes
    pub attributes: SecretAttributes,
}

/// Attributes of a secret bundle.
#[derive(Debug, Clone, Deserialize)]
pub struct SecretAttributes {
    /// Disabled secrets are treated as absent. A missing flag counts as
    /// disabled.
    #[serde(default)]
    pub enabled: bool,
}

/// A typed secret value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum SecretValue {
    /// `"true"` or `"false"`
    Bool(bool),
    /// Optionally signed decimal digits
    Integer(i64),
    /// Anything else, unchanged
    String(String),
}

impl fmt::Display for SecretValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{b}"),
            Self::Integer(i) => write!(f, "{i}"),
            Self::String(s) => f.write_str(s),
        }
    }
}

/// Coerce a wire string into a [`SecretValue`].
///
/// Checked in order: the literals `true` and `false`, then an optional sign
/// followed by ASCII digits, then the string as-is. Digit strings outside
/// the `i64` range stay strings.
#[must_use]
pub fn coerce_value(raw: &str) -> SecretValue {
    match raw {
        "true" => return SecretValue::Bool(true),
        "false" => return SecretValue::Bool(false),
        _ => {}
    }

    if INTEGER.is_match(raw) {
        if let Ok(n) = raw.parse::<i64>() {
            return SecretValue::Integer(n);
        }
    }

    SecretValue::String(raw.to_string())
}
