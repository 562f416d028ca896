//! Lookup options: the ordered vault map supplied by the host.
//!
//! Entries are kept even when incomplete. Usability is checked by
//! [`crate::validate`], and incomplete entries are still visited by the
//! resolver, so an ordering mistake in the options surfaces as an
//! authentication failure rather than being silently skipped.

use crate::error::{KeyVaultError, KeyVaultResult};
use secrecy::{ExposeSecret, SecretString};
use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer};
use std::fmt;
use std::path::PathBuf;

/// One entry of the `vaults` option.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(from = "RawVaultConfig")]
pub struct VaultConfig {
    /// Vault name or full hostname
    pub vault: Option<String>,
    /// Azure AD tenant
    pub tenant: Option<String>,
    /// Client (application) id
    pub client: Option<String>,
    /// Client secret
    pub client_secret: Option<SecretString>,
}

#[derive(Deserialize)]
struct RawVaultConfig {
    vault: Option<String>,
    tenant: Option<String>,
    client: Option<String>,
    client_secret: Option<String>,
}

impl From<RawVaultConfig> for VaultConfig {
    fn from(raw: RawVaultConfig) -> Self {
        Self {
            vault: raw.vault,
            tenant: raw.tenant,
            client: raw.client,
            client_secret: raw.client_secret.map(SecretString::from),
        }
    }
}

impl VaultConfig {
    /// Create a complete configuration.
    #[must_use]
    pub fn new(
        vault: impl Into<String>,
        tenant: impl Into<String>,
        client: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> Self {
        Self {
            vault: Some(vault.into()),
            tenant: Some(tenant.into()),
            client: Some(client.into()),
            client_secret: Some(SecretString::from(client_secret.into())),
        }
    }

    /// Names of required fields that are absent or empty.
    #[must_use]
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if non_empty(self.vault.as_deref()).is_none() {
            missing.push("vault");
        }
        if non_empty(self.tenant.as_deref()).is_none() {
            missing.push("tenant");
        }
        if non_empty(self.client.as_deref()).is_none() {
            missing.push("client");
        }
        if self.client_secret().is_none() {
            missing.push("client_secret");
        }
        missing
    }

    /// A config is usable when all four fields are present and non-empty.
    #[must_use]
    pub fn is_usable(&self) -> bool {
        self.missing_fields().is_empty()
    }

    /// Vault name, if non-empty.
    #[must_use]
    pub fn vault(&self) -> Option<&str> {
        non_empty(self.vault.as_deref())
    }

    /// Tenant, if non-empty.
    #[must_use]
    pub fn tenant(&self) -> Option<&str> {
        non_empty(self.tenant.as_deref())
    }

    /// Client id, if non-empty.
    #[must_use]
    pub fn client(&self) -> Option<&str> {
        non_empty(self.client.as_deref())
    }

    /// Client secret, if non-empty.
    #[must_use]
    pub fn client_secret(&self) -> Option<&SecretString> {
        self.client_secret
            .as_ref()
            .filter(|s| !s.expose_secret().is_empty())
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

/// Ordered mapping from vault name to [`VaultConfig`].
///
/// Iteration follows insertion order, which for deserialized options is
/// the order the entries appear in the source document.
#[derive(Debug, Clone, Default)]
pub struct VaultSet {
    entries: Vec<(String, VaultConfig)>,
}

impl VaultSet {
    /// Create an empty set.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Insert or replace an entry. A replaced entry keeps its position.
    pub fn insert(&mut self, name: impl Into<String>, config: VaultConfig) {
        let name = name.into();
        if let Some(slot) = self.entries.iter_mut().find(|(n, _)| *n == name) {
            slot.1 = config;
        } else {
            self.entries.push((name, config));
        }
    }

    /// Builder form of [`VaultSet::insert`].
    #[must_use]
    pub fn with_vault(mut self, name: impl Into<String>, config: VaultConfig) -> Self {
        self.insert(name, config);
        self
    }

    /// Iterate entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &VaultConfig)> {
        self.entries.iter().map(|(n, c)| (n.as_str(), c))
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the set has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of usable entries.
    #[must_use]
    pub fn usable_count(&self) -> usize {
        self.entries.iter().filter(|(_, c)| c.is_usable()).count()
    }
}

impl<'de> Deserialize<'de> for VaultSet {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct VaultSetVisitor;

        impl<'de> Visitor<'de> for VaultSetVisitor {
            type Value = VaultSet;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of vault name to vault configuration")
            }

            fn visit_map<A>(self, mut access: A) -> Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut set = VaultSet::new();
                while let Some((name, config)) = access.next_entry::<String, VaultConfig>()? {
                    set.insert(name, config);
                }
                Ok(set)
            }
        }

        deserializer.deserialize_map(VaultSetVisitor)
    }
}

/// Options passed by the host for one lookup.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LookupOptions {
    /// The `vaults` map; absence is a configuration error
    pub vaults: Option<VaultSet>,
}

impl LookupOptions {
    /// Options with the given vault set.
    #[must_use]
    pub const fn with_vaults(vaults: VaultSet) -> Self {
        Self {
            vaults: Some(vaults),
        }
    }

    /// Interpret an already-parsed options document.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the document does not have the
    /// expected shape.
    pub fn from_value(value: serde_json::Value) -> KeyVaultResult<Self> {
        serde_json::from_value(value)
            .map_err(|e| KeyVaultError::configuration(format!("malformed lookup options: {e}")))
    }

    /// Read options from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the file cannot be read or parsed.
    pub fn from_file(path: &std::path::Path) -> KeyVaultResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            KeyVaultError::configuration(format!("cannot read {}: {e}", path.display()))
        })?;
        serde_json::from_str(&text).map_err(|e| {
            KeyVaultError::configuration(format!("cannot parse {}: {e}", path.display()))
        })
    }
}

/// Command-line configuration, loaded from the environment.
#[derive(Debug, Clone)]
pub struct CliConfig {
    /// JSON file holding `{"vaults": {...}}`
    pub options_file: PathBuf,
    /// Log level filter
    pub log_level: String,
    /// Emit JSON logs
    pub log_json: bool,
}

impl CliConfig {
    /// Load configuration from environment variables.
    ///
    /// A `.env` file in the working directory is honoured.
    ///
    /// # Errors
    ///
    /// Returns an error if `KEYVAULT_OPTIONS_FILE` is unset or a variable
    /// is invalid.
    pub fn from_env() -> KeyVaultResult<Self> {
        dotenvy::dotenv().ok();

        let options_file = std::env::var("KEYVAULT_OPTIONS_FILE")
            .map(PathBuf::from)
            .map_err(|_| KeyVaultError::configuration("KEYVAULT_OPTIONS_FILE is not set"))?;
        let log_level = std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
        let log_json = parse_env("LOG_JSON", false)?;

        Ok(Self {
            options_file,
            log_level,
            log_json,
        })
    }
}

/// Parse environment variable with default value.
fn parse_env<T: std::str::FromStr>(name: &str, default: T) -> KeyVaultResult<T>
where
    T::Err: fmt::Display,
{
    match std::env::var(name) {
        Ok(val) => val
            .parse()
            .map_err(|e| KeyVaultError::configuration(format!("Invalid {name}: {e}"))),
        Err(_) => Ok(default),
    }
}
