//! Azure Key Vault lookup backend.
//!
//! Resolves `keyvault::`-prefixed configuration keys to typed secret values
//! by querying the configured vaults in order, each with its own
//! client-credentials token.
//!
//! ```no_run
//! use keyvault_lookup::{LookupOptions, TracingContext, VaultConfig, VaultSet, lookup_key};
//!
//! # async fn run() -> keyvault_lookup::KeyVaultResult<()> {
//! let vaults = VaultSet::new().with_vault("primary", VaultConfig::new("kv1", "tenant", "client", "secret"));
//! let outcome = lookup_key("keyvault::db::password", &LookupOptions::with_vaults(vaults), &TracingContext).await?;
//! println!("{:?}", outcome.into_option());
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod auth;
pub mod config;
pub mod context;
pub mod error;
pub mod lookup;
pub mod resolver;
pub mod secrets;
pub mod validate;

pub use auth::{BearerToken, TokenAuthenticator};
pub use config::{CliConfig, LookupOptions, VaultConfig, VaultSet};
pub use context::{LookupContext, TracingContext};
pub use error::{ErrorKind, KeyVaultError, KeyVaultResult};
pub use lookup::{KeyVaultLookup, Lookup, blocking, lookup_key};
pub use resolver::SecretResolver;
pub use secrets::{LookupKey, SecretValue, coerce_value, normalize_vault_host, secret_name};
pub use validate::validate;
