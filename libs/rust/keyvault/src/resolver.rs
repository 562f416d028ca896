//! Secret resolution across the configured vaults.
//!
//! Vaults are visited strictly in insertion order and every step is awaited
//! before the next begins. The first terminal outcome ends the lookup:
//! - a coerced value from an enabled secret
//! - a 404 or a disabled secret, reported as not found
//! - any fatal error
//!
//! Only an empty response moves on to the next vault.

use crate::auth::{BearerToken, TokenAuthenticator};
use crate::config::{VaultConfig, VaultSet};
use crate::context::LookupContext;
use crate::error::{KeyVaultError, KeyVaultResult};
use crate::lookup::Lookup;
use crate::secrets::{LookupKey, SecretResponse, coerce_value, normalize_vault_host, secret_url};
use lookup_common::{HttpRequest, HttpTransport};
use serde_json::Value;
use tracing::{debug, info, instrument};

/// Resolves keys against a [`VaultSet`] through an [`HttpTransport`].
#[derive(Debug, Clone)]
pub struct SecretResolver<T> {
    transport: T,
}

impl<T> SecretResolver<T>
where
    T: HttpTransport,
{
    /// Create a resolver over a transport.
    pub const fn new(transport: T) -> Self {
        Self { transport }
    }

    /// The underlying transport.
    pub const fn transport(&self) -> &T {
        &self.transport
    }

    /// Resolve a key.
    ///
    /// Keys outside the `keyvault::` namespace are not found without any
    /// network call.
    ///
    /// # Errors
    ///
    /// Returns an error on any fatal outcome: an entry without a vault
    /// host or with a host that does not form a URL, an authentication
    /// failure, or a secret fetch failure other than 404.
    #[instrument(skip(self, key, vaults, ctx), fields(key = %key))]
    pub async fn resolve<C>(
        &self,
        key: &LookupKey,
        vaults: &VaultSet,
        ctx: &C,
    ) -> KeyVaultResult<Lookup>
    where
        C: LookupContext + ?Sized,
    {
        let Some(secret_name) = key.secret_name() else {
            debug!("Key is outside the keyvault namespace");
            return Ok(Lookup::NotFound);
        };

        let authenticator = TokenAuthenticator::new(&self.transport);

        for (name, config) in vaults.iter() {
            let url = secret_url(vault_host(name, config)?, &secret_name)?;
            let token = authenticator.authenticate(name, config).await?;

            if let Some(outcome) = self.fetch(name, url, &secret_name, &token, ctx).await? {
                return Ok(outcome);
            }
        }

        debug!("No vault returned the secret");
        Ok(Lookup::NotFound)
    }

    /// Fetch from one vault. `None` means the vault answered with nothing
    /// and the next vault should be tried.
    async fn fetch<C>(
        &self,
        name: &str,
        url: String,
        secret_name: &str,
        token: &BearerToken,
        ctx: &C,
    ) -> KeyVaultResult<Option<Lookup>>
    where
        C: LookupContext + ?Sized,
    {
        let request = HttpRequest::get(url)
            .header("Authorization", token.header_value())
            .json();

        let response = match self.transport.send(request).await {
            Ok(response) => response,
            Err(e) if e.is_not_found() => {
                info!(vault = name, secret = secret_name, "Secret not found");
                ctx.explain(&|| format!("Vault {name} has no secret {secret_name}"));
                return Ok(Some(Lookup::NotFound));
            }
            Err(source) => {
                return Err(KeyVaultError::Transport {
                    vault: name.to_string(),
                    source,
                });
            }
        };

        let json = match response.json {
            None | Some(Value::Null) => {
                ctx.explain(&|| format!("Vault {name} returned an empty response"));
                return Ok(None);
            }
            Some(json) => json,
        };

        let secret: SecretResponse =
            serde_json::from_value(json).map_err(|e| KeyVaultError::MalformedResponse {
                vault: name.to_string(),
                reason: e.to_string(),
            })?;

        let enabled = secret.attributes.enabled;
        ctx.explain(&|| format!("Vault {name} returned secret {secret_name} (enabled: {enabled})"));

        if !enabled {
            info!(vault = name, secret = secret_name, "Secret is disabled");
            return Ok(Some(Lookup::NotFound));
        }

        let raw = secret
            .value
            .ok_or_else(|| KeyVaultError::MalformedResponse {
                vault: name.to_string(),
                reason: "missing value".to_string(),
            })?;

        debug!(vault = name, secret = secret_name, "Secret resolved");
        Ok(Some(Lookup::Found(coerce_value(&raw))))
    }
}

fn vault_host<'a>(name: &str, config: &'a VaultConfig) -> KeyVaultResult<&'a str> {
    config.vault().map(normalize_vault_host).ok_or_else(|| {
        KeyVaultError::configuration(format!("vault {name} has no vault host configured"))
    })
}
