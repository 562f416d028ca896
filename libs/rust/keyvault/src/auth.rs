//! OAuth2 client-credentials authentication against Azure AD.

use crate::config::VaultConfig;
use crate::error::{KeyVaultError, KeyVaultResult};
use lookup_common::{HttpRequest, HttpTransport};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tracing::{debug, instrument};
use url::Url;

/// Azure AD authority that issues tokens.
pub const AUTHORITY_URL: &str = "https://login.windows.net";

/// Resource the token is requested for.
pub const VAULT_RESOURCE: &str = "https://vault.azure.net";

/// An `Authorization` header value of the form `Bearer <token>`.
///
/// Lives for one vault iteration and is never cached.
#[derive(Debug)]
pub struct BearerToken(SecretString);

impl BearerToken {
    /// Wrap a raw access token.
    #[must_use]
    pub fn new(access_token: &str) -> Self {
        Self(SecretString::from(format!("Bearer {access_token}")))
    }

    /// Full header value, including the `Bearer ` scheme.
    #[must_use]
    pub fn header_value(&self) -> &str {
        self.0.expose_secret()
    }
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// Token endpoint for a tenant. The tenant is percent-encoded as one path
/// segment.
///
/// # Errors
///
/// Returns [`KeyVaultError::Configuration`] if the endpoint cannot be built.
pub fn token_url(tenant: &str) -> KeyVaultResult<String> {
    let mut url = Url::parse(AUTHORITY_URL)
        .map_err(|e| KeyVaultError::configuration(format!("invalid authority url: {e}")))?;

    url.path_segments_mut()
        .map_err(|()| KeyVaultError::configuration("authority url cannot carry a path"))?
        .push(tenant)
        .push("oauth2")
        .push("token");

    Ok(url.into())
}

/// Exchanges client credentials for bearer tokens.
pub struct TokenAuthenticator<'a, T: ?Sized> {
    transport: &'a T,
}

impl<'a, T> TokenAuthenticator<'a, T>
where
    T: HttpTransport + ?Sized,
{
    /// Create an authenticator over a transport.
    #[must_use]
    pub const fn new(transport: &'a T) -> Self {
        Self { transport }
    }

    /// Obtain a token for one vault entry.
    ///
    /// Missing credentials fail without any network call. Every other
    /// failure is wrapped as an authentication error.
    ///
    /// # Errors
    ///
    /// Returns [`KeyVaultError::MissingCredentials`],
    /// [`KeyVaultError::Authentication`] or
    /// [`KeyVaultError::InvalidTokenResponse`].
    #[instrument(skip(self, config), fields(tenant = config.tenant()))]
    pub async fn authenticate(&self, vault: &str, config: &VaultConfig) -> KeyVaultResult<BearerToken> {
        let (Some(tenant), Some(client), Some(client_secret)) =
            (config.tenant(), config.client(), config.client_secret())
        else {
            return Err(KeyVaultError::MissingCredentials {
                vault: vault.to_string(),
            });
        };

        let request = HttpRequest::post(token_url(tenant)?)
            .form([
                ("grant_type", "client_credentials"),
                ("client_id", client),
                ("client_secret", client_secret.expose_secret()),
                ("resource", VAULT_RESOURCE),
            ])
            .json();

        let response = self
            .transport
            .send(request)
            .await
            .map_err(|source| KeyVaultError::Authentication {
                vault: vault.to_string(),
                source,
            })?;

        let json = response
            .json
            .ok_or_else(|| KeyVaultError::InvalidTokenResponse {
                vault: vault.to_string(),
                reason: "empty token response".to_string(),
            })?;

        let token: TokenResponse =
            serde_json::from_value(json).map_err(|e| KeyVaultError::InvalidTokenResponse {
                vault: vault.to_string(),
                reason: e.to_string(),
            })?;

        debug!(vault, "Obtained bearer token");
        Ok(BearerToken::new(&token.access_token))
    }
}
