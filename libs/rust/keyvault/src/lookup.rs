//! Lookup entry point: validation, then resolution.

use crate::config::LookupOptions;
use crate::context::LookupContext;
use crate::error::{KeyVaultError, KeyVaultResult};
use crate::resolver::SecretResolver;
use crate::secrets::{LookupKey, SecretValue};
use crate::validate::validate;
use lookup_common::{HttpConfig, HttpTransport, ReqwestTransport};
use tracing::instrument;

/// Non-error outcome of a lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup {
    /// The secret exists, is enabled, and was coerced
    Found(SecretValue),
    /// The host's "no value" answer
    NotFound,
}

impl Lookup {
    /// Whether a value was produced.
    #[must_use]
    pub const fn is_found(&self) -> bool {
        matches!(self, Self::Found(_))
    }

    /// Borrow the value, if any.
    #[must_use]
    pub const fn value(&self) -> Option<&SecretValue> {
        match self {
            Self::Found(v) => Some(v),
            Self::NotFound => None,
        }
    }

    /// Convert to `Option`, mapping not-found to `None`.
    #[must_use]
    pub fn into_option(self) -> Option<SecretValue> {
        match self {
            Self::Found(v) => Some(v),
            Self::NotFound => None,
        }
    }
}

/// The lookup function a host calls.
///
/// Holds no per-lookup state: each call validates, authenticates and
/// fetches afresh.
#[derive(Debug, Clone)]
pub struct KeyVaultLookup<T> {
    resolver: SecretResolver<T>,
}

impl KeyVaultLookup<ReqwestTransport> {
    /// Create a lookup over a reqwest transport.
    ///
    /// # Errors
    ///
    /// Returns [`KeyVaultError::HttpClient`] if the client cannot be built.
    pub fn new(config: &HttpConfig) -> KeyVaultResult<Self> {
        let transport = ReqwestTransport::new(config).map_err(KeyVaultError::HttpClient)?;
        Ok(Self::with_transport(transport))
    }
}

impl<T> KeyVaultLookup<T>
where
    T: HttpTransport,
{
    /// Create a lookup over any transport.
    pub const fn with_transport(transport: T) -> Self {
        Self {
            resolver: SecretResolver::new(transport),
        }
    }

    /// The resolver used for each lookup.
    pub const fn resolver(&self) -> &SecretResolver<T> {
        &self.resolver
    }

    /// Look up a key.
    ///
    /// The `vaults` option is validated before the key is even examined, so
    /// a broken configuration fails every lookup, namespaced or not.
    ///
    /// # Errors
    ///
    /// Returns a [`KeyVaultError`] for configuration, authentication, and
    /// transport failures. A missing secret is `Ok(Lookup::NotFound)`.
    #[instrument(skip_all)]
    pub async fn lookup_key<C>(
        &self,
        key: impl Into<LookupKey>,
        options: &LookupOptions,
        ctx: &C,
    ) -> KeyVaultResult<Lookup>
    where
        C: LookupContext + ?Sized,
    {
        let vaults = validate(options.vaults.as_ref(), ctx)?;
        let key = key.into();

        let outcome = self.resolver.resolve(&key, vaults, ctx).await?;
        if outcome == Lookup::NotFound {
            ctx.explain(&|| format!("Key {key} not found"));
        }
        Ok(outcome)
    }

    /// Look up a key from synchronous code.
    ///
    /// Drives the lookup on a fresh current-thread runtime. Must not be
    /// called from within an async runtime.
    ///
    /// # Errors
    ///
    /// Same as [`KeyVaultLookup::lookup_key`], plus
    /// [`KeyVaultError::Runtime`] if the runtime cannot be created.
    pub fn lookup_key_blocking<C>(
        &self,
        key: impl Into<LookupKey>,
        options: &LookupOptions,
        ctx: &C,
    ) -> KeyVaultResult<Lookup>
    where
        C: LookupContext + ?Sized,
    {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        runtime.block_on(self.lookup_key(key, options, ctx))
    }
}

/// Look up a key with a default reqwest transport.
///
/// # Errors
///
/// See [`KeyVaultLookup::lookup_key`].
pub async fn lookup_key<C>(
    key: impl Into<LookupKey>,
    options: &LookupOptions,
    ctx: &C,
) -> KeyVaultResult<Lookup>
where
    C: LookupContext + ?Sized,
{
    KeyVaultLookup::new(&HttpConfig::default())?
        .lookup_key(key, options, ctx)
        .await
}

/// Synchronous entry points for hosts without an async runtime.
pub mod blocking {
    use super::{KeyVaultLookup, Lookup};
    use crate::config::LookupOptions;
    use crate::context::LookupContext;
    use crate::error::KeyVaultResult;
    use crate::secrets::LookupKey;
    use lookup_common::HttpConfig;

    /// Blocking form of [`super::lookup_key`].
    ///
    /// # Errors
    ///
    /// See [`KeyVaultLookup::lookup_key_blocking`].
    pub fn lookup_key<C>(
        key: impl Into<LookupKey>,
        options: &LookupOptions,
        ctx: &C,
    ) -> KeyVaultResult<Lookup>
    where
        C: LookupContext + ?Sized,
    {
        KeyVaultLookup::new(&HttpConfig::default())?.lookup_key_blocking(key, options, ctx)
    }
}
