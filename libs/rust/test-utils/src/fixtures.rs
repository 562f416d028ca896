//! Test fixtures with sample data.
//!
//! This module provides pre-built vault sets and vault responses.

use keyvault_lookup::{LookupOptions, VaultConfig, VaultSet};
use serde_json::{Value, json};

/// Usable config for vault host `host` with tenant `tenant-{host}`.
#[must_use]
pub fn usable_vault(host: &str) -> VaultConfig {
    VaultConfig::new(
        host,
        format!("tenant-{host}"),
        format!("client-{host}"),
        format!("secret-{host}"),
    )
}

/// Config with only the vault host set.
#[must_use]
pub fn host_only_vault(host: &str) -> VaultConfig {
    VaultConfig {
        vault: Some(host.to_string()),
        ..VaultConfig::default()
    }
}

/// The single-vault set `{vault:"kv1", tenant:"t", client:"c", client_secret:"s"}`.
#[must_use]
pub fn single_vault_set() -> VaultSet {
    VaultSet::new().with_vault("primary", VaultConfig::new("kv1", "t", "c", "s"))
}

/// Two usable vaults, `kv1` then `kv2`.
#[must_use]
pub fn two_vault_set() -> VaultSet {
    VaultSet::new()
        .with_vault("primary", usable_vault("kv1"))
        .with_vault("secondary", usable_vault("kv2"))
}

/// Wrap a set as lookup options.
#[must_use]
pub fn options(vaults: VaultSet) -> LookupOptions {
    LookupOptions::with_vaults(vaults)
}

/// Secret bundle as returned by `GET /secrets/{name}`.
#[must_use]
pub fn secret_body(value: &str, enabled: bool) -> Value {
    json!({
        "value": value,
        "id": "https://kv1.vault.azure.net/secrets/app-token/4387e9f3d6e14c459867679a90fd0f79",
        "attributes": {
            "enabled": enabled,
            "created": 1_493_938_410,
            "updated": 1_493_938_410,
            "recoveryLevel": "Purgeable"
        }
    })
}
