//! Vault configuration gate, run before anything else on every lookup.

use crate::config::VaultSet;
use crate::context::LookupContext;
use crate::error::{KeyVaultError, KeyVaultResult};
use tracing::warn;

/// Check that the `vaults` option exists and has at least one usable entry.
///
/// Unusable entries are explained to the host but tolerated.
///
/// # Errors
///
/// Returns [`KeyVaultError::Configuration`] when `vaults` is absent or no
/// entry is usable.
pub fn validate<'a, C>(vaults: Option<&'a VaultSet>, ctx: &C) -> KeyVaultResult<&'a VaultSet>
where
    C: LookupContext + ?Sized,
{
    let Some(vaults) = vaults else {
        return Err(KeyVaultError::configuration(
            "missing minimum vault location configuration, vaults key is not present",
        ));
    };

    for (name, config) in vaults.iter() {
        let missing = config.missing_fields();
        if !missing.is_empty() {
            warn!(vault = name, ?missing, "Vault has an invalid configuration");
            ctx.explain(&|| {
                format!(
                    "Vault {name} has an invalid configuration (missing {})",
                    missing.join(", ")
                )
            });
        }
    }

    if vaults.usable_count() == 0 {
        return Err(KeyVaultError::configuration(
            "missing minimum vault configuration as no valid vaults found",
        ));
    }

    Ok(vaults)
}
