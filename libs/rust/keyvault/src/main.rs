use anyhow::Context;
use keyvault_lookup::{CliConfig, KeyVaultLookup, Lookup, LookupOptions, TracingContext};
use lookup_common::{HttpConfig, TracingConfig, init_tracing};
use std::process::ExitCode;
use tracing::{error, info};

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let Some(key) = std::env::args().nth(1) else {
        eprintln!("usage: keyvault-lookup <key>");
        return Ok(ExitCode::from(2));
    };

    let config = CliConfig::from_env()?;

    let mut tracing_config = TracingConfig::default().with_log_level(&config.log_level);
    if config.log_json {
        tracing_config = tracing_config.with_json_output();
    }
    init_tracing(&tracing_config).context("failed to initialize tracing")?;

    info!(options_file = %config.options_file.display(), "Starting lookup");

    let options = LookupOptions::from_file(&config.options_file)?;
    let lookup = KeyVaultLookup::new(&HttpConfig::default())?;

    match lookup.lookup_key(key.as_str(), &options, &TracingContext).await {
        Ok(Lookup::Found(value)) => {
            println!("{}", serde_json::to_string(&value)?);
            Ok(ExitCode::SUCCESS)
        }
        Ok(Lookup::NotFound) => {
            eprintln!("{key}: not found");
            Ok(ExitCode::from(1))
        }
        Err(e) => {
            error!(kind = ?e.kind(), error = %e, "Lookup failed");
            Err(e.into())
        }
    }
}
