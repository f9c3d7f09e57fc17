// src/pipeline/validate.rs

use crate::config::CredentialSource;
use crate::error::Result;
use crate::models::{Config, Role};

/// Validate configuration and credential files without contacting the provider.
pub async fn run_validate(config: &Config, credentials: &dyn CredentialSource) -> Result<()> {
    log::info!("Validating configuration...");

    if let Err(e) = config.validate() {
        log::error!("Config validation failed: {}", e);
        return Err(e);
    }
    log::info!("Config OK");
    log::info!("  keyword: {}", config.search.keyword);
    log::info!("  location: {}", config.search.location);
    log::info!(
        "  pages: {} x {} (window {}h)",
        config.search.max_pages,
        config.search.page_size,
        config.search.window_hours
    );
    log::info!(
        "  delay: {}-{}ms, retries: {}",
        config.rate_limit.min_delay_ms,
        config.rate_limit.max_delay_ms,
        config.rate_limit.max_retries
    );

    let loaded = match credentials.load(&config.accounts).await {
        Ok(loaded) => loaded,
        Err(e) => {
            log::error!("Credential validation failed: {}", e);
            return Err(e);
        }
    };
    log::info!("Credentials OK");
    for role in [Role::Search, Role::Detail, Role::Skills] {
        let count = loaded.iter().filter(|c| c.role == role).count();
        log::info!("  {}: {} account(s)", role, count);
    }

    Ok(())
}
