// src/lambda/mod.rs

//! AWS Lambda handler for the crawler.
//!
//! Each invocation:
//! 1. Builds the run configuration (S3 base file, environment, request overrides)
//! 2. Loads account cookies from the cookies bucket
//! 3. Crawls one keyword
//! 4. Writes the partition file to the data lake bucket

use std::sync::Arc;

use lambda_runtime::{Error as LambdaError, LambdaEvent};
use tracing::{error, info, instrument};

use crate::config::{CookieFileCredentials, load_config_from_store};
use crate::error::Result;
use crate::models::{Config, CrawlRequest, CrawlResponse};
use crate::pipeline::run_crawl;
use crate::services::VoyagerClient;
use crate::storage::S3Storage;

/// Main Lambda handler function.
///
/// Failures are reported in the response body with status `failed`
/// rather than as an invocation error.
#[instrument(skip(event))]
pub async fn handler(
    event: LambdaEvent<CrawlRequest>,
) -> std::result::Result<CrawlResponse, LambdaError> {
    let start = std::time::Instant::now();
    let (request, _context) = event.into_parts();

    info!(
        "Starting crawl: keyword={:?}, location={:?}",
        request.keyword, request.location
    );

    match invoke(&request).await {
        Ok(response) => {
            info!(
                "Crawl {}: {} jobs at {} in {}ms",
                response.status,
                response.jobs_processed,
                response.storage_path,
                start.elapsed().as_millis()
            );
            Ok(response)
        }
        Err(e) => {
            error!("Crawl failed: {}", e);
            Ok(CrawlResponse::failed(&e))
        }
    }
}

/// Internal crawl logic.
async fn invoke(request: &CrawlRequest) -> Result<CrawlResponse> {
    let mut env_config = Config::default();
    env_config.apply_env();

    let lake = S3Storage::from_env(&env_config.storage.bucket).await;

    // An optional base file in the lake bucket, overridden again by the environment.
    let base = match std::env::var("CONFIG_S3_KEY") {
        Ok(key) => {
            let mut config = load_config_from_store(&lake, &key).await?;
            config.apply_env();
            config
        }
        Err(_) => env_config,
    };
    let config = resolve_config(base, request)?;

    let lake = lake.with_bucket(&config.storage.bucket);
    let cookies = lake.with_bucket(&config.storage.cookies_bucket);
    let provider = VoyagerClient::new(&config.provider)?;

    run_crawl(
        Arc::new(config),
        Arc::new(provider),
        Arc::new(lake),
        &CookieFileCredentials::new(Arc::new(cookies)),
    )
    .await
}

/// Merge the request into `base` and check the result.
fn resolve_config(base: Config, request: &CrawlRequest) -> Result<Config> {
    let config = base.with_request(request);
    config.validate()?;
    Ok(config)
}
