//! AWS Lambda entry point for the job crawler
//!
//! Deploy with `cargo lambda build --release --features lambda`
//! The event payload is a `CrawlRequest` JSON object.

use job_crawler::lambda::handler;
use lambda_runtime::{Error as LambdaError, service_fn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), LambdaError> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer().json())
        .init();

    tracing::info!("Job crawler Lambda starting...");
    lambda_runtime::run(service_fn(handler)).await
}
