//! Job crawler CLI
//!
//! Local execution entry point. For AWS Lambda, use `job-crawler-lambda`.

use std::path::PathBuf;
use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use clap::{Parser, Subcommand};
use job_crawler::{
    config::CookieFileCredentials,
    error::{AppError, Result},
    models::{Config, CrawlRequest, CrawlStatus},
    pipeline,
    services::VoyagerClient,
    storage::{LocalStorage, SchemaValidatedWriter, partition_key},
};

/// Job listing crawler
#[derive(Parser, Debug)]
#[command(
    name = "job-crawler",
    version,
    about = "Crawls job listings into a partitioned parquet data lake"
)]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Crawl one keyword and write its partition file
    Crawl {
        /// Search keyword (overrides the config file)
        #[arg(short, long)]
        keyword: Option<String>,

        /// Search location
        #[arg(short, long)]
        location: Option<String>,

        /// Maximum number of result pages
        #[arg(long)]
        pages: Option<u32>,

        /// Results requested per page
        #[arg(long)]
        page_size: Option<u32>,

        /// Admission window in hours
        #[arg(long)]
        window_hours: Option<u32>,
    },

    /// Validate configuration and cookie files
    Validate,

    /// Print the records of a written partition file
    Inspect {
        /// Keyword the partition was written for
        #[arg(short, long)]
        keyword: String,

        /// Partition date (YYYY-MM-DD), today if omitted
        #[arg(short, long)]
        date: Option<NaiveDate>,
    },
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let mut config = Config::load_or_default(&cli.config);
    config.apply_env();
    log::info!("Loaded configuration from {}", cli.config.display());

    let output = Arc::new(LocalStorage::new(&config.storage.local_dir));
    let cookies = CookieFileCredentials::new(Arc::new(LocalStorage::new(
        &config.storage.cookies_dir,
    )));

    match cli.command {
        Command::Crawl {
            keyword,
            location,
            pages,
            page_size,
            window_hours,
        } => {
            let request = CrawlRequest {
                keyword,
                location,
                window_hours,
                max_pages: pages,
                page_size,
                ..CrawlRequest::default()
            };
            let config = config.with_request(&request);
            config.validate()?;

            let provider = VoyagerClient::new(&config.provider)?;
            let response = pipeline::run_crawl(
                Arc::new(config),
                Arc::new(provider),
                output,
                &cookies,
            )
            .await?;

            if response.status == CrawlStatus::Partial {
                log::warn!("Run was truncated; the partition holds a partial result");
            }
            println!("{}", serde_json::to_string_pretty(&response)?);
        }

        Command::Validate => {
            pipeline::run_validate(&config, &cookies).await?;
            log::info!("All validations passed!");
        }

        Command::Inspect { keyword, date } => {
            let date = date.unwrap_or_else(|| Utc::now().date_naive());
            let key = partition_key(&config.storage.prefix, &keyword, date);
            let writer = SchemaValidatedWriter::new(output, &config.storage.prefix);

            let records = writer
                .read(&key)
                .await?
                .ok_or_else(|| AppError::config(format!("No partition file at {}", key)))?;
            log::info!("{} records in {}", records.len(), key);
            for record in &records {
                println!("{}", serde_json::to_string(record)?);
            }
        }
    }

    Ok(())
}
