// src/pipeline/crawl.rs

//! Crawl run orchestration.
//!
//! Pages are fetched one after another. Within a page, items fan out to
//! the detail fetcher; admission (window, then dedup) runs afterwards on the
//! ordered outcomes, so the dedup set is only touched from this loop.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::config::CredentialSource;
use crate::error::Result;
use crate::models::{
    Config, CrawlResponse, CrawlStatus, Credential, NormalizedJobRecord, Role, RunSummary,
};
use crate::pipeline::admission::{Deduplicator, TimeWindowFilter};
use crate::pipeline::normalize::RecordNormalizer;
use crate::pipeline::paginate::PaginationDriver;
use crate::services::{DetailFetcher, FetchOutcome, ListingProvider, RateLimiter, SessionPool};
use crate::storage::{ObjectStore, SchemaValidatedWriter};

/// One end-to-end crawl for a single keyword.
pub struct CrawlRun {
    config: Arc<Config>,
    provider: Arc<dyn ListingProvider>,
    store: Arc<dyn ObjectStore>,
    started_at: DateTime<Utc>,
}

impl CrawlRun {
    /// Prepare a run anchored at the current time.
    pub fn new(
        config: Arc<Config>,
        provider: Arc<dyn ListingProvider>,
        store: Arc<dyn ObjectStore>,
    ) -> Self {
        Self {
            config,
            provider,
            store,
            started_at: Utc::now(),
        }
    }

    /// Anchor the admission window and partition date at `started_at`.
    pub fn started_at(mut self, started_at: DateTime<Utc>) -> Self {
        self.started_at = started_at;
        self
    }

    /// Execute the run.
    ///
    /// Authentication and storage failures are returned as errors. Every
    /// other failure is isolated to its item or page, and a truncated run
    /// still writes what it accumulated and reports `partial`.
    pub async fn execute(&self, credentials: &[Credential]) -> Result<CrawlResponse> {
        let config = self.config.as_ref();
        config.validate_run()?;

        log::info!(
            "Starting crawl for '{}' in {} ({} pages of {})",
            config.search.keyword,
            config.search.location,
            config.search.max_pages,
            config.search.page_size
        );

        let pool = Arc::new(SessionPool::connect(self.provider.as_ref(), credentials).await?);
        let limiter = Arc::new(RateLimiter::new(&config.rate_limit));

        let mut driver = PaginationDriver::new(
            Arc::clone(&self.provider),
            pool.acquire(Role::Search)?,
            Arc::clone(&limiter),
            &config.search,
            config.rate_limit.max_search_errors,
        );
        let fetcher = DetailFetcher::new(
            Arc::clone(&self.provider),
            Arc::clone(&pool),
            limiter,
            RecordNormalizer::new(&config.provider.job_url_base),
        );

        let window = TimeWindowFilter::new(self.started_at, config.search.window_hours);
        let mut dedup = Deduplicator::new();
        let mut records: Vec<NormalizedJobRecord> = Vec::new();
        let mut summary = RunSummary::default();
        let mut rate_limited_pages = 0;

        while let Some(page) = driver.next_page().await {
            log::debug!(
                "Page {} at offset {}: {} usable of {} returned",
                page.index + 1,
                page.offset,
                page.results.len(),
                page.returned
            );
            let outcomes = fetcher.fetch_page(&page.results).await;
            summary.items_seen += page.results.len();

            let page_rate_limited = outcomes.iter().any(FetchOutcome::is_rate_limited);
            for outcome in outcomes {
                let record = match outcome {
                    FetchOutcome::Record(record) => record,
                    FetchOutcome::Skipped { .. } => {
                        summary.items_skipped += 1;
                        continue;
                    }
                };

                if !window.accepts(record.posted_time) {
                    log::info!(
                        "Job {} posted at {:?} is outside window {} - {}",
                        record.job_id,
                        record.posted_time,
                        window.start_ms(),
                        window.end_ms()
                    );
                    summary.outside_window += 1;
                    continue;
                }
                if !dedup.admit(&record.job_id) {
                    log::info!("Skipping duplicate job {}", record.job_id);
                    summary.duplicates += 1;
                    continue;
                }
                records.push(record);
            }

            if page_rate_limited {
                rate_limited_pages += 1;
                if rate_limited_pages >= config.rate_limit.max_rate_limited_pages.max(1) {
                    log::warn!(
                        "{} consecutive pages hit rate limit exhaustion, truncating run",
                        rate_limited_pages
                    );
                    driver.truncate();
                }
            } else {
                rate_limited_pages = 0;
            }
        }

        summary.pages_requested = driver.pages_requested();
        summary.truncated = driver.is_truncated();

        let writer = SchemaValidatedWriter::new(Arc::clone(&self.store), &config.storage.prefix);
        let written = writer
            .write(&config.search.keyword, self.started_at.date_naive(), &records)
            .await?;
        summary.malformed = written.dropped;

        let status = if summary.truncated {
            CrawlStatus::Partial
        } else {
            CrawlStatus::Success
        };
        log::info!(
            "Crawl {}: {} jobs written to {} (pages {}, seen {}, skipped {}, outside window {}, duplicates {}, malformed {})",
            status,
            written.written,
            written.location,
            summary.pages_requested,
            summary.items_seen,
            summary.items_skipped,
            summary.outside_window,
            summary.duplicates,
            summary.malformed
        );

        Ok(CrawlResponse {
            status,
            jobs_processed: written.written,
            storage_path: written.partition,
            error: None,
            summary,
        })
    }
}

/// Resolve credentials for `config.accounts` and execute one run.
pub async fn run_crawl(
    config: Arc<Config>,
    provider: Arc<dyn ListingProvider>,
    store: Arc<dyn ObjectStore>,
    credentials: &dyn CredentialSource,
) -> Result<CrawlResponse> {
    let loaded = credentials.load(&config.accounts).await?;
    CrawlRun::new(config, provider, store).execute(&loaded).await
}
