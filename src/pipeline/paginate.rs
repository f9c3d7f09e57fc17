// src/pipeline/paginate.rs

//! Offset-based pagination over the search operation.

use std::sync::Arc;

use crate::models::{SearchConfig, SearchResult};
use crate::services::provider::{ListingProvider, SearchQuery};
use crate::services::rate_limiter::{CallOutcome, RateLimiter};
use crate::services::session_pool::Session;

/// Pagination state between calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverState {
    Idle,
    Requesting,
    Done,
}

/// One page handed to the crawl loop.
#[derive(Debug, Clone)]
pub struct Page {
    pub index: u32,
    pub offset: u32,
    pub results: Vec<SearchResult>,
    /// Elements the provider sent, usable or not
    pub returned: usize,
    /// The search call failed and the page stands in as empty
    pub failed: bool,
}

/// Drives the search operation one page at a time.
///
/// Offsets are requested strictly in increasing order and never two at
/// once. The driver stops on a short page, at the page budget, when rate
/// limit retries run out, or after too many consecutive failed pages; the
/// last two mark the run truncated.
pub struct PaginationDriver {
    provider: Arc<dyn ListingProvider>,
    session: Arc<Session>,
    limiter: Arc<RateLimiter>,
    keyword: String,
    location: String,
    listed_after_secs: u64,
    page_size: u32,
    max_pages: u32,
    max_search_errors: u32,
    next_index: u32,
    consecutive_errors: u32,
    pages_requested: usize,
    state: DriverState,
    truncated: bool,
}

impl PaginationDriver {
    pub fn new(
        provider: Arc<dyn ListingProvider>,
        session: Arc<Session>,
        limiter: Arc<RateLimiter>,
        search: &SearchConfig,
        max_search_errors: u32,
    ) -> Self {
        Self {
            provider,
            session,
            limiter,
            keyword: search.keyword.clone(),
            location: search.location.clone(),
            listed_after_secs: search.listed_after_secs,
            page_size: search.page_size.max(1),
            max_pages: search.max_pages,
            max_search_errors: max_search_errors.max(1),
            next_index: 0,
            consecutive_errors: 0,
            pages_requested: 0,
            state: DriverState::Idle,
            truncated: false,
        }
    }

    pub fn state(&self) -> DriverState {
        self.state
    }

    pub fn is_truncated(&self) -> bool {
        self.truncated
    }

    pub fn pages_requested(&self) -> usize {
        self.pages_requested
    }

    /// Stop early, preserving whatever was already fetched.
    pub fn truncate(&mut self) {
        self.truncated = true;
        self.state = DriverState::Done;
    }

    /// Request the next page, or `None` once pagination is over.
    pub async fn next_page(&mut self) -> Option<Page> {
        if self.state == DriverState::Done {
            return None;
        }
        if self.next_index >= self.max_pages {
            log::info!("Page budget of {} reached", self.max_pages);
            self.state = DriverState::Done;
            return None;
        }

        let index = self.next_index;
        let offset = index.saturating_mul(self.page_size);
        let query = SearchQuery {
            keyword: self.keyword.clone(),
            location: self.location.clone(),
            limit: self.page_size,
            offset,
            listed_after_secs: self.listed_after_secs,
        };

        log::info!("Searching page {} (offset {})", index + 1, offset);
        self.state = DriverState::Requesting;
        self.pages_requested += 1;
        self.next_index += 1;

        let provider = self.provider.as_ref();
        let session = self.session.as_ref();
        let query_ref = &query;
        let outcome = self
            .limiter
            .call(&format!("search offset {}", offset), move || async move {
                let mut state = session.lock().await;
                provider.search(&mut state, query_ref).await
            })
            .await;

        match outcome {
            CallOutcome::Done(page) => {
                self.consecutive_errors = 0;
                log::info!(
                    "Found {} jobs on page {} ({} elements returned)",
                    page.results.len(),
                    index + 1,
                    page.returned
                );
                self.state = if page.returned < self.page_size as usize {
                    log::info!(
                        "Page {} returned fewer than {} items, stopping",
                        index + 1,
                        self.page_size
                    );
                    DriverState::Done
                } else {
                    DriverState::Idle
                };
                Some(Page {
                    index,
                    offset,
                    results: page.results,
                    returned: page.returned,
                    failed: false,
                })
            }
            CallOutcome::RateLimitExhausted => {
                log::warn!("Search at offset {} stayed rate limited, truncating run", offset);
                self.truncate();
                None
            }
            CallOutcome::Failed(e) => {
                self.consecutive_errors += 1;
                log::warn!(
                    "Search at offset {} failed ({}/{}): {}",
                    offset,
                    self.consecutive_errors,
                    self.max_search_errors,
                    e
                );
                if self.consecutive_errors >= self.max_search_errors {
                    log::warn!("Too many consecutive search failures, truncating run");
                    self.truncate();
                    return None;
                }
                self.state = DriverState::Idle;
                Some(Page {
                    index,
                    offset,
                    results: Vec::new(),
                    returned: 0,
                    failed: true,
                })
            }
        }
    }
}
