// src/services/detail.rs

//! Per-item detail and skills fetching.

use std::sync::Arc;

use futures::stream::{self, StreamExt};

use crate::models::{NormalizedJobRecord, Role, SearchResult, SkillSet};
use crate::pipeline::normalize::RecordNormalizer;
use crate::services::provider::{ListingProvider, ProviderError};
use crate::services::rate_limiter::{CallOutcome, RateLimiter};
use crate::services::session_pool::SessionPool;

/// Why an item produced no record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// The detail lookup stayed rate limited after every retry
    RateLimited,
    /// The detail lookup failed for another reason
    DetailFailed(ProviderError),
    /// No session could be acquired
    NoSession(String),
}

/// Result of fetching one search item.
#[derive(Debug, Clone)]
pub enum FetchOutcome {
    Record(NormalizedJobRecord),
    Skipped { job_id: String, reason: SkipReason },
}

impl FetchOutcome {
    pub fn is_rate_limited(&self) -> bool {
        matches!(
            self,
            FetchOutcome::Skipped {
                reason: SkipReason::RateLimited,
                ..
            }
        )
    }
}

/// Fans each item out to a detail and a skills lookup on distinct sessions.
pub struct DetailFetcher {
    provider: Arc<dyn ListingProvider>,
    pool: Arc<SessionPool>,
    limiter: Arc<RateLimiter>,
    normalizer: RecordNormalizer,
}

impl DetailFetcher {
    pub fn new(
        provider: Arc<dyn ListingProvider>,
        pool: Arc<SessionPool>,
        limiter: Arc<RateLimiter>,
        normalizer: RecordNormalizer,
    ) -> Self {
        Self {
            provider,
            pool,
            limiter,
            normalizer,
        }
    }

    /// Fetch and merge one item.
    ///
    /// Both lookups run concurrently and are awaited together. A failed
    /// detail lookup skips the item; a failed skills lookup only degrades
    /// the skills field to its default.
    pub async fn fetch(&self, item: &SearchResult) -> FetchOutcome {
        let job_id = item.job_id.clone();

        let sessions = self
            .pool
            .acquire(Role::Detail)
            .and_then(|detail| Ok((detail, self.pool.acquire(Role::Skills)?)));
        let (detail_session, skills_session) = match sessions {
            Ok(pair) => pair,
            Err(e) => {
                log::error!("Job {}: {}", job_id, e);
                return FetchOutcome::Skipped {
                    job_id,
                    reason: SkipReason::NoSession(e.to_string()),
                };
            }
        };

        let provider = self.provider.as_ref();
        let id = job_id.as_str();
        let detail_context = format!("detail {}", id);
        let skills_context = format!("skills {}", id);

        let detail_call = {
            let session = detail_session.as_ref();
            self.limiter.call(&detail_context, move || async move {
                let mut state = session.lock().await;
                provider.detail(&mut state, id).await
            })
        };
        let skills_call = {
            let session = skills_session.as_ref();
            self.limiter.call(&skills_context, move || async move {
                let mut state = session.lock().await;
                provider.skills(&mut state, id).await
            })
        };

        let (detail, skills) = tokio::join!(detail_call, skills_call);

        let detail = match detail {
            CallOutcome::Done(detail) => detail,
            CallOutcome::RateLimitExhausted => {
                log::warn!("Job {}: detail lookup rate limited, skipping", job_id);
                return FetchOutcome::Skipped {
                    job_id,
                    reason: SkipReason::RateLimited,
                };
            }
            CallOutcome::Failed(e) => {
                log::warn!("Job {}: detail lookup failed, skipping: {}", job_id, e);
                return FetchOutcome::Skipped {
                    job_id,
                    reason: SkipReason::DetailFailed(e),
                };
            }
        };

        let skills = match skills {
            CallOutcome::Done(skills) => skills,
            CallOutcome::RateLimitExhausted => {
                log::warn!("Job {}: skills lookup rate limited, using defaults", job_id);
                SkillSet::default()
            }
            CallOutcome::Failed(e) => {
                log::warn!("Job {}: skills lookup failed, using defaults: {}", job_id, e);
                SkillSet::default()
            }
        };

        let record = self.normalizer.normalize(item, &detail, &skills);
        log::debug!(
            "Processed job {}: {} at {}",
            record.job_id,
            record.title.as_deref().unwrap_or_default(),
            record.company.as_deref().unwrap_or_default()
        );
        FetchOutcome::Record(record)
    }

    /// Fetch a page of items, at most `worker_limit` at a time.
    ///
    /// Items complete in any order; outcomes come back in page order so
    /// admission downstream stays deterministic.
    pub async fn fetch_page(&self, items: &[SearchResult]) -> Vec<FetchOutcome> {
        let mut outcomes: Vec<(usize, FetchOutcome)> = stream::iter(items.iter().enumerate())
            .map(|(index, item)| async move { (index, self.fetch(item).await) })
            .buffer_unordered(self.pool.worker_limit())
            .collect()
            .await;

        outcomes.sort_by_key(|(index, _)| *index);
        outcomes.into_iter().map(|(_, outcome)| outcome).collect()
    }
}
