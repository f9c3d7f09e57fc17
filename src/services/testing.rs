// src/services/testing.rs

//! In-memory provider with scripted responses for unit tests.

use std::collections::{HashMap, HashSet, VecDeque};
use std::hash::Hash;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use crate::models::{Credential, DetailRecord, SearchResult, SessionState, SkillSet};
use crate::services::provider::{
    ListingProvider, ProviderError, ProviderResult, SearchPage, SearchQuery,
};

type Script<K, T> = Mutex<HashMap<K, VecDeque<ProviderResult<T>>>>;

/// Provider whose answers are queued per offset or job id.
///
/// Each call pops the next queued answer; the last one repeats. Unscripted
/// keys get an empty page, an empty detail record, or a single skill.
///
/// Detail and skills calls can be given a latency; overlapping calls and
/// items with unfinished lookups are tracked so concurrency is observable.
#[derive(Default)]
pub struct ScriptedProvider {
    rejected: HashSet<String>,
    auth_calls: AtomicUsize,
    pages: Script<u32, SearchPage>,
    details: Script<String, DetailRecord>,
    skills: Script<String, SkillSet>,
    search_log: Mutex<Vec<u32>>,
    detail_log: Mutex<Vec<String>>,
    skills_calls: AtomicUsize,
    detail_latency: Duration,
    skills_latency: Duration,
    active_calls: AtomicUsize,
    peak_calls: AtomicUsize,
    // Job id -> lookups not yet returned.
    open_items: Mutex<HashMap<String, usize>>,
    peak_items: AtomicUsize,
}

impl ScriptedProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Search item posted at `posted_time` epoch millis.
    pub fn item(job_id: &str, posted_time: i64) -> SearchResult {
        SearchResult {
            job_id: job_id.to_string(),
            title: Some(format!("Job {}", job_id)),
            company: Some("Acme".into()),
            location: Some("Sydney".into()),
            posted_time: Some(posted_time),
            expire_time: None,
            reposted: Some(false),
        }
    }

    /// `count` items with ids `first..first + count`.
    pub fn items(first: usize, count: usize, posted_time: i64) -> Vec<SearchResult> {
        (first..first + count)
            .map(|i| Self::item(&i.to_string(), posted_time))
            .collect()
    }

    pub fn reject_identity(mut self, identity: &str) -> Self {
        self.rejected.insert(identity.to_string());
        self
    }

    pub fn page(self, offset: u32, results: Vec<SearchResult>) -> Self {
        push(&self.pages, offset, Ok(SearchPage::new(results)));
        self
    }

    /// Page whose provider response held `returned` elements, some unusable.
    pub fn page_with_returned(self, offset: u32, results: Vec<SearchResult>, returned: usize) -> Self {
        push(&self.pages, offset, Ok(SearchPage { results, returned }));
        self
    }

    /// Make every detail and skills call take this long.
    pub fn latency(mut self, detail: Duration, skills: Duration) -> Self {
        self.detail_latency = detail;
        self.skills_latency = skills;
        self
    }

    pub fn search_error(self, offset: u32, error: ProviderError) -> Self {
        push(&self.pages, offset, Err(error));
        self
    }

    pub fn detail(self, job_id: &str, record: DetailRecord) -> Self {
        push(&self.details, job_id.to_string(), Ok(record));
        self
    }

    pub fn detail_error(self, job_id: &str, error: ProviderError) -> Self {
        push(&self.details, job_id.to_string(), Err(error));
        self
    }

    pub fn skills_error(self, job_id: &str, error: ProviderError) -> Self {
        push(&self.skills, job_id.to_string(), Err(error));
        self
    }

    pub fn auth_calls(&self) -> usize {
        self.auth_calls.load(Ordering::SeqCst)
    }

    /// Offsets requested so far, in call order.
    pub fn search_offsets(&self) -> Vec<u32> {
        self.search_log.lock().unwrap().clone()
    }

    pub fn detail_calls(&self) -> Vec<String> {
        self.detail_log.lock().unwrap().clone()
    }

    pub fn skills_calls(&self) -> usize {
        self.skills_calls.load(Ordering::SeqCst)
    }

    /// Most detail/skills calls in flight at once.
    pub fn peak_calls(&self) -> usize {
        self.peak_calls.load(Ordering::SeqCst)
    }

    /// Most items with a started but unfinished detail/skills pair at once.
    pub fn peak_items(&self) -> usize {
        self.peak_items.load(Ordering::SeqCst)
    }

    async fn lookup(&self, job_id: &str, latency: Duration) {
        {
            let mut open = self.open_items.lock().unwrap();
            if !open.contains_key(job_id) {
                open.insert(job_id.to_string(), 2);
                self.peak_items.fetch_max(open.len(), Ordering::SeqCst);
            }
        }
        let active = self.active_calls.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_calls.fetch_max(active, Ordering::SeqCst);

        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }

        self.active_calls.fetch_sub(1, Ordering::SeqCst);
        let mut open = self.open_items.lock().unwrap();
        if let Some(remaining) = open.get_mut(job_id) {
            *remaining -= 1;
            if *remaining == 0 {
                open.remove(job_id);
            }
        }
    }
}

fn push<K: Eq + Hash, T>(script: &Script<K, T>, key: K, answer: ProviderResult<T>) {
    script
        .lock()
        .unwrap()
        .entry(key)
        .or_default()
        .push_back(answer);
}

fn next<K: Eq + Hash, T: Clone>(script: &Script<K, T>, key: &K) -> Option<ProviderResult<T>> {
    let mut script = script.lock().unwrap();
    let queue = script.get_mut(key)?;
    if queue.len() > 1 {
        queue.pop_front()
    } else {
        queue.front().cloned()
    }
}

#[async_trait]
impl ListingProvider for ScriptedProvider {
    async fn authenticate(&self, credential: &Credential) -> ProviderResult<SessionState> {
        self.auth_calls.fetch_add(1, Ordering::SeqCst);
        if self.rejected.contains(&credential.identity) {
            return Err(ProviderError::Unauthorized("HTTP 401".into()));
        }
        Ok(SessionState::from_credential(credential))
    }

    async fn search(
        &self,
        _session: &mut SessionState,
        query: &SearchQuery,
    ) -> ProviderResult<SearchPage> {
        self.search_log.lock().unwrap().push(query.offset);
        next(&self.pages, &query.offset).unwrap_or_else(|| Ok(SearchPage::default()))
    }

    async fn detail(
        &self,
        _session: &mut SessionState,
        job_id: &str,
    ) -> ProviderResult<DetailRecord> {
        self.detail_log.lock().unwrap().push(job_id.to_string());
        self.lookup(job_id, self.detail_latency).await;
        next(&self.details, &job_id.to_string()).unwrap_or_else(|| Ok(DetailRecord::default()))
    }

    async fn skills(&self, _session: &mut SessionState, job_id: &str) -> ProviderResult<SkillSet> {
        self.skills_calls.fetch_add(1, Ordering::SeqCst);
        self.lookup(job_id, self.skills_latency).await;
        next(&self.skills, &job_id.to_string()).unwrap_or_else(|| {
            Ok(SkillSet {
                skills: Some(vec!["SQL".into()]),
                company_name: None,
            })
        })
    }
}
