// src/pipeline/admission.rs

//! Admission checks applied to every fetched record, in order: time window, then dedup.

use std::collections::HashSet;

use chrono::{DateTime, Duration, Utc};

/// Accepts posting times inside `[start, end]`, anchored at run start.
///
/// The window guards against postings inserted into earlier result pages
/// while the run is paginating; it is not a staleness filter. Both bounds
/// keep millisecond precision, so the run-start instant is not rounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindowFilter {
    start_ms: i64,
    end_ms: i64,
}

impl TimeWindowFilter {
    /// Window of `hours` ending at `run_start`.
    pub fn new(run_start: DateTime<Utc>, hours: u32) -> Self {
        let end_ms = run_start.timestamp_millis();
        Self {
            start_ms: end_ms - Duration::hours(i64::from(hours)).num_milliseconds(),
            end_ms,
        }
    }

    pub fn start_ms(&self) -> i64 {
        self.start_ms
    }

    pub fn end_ms(&self) -> i64 {
        self.end_ms
    }

    /// Unknown posting times cannot be verified and are rejected.
    pub fn accepts(&self, posted_time: Option<i64>) -> bool {
        posted_time.is_some_and(|t| self.start_ms <= t && t <= self.end_ms)
    }
}

/// Per-run set of admitted job ids.
#[derive(Debug, Default)]
pub struct Deduplicator {
    seen: HashSet<String>,
}

impl Deduplicator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `job_id`; false if it was already admitted this run.
    pub fn admit(&mut self, job_id: &str) -> bool {
        if self.seen.contains(job_id) {
            return false;
        }
        self.seen.insert(job_id.to_string())
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}
