// src/models/run.rs

//! Invocation payloads and run reporting.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Per-invocation overrides. Absent fields keep the configured value.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CrawlRequest {
    #[serde(default)]
    pub keyword: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub window_hours: Option<u32>,
    #[serde(default)]
    pub max_pages: Option<u32>,
    #[serde(default)]
    pub page_size: Option<u32>,
    /// Lower bound of the evasion delay in millis
    #[serde(default, alias = "base_delay")]
    pub base_delay_ms: Option<u64>,
    #[serde(default, alias = "retry_delay")]
    pub retry_delay_ms: Option<u64>,
    #[serde(default)]
    pub max_retries: Option<u32>,
}

/// Final status of a crawl run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CrawlStatus {
    Success,
    /// Truncated by rate limiting or repeated page failures
    Partial,
    Failed,
}

impl fmt::Display for CrawlStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            CrawlStatus::Success => "success",
            CrawlStatus::Partial => "partial",
            CrawlStatus::Failed => "failed",
        })
    }
}

/// Counters collected over one run.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct RunSummary {
    pub pages_requested: usize,
    pub items_seen: usize,
    pub items_skipped: usize,
    pub outside_window: usize,
    pub duplicates: usize,
    pub malformed: usize,
    pub truncated: bool,
}

/// Outcome reported to the invoker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlResponse {
    pub status: CrawlStatus,
    pub jobs_processed: usize,
    pub storage_path: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    #[serde(default)]
    pub summary: RunSummary,
}

impl CrawlResponse {
    /// Response for a run that never reached the write.
    pub fn failed(error: impl fmt::Display) -> Self {
        Self {
            status: CrawlStatus::Failed,
            jobs_processed: 0,
            storage_path: String::new(),
            error: Some(error.to_string()),
            summary: RunSummary::default(),
        }
    }
}
