// src/models/mod.rs

//! Domain models for the crawler application.
//!
//! This module contains all data structures used throughout the application,
//! organized by their primary purpose.

mod config;
mod job;
mod run;
mod session;

// Re-export all public types
pub use config::{
    AccountConfig, Config, ProviderConfig, RateLimitConfig, SearchConfig, StorageConfig,
};
pub use job::{
    DetailRecord, EASY_APPLY_KEY, NormalizedJobRecord, OFFSITE_APPLY_KEY, SearchResult, SkillSet,
    WorkplaceType,
};
pub use run::{CrawlRequest, CrawlResponse, CrawlStatus, RunSummary};
pub use session::{CSRF_COOKIE, Credential, Role, SessionState};
