// src/services/mod.rs

//! Service layer for the crawler application.
//!
//! This module contains the provider-facing logic:
//! - Provider calls and error classification (`ListingProvider`, `VoyagerClient`)
//! - Evasion delay and retries (`RateLimiter`)
//! - Role-bound sessions (`SessionPool`)
//! - Per-item detail and skills fan-out (`DetailFetcher`)

pub mod detail;
pub mod provider;
pub mod rate_limiter;
pub mod session_pool;

#[cfg(test)]
pub mod testing;

pub use detail::{DetailFetcher, FetchOutcome, SkipReason};
pub use provider::{
    ListingProvider, ProviderError, ProviderResult, SearchPage, SearchQuery,
    VoyagerClient,
};
pub use rate_limiter::{CallOutcome, ErrorClass, RateLimiter};
pub use session_pool::{Session, SessionPool};
